/*
 * This modules contains the configuration of the `SeqEval` metric. The `SeqEvalConfig` struct
 * implements the default trait and can be customized with the `SeqEvalConfigBuilder`.
*/
use crate::metrics::DivByZeroStrat;
use either::Either as LeftOrRight;
use std::fmt::Display;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
/// Config struct used to simplify the inputs of parameters to the `SeqEval` metric and to the
/// `classification_report` function. It implements the default trait.
pub struct SeqEvalConfig {
    /// This parameter describe what to do when we encounter a division by zero when computing
    /// precision and recall. The most common solution is to replace the results by 0.
    pub(crate) zero_division: DivByZeroStrat,
    /// Is the prefix (e.g. 'I', 'B', 'U', ...) located at the end of the labels? If so, this
    /// parameter should be `true`.
    pub(crate) suffix: bool,
    /// Char separating the prefix from the class, such as `-` in `B-PER`.
    pub(crate) delimiter: char,
    /// Can we use multiple cores to compute the metrics? In practice, the per class arrays are
    /// small and it is better to *not* parallelize the computations.
    pub(crate) parallel: bool,
}

impl SeqEvalConfig {
    pub fn new() -> Self {
        Self {
            zero_division: DivByZeroStrat::ReplaceBy0,
            suffix: false,
            delimiter: '-',
            parallel: false,
        }
    }

    pub fn zero_division(&self) -> DivByZeroStrat {
        self.zero_division
    }

    pub fn suffix(&self) -> bool {
        self.suffix
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }
}

impl Default for SeqEvalConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl<ZeroDiv: Into<DivByZeroStrat>> From<SeqEvalConfigBuilder<ZeroDiv>> for SeqEvalConfig {
    fn from(value: SeqEvalConfigBuilder<ZeroDiv>) -> Self {
        Self {
            zero_division: value.zero_division.either_into(),
            suffix: value.suffix,
            delimiter: value.delimiter,
            parallel: value.parallel,
        }
    }
}

impl From<(DivByZeroStrat, bool, char, bool)> for SeqEvalConfig {
    fn from(value: (DivByZeroStrat, bool, char, bool)) -> Self {
        Self {
            zero_division: value.0,
            suffix: value.1,
            delimiter: value.2,
            parallel: value.3,
        }
    }
}

impl Display for SeqEvalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Strategy when encountering a division by zero: {:?}\n Prefix located at the end of the labels: {}\n Delimiter: {:?}\n Using parallel computations: {}",
            self.zero_division, self.suffix, self.delimiter, self.parallel
        )
    }
}

/// This builder can be used to build and customize a `SeqEvalConfig` structure.
///
/// # Example
///
/// ```rust
/// use nerprep::{DivByZeroStrat, SeqEvalConfigBuilder};
///
/// let config = SeqEvalConfigBuilder::default()
///     .division_by_zero(DivByZeroStrat::ReplaceBy1)
///     .suffix(true)
///     .build();
/// assert_eq!(config.zero_division(), DivByZeroStrat::ReplaceBy1);
/// assert!(config.suffix());
/// ```
pub struct SeqEvalConfigBuilder<ZeroDiv>
where
    ZeroDiv: Into<DivByZeroStrat>,
{
    zero_division: LeftOrRight<ZeroDiv, DivByZeroStrat>,
    suffix: bool,
    delimiter: char,
    parallel: bool,
}

impl Default for SeqEvalConfigBuilder<DivByZeroStrat> {
    fn default() -> Self {
        Self::new()
    }
}

impl<ZeroDiv> SeqEvalConfigBuilder<ZeroDiv>
where
    ZeroDiv: Into<DivByZeroStrat>,
{
    pub fn new() -> Self {
        Self {
            zero_division: LeftOrRight::Right(DivByZeroStrat::ReplaceBy0),
            suffix: false,
            delimiter: '-',
            parallel: false,
        }
    }
    pub fn division_by_zero(mut self, division_by_zero: ZeroDiv) -> Self {
        self.zero_division = LeftOrRight::Left(division_by_zero);
        self
    }
    pub fn suffix(mut self, suffix: bool) -> Self {
        self.suffix = suffix;
        self
    }
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
    pub fn build(self) -> SeqEvalConfig {
        SeqEvalConfig::from(self)
    }
}
