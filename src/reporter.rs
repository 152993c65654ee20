/**
This modules gives a few tools to prettyprint the metrics of every class and the overall metrics.
*/
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::error::Error;
use std::fmt::Display;
use std::hash::Hash;
use std::str::FromStr;

/// The reporter holds the metrics of every class and the overall metrics. It can be used to
/// display the results as if they were collected into a dataframe. The reporter can be built with
/// the `classification_report` function.
///
/// # Example
///
/// ```rust
/// use nerprep::{classification_report, SeqEvalConfig};
///
/// let y_true = vec![vec!["B-PER", "I-PER", "O", "B-LOC"]];
/// let y_pred = vec![vec!["B-PER", "I-PER", "O", "O"]];
///
/// let reporter = classification_report(&y_true, &y_pred, &SeqEvalConfig::default()).unwrap();
///
/// let expected_report =
/// "Class, Precision, Recall, Fscore, Support
/// LOC, 0, 0, 0, 1
/// PER, 1, 1, 1, 1
/// Overall_Micro, 1, 0.5, 0.6666667, 2
/// Overall_Macro, 0.5, 0.5, 0.5, 2
/// Overall_Weighted, 0.5, 0.5, 0.5, 2\n";
///
/// assert_eq!(expected_report, reporter.to_string());
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct Reporter {
    pub(crate) classes: BTreeSet<ClassMetrics>,
}

/// By converting the reporter into a `HashSet` of `ClassMetrics`, you lose the ordering of the
/// rows. If you mean to consume the data without prettyprinting it, this is not a problem.
impl From<Reporter> for HashSet<ClassMetrics> {
    fn from(value: Reporter) -> Self {
        value.classes.into_iter().collect()
    }
}

impl Reporter {
    pub(crate) fn insert(&mut self, metrics: ClassMetrics) -> bool {
        self.classes.insert(metrics)
    }

    /// The metrics of a single class, such as `PER`.
    pub fn get(&self, class: &str) -> Option<&ClassMetrics> {
        self.classes
            .iter()
            .find(|m| m.average == Average::None && m.class == class)
    }

    pub fn overall(&self, average: OverallAverage) -> Option<&ClassMetrics> {
        let average = Average::from(average);
        self.classes.iter().find(|m| m.average == average)
    }

    /// Per class rows, in ascending order of class name.
    pub fn classes(&self) -> impl Iterator<Item = &ClassMetrics> {
        self.classes.iter().filter(|m| m.average == Average::None)
    }
}

/// The Reporter struct acts as a dataframe when displayed.
impl Display for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Class, Precision, Recall, Fscore, Support")?;
        for v in self.classes.iter() {
            writeln!(f, "{}", v)?
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
/// The metrics of a single class, or an average over the classes. They implement a special version
/// of the `Display` trait, allowing them to be treated as the line of a dataframe. Two rows are
/// equal when they have the same class and average.
pub struct ClassMetrics {
    /// The class, such as "PER", "GEO", "MISC", etc.
    pub class: String,
    /// The average used to compute this row
    pub average: Average,
    pub precision: f32,
    pub recall: f32,
    pub fscore: f32,
    pub support: usize,
}

impl Hash for ClassMetrics {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.class.hash(state);
        self.average.hash(state)
    }
}

impl PartialEq for ClassMetrics {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class && self.average == other.average
    }
}
impl Eq for ClassMetrics {}

/// Classes come first, sorted by name, followed by the averages.
impl Ord for ClassMetrics {
    fn cmp(&self, other: &Self) -> Ordering {
        self.average
            .cmp(&other.average)
            .then_with(|| self.class.cmp(&other.class))
    }
}

impl PartialOrd for ClassMetrics {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl ClassMetrics {
    pub(crate) fn new_overall(
        average: OverallAverage,
        precision: f32,
        recall: f32,
        fscore: f32,
        support: usize,
    ) -> Self {
        ClassMetrics {
            class: average.to_string(),
            average: average.into(),
            precision,
            recall,
            fscore,
            support,
        }
    }
}

/// The ClassMetrics struct acts as a line in a dataframe when displayed.
impl Display for ClassMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}",
            self.class, self.precision, self.recall, self.fscore, self.support
        )
    }
}

/// Enumeration of the different types of averaging supported by this crate. The variants are
/// ordered as they appear in a report.
#[derive(
    Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Serialize, Deserialize,
)]
pub enum Average {
    None,
    Micro,
    Macro,
    Weighted,
}

impl Display for Average {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for Average {
    type Err = AverageParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Average::None),
            "micro" => Ok(Average::Micro),
            "macro" => Ok(Average::Macro),
            "weighted" => Ok(Average::Weighted),
            _ => Err(AverageParsingError(String::from(s))),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct AverageParsingError(String);

impl Display for AverageParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Impossible to parse the string ({}) into an Average",
            self.0
        )
    }
}

impl Error for AverageParsingError {}

#[derive(Debug, Hash, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum OverallAverage {
    Micro,
    Macro,
    Weighted,
}

impl Display for OverallAverage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str_content = match self {
            Self::Micro => "Overall_Micro",
            Self::Macro => "Overall_Macro",
            Self::Weighted => "Overall_Weighted",
        };
        write!(f, "{}", str_content)
    }
}

impl From<OverallAverage> for Average {
    fn from(value: OverallAverage) -> Self {
        match value {
            OverallAverage::Micro => Average::Micro,
            OverallAverage::Macro => Average::Macro,
            OverallAverage::Weighted => Average::Weighted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn class(name: &str, precision: f32, support: usize) -> ClassMetrics {
        ClassMetrics {
            class: String::from(name),
            average: Average::None,
            precision,
            recall: precision,
            fscore: precision,
            support,
        }
    }

    fn build_reporter() -> Reporter {
        let mut reporter = Reporter::default();
        reporter.insert(ClassMetrics::new_overall(OverallAverage::Weighted, 0.5, 0.5, 0.5, 3));
        reporter.insert(class("PER", 1.0, 2));
        reporter.insert(ClassMetrics::new_overall(OverallAverage::Micro, 0.25, 0.5, 0.75, 3));
        reporter.insert(class("LOC", 0.0, 1));
        reporter
    }

    #[test]
    fn test_rows_order() {
        let reporter = build_reporter();
        let rows: Vec<&str> = reporter.classes.iter().map(|m| m.class.as_str()).collect();
        assert_eq!(rows, vec!["LOC", "PER", "Overall_Micro", "Overall_Weighted"]);
        let classes: Vec<&str> = reporter.classes().map(|m| m.class.as_str()).collect();
        assert_eq!(classes, vec!["LOC", "PER"]);
    }

    #[test]
    fn test_display() {
        let expected = "Class, Precision, Recall, Fscore, Support
LOC, 0, 0, 0, 1
PER, 1, 1, 1, 2
Overall_Micro, 0.25, 0.5, 0.75, 3
Overall_Weighted, 0.5, 0.5, 0.5, 3\n";
        assert_eq!(build_reporter().to_string(), expected);
    }

    #[test]
    fn test_lookups() {
        let reporter = build_reporter();
        assert_eq!(reporter.get("PER").unwrap().support, 2);
        assert!(reporter.get("Overall_Micro").is_none());
        assert_eq!(reporter.overall(OverallAverage::Micro).unwrap().precision, 0.25);
        assert!(reporter.overall(OverallAverage::Macro).is_none());
        let set: HashSet<ClassMetrics> = reporter.into();
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_insert_same_row_twice() {
        let mut reporter = Reporter::default();
        assert!(reporter.insert(class("PER", 1.0, 2)));
        assert!(!reporter.insert(class("PER", 0.0, 2)));
    }

    #[rstest]
    #[case("micro", Ok(Average::Micro))]
    #[case("Macro", Ok(Average::Macro))]
    #[case("WEIGHTED", Ok(Average::Weighted))]
    #[case("none", Ok(Average::None))]
    #[case("samples", Err(AverageParsingError(String::from("samples"))))]
    fn test_average_from_str(
        #[case] input: &str,
        #[case] expected: Result<Average, AverageParsingError>,
    ) {
        assert_eq!(input.parse::<Average>(), expected);
    }
}
