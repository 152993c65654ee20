/**
This module computes the span level metrics (precision, recall, f-score, support) of true and
predicted label sequences, the token accuracy, and reduces the logits of a token classification
model into those metrics.
*/
use crate::config::SeqEvalConfig;
use crate::entity::{get_entities_lenient, Entities};
use crate::labels::{LabelError, LabelSet, ParsingError};
use crate::reporter::{Average, ClassMetrics, OverallAverage, Reporter};
use ahash::{AHashMap, AHashSet};
use itertools::multizip;
use ndarray::{prelude::*, Zip};
use ndarray_stats::{
    errors::{MinMaxError, MultiInputError},
    QuantileExt, SummaryStatisticsExt,
};
use num::{Float, Num};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{self, Debug, Display};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
/// How do we handle cases with a division by zero? Do we replace the result by 1, return an error,
/// or replace the result by 0? SeqEval uses by default the `ReplaceBy0` strategy. The
/// `ReturnError` strategy stops the computation and is only useful if you believe there should be
/// no 0 in the denominator.
pub enum DivByZeroStrat {
    /// The result of a division by zero is `1`
    ReplaceBy1,
    /// Returns an error
    ReturnError,
    /// The result of a division by zero is `0`
    #[default]
    ReplaceBy0,
}

#[derive(Debug)]
pub struct ParsingDivisionByZeroStrategyError<S: Debug + Display>(S);

impl<S: Debug + Display> Display for ParsingDivisionByZeroStrategyError<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Could not parse the {} into a a `DivisionByZeroStrategy`",
            self.0
        )
    }
}
impl<S: Debug + Display> Error for ParsingDivisionByZeroStrategyError<S> {}

impl FromStr for DivByZeroStrat {
    type Err = ParsingDivisionByZeroStrategyError<String>;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_ref() {
            "replaceby1" | "replacebyone" | "1" => Ok(DivByZeroStrat::ReplaceBy1),
            "replaceby0" | "replacebyzero" | "0" | "warn" => Ok(DivByZeroStrat::ReplaceBy0),
            "returnerror" | "error" => Ok(DivByZeroStrat::ReturnError),
            _ => Err(ParsingDivisionByZeroStrategyError(String::from(s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DivisionByZeroError;

impl Display for DivisionByZeroError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Encountered division by zero")
    }
}

impl Error for DivisionByZeroError {}

/// Divides `numerator` by `denominator` element-wise and applies the `zero_division` strategy
/// where the denominator is zero.
fn prf_divide<I, D>(
    numerator: ArrayView<I, D>,
    denominator: ArrayView<I, D>,
    parallel: bool,
    zero_division: DivByZeroStrat,
) -> Result<Array<I, D>, DivisionByZeroError>
where
    I: Num + Copy + Send + Sync,
    D: Dimension,
{
    let (mut result, zero_mask) = if parallel {
        par_prf_divide_results_and_mask(numerator, denominator)
    } else {
        prf_divide_results_and_mask(numerator, denominator)
    };
    let has_zero = zero_mask.iter().any(|m| *m == I::zero());
    match zero_division {
        DivByZeroStrat::ReturnError if has_zero => Err(DivisionByZeroError),
        DivByZeroStrat::ReplaceBy1 => {
            let fill = |r: &mut I, m: &I| {
                if *m == I::zero() {
                    *r = I::one()
                }
            };
            if parallel {
                Zip::from(&mut result).and(&zero_mask).par_for_each(fill);
            } else {
                Zip::from(&mut result).and(&zero_mask).for_each(fill);
            }
            Ok(result)
        }
        _ => Ok(result * zero_mask),
    }
}

/// This function computes the result in parallel. For a synchronous version of this function,
/// see `prf_divide_results_and_mask`. The mask holds `0` where the denominator is zero and `1`
/// elsewhere.
fn par_prf_divide_results_and_mask<I, D>(
    numerator: ArrayView<I, D>,
    denominator: ArrayView<I, D>,
) -> (Array<I, D>, Array<I, D>)
where
    I: Num + Copy + Send + Sync,
    D: Dimension,
{
    let zero_at_mask = Zip::from(&denominator).par_map_collect(|d| {
        if *d == I::zero() {
            I::zero()
        } else {
            I::one()
        }
    });
    let mut safe_denominator = denominator.to_owned();
    safe_denominator.par_mapv_inplace(|v| if v == I::zero() { I::one() } else { v });
    (&numerator / &safe_denominator, zero_at_mask)
}

/// This function computes the result synchronously. For a parallel version of this function, see
/// `par_prf_divide_results_and_mask`.
fn prf_divide_results_and_mask<I, D>(
    numerator: ArrayView<I, D>,
    denominator: ArrayView<I, D>,
) -> (Array<I, D>, Array<I, D>)
where
    I: Num + Copy,
    D: Dimension,
{
    let zero_at_mask = denominator.mapv(|d| if d == I::zero() { I::zero() } else { I::one() });
    let safe_denominator = denominator.mapv(|v| if v == I::zero() { I::one() } else { v });
    (&numerator / &safe_denominator, zero_at_mask)
}

#[derive(Debug, PartialEq, Clone, Copy)]
/// Error type to represent when two lists or arrays are not of the same length (when they should
/// be).
pub struct InconsistentLengthError(usize, usize);

impl Display for InconsistentLengthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Inconsistent length between two lists. `y_true` is length {}, `y_pred` is length {}",
            self.0, self.1
        )
    }
}
impl Error for InconsistentLengthError {}

fn check_consistent_length<T>(
    y_true: &[Vec<T>],
    y_pred: &[Vec<T>],
) -> Result<(), InconsistentLengthError> {
    if y_true.len() != y_pred.len() {
        return Err(InconsistentLengthError(y_true.len(), y_pred.len()));
    }
    for (t, p) in y_true.iter().zip(y_pred) {
        if t.len() != p.len() {
            return Err(InconsistentLengthError(t.len(), p.len()));
        }
    }
    Ok(())
}

fn check_for_empty_input<T>(y_true: &[Vec<T>]) -> Result<(), ComputationError> {
    if y_true.iter().all(Vec::is_empty) {
        return Err(ComputationError::EmptyInput(String::from("y_true")));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
/// Enum error encompassing the failures that could happen when computing the metrics.
pub enum ComputationError {
    InconsistentLength(InconsistentLengthError),
    /// The logits and the labels don't cover the same `(sentence, token)` grid. Contains the
    /// shape of the logits and the shape of the labels.
    InconsistentShape((usize, usize), (usize, usize)),
    EmptyInput(String),
    Parsing(ParsingError<String>),
    Label(LabelError),
    DivisionByZero(DivisionByZeroError),
    /// No maximum logit could be found, because the class axis is empty or holds a NaN
    Argmax(MinMaxError),
    InputError(MultiInputError),
    /// The metric did not return the given key
    MissingKey(String),
}

impl Display for ComputationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InconsistentLength(length_err) => Display::fmt(length_err, f),
            Self::InconsistentShape(logits, labels) => write!(
                f,
                "Inconsistent shapes. The logits cover {:?} (sentence, token) positions and the labels {:?}",
                logits, labels
            ),
            Self::EmptyInput(which) => write!(f, "Received an empty input {}", which),
            Self::Parsing(err) => Display::fmt(err, f),
            Self::Label(err) => Display::fmt(err, f),
            Self::DivisionByZero(div_err) => Display::fmt(div_err, f),
            Self::Argmax(err) => write!(f, "Could not find the predicted label: {}", err),
            Self::InputError(input_err) => Display::fmt(input_err, f),
            Self::MissingKey(key) => write!(f, "The metric did not return the key {}", key),
        }
    }
}
impl Error for ComputationError {}

impl From<ParsingError<String>> for ComputationError {
    fn from(value: ParsingError<String>) -> Self {
        Self::Parsing(value)
    }
}

impl From<LabelError> for ComputationError {
    fn from(value: LabelError) -> Self {
        Self::Label(value)
    }
}

impl From<InconsistentLengthError> for ComputationError {
    fn from(value: InconsistentLengthError) -> Self {
        Self::InconsistentLength(value)
    }
}

impl From<DivisionByZeroError> for ComputationError {
    fn from(value: DivisionByZeroError) -> Self {
        Self::DivisionByZero(value)
    }
}

impl From<MinMaxError> for ComputationError {
    fn from(value: MinMaxError) -> Self {
        Self::Argmax(value)
    }
}

impl From<MultiInputError> for ComputationError {
    fn from(value: MultiInputError) -> Self {
        Self::InputError(value)
    }
}

/// Type alias for representing the output of the `precision_recall_fscore_support`. The first
/// array contains the precision, the second the recall, the third the f-score and the last one
/// the support.
pub type PrecisionRecallFScoreTrueSum = (Array1<f32>, Array1<f32>, Array1<f32>, Array1<usize>);

/// Predicted sum, true positive sum and true sum of every class, the classes being sorted by name.
struct ClassCounts {
    names: Vec<String>,
    pred_sum: Array1<usize>,
    tp_sum: Array1<usize>,
    true_sum: Array1<usize>,
}

impl ClassCounts {
    fn total(&self) -> ClassCounts {
        ClassCounts {
            names: vec![],
            pred_sum: array![self.pred_sum.sum()],
            tp_sum: array![self.tp_sum.sum()],
            true_sum: array![self.true_sum.sum()],
        }
    }
}

type EntitiesByClass<'b> = AHashMap<&'b str, AHashSet<(usize, usize, usize)>>;

fn group_by_class<'b>(entities: &'b Entities<'_>) -> EntitiesByClass<'b> {
    let mut groups: EntitiesByClass<'b> = AHashMap::new();
    for e in entities.iter().flatten() {
        groups
            .entry(e.class.as_ref())
            .or_default()
            .insert((e.sequence, e.start, e.end));
    }
    groups
}

fn extract_tp_actual_correct(entities_true: &Entities, entities_pred: &Entities) -> ClassCounts {
    let entities_true_init = group_by_class(entities_true);
    let entities_pred_init = group_by_class(entities_pred);
    let target_names: BTreeSet<&str> = entities_true_init
        .keys()
        .chain(entities_pred_init.keys())
        .copied()
        .collect();
    let empty = AHashSet::default();
    let mut tp_sum = Vec::with_capacity(target_names.len());
    let mut pred_sum = Vec::with_capacity(target_names.len());
    let mut true_sum = Vec::with_capacity(target_names.len());
    for type_name in target_names.iter() {
        let entities_true_type = entities_true_init.get(type_name).unwrap_or(&empty);
        let entities_pred_type = entities_pred_init.get(type_name).unwrap_or(&empty);
        tp_sum.push(entities_true_type.intersection(entities_pred_type).count());
        pred_sum.push(entities_pred_type.len());
        true_sum.push(entities_true_type.len());
    }
    ClassCounts {
        names: target_names.into_iter().map(String::from).collect(),
        pred_sum: Array::from(pred_sum),
        tp_sum: Array::from(tp_sum),
        true_sum: Array::from(true_sum),
    }
}

fn per_class_scores(
    counts: &ClassCounts,
    beta: f32,
    config: &SeqEvalConfig,
) -> Result<PrecisionRecallFScoreTrueSum, ComputationError> {
    let tp_sum = counts.tp_sum.mapv(|x| x as f32);
    let pred_sum = counts.pred_sum.mapv(|x| x as f32);
    let true_sum = counts.true_sum.mapv(|x| x as f32);
    let precision = prf_divide(
        tp_sum.view(),
        pred_sum.view(),
        config.parallel,
        config.zero_division,
    )?;
    let recall = prf_divide(
        tp_sum.view(),
        true_sum.view(),
        config.parallel,
        config.zero_division,
    )?;
    let beta2 = beta.powi(2);
    let f_score = if beta2.is_infinite() && beta2.is_sign_positive() {
        recall.clone()
    } else {
        let denom = (beta2 * &precision + &recall).mapv(|v| if v == 0.0 { 1.0 } else { v });
        (beta2 + 1.0) * &precision * &recall / denom
    };
    Ok((precision, recall, f_score, counts.true_sum.clone()))
}

fn averaged_scores(
    counts: &ClassCounts,
    beta: f32,
    average: OverallAverage,
    config: &SeqEvalConfig,
) -> Result<(f32, f32, f32, usize), ComputationError> {
    let support = counts.true_sum.sum();
    match average {
        OverallAverage::Micro => {
            let (p, r, f, _) = per_class_scores(&counts.total(), beta, config)?;
            Ok((p[0], r[0], f[0], support))
        }
        OverallAverage::Macro => {
            let (p, r, f, _) = per_class_scores(counts, beta, config)?;
            Ok((
                p.mean().unwrap_or(0.0),
                r.mean().unwrap_or(0.0),
                f.mean().unwrap_or(0.0),
                support,
            ))
        }
        OverallAverage::Weighted => {
            if support == 0 {
                let zero_division_value = match config.zero_division {
                    DivByZeroStrat::ReturnError => {
                        return Err(ComputationError::DivisionByZero(DivisionByZeroError))
                    }
                    DivByZeroStrat::ReplaceBy0 => 0.0,
                    DivByZeroStrat::ReplaceBy1 => 1.0,
                };
                let no_prediction = counts.pred_sum.sum() == 0;
                let on_predictions = if no_prediction {
                    zero_division_value
                } else {
                    0.0
                };
                return Ok((on_predictions, zero_division_value, on_predictions, 0));
            }
            let (p, r, f, _) = per_class_scores(counts, beta, config)?;
            let weights = counts.true_sum.mapv(|x| x as f32);
            Ok((
                p.weighted_mean(&weights)?,
                r.weighted_mean(&weights)?,
                f.weighted_mean(&weights)?,
                support,
            ))
        }
    }
}

fn counts_of<S: AsRef<str>>(
    y_true: &[Vec<S>],
    y_pred: &[Vec<S>],
    config: &SeqEvalConfig,
) -> Result<ClassCounts, ComputationError> {
    check_consistent_length(y_true, y_pred)?;
    check_for_empty_input(y_true)?;
    let entities_true = get_entities_lenient(y_true, config.suffix, config.delimiter)?;
    let entities_pred = get_entities_lenient(y_pred, config.suffix, config.delimiter)?;
    Ok(extract_tp_actual_correct(&entities_true, &entities_pred))
}

/// Computes the precision, recall, fscore and support of the entities of the true and predicted
/// sequences. With `Average::None`, the arrays hold one value per class, the classes being sorted
/// by name. Any other average returns arrays of length 1.
///
/// * `y_true`: True labels
/// * `y_pred`: Predicted labels
/// * `beta`: Value of the `beta` parameter of the fscore. `beta=1` for F1 and `beta=0.5` for F0.5.
/// * `average`: What type of average to use.
/// * `config`: Division by zero strategy and label format.
pub fn precision_recall_fscore_support<S: AsRef<str>>(
    y_true: &[Vec<S>],
    y_pred: &[Vec<S>],
    beta: f32,
    average: Average,
    config: &SeqEvalConfig,
) -> Result<PrecisionRecallFScoreTrueSum, ComputationError> {
    let counts = counts_of(y_true, y_pred, config)?;
    let overall = match average {
        Average::None => return per_class_scores(&counts, beta, config),
        Average::Micro => OverallAverage::Micro,
        Average::Macro => OverallAverage::Macro,
        Average::Weighted => OverallAverage::Weighted,
    };
    let (p, r, f, s) = averaged_scores(&counts, beta, overall, config)?;
    Ok((array![p], array![r], array![f], array![s]))
}

/// Fraction of the labels that were predicted exactly, over all the sequences.
pub fn accuracy_score<S: AsRef<str>>(
    y_true: &[Vec<S>],
    y_pred: &[Vec<S>],
) -> Result<f32, ComputationError> {
    check_consistent_length(y_true, y_pred)?;
    check_for_empty_input(y_true)?;
    let (correct, total) = y_true
        .iter()
        .flatten()
        .zip(y_pred.iter().flatten())
        .fold((0usize, 0usize), |(correct, total), (t, p)| {
            (correct + usize::from(t.as_ref() == p.as_ref()), total + 1)
        });
    Ok(correct as f32 / total as f32)
}

/// Computes the metrics of every class and the micro, macro and weighted averages. The returned
/// structure can be used to prettyprint the results.
///
/// * `y_true`: True labels
/// * `y_pred`: Predicted labels
/// * `config`: Division by zero strategy and label format.
pub fn classification_report<S: AsRef<str>>(
    y_true: &[Vec<S>],
    y_pred: &[Vec<S>],
    config: &SeqEvalConfig,
) -> Result<Reporter, ComputationError> {
    let counts = counts_of(y_true, y_pred, config)?;
    let (p, r, f1, s) = per_class_scores(&counts, 1.0, config)?;
    let mut reporter = Reporter::default();
    for (name, precision, recall, fscore, support) in multizip((
        counts.names.iter(),
        p.into_iter(),
        r.into_iter(),
        f1.into_iter(),
        s.into_iter(),
    )) {
        reporter.insert(ClassMetrics {
            class: name.clone(),
            average: Average::None,
            precision,
            recall,
            fscore,
            support,
        });
    }
    for avg in [
        OverallAverage::Micro,
        OverallAverage::Macro,
        OverallAverage::Weighted,
    ] {
        let (p, r, f1, s) = averaged_scores(&counts, 1.0, avg, config)?;
        reporter.insert(ClassMetrics::new_overall(avg, p, r, f1, s));
    }
    Ok(reporter)
}

/// Key/value results of a sequence metric.
pub type MetricValues = BTreeMap<String, f32>;

pub const OVERALL_PRECISION: &str = "overall_precision";
pub const OVERALL_RECALL: &str = "overall_recall";
pub const OVERALL_F1: &str = "overall_f1";
pub const OVERALL_ACCURACY: &str = "overall_accuracy";

/// A span level sequence labeling metric. It receives one label sequence per sentence and must
/// return at least the keys `overall_precision`, `overall_recall`, `overall_f1` and
/// `overall_accuracy`.
pub trait SequenceMetric {
    fn compute(
        &self,
        predictions: &[Vec<String>],
        references: &[Vec<String>],
    ) -> Result<MetricValues, ComputationError>;
}

/// Span level metric computed over the entities of the sequences, in the lenient mode. Besides the
/// overall keys, it returns the keys `<class>.precision`, `<class>.recall`, `<class>.f1` and
/// `<class>.number` for every class.
///
/// # Example
///
/// ```rust
/// use nerprep::{SeqEval, SequenceMetric};
///
/// let to_vecs = |v: Vec<Vec<&str>>| -> Vec<Vec<String>> {
///     v.into_iter().map(|s| s.into_iter().map(String::from).collect()).collect()
/// };
/// let y_true = to_vecs(vec![vec!["B-PER", "I-PER", "O"], vec!["B-LOC", "O"]]);
/// let y_pred = to_vecs(vec![vec!["B-PER", "I-PER", "O"], vec!["O", "O"]]);
/// let values = SeqEval::default().compute(&y_pred, &y_true).unwrap();
/// assert_eq!(values["overall_precision"], 1.0);
/// assert_eq!(values["overall_recall"], 0.5);
/// assert_eq!(values["overall_accuracy"], 0.8);
/// assert_eq!(values["PER.number"], 1.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SeqEval {
    config: SeqEvalConfig,
}

impl SeqEval {
    pub fn new(config: SeqEvalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SeqEvalConfig {
        &self.config
    }
}

impl SequenceMetric for SeqEval {
    fn compute(
        &self,
        predictions: &[Vec<String>],
        references: &[Vec<String>],
    ) -> Result<MetricValues, ComputationError> {
        let counts = counts_of(references, predictions, &self.config)?;
        let (p, r, f1, s) = per_class_scores(&counts, 1.0, &self.config)?;
        let mut values = MetricValues::new();
        for (name, precision, recall, fscore, support) in
            multizip((counts.names.iter(), p, r, f1, s))
        {
            values.insert(format!("{}.precision", name), precision);
            values.insert(format!("{}.recall", name), recall);
            values.insert(format!("{}.f1", name), fscore);
            values.insert(format!("{}.number", name), support as f32);
        }
        let (p, r, f1, _) = averaged_scores(&counts, 1.0, OverallAverage::Micro, &self.config)?;
        values.insert(String::from(OVERALL_PRECISION), p);
        values.insert(String::from(OVERALL_RECALL), r);
        values.insert(String::from(OVERALL_F1), f1);
        values.insert(
            String::from(OVERALL_ACCURACY),
            accuracy_score(references, predictions)?,
        );
        Ok(values)
    }
}

/// The aggregated scores of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalMetrics {
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
    pub accuracy: f32,
}

impl EvalMetrics {
    /// Reads the overall keys of the values returned by a `SequenceMetric`.
    pub fn from_values(values: &MetricValues) -> Result<Self, ComputationError> {
        let get = |key: &str| {
            values
                .get(key)
                .copied()
                .ok_or_else(|| ComputationError::MissingKey(String::from(key)))
        };
        Ok(Self {
            precision: get(OVERALL_PRECISION)?,
            recall: get(OVERALL_RECALL)?,
            f1: get(OVERALL_F1)?,
            accuracy: get(OVERALL_ACCURACY)?,
        })
    }
}

/// The id of the label with the largest logit, for every row of `logits` (tokens x classes).
pub fn argmax_predictions<F: Float>(logits: ArrayView2<F>) -> Result<Vec<usize>, ComputationError> {
    logits
        .outer_iter()
        .map(|row| row.argmax().map_err(ComputationError::from))
        .collect()
}

/// Reduces the logits of a token classification model to the overall metrics.
///
/// The predicted label of every token is the one with the largest logit. The positions whose true
/// label is `ignore_index` are dropped from the true and the predicted sequences before they are
/// given to the metric.
///
/// * `logits`: Scores of shape (sentences, tokens, classes).
/// * `label_ids`: True label ids of shape (sentences, tokens).
/// * `labels`: Label set used to name the ids.
/// * `ignore_index`: Marker of the positions to drop, usually `IGNORE_INDEX`.
/// * `metric`: The span level metric, such as `SeqEval`.
///
/// # Example
///
/// ```rust
/// use ndarray::{array, Array3};
/// use nerprep::{compute_metrics, LabelSet, SeqEval, IGNORE_INDEX};
///
/// let labels = LabelSet::conll2003();
/// let mut logits = Array3::<f32>::zeros((1, 4, labels.len()));
/// // Predicts "O", "B-PER", "O", "O"
/// for (token, label) in [0, 1, 0, 0].into_iter().enumerate() {
///     logits[[0, token, label]] = 1.0;
/// }
/// let label_ids = array![[-100, 1, 2, -100]];
/// let metrics = compute_metrics(logits.view(), label_ids.view(), &labels, IGNORE_INDEX, &SeqEval::default()).unwrap();
/// assert_eq!(metrics.f1, 0.0);
/// assert_eq!(metrics.accuracy, 0.5);
/// ```
pub fn compute_metrics<F, M>(
    logits: ArrayView3<F>,
    label_ids: ArrayView2<i64>,
    labels: &LabelSet,
    ignore_index: i64,
    metric: &M,
) -> Result<EvalMetrics, ComputationError>
where
    F: Float,
    M: SequenceMetric + ?Sized,
{
    let (n_sentences, n_tokens, _) = logits.dim();
    if (n_sentences, n_tokens) != label_ids.dim() {
        return Err(ComputationError::InconsistentShape(
            (n_sentences, n_tokens),
            label_ids.dim(),
        ));
    }
    let mut references = Vec::with_capacity(n_sentences);
    let mut predictions = Vec::with_capacity(n_sentences);
    for (sentence_logits, sentence_labels) in logits.outer_iter().zip(label_ids.outer_iter()) {
        let mut true_names = Vec::new();
        let mut predicted_names = Vec::new();
        for (token_logits, true_id) in sentence_logits.outer_iter().zip(sentence_labels.iter()) {
            if *true_id == ignore_index {
                continue;
            }
            let predicted_id = token_logits.argmax()?;
            true_names.push(String::from(labels.name_of_signed(*true_id)?));
            predicted_names.push(String::from(labels.name(predicted_id)?));
        }
        references.push(true_names);
        predictions.push(predicted_names);
    }
    log::debug!(
        "Scoring {} tokens of {} sentences",
        references.iter().map(Vec::len).sum::<usize>(),
        references.len()
    );
    let values = metric.compute(&predictions, &references)?;
    EvalMetrics::from_values(&values)
}
