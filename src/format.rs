/**
This module turns the predictions of a model over the sub-word tokens of a text back into a per
word view: every word of the text is associated with its sub-word tokens and the label name
predicted for each of them.
*/
use crate::align::{word_steps, WordStep};
use crate::labels::{LabelError, LabelSet};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::error::Error;
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
/// Errors raised while formatting predictions.
pub enum FormatError {
    /// The sub-tokens, the predictions and the word-id map don't have the same length. Contains
    /// the three lengths.
    InconsistentLength(usize, usize, usize),
    /// The tokenizer referenced a word that is not in the text. Contains the word index and the
    /// number of words.
    WordOutOfRange(usize, usize),
    Label(LabelError),
}

impl Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InconsistentLength(tokens, predictions, word_ids) => write!(
                f,
                "Inconsistent length. There are {} tokens, {} predictions and {} word ids",
                tokens, predictions, word_ids
            ),
            Self::WordOutOfRange(word, len) => write!(
                f,
                "Token refers to word {} but the text only has {} words",
                word, len
            ),
            Self::Label(err) => Display::fmt(err, f),
        }
    }
}

impl Error for FormatError {}

impl From<LabelError> for FormatError {
    fn from(value: LabelError) -> Self {
        Self::Label(value)
    }
}

/// The sub-word tokens of a word and the label predicted for every one of them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WordPrediction {
    #[serde(rename = "Tokens")]
    pub tokens: Vec<String>,
    #[serde(rename = "Labels")]
    pub labels: Vec<String>,
}

/// Per word predictions, ordered by the first appearance of every word. Words are keyed by their
/// literal string: when the same string appears twice in a text, its entry holds the tokens of the
/// last occurrence and keeps the position of the first one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormattedResult {
    entries: Vec<(String, WordPrediction)>,
}

impl FormattedResult {
    pub fn get(&self, word: &str) -> Option<&WordPrediction> {
        self.entries.iter().find(|(w, _)| w == word).map(|(_, p)| p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &WordPrediction)> {
        self.entries.iter().map(|(w, p)| (w.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Starts a new entry for `word`, replacing the content of an existing one in place. Returns
    /// the position of the entry.
    fn open(mut self, word: &str) -> (Self, usize) {
        let position = match self.entries.iter().position(|(w, _)| w == word) {
            Some(position) => {
                self.entries[position].1 = WordPrediction::default();
                position
            }
            None => {
                self.entries
                    .push((String::from(word), WordPrediction::default()));
                self.entries.len() - 1
            }
        };
        (self, position)
    }

    fn push(mut self, position: usize, token: &str, label: &str) -> Self {
        let prediction = &mut self.entries[position].1;
        prediction.tokens.push(String::from(token));
        prediction.labels.push(String::from(label));
        self
    }
}

impl Serialize for FormattedResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (word, prediction) in &self.entries {
            map.serialize_entry(word, prediction)?;
        }
        map.end()
    }
}

/// Groups the sub-word tokens of a text and their predicted labels by word.
///
/// * `text`: The text given to the tokenizer. It is split on whitespace.
/// * `sub_tokens`: The tokens produced by the tokenizer, special tokens included.
/// * `predictions`: One predicted label id per token.
/// * `word_ids`: For every token, the index of its word or `None` for special tokens.
/// * `labels`: Label set used to name the predictions.
///
/// Special tokens are skipped and don't interrupt a word: a word split around a special token is
/// still a single entry.
///
/// # Example
///
/// ```rust
/// use nerprep::{format_result, LabelSet};
///
/// let tokens = ["[CLS]", "Tom", "lik", "##es", "[SEP]"];
/// let word_ids = [None, Some(0), Some(1), Some(1), None];
/// let result = format_result("Tom likes", &tokens, &[0, 1, 0, 0, 0], &word_ids, &LabelSet::conll2003()).unwrap();
/// let likes = result.get("likes").unwrap();
/// assert_eq!(likes.tokens, vec!["lik", "##es"]);
/// assert_eq!(likes.labels, vec!["O", "O"]);
/// assert_eq!(result.get("Tom").unwrap().labels, vec!["B-PER"]);
/// ```
pub fn format_result<T: AsRef<str>>(
    text: &str,
    sub_tokens: &[T],
    predictions: &[usize],
    word_ids: &[Option<usize>],
    labels: &LabelSet,
) -> Result<FormattedResult, FormatError> {
    if sub_tokens.len() != predictions.len() || predictions.len() != word_ids.len() {
        return Err(FormatError::InconsistentLength(
            sub_tokens.len(),
            predictions.len(),
            word_ids.len(),
        ));
    }
    let words: Vec<&str> = text.split_whitespace().collect();
    let kept: Vec<(&str, usize, usize)> = sub_tokens
        .iter()
        .zip(predictions)
        .zip(word_ids)
        .filter_map(|((token, prediction), word_id)| {
            word_id.map(|word| (token.as_ref(), *prediction, word))
        })
        .collect();
    let steps = word_steps(kept.iter().map(|(_, _, word)| Some(*word)));

    let (result, _) = kept.iter().zip(steps).try_fold(
        (FormattedResult::default(), 0usize),
        |(result, position), ((token, prediction, _), step)| {
            let (result, position) = match step {
                WordStep::NewWord(word) => {
                    let key = words
                        .get(word)
                        .ok_or(FormatError::WordOutOfRange(word, words.len()))?;
                    result.open(key)
                }
                WordStep::ContinueWord(_) | WordStep::Special => (result, position),
            };
            let label = labels.name(*prediction)?;
            Ok::<_, FormatError>((result.push(position, token, label), position))
        },
    )?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| String::from(*s)).collect()
    }

    #[test]
    fn test_format_simple_sentence() {
        let labels = LabelSet::conll2003();
        let tokens = ["[CLS]", "Angela", "Mer", "##kel", "visits", "Paris", "[SEP]"];
        let word_ids = [None, Some(0), Some(1), Some(1), Some(2), Some(3), None];
        let predictions = [0, 1, 2, 2, 0, 5, 0];
        let result =
            format_result("Angela Merkel visits Paris", &tokens, &predictions, &word_ids, &labels)
                .unwrap();
        let words: Vec<&str> = result.iter().map(|(w, _)| w).collect();
        assert_eq!(words, vec!["Angela", "Merkel", "visits", "Paris"]);
        assert_eq!(
            result.get("Merkel").unwrap(),
            &WordPrediction {
                tokens: names(&["Mer", "##kel"]),
                labels: names(&["I-PER", "I-PER"]),
            }
        );
        assert_eq!(result.get("Paris").unwrap().labels, names(&["B-LOC"]));
        assert!(result.get("[CLS]").is_none());
    }

    #[test]
    fn test_special_tokens_do_not_split_words() {
        let labels = LabelSet::conll2003();
        let tokens = ["Ber", "[UNK]", "##lin"];
        let word_ids = [Some(0), None, Some(0)];
        let result = format_result("Berlin", &tokens, &[5, 0, 6], &word_ids, &labels).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.get("Berlin").unwrap().tokens, names(&["Ber", "##lin"]));
        assert_eq!(result.get("Berlin").unwrap().labels, names(&["B-LOC", "I-LOC"]));
    }

    #[test]
    fn test_repeated_word_keeps_last_occurrence() {
        let labels = LabelSet::conll2003();
        let tokens = ["the", "cat", "the", "dog"];
        let word_ids = [Some(0), Some(1), Some(2), Some(3)];
        let result = format_result("the cat the dog", &tokens, &[0, 0, 7, 0], &word_ids, &labels)
            .unwrap();
        let words: Vec<&str> = result.iter().map(|(w, _)| w).collect();
        assert_eq!(words, vec!["the", "cat", "dog"]);
        assert_eq!(result.get("the").unwrap().labels, names(&["B-MISC"]));
    }

    #[rstest]
    #[case(&["a", "b"], &[0, 0], &[Some(0)])]
    #[case(&["a"], &[0, 0], &[Some(0)])]
    #[case(&["a", "b"], &[0], &[Some(0), Some(0)])]
    fn test_inconsistent_length(
        #[case] tokens: &[&str],
        #[case] predictions: &[usize],
        #[case] word_ids: &[Option<usize>],
    ) {
        let err =
            format_result("a", tokens, predictions, word_ids, &LabelSet::conll2003()).unwrap_err();
        assert!(matches!(err, FormatError::InconsistentLength(..)));
    }

    #[test]
    fn test_errors() {
        let labels = LabelSet::conll2003();
        assert_eq!(
            format_result("one", &["one", "two"], &[0, 0], &[Some(0), Some(1)], &labels),
            Err(FormatError::WordOutOfRange(1, 1))
        );
        assert_eq!(
            format_result("one", &["one"], &[11], &[Some(0)], &labels),
            Err(FormatError::Label(LabelError::UnknownId(11, 9)))
        );
    }

    #[test]
    fn test_empty_input() {
        let empty: [&str; 0] = [];
        let result = format_result("", &empty, &[], &[], &LabelSet::conll2003()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_serialize_as_object() {
        let labels = LabelSet::conll2003();
        let result = format_result(
            "Tom likes",
            &["[CLS]", "Tom", "likes", "[SEP]"],
            &[0, 1, 0, 0],
            &[None, Some(0), Some(1), None],
            &labels,
        )
        .unwrap();
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(
            json,
            r#"{"Tom":{"Tokens":["Tom"],"Labels":["B-PER"]},"likes":{"Tokens":["likes"],"Labels":["O"]}}"#
        );
    }
}
