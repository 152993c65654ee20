/**
This module aligns word level labels with the sub-word tokens produced by a tokenizer. A tokenizer
maps every produced token to the index of the word it comes from, or to nothing for special and
padding tokens. The first token of a word keeps the label of the word, the following tokens of the
same word receive its continuation label (`B-X` becomes `I-X`) and tokens without a word receive
the ignore marker.
*/
use crate::labels::{LabelError, LabelSet};
use std::error::Error;
use std::fmt::Display;

/// Label given to the tokens that must not be scored, such as special and padding tokens.
pub const IGNORE_INDEX: i64 = -100;

/// Position of the cursor while walking a word-id map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum WordCursor {
    /// No word was seen yet, or the last token did not belong to a word
    #[default]
    Outside,
    /// The last token belonged to the word at this index
    InWord(usize),
}

/// What a single token is, relative to the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WordStep {
    /// Special or padding token
    Special,
    /// First token of the word at this index
    NewWord(usize),
    /// Token following another token of the same word
    ContinueWord(usize),
}

impl WordCursor {
    /// Consumes the next word id and returns the new cursor and the step it represents.
    pub(crate) fn advance(self, word_id: Option<usize>) -> (Self, WordStep) {
        match (self, word_id) {
            (_, None) => (Self::Outside, WordStep::Special),
            (Self::InWord(prev), Some(current)) if prev == current => {
                (self, WordStep::ContinueWord(current))
            }
            (_, Some(current)) => (Self::InWord(current), WordStep::NewWord(current)),
        }
    }
}

/// Iterator adaptor turning a word-id map into `WordStep`s.
pub(crate) struct WordSteps<I> {
    word_ids: I,
    cursor: WordCursor,
}

impl<I: Iterator<Item = Option<usize>>> Iterator for WordSteps<I> {
    type Item = WordStep;
    fn next(&mut self) -> Option<Self::Item> {
        let word_id = self.word_ids.next()?;
        let (cursor, step) = self.cursor.advance(word_id);
        self.cursor = cursor;
        Some(step)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.word_ids.size_hint()
    }
}

pub(crate) fn word_steps<I>(word_ids: I) -> WordSteps<I::IntoIter>
where
    I: IntoIterator<Item = Option<usize>>,
{
    WordSteps {
        word_ids: word_ids.into_iter(),
        cursor: WordCursor::default(),
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Errors raised while aligning labels.
pub enum AlignError {
    /// The tokenizer referenced a word that has no label. Contains the word index and the number
    /// of labels.
    WordOutOfRange(usize, usize),
    /// A word label is not part of the label set
    Label(LabelError),
    /// The batch of labels and the batch of word-id maps don't have the same length
    InconsistentLength(usize, usize),
}

impl Display for AlignError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WordOutOfRange(word, len) => write!(
                f,
                "Token refers to word {} but the sentence only has {} labels",
                word, len
            ),
            Self::Label(err) => Display::fmt(err, f),
            Self::InconsistentLength(labels, word_ids) => write!(
                f,
                "Inconsistent batch length. There are {} label sequences and {} word-id maps",
                labels, word_ids
            ),
        }
    }
}

impl Error for AlignError {}

impl From<LabelError> for AlignError {
    fn from(value: LabelError) -> Self {
        Self::Label(value)
    }
}

/// Converts a label id into the signed type of the aligned labels.
fn to_signed(id: usize, labels: &LabelSet) -> Result<i64, AlignError> {
    i64::try_from(id).map_err(|_| AlignError::Label(LabelError::UnknownId(id, labels.len())))
}

/// Aligns the labels of the words of a sentence with its sub-word tokens. The returned vector
/// has the same length as `word_ids`.
///
/// * `word_labels`: One label id per word.
/// * `word_ids`: For every token, the index of its word or `None` for special tokens.
/// * `labels`: Label set used to find the continuation labels.
/// * `ignore_index`: Label given to the special tokens, usually `IGNORE_INDEX`.
///
/// # Example
///
/// ```rust
/// use nerprep::{align_labels_with_tokens, LabelSet, IGNORE_INDEX};
///
/// let labels = LabelSet::conll2003();
/// // "Tom" is split in two tokens, "likes" is a single token.
/// let word_ids = [None, Some(0), Some(0), Some(1), None];
/// let aligned = align_labels_with_tokens(&[1, 0], &word_ids, &labels, IGNORE_INDEX).unwrap();
/// assert_eq!(aligned, vec![-100, 1, 2, 0, -100]);
/// ```
pub fn align_labels_with_tokens(
    word_labels: &[usize],
    word_ids: &[Option<usize>],
    labels: &LabelSet,
    ignore_index: i64,
) -> Result<Vec<i64>, AlignError> {
    let word_label = |word: usize| {
        word_labels
            .get(word)
            .copied()
            .ok_or(AlignError::WordOutOfRange(word, word_labels.len()))
    };
    word_steps(word_ids.iter().copied())
        .map(|step| match step {
            WordStep::Special => Ok(ignore_index),
            WordStep::NewWord(word) => {
                let label = word_label(word)?;
                // Validates the id even if it is kept as is
                labels.name(label)?;
                to_signed(label, labels)
            }
            WordStep::ContinueWord(word) => {
                let label = word_label(word)?;
                to_signed(labels.continuation_id(label)?, labels)
            }
        })
        .collect()
}

/// Aligns every sentence of a batch, preserving the batch order.
pub fn align_batch<L, W>(
    batch_labels: &[L],
    batch_word_ids: &[W],
    labels: &LabelSet,
    ignore_index: i64,
) -> Result<Vec<Vec<i64>>, AlignError>
where
    L: AsRef<[usize]>,
    W: AsRef<[Option<usize>]>,
{
    if batch_labels.len() != batch_word_ids.len() {
        return Err(AlignError::InconsistentLength(
            batch_labels.len(),
            batch_word_ids.len(),
        ));
    }
    let aligned = batch_labels
        .iter()
        .zip(batch_word_ids)
        .map(|(word_labels, word_ids)| {
            align_labels_with_tokens(word_labels.as_ref(), word_ids.as_ref(), labels, ignore_index)
        })
        .collect::<Result<Vec<_>, _>>()?;
    log::debug!("Aligned the labels of {} sentences", aligned.len());
    Ok(aligned)
}
