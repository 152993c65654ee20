//! Bridge between a sub-word tokenizer and the label aligner.
//!
//! The tokenizer is consumed through the [`SubwordTokenizer`] trait. It is implemented for the
//! Hugging Face [`tokenizers::Tokenizer`], which receives the sentences already split into words.

use crate::align::{align_labels_with_tokens, AlignError};
use crate::corpus::Corpus;
use crate::labels::LabelSet;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::Display;
use std::path::Path;
use tokenizers::{PaddingParams, Tokenizer, TruncationParams};

/// Token string of the padding positions of a `TokenizedBatch`.
pub const PAD_TOKEN: &str = "[PAD]";

/// Output of the tokenizer for a single sentence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubwordEncoding {
    /// Token ids, including special tokens.
    pub ids: Vec<u32>,
    /// Token strings, aligned with `ids`.
    pub tokens: Vec<String>,
    /// Index of the word of every token. `None` for special and padding tokens.
    pub word_ids: Vec<Option<usize>>,
    /// `1` for real tokens and `0` for padding.
    pub attention_mask: Vec<u32>,
}

impl SubwordEncoding {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug)]
/// Errors raised while tokenizing and aligning a corpus.
pub enum TokenizeError {
    /// Error raised by the tokenizer itself
    Tokenizer(String),
    Align(AlignError),
    /// The tokenizer did not return one encoding per sentence, or an encoding has fields of
    /// different lengths. Contains the expected and the actual length.
    InconsistentLength(usize, usize),
}

impl Display for TokenizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tokenizer(msg) => write!(f, "Tokenizer error: {}", msg),
            Self::Align(err) => Display::fmt(err, f),
            Self::InconsistentLength(expected, actual) => write!(
                f,
                "Inconsistent length in the tokenizer output. Expected {}, got {}",
                expected, actual
            ),
        }
    }
}

impl Error for TokenizeError {}

impl From<AlignError> for TokenizeError {
    fn from(value: AlignError) -> Self {
        Self::Align(value)
    }
}

impl From<tokenizers::Error> for TokenizeError {
    fn from(value: tokenizers::Error) -> Self {
        Self::Tokenizer(value.to_string())
    }
}

/// A tokenizer splitting words into sub-word tokens and remembering the word of every token.
pub trait SubwordTokenizer {
    /// Tokenizes a batch of sentences already split into words. Special tokens are added.
    fn encode_words(&self, batch: &[Vec<String>]) -> Result<Vec<SubwordEncoding>, TokenizeError>;
}

impl SubwordTokenizer for Tokenizer {
    fn encode_words(&self, batch: &[Vec<String>]) -> Result<Vec<SubwordEncoding>, TokenizeError> {
        let encodings = self.encode_batch(batch.to_vec(), true)?;
        Ok(encodings
            .into_iter()
            .map(|encoding| SubwordEncoding {
                ids: encoding.get_ids().to_vec(),
                tokens: encoding.get_tokens().to_vec(),
                word_ids: encoding
                    .get_word_ids()
                    .iter()
                    .map(|w| w.map(|w| w as usize))
                    .collect(),
                attention_mask: encoding.get_attention_mask().to_vec(),
            })
            .collect())
    }
}

/// Parameters used when loading a `tokenizer.json` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizerConfig {
    /// Sequences longer than this are truncated.
    pub max_length: usize,
    /// Pads every batch to its longest sequence.
    pub pad_to_longest: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            max_length: 512,
            pad_to_longest: true,
        }
    }
}

/// Loads a Hugging Face tokenizer and enables truncation and padding.
pub fn load_tokenizer<P: AsRef<Path>>(
    path: P,
    config: &TokenizerConfig,
) -> Result<Tokenizer, TokenizeError> {
    let mut tokenizer = Tokenizer::from_file(path.as_ref())?;
    tokenizer.with_truncation(Some(TruncationParams {
        max_length: config.max_length,
        ..Default::default()
    }))?;
    if config.pad_to_longest {
        tokenizer.with_padding(Some(PaddingParams::default()));
    }
    log::info!(
        "Loaded tokenizer from {} (max length {})",
        path.as_ref().display(),
        config.max_length
    );
    Ok(tokenizer)
}

/// Tokenized batch with labels aligned on the sub-word tokens. Every row is a sentence and the
/// rows are padded to the longest sentence of the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenizedBatch {
    pub input_ids: Array2<u32>,
    pub attention_mask: Array2<u32>,
    pub labels: Array2<i64>,
    /// Padded with `None`.
    pub word_ids: Vec<Vec<Option<usize>>>,
    /// Padded with `PAD_TOKEN`.
    pub tokens: Vec<Vec<String>>,
}

impl TokenizedBatch {
    /// Number of sentences.
    pub fn len(&self) -> usize {
        self.word_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.word_ids.is_empty()
    }

    /// Word-id map of the sentence at index `i`.
    pub fn word_ids(&self, i: usize) -> Option<&[Option<usize>]> {
        self.word_ids.get(i).map(Vec::as_slice)
    }
}

/// Pads a vector to ensure it has at least `target_len` elements, using `pad_value`.
#[inline(always)]
fn pad_vec<T: Clone>(vec: &[T], pad_value: T, target_len: usize) -> Vec<T> {
    let mut padded = vec.to_owned();
    if padded.len() < target_len {
        padded.resize(target_len, pad_value);
    }
    padded
}

/// Stacks rows of equal length into an array.
fn to_batched_array<T: Clone>(
    rows: Vec<Vec<T>>,
    width: usize,
) -> Result<Array2<T>, TokenizeError> {
    let height = rows.len();
    let flat: Vec<T> = rows.into_iter().flatten().collect();
    let actual = flat.len();
    Array2::from_shape_vec((height, width), flat)
        .map_err(|_| TokenizeError::InconsistentLength(height * width, actual))
}

/// Tokenizes every sentence of the corpus and aligns its labels on the produced tokens.
///
/// * `corpus`: Sentences and label ids.
/// * `tokenizer`: Any `SubwordTokenizer`.
/// * `labels`: Label set used to find the continuation labels.
/// * `ignore_index`: Label of special and padding tokens, usually `IGNORE_INDEX`.
pub fn tokenize_and_align_labels<T: SubwordTokenizer + ?Sized>(
    corpus: &Corpus,
    tokenizer: &T,
    labels: &LabelSet,
    ignore_index: i64,
) -> Result<TokenizedBatch, TokenizeError> {
    let encodings = tokenizer.encode_words(&corpus.tokens)?;
    if encodings.len() != corpus.len() {
        return Err(TokenizeError::InconsistentLength(
            corpus.len(),
            encodings.len(),
        ));
    }
    let width = encodings.iter().map(SubwordEncoding::len).max().unwrap_or(0);
    let height = encodings.len();
    let (mut id_rows, mut mask_rows, mut label_rows) = (
        Vec::with_capacity(height),
        Vec::with_capacity(height),
        Vec::with_capacity(height),
    );
    let mut word_ids = Vec::with_capacity(height);
    let mut tokens = Vec::with_capacity(height);

    for (encoding, word_labels) in encodings.into_iter().zip(corpus.label.iter()) {
        let seq_len = encoding.len();
        for field_len in [
            encoding.tokens.len(),
            encoding.word_ids.len(),
            encoding.attention_mask.len(),
        ] {
            if field_len != seq_len {
                return Err(TokenizeError::InconsistentLength(seq_len, field_len));
            }
        }
        let aligned =
            align_labels_with_tokens(word_labels, &encoding.word_ids, labels, ignore_index)?;
        id_rows.push(pad_vec(&encoding.ids, 0, width));
        mask_rows.push(pad_vec(&encoding.attention_mask, 0, width));
        label_rows.push(pad_vec(&aligned, ignore_index, width));
        word_ids.push(pad_vec(&encoding.word_ids, None, width));
        tokens.push(pad_vec(&encoding.tokens, String::from(PAD_TOKEN), width));
    }
    log::debug!(
        "Tokenized {} sentences into a batch of width {}",
        height,
        width
    );
    Ok(TokenizedBatch {
        input_ids: to_batched_array(id_rows, width)?,
        attention_mask: to_batched_array(mask_rows, width)?,
        labels: to_batched_array(label_rows, width)?,
        word_ids,
        tokens,
    })
}
