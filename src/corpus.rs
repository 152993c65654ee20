/**
This module reads annotated corpora in the CoNLL style: one `token label` pair per line and a blank
line between sentences. Malformed lines are reported and skipped.
*/
use crate::labels::{LabelError, LabelSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

#[derive(Debug)]
/// Errors raised while reading or encoding a corpus.
pub enum CorpusError {
    Io(io::Error),
    /// A label of the corpus is not part of the label set. Contains the sentence index, the
    /// token index and the underlying error.
    Label(usize, usize, LabelError),
}

impl Display for CorpusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "Could not read the corpus: {}", err),
            Self::Label(sentence, token, err) => write!(
                f,
                "Invalid label for token {} of sentence {}: {}",
                token, sentence, err
            ),
        }
    }
}

impl Error for CorpusError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Label(_, _, err) => Some(err),
        }
    }
}

impl From<io::Error> for CorpusError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Corpus as read from disk. It acts as a table with two columns: `tokens` and `label`. Every row
/// is a sentence and both columns of a row have the same length.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CorpusFrame {
    pub tokens: Vec<Vec<String>>,
    pub label: Vec<Vec<String>>,
}

/// Accumulates the pairs of the sentence being read.
#[derive(Default)]
struct PendingSentence {
    tokens: Vec<String>,
    labels: Vec<String>,
}

impl PendingSentence {
    fn flush_into(&mut self, frame: &mut CorpusFrame) {
        if self.labels.is_empty() {
            return;
        }
        frame.tokens.push(std::mem::take(&mut self.tokens));
        frame.label.push(std::mem::take(&mut self.labels));
    }
}

impl CorpusFrame {
    /// Reads a corpus file.
    ///
    /// * `path`: Path to a UTF-8 file with one `token label` pair per line.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CorpusError> {
        let file = File::open(path.as_ref())?;
        let frame = Self::from_reader(BufReader::new(file))?;
        log::debug!(
            "Read {} sentences from {}",
            frame.len(),
            path.as_ref().display()
        );
        Ok(frame)
    }

    /// Reads a corpus from any buffered reader. A sentence that is not followed by a blank line
    /// at the end of the input is kept.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, CorpusError> {
        let mut frame = CorpusFrame::default();
        let mut pending = PendingSentence::default();
        for (line_number, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                pending.flush_into(&mut frame);
                continue;
            }
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next(), fields.next()) {
                (Some(token), Some(label), None) => {
                    pending.tokens.push(String::from(token));
                    pending.labels.push(String::from(label));
                }
                _ => log::warn!(
                    "Couldn't split line {} to token and label: {:?}",
                    line_number + 1,
                    line
                ),
            }
        }
        pending.flush_into(&mut frame);
        Ok(frame)
    }

    /// Number of sentences.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The sorted unique label names found in the corpus.
    pub fn label_names(&self) -> Vec<&str> {
        let names: BTreeSet<&str> = self.label.iter().flatten().map(String::as_str).collect();
        names.into_iter().collect()
    }

    /// Converts the label names into label ids.
    pub fn encode(self, labels: &LabelSet) -> Result<Corpus, CorpusError> {
        let label = self
            .label
            .iter()
            .enumerate()
            .map(|(sentence, names)| {
                names
                    .iter()
                    .enumerate()
                    .map(|(token, name)| {
                        labels
                            .id(name)
                            .map_err(|err| CorpusError::Label(sentence, token, err))
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Corpus {
            tokens: self.tokens,
            label,
        })
    }
}

/// A sentence of a `Corpus`: its words and the id of the label of every word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentence<'a> {
    pub tokens: &'a [String],
    pub labels: &'a [usize],
}

/// Corpus whose labels were converted into label ids. Like the `CorpusFrame`, it acts as a table
/// with the columns `tokens` and `label`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Corpus {
    pub tokens: Vec<Vec<String>>,
    pub label: Vec<Vec<usize>>,
}

impl Corpus {
    /// Reads a corpus file and converts its labels into ids.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use nerprep::{Corpus, LabelSet};
    ///
    /// let corpus = Corpus::load("data/train.txt", &LabelSet::conll2003()).unwrap();
    /// for sentence in corpus.sentences() {
    ///     assert_eq!(sentence.tokens.len(), sentence.labels.len());
    /// }
    /// ```
    pub fn load<P: AsRef<Path>>(path: P, labels: &LabelSet) -> Result<Self, CorpusError> {
        CorpusFrame::from_path(path)?.encode(labels)
    }

    pub fn sentences(&self) -> impl Iterator<Item = Sentence<'_>> {
        self.tokens
            .iter()
            .zip(self.label.iter())
            .map(|(tokens, labels)| Sentence { tokens, labels })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::{Cursor, Write};

    fn words(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| String::from(*s)).collect()
    }

    #[test]
    fn test_read_two_sentences() {
        let content = "Tom B-PER\nlikes O\n\nMary B-PER\n\n";
        let frame = CorpusFrame::from_reader(Cursor::new(content)).unwrap();
        assert_eq!(
            frame.tokens,
            vec![words(&["Tom", "likes"]), words(&["Mary"])]
        );
        assert_eq!(
            frame.label,
            vec![words(&["B-PER", "O"]), words(&["B-PER"])]
        );
        let corpus = frame.encode(&LabelSet::conll2003()).unwrap();
        assert_eq!(corpus.label, vec![vec![1, 0], vec![1]]);
    }

    #[rstest]
    #[case("Tom B-PER\nlikes O", 1)]
    #[case("Tom B-PER\n\n\n\nMary B-PER", 2)]
    #[case("\n\n", 0)]
    #[case("", 0)]
    #[case("Tom B-PER\r\n   \r\nMary B-PER\r\n", 2)]
    fn test_sentence_boundaries(#[case] content: &str, #[case] n_sentences: usize) {
        let frame = CorpusFrame::from_reader(Cursor::new(content)).unwrap();
        assert_eq!(frame.len(), n_sentences);
        for (tokens, labels) in frame.tokens.iter().zip(frame.label.iter()) {
            assert!(!tokens.is_empty());
            assert_eq!(tokens.len(), labels.len());
        }
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let content = "Tom B-PER\nNew York B-LOC\nlonely\n\tlikes\tO\n\n";
        let frame = CorpusFrame::from_reader(Cursor::new(content)).unwrap();
        assert_eq!(frame.tokens, vec![words(&["Tom", "likes"])]);
        assert_eq!(frame.label, vec![words(&["B-PER", "O"])]);
    }

    #[test]
    fn test_unknown_label() {
        let frame = CorpusFrame::from_reader(Cursor::new("Tom B-PER\nMonday B-DATE\n")).unwrap();
        let err = frame.encode(&LabelSet::conll2003()).unwrap_err();
        assert!(matches!(
            err,
            CorpusError::Label(0, 1, LabelError::UnknownName(ref name)) if name == "B-DATE"
        ));
    }

    #[test]
    fn test_label_names() {
        let frame =
            CorpusFrame::from_reader(Cursor::new("a O\nb B-LOC\n\nc I-LOC\nd O\n")).unwrap();
        assert_eq!(frame.label_names(), vec!["B-LOC", "I-LOC", "O"]);
        let labels = LabelSet::new(frame.label_names()).unwrap();
        assert_eq!(labels.continuation_id(0).unwrap(), 1);
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "EU B-ORG\nrejects O\nGerman B-MISC\ncall O\n\nPeter B-PER\nBlackburn I-PER\n").unwrap();
        let corpus = Corpus::load(file.path(), &LabelSet::conll2003()).unwrap();
        assert_eq!(corpus.len(), 2);
        let sentences: Vec<Sentence> = corpus.sentences().collect();
        assert_eq!(sentences[0].labels, &[3, 0, 7, 0]);
        assert_eq!(sentences[1].tokens, &words(&["Peter", "Blackburn"])[..]);
        assert_eq!(sentences[1].labels, &[1, 2]);
    }

    #[test]
    fn test_missing_file() {
        let err = CorpusFrame::from_path("this/file/does/not/exist.txt").unwrap_err();
        assert!(matches!(err, CorpusError::Io(_)));
    }
}
