/**
Read-only, index addressable view over a table of texts and optional labels. The view can apply a
transformation to the text when a record is accessed.
*/
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::Display;
use std::io::Read;
use std::path::Path;

/// Label returned for the records of a table without a `label` column.
pub const NO_LABEL: i64 = -1;

#[derive(Debug)]
/// Errors raised by the dataset view and its table.
pub enum DatasetError {
    /// Index out of bounds. Contains the index and the length of the dataset.
    OutOfBounds(usize, usize),
    /// A required column is missing from the table
    MissingColumn(&'static str),
    /// The `label` column does not have one value per text. Contains both lengths.
    InconsistentLength(usize, usize),
    /// A label could not be parsed as an integer. Contains the row and the raw value.
    Parse(usize, String),
    Csv(csv::Error),
}

impl Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfBounds(index, len) => write!(
                f,
                "Index {} is out of bounds for a dataset of length {}",
                index, len
            ),
            Self::MissingColumn(column) => write!(f, "Missing required column `{}`", column),
            Self::InconsistentLength(texts, labels) => write!(
                f,
                "The table has {} texts but {} labels",
                texts, labels
            ),
            Self::Parse(row, value) => {
                write!(f, "Could not parse the label {:?} of row {}", value, row)
            }
            Self::Csv(err) => write!(f, "Could not read the table: {}", err),
        }
    }
}

impl Error for DatasetError {}

impl From<csv::Error> for DatasetError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

/// A table with a required `text` column and an optional `label` column. The `label` column,
/// when present, has one value per text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "TextColumns")]
pub struct TextFrame {
    text: Vec<String>,
    label: Option<Vec<i64>>,
}

/// Unchecked columns of a deserialized `TextFrame`.
#[derive(Deserialize)]
struct TextColumns {
    text: Vec<String>,
    #[serde(default)]
    label: Option<Vec<i64>>,
}

impl TryFrom<TextColumns> for TextFrame {
    type Error = DatasetError;
    fn try_from(value: TextColumns) -> Result<Self, Self::Error> {
        Self::new(value.text, value.label)
    }
}

impl TextFrame {
    pub fn new(text: Vec<String>, label: Option<Vec<i64>>) -> Result<Self, DatasetError> {
        if let Some(labels) = &label {
            if labels.len() != text.len() {
                return Err(DatasetError::InconsistentLength(text.len(), labels.len()));
            }
        }
        Ok(Self { text, label })
    }

    /// Reads a CSV file with a header row.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let reader = csv::Reader::from_path(path)?;
        Self::from_csv(reader)
    }

    /// Reads CSV content with a header row from any reader.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        Self::from_csv(csv::Reader::from_reader(reader))
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, DatasetError> {
        let headers = reader.headers()?.clone();
        let text_column = headers
            .iter()
            .position(|h| h == "text")
            .ok_or(DatasetError::MissingColumn("text"))?;
        let label_column = headers.iter().position(|h| h == "label");

        let mut text = Vec::new();
        let mut label = label_column.map(|_| Vec::new());
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            text.push(String::from(record.get(text_column).unwrap_or_default()));
            if let (Some(column), Some(labels)) = (label_column, label.as_mut()) {
                let raw = record.get(column).unwrap_or_default();
                let value = raw
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| DatasetError::Parse(row, String::from(raw)))?;
                labels.push(value);
            }
        }
        log::debug!(
            "Read a table of {} rows (label column: {})",
            text.len(),
            label.is_some()
        );
        Self::new(text, label)
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn has_labels(&self) -> bool {
        self.label.is_some()
    }
}

/// A record of the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRecord {
    pub text: String,
    /// `NO_LABEL` when the table has no `label` column.
    pub label: i64,
}

type Transform = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Read-only view over a `TextFrame`.
///
/// # Example
///
/// ```rust
/// use nerprep::{TextDataset, TextFrame};
///
/// let frame = TextFrame::new(vec![String::from("Hello")], None).unwrap();
/// let dataset = TextDataset::new(frame).with_transform(|t| t.to_lowercase());
/// let record = dataset.get(0).unwrap();
/// assert_eq!(record.text, "hello");
/// assert_eq!(record.label, -1);
/// assert!(dataset.get(1).is_err());
/// ```
pub struct TextDataset {
    frame: TextFrame,
    transform: Option<Transform>,
}

impl TextDataset {
    pub fn new(frame: TextFrame) -> Self {
        Self {
            frame,
            transform: None,
        }
    }

    /// Sets the function applied to the text of every accessed record.
    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.transform = Some(Box::new(transform));
        self
    }

    pub fn len(&self) -> usize {
        self.frame.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<TextRecord, DatasetError> {
        let text = self
            .frame
            .text
            .get(index)
            .ok_or(DatasetError::OutOfBounds(index, self.len()))?;
        let label = match &self.frame.label {
            Some(labels) => *labels
                .get(index)
                .ok_or(DatasetError::InconsistentLength(self.len(), labels.len()))?,
            None => NO_LABEL,
        };
        Ok(self.record(text, label))
    }

    /// Every record of the dataset, in order.
    pub fn iter(&self) -> impl Iterator<Item = TextRecord> + '_ {
        let labels = self
            .frame
            .label
            .iter()
            .flatten()
            .copied()
            .chain(std::iter::repeat(NO_LABEL));
        self.frame
            .text
            .iter()
            .zip(labels)
            .map(move |(text, label)| self.record(text, label))
    }

    fn record(&self, text: &str, label: i64) -> TextRecord {
        let text = match &self.transform {
            Some(transform) => transform(text),
            None => String::from(text),
        };
        TextRecord { text, label }
    }
}

impl std::fmt::Debug for TextDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextDataset")
            .field("frame", &self.frame)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}
