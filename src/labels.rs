/**
This module holds the label scheme of a token classification model: the ordered list of label
names (the position of a name is its id), the parsing of every name into a prefix and a class,
and the conversion of a begin tag into its inside tag. The conversion is used when a single word
is split into many sub-word tokens.
*/
use ahash::AHashMap;
use enum_iterator::{all, Sequence};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::error::Error;
use std::fmt::{Debug, Display};

/// Label names of the CoNLL-2003 shared task, in the order used by most pretrained checkpoints.
pub const CONLL2003_LABELS: [&str; 9] = [
    "O", "B-PER", "I-PER", "B-ORG", "I-ORG", "B-LOC", "I-LOC", "B-MISC", "I-MISC",
];

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Sequence, Serialize, Deserialize)]
/// The prefix indicates where a token is located in a chunk. For example, `B` marks the beginning
/// of a chunk and `I` a token inside of it. All prefixes are a single ascii character.
pub enum Prefix {
    I,
    O,
    B,
    E,
    S,
    U,
    L,
}

impl TryFrom<char> for Prefix {
    type Error = ParsingError<String>;
    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            'I' => Ok(Self::I),
            'O' => Ok(Self::O),
            'B' => Ok(Self::B),
            'E' => Ok(Self::E),
            'S' => Ok(Self::S),
            'U' => Ok(Self::U),
            'L' => Ok(Self::L),
            _ => Err(ParsingError::PrefixError(String::from(value))),
        }
    }
}

impl Prefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            Prefix::I => "I",
            Prefix::O => "O",
            Prefix::B => "B",
            Prefix::E => "E",
            Prefix::S => "S",
            Prefix::U => "U",
            Prefix::L => "L",
        }
    }
}

impl Display for Prefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Could not parse the string into a `Tag`
pub enum ParsingError<S: AsRef<str>> {
    PrefixError(S),
    EmptyToken,
}

impl<S: AsRef<str>> Display for ParsingError<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PrefixError(s) => {
                let allowed: Vec<Prefix> = all::<Prefix>().collect();
                write!(
                    f,
                    "Could not parse the following string into a Prefix: {}. Allowed prefixes are {:?}",
                    s.as_ref(),
                    allowed
                )
            }
            Self::EmptyToken => {
                write!(f, "Received an empty string/&str")
            }
        }
    }
}
impl<S: AsRef<str> + Debug> Error for ParsingError<S> {}

/// A parsed label, such as `B-PER`. The prefix (`B`) gives the position inside of the chunk and the
/// class (`PER`) the kind of entity. The outside label `O` has the class `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag<'a> {
    prefix: Prefix,
    class: Cow<'a, str>,
}

impl<'a> Tag<'a> {
    /// Parses a label.
    ///
    /// * `token`: The label, such as `"B-PER"` or `"PER-B"` when `suffix` is `true`.
    /// * `suffix`: Marker indicating if the prefix is located at the end (`true`) or at the start
    ///   (`false`) of the label.
    /// * `delimiter`: Char separating the prefix from the class.
    pub fn parse<T: Into<Cow<'a, str>>>(
        token: T,
        suffix: bool,
        delimiter: char,
    ) -> Result<Self, ParsingError<String>> {
        let token: Cow<'a, str> = token.into();
        let prefix_char = if suffix {
            token.chars().next_back()
        } else {
            token.chars().next()
        };
        let prefix = match prefix_char {
            Some(c) => Prefix::try_from(c)?,
            None => return Err(ParsingError::EmptyToken),
        };
        let class = match token {
            Cow::Borrowed(s) => Cow::Borrowed(Self::split_class(s, suffix, delimiter)),
            Cow::Owned(s) => Cow::Owned(String::from(Self::split_class(&s, suffix, delimiter))),
        };
        Ok(Self { prefix, class })
    }

    /// Strips the prefix and the delimiter from the label. An empty class becomes `_`.
    fn split_class(token: &str, suffix: bool, delimiter: char) -> &str {
        let class = if suffix {
            let (head, _) = token.split_at(token.len() - token.chars().next_back().map_or(0, char::len_utf8));
            match head.rsplit_once(delimiter) {
                Some((class, _)) => class,
                None => head,
            }
        } else {
            let (_, rest) = token.split_at(token.chars().next().map_or(0, char::len_utf8));
            match rest.split_once(delimiter) {
                Some((_, class)) => class,
                None => rest,
            }
        };
        if class.is_empty() {
            "_"
        } else {
            class
        }
    }

    pub fn new<T: Into<Cow<'a, str>>>(prefix: Prefix, class: T) -> Self {
        Self {
            prefix,
            class: class.into(),
        }
    }

    pub fn prefix(&self) -> Prefix {
        self.prefix
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn is_begin(&self) -> bool {
        matches!(self.prefix, Prefix::B)
    }

    /// Returns the tag a continuation sub-word token of the same word receives: `B-X` becomes
    /// `I-X`. Every other tag is its own continuation.
    pub fn to_continuation(&self) -> Tag<'a> {
        match self.prefix {
            Prefix::B => Tag {
                prefix: Prefix::I,
                class: self.class.clone(),
            },
            _ => self.clone(),
        }
    }

    pub(crate) fn into_class(self) -> Cow<'a, str> {
        self.class
    }

    pub fn into_owned(self) -> Tag<'static> {
        Tag {
            prefix: self.prefix,
            class: Cow::Owned(self.class.into_owned()),
        }
    }
}

impl<'a> Display for Tag<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.prefix {
            Prefix::O => write!(f, "O"),
            p => write!(f, "{}-{}", p, self.class),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Errors raised when looking up or building labels.
pub enum LabelError {
    /// The label name is not part of the label set
    UnknownName(String),
    /// The label id is not part of the label set. Contains the id and the number of labels.
    UnknownId(usize, usize),
    /// Label ids are positions and can't be negative
    NegativeId(i64),
    /// The same label name appears twice in the label set
    DuplicateName(String),
    /// A begin label has no matching inside label
    MissingContinuation { label: String, expected: String },
    /// A label name could not be parsed
    Parsing(ParsingError<String>),
}

impl Display for LabelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownName(name) => write!(f, "Unknown label name: {}", name),
            Self::UnknownId(id, len) => write!(
                f,
                "Label id {} is out of range. The label set contains {} labels",
                id, len
            ),
            Self::NegativeId(id) => write!(f, "Label id {} is negative", id),
            Self::DuplicateName(name) => write!(f, "Label {} appears more than once", name),
            Self::MissingContinuation { label, expected } => write!(
                f,
                "The label {} has no continuation label. Expected to find {} in the label set",
                label, expected
            ),
            Self::Parsing(err) => Display::fmt(err, f),
        }
    }
}

impl Error for LabelError {}

impl From<ParsingError<String>> for LabelError {
    fn from(value: ParsingError<String>) -> Self {
        Self::Parsing(value)
    }
}

/// The ordered list of label names of a model. The id of a label is its position in the list. The
/// continuation id of every label is computed once, when the set is built.
///
/// # Example
///
/// ```rust
/// use nerprep::LabelSet;
///
/// let labels = LabelSet::new(["O", "B-PER", "I-PER"]).unwrap();
/// assert_eq!(labels.id("B-PER").unwrap(), 1);
/// assert_eq!(labels.continuation_id(1).unwrap(), 2);
/// assert_eq!(labels.continuation_id(0).unwrap(), 0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSet {
    names: Vec<String>,
    tags: Vec<Tag<'static>>,
    index: AHashMap<String, usize>,
    continuation: Vec<usize>,
}

impl LabelSet {
    /// Builds a label set from names formatted as `B-PER` (prefix first, `-` as delimiter).
    pub fn new<S, I>(names: I) -> Result<Self, LabelError>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S>,
    {
        Self::with_format(names, false, '-')
    }

    /// Builds a label set from names with a custom prefix position and delimiter.
    pub fn with_format<S, I>(names: I, suffix: bool, delimiter: char) -> Result<Self, LabelError>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S>,
    {
        let names: Vec<String> = names.into_iter().map(|s| String::from(s.as_ref())).collect();
        let mut index = AHashMap::with_capacity(names.len());
        let mut tags = Vec::with_capacity(names.len());
        for (id, name) in names.iter().enumerate() {
            if index.insert(name.clone(), id).is_some() {
                return Err(LabelError::DuplicateName(name.clone()));
            }
            tags.push(Tag::parse(name.as_str(), suffix, delimiter)?.into_owned());
        }
        let continuation = tags
            .iter()
            .enumerate()
            .map(|(id, tag)| {
                let target = tag.to_continuation();
                if &target == tag {
                    return Ok(id);
                }
                tags.iter()
                    .position(|t| t == &target)
                    .ok_or_else(|| LabelError::MissingContinuation {
                        label: names[id].clone(),
                        expected: target.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            names,
            tags,
            index,
            continuation,
        })
    }

    /// The CoNLL-2003 label set: `O, B-PER, I-PER, B-ORG, I-ORG, B-LOC, I-LOC, B-MISC, I-MISC`.
    pub fn conll2003() -> Self {
        Self::new(CONLL2003_LABELS).expect("The CoNLL-2003 label list is well formed")
    }

    pub fn id(&self, name: &str) -> Result<usize, LabelError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| LabelError::UnknownName(String::from(name)))
    }

    pub fn name(&self, id: usize) -> Result<&str, LabelError> {
        self.names
            .get(id)
            .map(String::as_str)
            .ok_or(LabelError::UnknownId(id, self.names.len()))
    }

    /// Looks up a name from a signed id, as found in label arrays holding an ignore marker.
    pub fn name_of_signed(&self, id: i64) -> Result<&str, LabelError> {
        let id = usize::try_from(id).map_err(|_| LabelError::NegativeId(id))?;
        self.name(id)
    }

    pub fn tag(&self, id: usize) -> Result<&Tag<'static>, LabelError> {
        self.tags
            .get(id)
            .ok_or(LabelError::UnknownId(id, self.tags.len()))
    }

    /// Id of the label given to the continuation sub-word tokens of a word labelled `id`.
    pub fn continuation_id(&self, id: usize) -> Result<usize, LabelError> {
        self.continuation
            .get(id)
            .copied()
            .ok_or(LabelError::UnknownId(id, self.continuation.len()))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{QuickCheck, TestResult};
    use rstest::rstest;

    #[rstest]
    #[case("B-PER", false, Prefix::B, "PER")]
    #[case("I-MISC", false, Prefix::I, "MISC")]
    #[case("O", false, Prefix::O, "_")]
    #[case("PER-B", true, Prefix::B, "PER")]
    #[case("GEO-LOC-I", true, Prefix::I, "GEO-LOC")]
    #[case("B-GEO-LOC", false, Prefix::B, "GEO-LOC")]
    #[case("BPER", false, Prefix::B, "PER")]
    fn test_tag_parse(
        #[case] token: &str,
        #[case] suffix: bool,
        #[case] prefix: Prefix,
        #[case] class: &str,
    ) {
        let tag = Tag::parse(token, suffix, '-').unwrap();
        assert_eq!(tag.prefix(), prefix);
        assert_eq!(tag.class(), class);
    }

    #[test]
    fn test_tag_parse_errors() {
        assert_eq!(Tag::parse("", false, '-'), Err(ParsingError::EmptyToken));
        assert_eq!(
            Tag::parse("X-PER", false, '-'),
            Err(ParsingError::PrefixError(String::from("X")))
        );
    }

    #[test]
    fn test_to_continuation() {
        let begin = Tag::parse("B-LOC", false, '-').unwrap();
        assert_eq!(begin.to_continuation(), Tag::new(Prefix::I, "LOC"));
        let inside = begin.to_continuation();
        assert_eq!(inside.to_continuation(), inside);
        let outside = Tag::parse("O", false, '-').unwrap();
        assert_eq!(outside.to_continuation(), outside);
        assert_eq!(inside.to_string(), "I-LOC");
        assert_eq!(outside.to_string(), "O");
    }

    #[test]
    fn test_conll_continuation_matches_parity() {
        let labels = LabelSet::conll2003();
        for id in 0..labels.len() {
            let expected = if id % 2 == 1 { id + 1 } else { id };
            let once = labels.continuation_id(id).unwrap();
            assert_eq!(once, expected);
            assert_eq!(labels.continuation_id(once).unwrap(), once);
        }
    }

    #[test]
    fn test_continuation_does_not_depend_on_order() {
        let labels = LabelSet::new(["B-PER", "B-LOC", "O", "I-LOC", "I-PER"]).unwrap();
        assert_eq!(labels.continuation_id(0).unwrap(), 4);
        assert_eq!(labels.continuation_id(1).unwrap(), 3);
        assert_eq!(labels.continuation_id(2).unwrap(), 2);
    }

    #[test]
    fn test_missing_continuation() {
        let err = LabelSet::new(["O", "B-PER"]).unwrap_err();
        assert_eq!(
            err,
            LabelError::MissingContinuation {
                label: String::from("B-PER"),
                expected: String::from("I-PER")
            }
        );
    }

    #[test]
    fn test_duplicate_name() {
        let err = LabelSet::new(["O", "O"]).unwrap_err();
        assert_eq!(err, LabelError::DuplicateName(String::from("O")));
    }

    #[test]
    fn test_lookups() {
        let labels = LabelSet::conll2003();
        assert_eq!(labels.id("I-ORG").unwrap(), 4);
        assert_eq!(labels.name(7).unwrap(), "B-MISC");
        assert_eq!(labels.name(9), Err(LabelError::UnknownId(9, 9)));
        assert_eq!(labels.name_of_signed(-100), Err(LabelError::NegativeId(-100)));
        assert_eq!(
            labels.id("B-DATE"),
            Err(LabelError::UnknownName(String::from("B-DATE")))
        );
        assert!(labels.tag(5).unwrap().is_begin());
    }

    #[test]
    fn test_propertie_continuation_out_of_range() {
        fn propertie_out_of_range_fails(offset: usize) -> TestResult {
            let labels = LabelSet::conll2003();
            let id = labels.len().saturating_add(offset);
            TestResult::from_bool(labels.continuation_id(id).is_err() && labels.name(id).is_err())
        }
        QuickCheck::new()
            .tests(500)
            .quickcheck(propertie_out_of_range_fails as fn(usize) -> TestResult)
    }
}
