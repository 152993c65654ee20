/**
This module extracts the entities (chunks) of label sequences in the lenient way: a chunk can start
with an inside tag and ends when the prefix or the class of the next tag says so. Entities are
keyed by the sequence they come from, which makes spans of different sentences distinct.
*/
use crate::labels::{ParsingError, Prefix, Tag};
use std::borrow::Cow;
use std::mem::take;
use std::ops::Deref;
use std::slice::Iter;

/// A named object found in a sequence. It spans the tokens `start..=end` of the sequence at index
/// `sequence` and has a class, such as `PER` or `LOC`.
#[derive(Debug, Hash, Clone, PartialEq, Eq, PartialOrd)]
pub struct Entity<'a> {
    pub(crate) sequence: usize,
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) class: Cow<'a, str>,
}

impl<'a> Entity<'a> {
    pub(crate) fn new(sequence: usize, start: usize, end: usize, class: Cow<'a, str>) -> Self {
        Entity {
            sequence,
            start,
            end,
            class,
        }
    }
}

/// Leniently retrieves the entities of every sequence.
pub(crate) fn get_entities_lenient<'a, S: AsRef<str>>(
    sequences: &'a [Vec<S>],
    suffix: bool,
    delimiter: char,
) -> Result<Entities<'a>, ParsingError<String>> {
    let mut res = Vec::with_capacity(sequences.len());
    for (sequence, labels) in sequences.iter().enumerate() {
        let entities: Result<Vec<_>, _> =
            LenientChunkIter::new(sequence, labels, suffix, delimiter).collect();
        res.push(entities?)
    }
    Ok(Entities(res))
}

/// This wrapper around the content iterator appends a single `"O"` at the end of its inner
/// iterator. The last chunk of a sequence is closed by it.
struct PaddedSequence<'a, S> {
    content: Iter<'a, S>,
    is_at_end: bool,
}

impl<'a, S: AsRef<str>> Iterator for PaddedSequence<'a, S> {
    type Item = &'a str;
    fn next(&mut self) -> Option<Self::Item> {
        match self.content.next() {
            Some(v) => Some(v.as_ref()),
            None if self.is_at_end => None,
            None => {
                self.is_at_end = true;
                Some("O")
            }
        }
    }
}

/// This struct iterates over a *single* sequence and returns the chunks associated with it.
struct LenientChunkIter<'a, S> {
    inner: PaddedSequence<'a, S>,
    sequence: usize,
    /// The prefix of the previous tag (e.g. 'I')
    prev_prefix: Prefix,
    /// The class of the previous tag (e.g. `"PER"`)
    prev_class: Cow<'a, str>,
    begin_offset: usize,
    suffix: bool,
    delimiter: char,
    index: usize,
}

impl<'a, S: AsRef<str>> LenientChunkIter<'a, S> {
    fn new(sequence: usize, labels: &'a [S], suffix: bool, delimiter: char) -> Self {
        LenientChunkIter {
            inner: PaddedSequence {
                content: labels.iter(),
                is_at_end: false,
            },
            sequence,
            prev_prefix: Prefix::O,
            prev_class: Cow::Borrowed(""),
            begin_offset: 0,
            suffix,
            delimiter,
            index: 0,
        }
    }

    /// Checks if a chunk ended between the previous and current tag.
    fn end_of_chunk(&self, current: &Tag<'_>) -> bool {
        match (self.prev_prefix, current.prefix()) {
            (Prefix::E, _) | (Prefix::S, _) => true,
            (Prefix::B, Prefix::B) | (Prefix::B, Prefix::S) | (Prefix::B, Prefix::O) => true,
            (Prefix::I, Prefix::B) | (Prefix::I, Prefix::S) | (Prefix::I, Prefix::O) => true,
            (Prefix::O, _) => false,
            _ => self.prev_class != current.class(),
        }
    }

    /// Checks if a chunk started between the previous and current tag.
    fn start_of_chunk(&self, current: &Tag<'_>) -> bool {
        match (self.prev_prefix, current.prefix()) {
            (_, Prefix::B) | (_, Prefix::S) => true,
            (Prefix::E, Prefix::E) | (Prefix::E, Prefix::I) => true,
            (Prefix::S, Prefix::E) | (Prefix::S, Prefix::I) => true,
            (Prefix::O, Prefix::E) | (Prefix::O, Prefix::I) => true,
            (_, Prefix::O) => false,
            _ => self.prev_class != current.class(),
        }
    }
}

impl<'a, S: AsRef<str>> Iterator for LenientChunkIter<'a, S> {
    type Item = Result<Entity<'a>, ParsingError<String>>;
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let current = self.inner.next()?;
            let tag = match Tag::parse(current, self.suffix, self.delimiter) {
                Ok(v) => v,
                Err(e) => {
                    self.index += 1;
                    return Some(Err(e));
                }
            };
            // A token can close the previous chunk and open the next one
            let ended = if self.end_of_chunk(&tag) {
                Some(Entity::new(
                    self.sequence,
                    self.begin_offset,
                    self.index - 1,
                    take(&mut self.prev_class),
                ))
            } else {
                None
            };
            if self.start_of_chunk(&tag) {
                self.begin_offset = self.index;
            }
            self.prev_prefix = tag.prefix();
            self.prev_class = tag.into_class();
            self.index += 1;
            if let Some(entity) = ended {
                return Some(Ok(entity));
            }
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
/// The entities of many sequences, one vector per sequence.
pub struct Entities<'a>(Vec<Vec<Entity<'a>>>);

impl<'a> Deref for Entities<'a> {
    type Target = Vec<Vec<Entity<'a>>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use quickcheck::{Arbitrary, Gen, QuickCheck, TestResult};
    use rstest::rstest;

    fn tuples(labels: &[&str], suffix: bool) -> Vec<(usize, usize, String)> {
        let sequences = vec![labels.to_vec()];
        let entities = get_entities_lenient(&sequences, suffix, '-').unwrap();
        entities
            .iter()
            .flatten()
            .map(|e| (e.start, e.end, e.class.to_string()))
            .collect()
    }

    fn t(start: usize, end: usize, class: &str) -> (usize, usize, String) {
        (start, end, String::from(class))
    }

    #[test]
    fn test_get_entities_lenient() {
        let sequences = vec![vec!["B-PER", "I-PER", "O", "B-LOC"]];
        let actual = get_entities_lenient(&sequences, false, '-').unwrap();
        let expected = Entities(vec![vec![
            Entity::new(0, 0, 1, Cow::from("PER")),
            Entity::new(0, 3, 3, Cow::from("LOC")),
        ]]);
        assert_eq!(actual, expected)
    }

    #[rstest]
    #[case(vec!["O", "O", "O", "B-MISC", "I-MISC", "I-MISC", "O", "B-PER", "I-PER"], vec![t(3, 5, "MISC"), t(7, 8, "PER")])]
    #[case(vec!["B-PER", "B-PER", "I-PER"], vec![t(0, 0, "PER"), t(1, 2, "PER")])]
    #[case(vec!["I-PER", "I-PER", "O"], vec![t(0, 1, "PER")])]
    #[case(vec!["B-PER", "I-LOC", "I-LOC"], vec![t(0, 0, "PER"), t(1, 2, "LOC")])]
    #[case(vec!["O", "I-MISC"], vec![t(1, 1, "MISC")])]
    #[case(vec!["B-LOC", "E-LOC", "S-PER", "O"], vec![t(0, 1, "LOC"), t(2, 2, "PER")])]
    #[case(vec!["O", "O"], vec![])]
    #[case(vec![], vec![])]
    fn test_lenient_chunks(
        #[case] labels: Vec<&str>,
        #[case] expected: Vec<(usize, usize, String)>,
    ) {
        assert_eq!(tuples(&labels, false), expected);
    }

    #[test]
    fn test_get_entities_with_suffix() {
        let labels = [
            "O", "O", "O", "MISC-B", "MISC-I", "MISC-I", "O", "PER-B", "PER-I",
        ];
        assert_eq!(
            tuples(&labels, true),
            vec![t(3, 5, "MISC"), t(7, 8, "PER")]
        );
    }

    #[test]
    fn test_sequences_are_distinct() {
        let sequences = vec![vec!["B-PER", "O"], vec!["B-PER", "O"]];
        let entities = get_entities_lenient(&sequences, false, '-').unwrap();
        let keys: Vec<(usize, usize, usize)> = entities
            .iter()
            .flatten()
            .map(|e| (e.sequence, e.start, e.end))
            .collect();
        assert_eq!(keys, vec![(0, 0, 0), (1, 0, 0)]);
    }

    #[test]
    fn test_invalid_label() {
        let sequences = vec![vec!["B-PER", "X-PER"]];
        assert_eq!(
            get_entities_lenient(&sequences, false, '-'),
            Err(ParsingError::PrefixError(String::from("X")))
        );
    }

    /// A sequence of IOB2 labels over two classes.
    #[derive(Debug, Clone)]
    pub(crate) struct LabelSequence(pub(crate) Vec<&'static str>);

    impl Arbitrary for LabelSequence {
        fn arbitrary(g: &mut Gen) -> Self {
            const CHOICES: [&str; 5] = ["O", "B-PER", "I-PER", "B-LOC", "I-LOC"];
            let len = usize::arbitrary(g) % 20;
            LabelSequence((0..len).map(|_| *g.choose(&CHOICES).unwrap()).collect())
        }
    }

    #[test]
    fn test_propertie_entities_are_well_formed() {
        fn propertie_entities_are_well_formed(sequence: LabelSequence) -> TestResult {
            let labels = sequence.0;
            let n_begin = labels.iter().filter(|l| l.starts_with('B')).count();
            let sequences = vec![labels];
            let entities = match get_entities_lenient(&sequences, false, '-') {
                Ok(e) => e,
                Err(_) => return TestResult::failed(),
            };
            let mut previous_end = None;
            for e in entities.iter().flatten() {
                if e.start > e.end || e.end >= sequences[0].len() {
                    return TestResult::failed();
                }
                if previous_end.is_some_and(|p| e.start <= p) {
                    return TestResult::failed();
                }
                previous_end = Some(e.end);
            }
            // Every begin tag opens its own entity
            TestResult::from_bool(entities.iter().flatten().count() >= n_begin)
        }
        QuickCheck::new()
            .tests(1000)
            .quickcheck(propertie_entities_are_well_formed as fn(LabelSequence) -> TestResult)
    }
}
