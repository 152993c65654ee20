/*!
This library prepares token classification (named entity recognition) data for a transformer model
and scores its predictions. It reads annotated corpora, aligns the labels of the words with the
sub-word tokens of a tokenizer, formats the predictions of a model back into words and reduces its
logits into span level metrics.

# Label alignment
A tokenizer can split a single word into many sub-word tokens and adds special tokens, such as
`[CLS]` and `[SEP]`, that belong to no word. The labels are aligned token by token:
* A special or padding token receives the ignore marker (`IGNORE_INDEX`, `-100`), which is skipped
    by the loss and the metrics.
* The first token of a word receives the label of the word.
* The following tokens of the same word receive the continuation label of the word. The
    continuation of `B-PER` is `I-PER`; every other label is its own continuation.

# Terminology
* A class is an entity we are interested in, such as 'LOC' for location, 'PER' for person, 'MISC'
    for miscellaneous, etc.
* A label is a string containing a prefix and a class, such as `B-PER`. The prefix indicates where
    we are in the current chunk. Prefix are limited to the letters `O`, `I`, `B`, `E`, `S`, `U` and
    `L`. The label `O` marks a token outside of any chunk.
* A chunk (or entity) is a list of at least one label associated with a named entity, such as
    `["B-PER", "I-PER", "I-PER"]`.

# Example
```rust
use nerprep::{align_labels_with_tokens, LabelSet, IGNORE_INDEX};

let labels = LabelSet::conll2003();
let word_labels = [labels.id("B-PER").unwrap(), labels.id("O").unwrap()];
// [CLS] To ##m likes [SEP]
let word_ids = [None, Some(0), Some(0), Some(1), None];
let aligned = align_labels_with_tokens(&word_labels, &word_ids, &labels, IGNORE_INDEX).unwrap();
assert_eq!(aligned, vec![IGNORE_INDEX, 1, 2, 0, IGNORE_INDEX]);
```
*/

mod align;
mod config;
mod corpus;
mod dataset;
mod entity;
mod format;
mod labels;
mod metrics;
mod reporter;
mod tokenize;

// The public api starts here
pub use labels::{LabelError, LabelSet, ParsingError, Prefix, Tag, CONLL2003_LABELS};

pub use align::{align_batch, align_labels_with_tokens, AlignError, IGNORE_INDEX};

pub use corpus::{Corpus, CorpusError, CorpusFrame, Sentence};

pub use tokenize::{
    load_tokenizer, tokenize_and_align_labels, SubwordEncoding, SubwordTokenizer, TokenizeError,
    TokenizedBatch, TokenizerConfig, PAD_TOKEN,
};

pub use dataset::{DatasetError, TextDataset, TextFrame, TextRecord, NO_LABEL};

pub use format::{format_result, FormatError, FormattedResult, WordPrediction};

pub use metrics::{
    accuracy_score, argmax_predictions, classification_report, compute_metrics,
    precision_recall_fscore_support, ComputationError, DivByZeroStrat, DivisionByZeroError,
    EvalMetrics, InconsistentLengthError, MetricValues, PrecisionRecallFScoreTrueSum, SeqEval,
    SequenceMetric, OVERALL_ACCURACY, OVERALL_F1, OVERALL_PRECISION, OVERALL_RECALL,
};

pub use reporter::{Average, ClassMetrics, OverallAverage, Reporter};

pub use config::{SeqEvalConfig, SeqEvalConfigBuilder};
