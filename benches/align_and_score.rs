use criterion::{criterion_group, criterion_main, Criterion};
use ndarray::Array3;
use nerprep::{
    align_batch, classification_report, compute_metrics, LabelSet, SeqEval, SeqEvalConfig,
    SequenceMetric, IGNORE_INDEX,
};
use pprof::criterion::{Output, PProfProfiler};
use serde::Deserialize;
use serde_jsonlines::json_lines;
use std::path::Path;

const SMALL_DATASET: &str = "./benches/data/small_dataset.jsonl";

#[derive(Deserialize)]
struct Example {
    true_tags: Vec<String>,
    predicted_tags: Vec<String>,
}

impl Example {
    /// Reads the examples and repeats them `times` times.
    fn into<P: AsRef<Path>>(path: P, times: usize) -> (Vec<Vec<String>>, Vec<Vec<String>>) {
        let examples = json_lines::<Example, P>(path)
            .unwrap()
            .map(|r| r.unwrap())
            .collect::<Vec<_>>();
        let mut vec_true_ner = Vec::with_capacity(examples.len() * times);
        let mut vec_predicted_ner = Vec::with_capacity(examples.len() * times);
        for _ in 0..times {
            for ex in examples.iter() {
                vec_true_ner.push(ex.true_tags.clone());
                vec_predicted_ner.push(ex.predicted_tags.clone());
            }
        }
        (vec_true_ner, vec_predicted_ner)
    }
}

/// Splits every word in two sub-word tokens and adds a special token at both ends.
fn build_word_ids(sentences: &[Vec<usize>]) -> Vec<Vec<Option<usize>>> {
    sentences
        .iter()
        .map(|words| {
            let mut word_ids = vec![None];
            for word in 0..words.len() {
                word_ids.push(Some(word));
                word_ids.push(Some(word));
            }
            word_ids.push(None);
            word_ids
        })
        .collect()
}

fn benchmark_align(c: &mut Criterion) {
    let labels = LabelSet::conll2003();
    let (true_vec, _) = Example::into(SMALL_DATASET, 50);
    let word_labels: Vec<Vec<usize>> = true_vec
        .iter()
        .map(|s| s.iter().map(|l| labels.id(l).unwrap()).collect())
        .collect();
    let word_ids = build_word_ids(&word_labels);
    c.bench_function("align_batch", |b| {
        b.iter(|| align_batch(&word_labels, &word_ids, &labels, IGNORE_INDEX).unwrap())
    });
}

fn benchmark_seqeval(c: &mut Criterion) {
    let (true_vec, pred_vec) = Example::into(SMALL_DATASET, 50);
    let metric = SeqEval::default();
    c.bench_function("seqeval_compute", |b| {
        b.iter(|| metric.compute(&pred_vec, &true_vec).unwrap())
    });
    c.bench_function("classification_report", |b| {
        b.iter(|| classification_report(&true_vec, &pred_vec, &SeqEvalConfig::default()).unwrap())
    });
}

fn benchmark_compute_metrics(c: &mut Criterion) {
    let labels = LabelSet::conll2003();
    let (true_vec, pred_vec) = Example::into(SMALL_DATASET, 10);
    let width = true_vec.iter().map(Vec::len).max().unwrap_or(0);
    let mut logits = Array3::<f32>::zeros((true_vec.len(), width, labels.len()));
    let mut label_ids = ndarray::Array2::<i64>::from_elem((true_vec.len(), width), IGNORE_INDEX);
    for (i, (t, p)) in true_vec.iter().zip(pred_vec.iter()).enumerate() {
        for (j, (true_tag, pred_tag)) in t.iter().zip(p.iter()).enumerate() {
            label_ids[[i, j]] = labels.id(true_tag).unwrap() as i64;
            logits[[i, j, labels.id(pred_tag).unwrap()]] = 1.0;
        }
    }
    let metric = SeqEval::default();
    c.bench_function("compute_metrics", |b| {
        b.iter(|| {
            compute_metrics(
                logits.view(),
                label_ids.view(),
                &labels,
                IGNORE_INDEX,
                &metric,
            )
            .unwrap()
        })
    });
}

criterion_group!(
    name=align_and_score_benches;
    config = Criterion::default().sample_size(100).with_profiler(PProfProfiler::new(3000, Output::Flamegraph(None)));
    targets = benchmark_align,
    benchmark_seqeval,
    benchmark_compute_metrics
);
criterion_main!(align_and_score_benches);
