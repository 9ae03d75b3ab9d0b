//! Labeled-document preparation for text classifiers.
//!
//! Turns a CSV of `(text, label)` pairs into cleaned, stratified train/test
//! splits with one-hot label matrices.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::PipelineError;

pub mod clean;

pub use clean::*;

/// One labeled document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledDoc {
    pub text: String,
    pub label: String,
}

/// Categorical label coding: sorted categories, code = position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCoding {
    classes: Vec<String>,
}

impl LabelCoding {
    pub fn fit(docs: &[LabeledDoc]) -> Self {
        let classes: BTreeSet<&str> = docs.iter().map(|d| d.label.as_str()).collect();
        Self {
            classes: classes.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn code(&self, label: &str) -> Option<usize> {
        self.classes.binary_search_by(|c| c.as_str().cmp(label)).ok()
    }

    /// One-hot rows for `labels`.
    ///
    /// With exactly two classes a single column is produced (1 for the second
    /// class), which is what binary classifiers expect.
    pub fn binarize<'a>(&self, labels: impl IntoIterator<Item = &'a str>) -> Vec<Vec<u8>> {
        let binary = self.classes.len() == 2;
        labels
            .into_iter()
            .map(|label| {
                let code = self.code(label);
                if binary {
                    vec![u8::from(code == Some(1))]
                } else {
                    (0..self.classes.len()).map(|i| u8::from(code == Some(i))).collect()
                }
            })
            .collect()
    }
}

/// Keep documents whose label is in `allowed`; an empty set keeps everything.
pub fn filter_labels(docs: Vec<LabeledDoc>, allowed: &[String]) -> Vec<LabeledDoc> {
    if allowed.is_empty() {
        return docs;
    }
    let allowed: HashSet<&str> = allowed.iter().map(String::as_str).collect();
    docs.into_iter().filter(|d| allowed.contains(d.label.as_str())).collect()
}

/// One side of a split, ready to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitSet {
    pub classes: Vec<String>,
    pub docs: Vec<String>,
    pub label_codes: Vec<usize>,
    pub labels: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: SplitSet,
    pub test: SplitSet,
    pub counts: BTreeMap<String, (usize, usize)>,
}

/// Per-label shuffled split.
///
/// Each label contributes `ceil(n * test_size)` documents to the test side, but
/// never all of them when it has more than one document. The same `seed` always
/// produces the same split.
pub fn stratified_split(docs: &[LabeledDoc], test_size: f64, seed: u64) -> Result<Split, PipelineError> {
    if !(test_size.is_finite() && test_size > 0.0 && test_size < 1.0) {
        return Err(PipelineError::InvalidSplit(format!(
            "test size must lie strictly between 0 and 1, got {test_size}"
        )));
    }
    if docs.is_empty() {
        return Err(PipelineError::InvalidSplit("no documents to split".to_string()));
    }

    let coding = LabelCoding::fit(docs);
    let mut by_label: BTreeMap<&str, Vec<&LabeledDoc>> = BTreeMap::new();
    for doc in docs {
        by_label.entry(doc.label.as_str()).or_default().push(doc);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();
    let mut counts = BTreeMap::new();

    for (label, mut group) in by_label {
        group.shuffle(&mut rng);
        let n = group.len();
        let mut n_test = (n as f64 * test_size).ceil() as usize;
        if n > 1 {
            n_test = n_test.min(n - 1);
        }
        let rest = group.split_off(n_test);
        counts.insert(label.to_string(), (rest.len(), group.len()));
        test.extend(group);
        train.extend(rest);
    }

    info!(train = train.len(), test = test.len(), classes = coding.classes.len(), "split documents");

    Ok(Split {
        train: split_set(&coding, &train),
        test: split_set(&coding, &test),
        counts,
    })
}

fn split_set(coding: &LabelCoding, docs: &[&LabeledDoc]) -> SplitSet {
    SplitSet {
        classes: coding.classes.clone(),
        docs: docs.iter().map(|d| d.text.clone()).collect(),
        label_codes: docs.iter().filter_map(|d| coding.code(&d.label)).collect(),
        labels: coding.binarize(docs.iter().map(|d| d.label.as_str())),
    }
}
