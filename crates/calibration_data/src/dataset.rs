use crate::sample::{row_tensor, Sample};
use anyhow::{ensure, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tch::Tensor;

/// The calibration windows drawn from a training split, in draw order.
///
/// Samples live in contiguous memory behind an `Arc<[Sample]>`, so cloning a
/// `TrainSet` only bumps the reference count. Windows are not deduplicated:
/// two draws may land on the same offset.
#[derive(Debug, Clone)]
pub struct TrainSet {
    samples: Arc<[Sample]>,
    metadata: HashMap<String, String>,
}

impl TrainSet {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self {
            samples: samples.into(),
            metadata: HashMap::new(),
        }
    }

    /// Adds/updates metadata and returns the modified set.
    /// Enables chaining: `train.with_metadata("dataset", "c4")`.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Returns the value of a metadata field, if it exists.
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(|s| s.as_str())
    }

    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// True when both sets hold the same samples, element-wise and in order.
    pub fn same_values(&self, other: &TrainSet) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| a.same_values(b))
    }
}

impl<'a> IntoIterator for &'a TrainSet {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One long `[1, L]` token stream used for evaluation.
///
/// Holds the whole tokenized eval split for WikiText-2 and PTB, and the
/// concatenated per-document windows for C4.
#[derive(Debug)]
pub struct ValidationStream {
    input_ids: Tensor,
}

impl ValidationStream {
    pub fn from_ids(ids: &[i64]) -> Self {
        Self {
            input_ids: row_tensor(ids),
        }
    }

    /// Tensor of shape `[1, len]`
    pub fn input_ids(&self) -> &Tensor {
        &self.input_ids
    }

    pub fn len(&self) -> usize {
        self.input_ids.size().last().copied().unwrap_or(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of whole `seqlen` chunks a perplexity pass can walk over.
    pub fn num_eval_windows(&self, seqlen: usize) -> usize {
        if seqlen == 0 {
            0
        } else {
            self.len() / seqlen
        }
    }

    /// Consecutive, non-overlapping `[1, seqlen]` views into the stream.
    /// A trailing chunk shorter than `seqlen` is dropped.
    pub fn eval_windows(&self, seqlen: usize) -> Result<impl Iterator<Item = Tensor> + '_> {
        ensure!(seqlen > 0, "seqlen must be > 0, but got seqlen={}", seqlen);
        let n = self.num_eval_windows(seqlen) as i64;
        let seqlen = seqlen as i64;
        Ok((0..n).map(move |i| self.input_ids.narrow(1, i * seqlen, seqlen)))
    }
}

impl Clone for ValidationStream {
    fn clone(&self) -> Self {
        Self {
            input_ids: self.input_ids.shallow_clone(),
        }
    }
}
