use anyhow::{anyhow, ensure, Result};
use std::collections::HashMap;
use tch::{Kind, Tensor};

/// Target value that tells the consuming trainer to skip a position in the loss.
pub const IGNORE_INDEX: i64 = -100;

pub const INPUT_IDS: &str = "input_ids";
pub const TARGET_IDS: &str = "target_ids";

/// The `Sample` struct is one calibration example: a `[1, seqlen]` window of
/// token ids and its target row.
///
/// Internally, the `features` map stores:
/// - `"input_ids"`: the window, `Int64`, shape `[1, seqlen]`
/// - `"target_ids"`: same shape; for real text every position except the last
///   is [`IGNORE_INDEX`], so only the final token contributes to the loss.
///
/// # Examples:
/// - window `[5, 9, 2, 7]` -> `{"input_ids": [[5, 9, 2, 7]], "target_ids": [[-100, -100, -100, 7]]}`
#[derive(Debug)]
pub struct Sample {
    pub features: HashMap<String, Tensor>,
}

/// Creates a shallow clone of the `Sample`
impl Clone for Sample {
    fn clone(&self) -> Self {
        let features = self
            .features
            .iter()
            .map(|(k, v)| (k.clone(), v.shallow_clone()))
            .collect();
        Self { features }
    }
}

impl Sample {
    /// Builds a sample from a token window using the masked-target convention.
    pub fn from_window(window: &[i64]) -> Result<Self> {
        ensure!(!window.is_empty(), "Cannot build a sample from an empty window");

        let mut target = vec![IGNORE_INDEX; window.len()];
        let last = window.len() - 1;
        target[last] = window[last];

        Ok(Self::from_rows(window, &target))
    }

    /// Builds a shape-compatible placeholder sample: given ids as input and an
    /// all-ones target. Used for synthetic benchmarking runs.
    pub fn synthetic(ids: &[i64]) -> Self {
        let input = row_tensor(ids);
        let target = Tensor::ones_like(&input);
        Self {
            features: HashMap::from([(INPUT_IDS.into(), input), (TARGET_IDS.into(), target)]),
        }
    }

    fn from_rows(input: &[i64], target: &[i64]) -> Self {
        Self {
            features: HashMap::from([
                (INPUT_IDS.into(), row_tensor(input)),
                (TARGET_IDS.into(), row_tensor(target)),
            ]),
        }
    }

    /// Returns a reference to the tensor by feature name.
    pub fn get(&self, feature: &str) -> Result<&Tensor> {
        self.features
            .get(feature)
            .ok_or_else(|| anyhow!("Feature {} not found", feature))
    }

    pub fn input_ids(&self) -> Result<&Tensor> {
        self.get(INPUT_IDS)
    }

    pub fn target_ids(&self) -> Result<&Tensor> {
        self.get(TARGET_IDS)
    }

    /// Returns an iterator over all feature names in this `Sample`.
    pub fn features(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    /// Feature-wise equality on shape and values.
    pub fn same_values(&self, other: &Sample) -> bool {
        self.features.len() == other.features.len()
            && self.features.iter().all(|(name, tensor)| {
                other
                    .features
                    .get(name)
                    .is_some_and(|o| o.size() == tensor.size() && o.equal(tensor))
            })
    }
}

/// Wraps token ids as a single-row `Int64` tensor of shape `[1, len]`.
pub(crate) fn row_tensor(ids: &[i64]) -> Tensor {
    Tensor::from_slice(ids)
        .to_kind(Kind::Int64)
        .view([1, ids.len() as i64])
}
