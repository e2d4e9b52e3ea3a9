#![allow(dead_code)]

use calibration_data::{CorpusError, CorpusProvider, DatasetName, Split, TokenizerProvider};

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::ops::Range;
use std::str::FromStr;
use tokenizers::Tokenizer;

/// Size of the word-level test vocabulary: "t0".."t999"
pub const VOCAB_WORDS: usize = 1000;

/// Word-level tokenizer where the word `tN` has id `N` and anything else is `[UNK]`.
pub fn numbered_tokenizer() -> Tokenizer {
    Tokenizer::from_str(&numbered_tokenizer_json().to_string()).expect("valid tokenizer JSON")
}

/// The numbered tokenizer with length limits stored in its JSON, the way
/// some Hub `tokenizer.json` files ship: truncation to 16 tokens and
/// padding to a fixed 64.
pub fn length_limited_tokenizer() -> Tokenizer {
    let mut json = numbered_tokenizer_json();
    json["truncation"] = serde_json::json!({
        "direction": "Right",
        "max_length": 16,
        "strategy": "LongestFirst",
        "stride": 0
    });
    json["padding"] = serde_json::json!({
        "strategy": { "Fixed": 64 },
        "direction": "Right",
        "pad_to_multiple_of": null,
        "pad_id": 0,
        "pad_type_id": 0,
        "pad_token": "t0"
    });
    Tokenizer::from_str(&json.to_string()).expect("valid tokenizer JSON")
}

fn numbered_tokenizer_json() -> serde_json::Value {
    let vocab: serde_json::Map<String, serde_json::Value> = (0..VOCAB_WORDS)
        .map(|i| (format!("t{}", i), serde_json::json!(i)))
        .chain(std::iter::once((
            "[UNK]".to_string(),
            serde_json::json!(VOCAB_WORDS),
        )))
        .collect();
    serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": { "type": "WordLevel", "vocab": vocab, "unk_token": "[UNK]" }
    })
}

/// A document made of the words for the given ids, e.g. `0..3` -> "t0 t1 t2"
pub fn doc(ids: Range<usize>) -> String {
    ids.map(|i| format!("t{}", i % VOCAB_WORDS))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Serves the numbered tokenizer for any model id and records what it was asked for.
#[derive(Default)]
pub struct TestTokenizers {
    pub requests: std::sync::Mutex<Vec<(String, Option<String>)>>,
}

impl TokenizerProvider for TestTokenizers {
    fn load(&self, model: &str, hf_token: Option<&str>) -> Result<Tokenizer> {
        self.requests
            .lock()
            .unwrap()
            .push((model.to_string(), hf_token.map(str::to_string)));
        Ok(numbered_tokenizer())
    }
}

/// Serves [`length_limited_tokenizer`] for any model id.
pub struct LengthLimitedTokenizers;

impl TokenizerProvider for LengthLimitedTokenizers {
    fn load(&self, _model: &str, _hf_token: Option<&str>) -> Result<Tokenizer> {
        Ok(length_limited_tokenizer())
    }
}

/// Fails the way a gated model without credentials does.
pub struct GatedTokenizers;

impl TokenizerProvider for GatedTokenizers {
    fn load(&self, model: &str, _hf_token: Option<&str>) -> Result<Tokenizer> {
        Err(CorpusError::TokenizerLoad {
            model: model.to_string(),
            reason: "401 Unauthorized".into(),
        }
        .into())
    }
}

/// In-memory corpora keyed by dataset and split.
#[derive(Default)]
pub struct TestCorpus {
    splits: HashMap<(DatasetName, Split), Vec<String>>,
}

impl TestCorpus {
    pub fn with_split(mut self, dataset: DatasetName, split: Split, docs: Vec<String>) -> Self {
        self.splits.insert((dataset, split), docs);
        self
    }

    /// WikiText-2 and PTB with 2_000 train tokens and a small eval split,
    /// plus a C4 pool mixing short and long documents.
    pub fn standard() -> Self {
        let train: Vec<String> = (0..100).map(|i| doc(i * 20..i * 20 + 20)).collect();
        let c4_train: Vec<String> = (0..60)
            .map(|i| {
                if i % 3 == 0 {
                    doc(i..i + 4) // too short for the seqlens used in tests
                } else {
                    doc(i * 10..i * 10 + 40)
                }
            })
            .collect();
        let c4_validation: Vec<String> = (0..30)
            .map(|i| if i % 2 == 0 { doc(0..2) } else { doc(500 + i..540 + i) })
            .collect();

        Self::default()
            .with_split(DatasetName::WikiText2, Split::Train, train.clone())
            .with_split(
                DatasetName::WikiText2,
                Split::Test,
                vec![doc(0..3), String::new(), doc(3..5)],
            )
            .with_split(DatasetName::Ptb, Split::Train, train)
            .with_split(
                DatasetName::Ptb,
                Split::Validation,
                vec![doc(900..910), doc(910..915)],
            )
            .with_split(DatasetName::C4, Split::Train, c4_train)
            .with_split(DatasetName::C4, Split::Validation, c4_validation)
    }
}

impl CorpusProvider for TestCorpus {
    fn load_split(&self, dataset: DatasetName, split: Split) -> Result<Vec<String>> {
        self.splits
            .get(&(dataset, split))
            .cloned()
            .ok_or_else(|| anyhow!("no {} {} split in test corpus", dataset, split))
    }
}

/// A corpus that must never be touched.
pub struct UnreachableCorpus;

impl CorpusProvider for UnreachableCorpus {
    fn load_split(&self, dataset: DatasetName, split: Split) -> Result<Vec<String>> {
        Err(anyhow!("unexpected fetch of {} {}", dataset, split))
    }
}

/// Flattens a `[1, n]` tensor into its values.
pub fn row(tensor: &tch::Tensor) -> Result<Vec<i64>> {
    Ok(Vec::<i64>::try_from(tensor.view([-1]))?)
}
