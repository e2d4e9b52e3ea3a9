//! src/error.rs
//!
//! Failure taxonomy for corpus loading.
//!
//! Library functions return `anyhow::Result`; every failure that callers may
//! want to branch on is raised as a [`CorpusError`] so it can be recovered with
//! `err.downcast_ref::<CorpusError>()`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorpusError {
    /// The dataset name matched none of the supported corpora.
    #[error("unknown dataset '{0}': expected a name containing 'wikitext2', 'ptb' or 'c4'")]
    UnknownDataset(String),

    #[error("invalid loader configuration: {0}")]
    InvalidConfig(String),

    /// Downloading or reading a dataset file failed.
    #[error("failed to fetch {what}")]
    Fetch {
        what: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to load tokenizer for model '{model}': {reason}")]
    TokenizerLoad { model: String, reason: String },

    #[error("tokenization failed: {0}")]
    Tokenization(String),

    /// The concatenated split holds fewer tokens than a single window.
    #[error("{split} split has {tokens} tokens, fewer than seqlen={seqlen}")]
    CorpusTooShort {
        split: String,
        tokens: usize,
        seqlen: usize,
    },

    /// Rejection sampling gave up before finding a document of at least `seqlen` tokens.
    #[error("no {split} document with at least {seqlen} tokens found after {draws} draws")]
    NoEligibleDocument {
        split: String,
        seqlen: usize,
        draws: usize,
    },
}
