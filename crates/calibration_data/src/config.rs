//! src/config.rs
//!
//! Parameters for a single `get_loaders` call.
//!
//! The `LoaderConfig` struct stores which corpus to load, how many windows to
//! draw and how the Hub collaborators are reached.
//!
//! Example:
//! ```ignore
//! let config = LoaderConfig::builder("wikitext2")
//!     .model("meta-llama/Llama-2-7b-hf")
//!     .nsamples(128)
//!     .seqlen(2048)
//!     .seed(0)
//!     .hf_token(std::env::var("HF_TOKEN").ok())
//!     .build();
//! ```

use crate::error::CorpusError;
use anyhow::{ensure, Result};
use std::path::PathBuf;

pub const DEFAULT_NSAMPLES: usize = 128;
pub const DEFAULT_SEQLEN: usize = 2048;
pub const DEFAULT_MAX_DOCUMENT_DRAWS: usize = 1_000_000;
pub const DEFAULT_SYNTHETIC_TOKEN_BOUND: i64 = 32_000;
pub const DEFAULT_C4_VALIDATION_WINDOWS: usize = 256;

/// Configuration for `get_loaders`
#[derive(Clone, Debug)]
pub struct LoaderConfig {
    /// Dataset selector, matched by substring against `wikitext2`, `ptb`, `c4`.
    pub name: String,
    /// Number of training windows to draw
    pub nsamples: usize,
    /// Seed for the training draws. C4 validation always uses seed 0.
    pub seed: u64,
    /// Window length in tokens
    pub seqlen: usize,
    /// Model id whose tokenizer is loaded (e.g. `meta-llama/Llama-2-7b-hf`)
    pub model: String,
    /// C4 only: skip real text and produce random token ids of the right shape.
    pub synthetic_data: bool,
    /// Credential for gated models on the Hugging Face Hub
    pub hf_token: Option<String>,
    /// Upper bound on document draws per window before rejection sampling fails.
    pub max_document_draws: usize,
    /// Exclusive upper bound for synthetic token ids.
    pub synthetic_token_bound: i64,
    /// Number of windows concatenated into the C4 validation stream.
    pub c4_validation_windows: usize,
    /// Hub cache directory. `None` uses the hf-hub default (`~/.cache/huggingface/hub`).
    pub cache_dir: Option<PathBuf>,
    /// Show download progress bars
    pub progress: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            nsamples: DEFAULT_NSAMPLES,
            seed: 0,
            seqlen: DEFAULT_SEQLEN,
            model: String::new(),
            synthetic_data: false,
            hf_token: None,
            max_document_draws: DEFAULT_MAX_DOCUMENT_DRAWS,
            synthetic_token_bound: DEFAULT_SYNTHETIC_TOKEN_BOUND,
            c4_validation_windows: DEFAULT_C4_VALIDATION_WINDOWS,
            cache_dir: None,
            progress: false,
        }
    }
}

impl LoaderConfig {
    pub fn builder(name: impl Into<String>) -> LoaderConfigBuilder {
        LoaderConfigBuilder {
            config: LoaderConfig {
                name: name.into(),
                ..Default::default()
            },
        }
    }

    /// Rejects parameter combinations that cannot produce a window.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.nsamples > 0,
            CorpusError::InvalidConfig("nsamples must be >= 1".into())
        );
        ensure!(
            self.seqlen > 0,
            CorpusError::InvalidConfig("seqlen must be >= 1".into())
        );
        ensure!(
            !self.model.trim().is_empty(),
            CorpusError::InvalidConfig("model id must not be empty".into())
        );
        ensure!(
            self.max_document_draws > 0,
            CorpusError::InvalidConfig("max_document_draws must be >= 1".into())
        );
        ensure!(
            self.synthetic_token_bound > 0,
            CorpusError::InvalidConfig(format!(
                "synthetic_token_bound must be positive, got {}",
                self.synthetic_token_bound
            ))
        );
        ensure!(
            self.c4_validation_windows > 0,
            CorpusError::InvalidConfig("c4_validation_windows must be >= 1".into())
        );
        Ok(())
    }
}

/// Builder for LoaderConfig with method chaining
pub struct LoaderConfigBuilder {
    config: LoaderConfig,
}

impl LoaderConfigBuilder {
    pub fn nsamples(mut self, nsamples: usize) -> Self {
        self.config.nsamples = nsamples;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn seqlen(mut self, seqlen: usize) -> Self {
        self.config.seqlen = seqlen;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn synthetic_data(mut self, synthetic: bool) -> Self {
        self.config.synthetic_data = synthetic;
        self
    }

    /// Set the Hub credential. Accepts `Option` so an env lookup can be passed straight in.
    pub fn hf_token(mut self, token: Option<String>) -> Self {
        self.config.hf_token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn max_document_draws(mut self, draws: usize) -> Self {
        self.config.max_document_draws = draws;
        self
    }

    pub fn synthetic_token_bound(mut self, bound: i64) -> Self {
        self.config.synthetic_token_bound = bound;
        self
    }

    pub fn c4_validation_windows(mut self, windows: usize) -> Self {
        self.config.c4_validation_windows = windows;
        self
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = Some(dir.into());
        self
    }

    pub fn progress(mut self, progress: bool) -> Self {
        self.config.progress = progress;
        self
    }

    /// Build the final configuration.
    pub fn build(self) -> LoaderConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = LoaderConfig::builder("wikitext2").model("gpt2").build();
        assert_eq!(config.nsamples, 128);
        assert_eq!(config.seqlen, 2048);
        assert_eq!(config.seed, 0);
        assert!(!config.synthetic_data);
        assert!(config.hf_token.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_token_is_treated_as_absent() {
        let config = LoaderConfig::builder("c4")
            .hf_token(Some(String::new()))
            .build();
        assert!(config.hf_token.is_none());
    }

    #[test]
    fn test_validate_rejects_zero_sizes() {
        for config in [
            LoaderConfig::builder("ptb").model("gpt2").nsamples(0).build(),
            LoaderConfig::builder("ptb").model("gpt2").seqlen(0).build(),
            LoaderConfig::builder("ptb").model("gpt2").max_document_draws(0).build(),
            LoaderConfig::builder("ptb").model("gpt2").synthetic_token_bound(0).build(),
            LoaderConfig::builder("ptb").build(),
        ] {
            let err = config.validate().unwrap_err();
            assert!(matches!(
                err.downcast_ref::<CorpusError>(),
                Some(CorpusError::InvalidConfig(_))
            ));
        }
    }
}
