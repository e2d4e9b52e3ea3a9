use crate::corpus::HubSettings;
use crate::error::CorpusError;
use anyhow::Result;
use tokenizers::Tokenizer;

/// Anything that can turn a model id (plus optional credential) into a tokenizer.
///
/// Implementations:
/// - [`HubTokenizerProvider`]: downloads `tokenizer.json` from the model repo
/// - tests provide an in-memory word-level tokenizer
pub trait TokenizerProvider {
    fn load(&self, model: &str, hf_token: Option<&str>) -> Result<Tokenizer>;
}

/// Fetches `tokenizer.json` from a Hugging Face model repo.
///
/// The file is cached by hf-hub, so repeated calibration runs only hit the
/// network once. Gated repos (e.g. Llama) need `hf_token`.
#[derive(Debug, Clone, Default)]
pub struct HubTokenizerProvider {
    settings: HubSettings,
}

impl HubTokenizerProvider {
    pub fn new(settings: HubSettings) -> Self {
        Self { settings }
    }
}

impl TokenizerProvider for HubTokenizerProvider {
    fn load(&self, model: &str, hf_token: Option<&str>) -> Result<Tokenizer> {
        let load_error = |reason: String| CorpusError::TokenizerLoad {
            model: model.to_string(),
            reason,
        };

        tracing::info!(
            "Loading tokenizer for '{}' ({})",
            model,
            if hf_token.is_some() {
                "authenticated"
            } else {
                "anonymous"
            }
        );

        let api = self
            .settings
            .api(hf_token)
            .map_err(|e| load_error(e.to_string()))?;
        let path = api
            .model(model.to_string())
            .get("tokenizer.json")
            .map_err(|e| load_error(e.to_string()))?;

        let tokenizer = Tokenizer::from_file(&path).map_err(|e| {
            load_error(format!("cannot parse '{}': {}", path.display(), e))
        })?;

        tracing::debug!(
            "Tokenizer for '{}' has {} entries",
            model,
            tokenizer.get_vocab_size(true)
        );
        Ok(tokenizer)
    }
}

/// Clears any truncation or padding stored in `tokenizer.json`.
///
/// Whole splits are encoded as one text and documents are length-checked
/// before windowing, so every encoding must keep its natural length.
pub fn without_length_limits(mut tokenizer: Tokenizer, model: &str) -> Result<Tokenizer> {
    tokenizer
        .with_truncation(None)
        .map_err(|e| CorpusError::TokenizerLoad {
            model: model.to_string(),
            reason: format!("cannot disable truncation: {}", e),
        })?;
    tokenizer.with_padding(None);
    Ok(tokenizer)
}

/// ===========================================================================
/// Tokenize text into `i64` token ids.
///
/// Wraps a HuggingFace [`Tokenizer`] and applies its special tokens the way
/// the model expects them (e.g. a leading BOS for Llama tokenizers).
///
/// # Example
/// ```ignore
/// let tokenize = Tokenize::new(&tokenizer);
/// let ids = tokenize.ids("Hello world!")?;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Tokenize<'a> {
    tokenizer: &'a Tokenizer,
}

impl<'a> Tokenize<'a> {
    pub fn new(tokenizer: &'a Tokenizer) -> Self {
        Self { tokenizer }
    }

    pub fn ids(&self, text: &str) -> Result<Vec<i64>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| CorpusError::Tokenization(e.to_string()))?;

        Ok(encoding.get_ids().iter().map(|&id| id as i64).collect())
    }

    /// Joins documents with a blank line and tokenizes the result in one pass.
    pub fn joined(&self, documents: &[String]) -> Result<Vec<i64>> {
        self.ids(&documents.join("\n\n"))
    }
}
