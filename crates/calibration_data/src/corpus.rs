//! src/corpus.rs
//!
//! Which corpora exist, where their splits live, and how raw documents are
//! fetched.
//!
//! ```text
//!  name ("wikitext2-calib")
//!        │  DatasetName::from_str (substring match)
//!        ↓
//!  DatasetName ──source(split)──> CorpusFile (repo, revision, path, format)
//!        │
//!        ↓ CorpusProvider::load_split
//!  Vec<String> documents (one per row / JSON line)
//! ```

use crate::config::LoaderConfig;
use crate::error::CorpusError;
use crate::readers::{DataSource, JsonlSource, ParquetSource};
use anyhow::{Context, Result};
use hf_hub::api::sync::{Api, ApiBuilder};
use hf_hub::{Repo, RepoType};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Rows decoded per Parquet record batch.
const PARQUET_BATCH_SIZE: usize = 4096;

/// The supported corpora. Closed set: anything else is a configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetName {
    WikiText2,
    Ptb,
    C4,
}

impl DatasetName {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetName::WikiText2 => "wikitext2",
            DatasetName::Ptb => "ptb",
            DatasetName::C4 => "c4",
        }
    }

    /// The split the validation stream is built from.
    pub fn eval_split(&self) -> Split {
        match self {
            DatasetName::WikiText2 => Split::Test,
            DatasetName::Ptb | DatasetName::C4 => Split::Validation,
        }
    }

    /// Location of a split on the Hugging Face Hub.
    pub fn source(&self, split: Split) -> Option<CorpusFile> {
        let file = match (self, split) {
            (DatasetName::WikiText2, Split::Train) => CorpusFile::parquet(
                "Salesforce/wikitext",
                "main",
                "wikitext-2-raw-v1/train-00000-of-00001.parquet",
                "text",
            ),
            (DatasetName::WikiText2, Split::Test) => CorpusFile::parquet(
                "Salesforce/wikitext",
                "main",
                "wikitext-2-raw-v1/test-00000-of-00001.parquet",
                "text",
            ),
            // The PTB repo is script-based; the Hub serves its Parquet conversion
            (DatasetName::Ptb, Split::Train) => CorpusFile::parquet(
                "ptb-text-only/ptb_text_only",
                "refs/convert/parquet",
                "penn_treebank/train/0000.parquet",
                "sentence",
            ),
            (DatasetName::Ptb, Split::Validation) => CorpusFile::parquet(
                "ptb-text-only/ptb_text_only",
                "refs/convert/parquet",
                "penn_treebank/validation/0000.parquet",
                "sentence",
            ),
            (DatasetName::C4, Split::Train) => CorpusFile::json_lines(
                "allenai/c4",
                "main",
                "en/c4-train.00000-of-01024.json.gz",
            ),
            (DatasetName::C4, Split::Validation) => CorpusFile::json_lines(
                "allenai/c4",
                "main",
                "en/c4-validation.00000-of-00008.json.gz",
            ),
            _ => return None,
        };
        Some(file)
    }
}

/// Matches by substring in priority order `wikitext2`, `ptb`, `c4`, so names
/// like `"wikitext2_llama"` select WikiText-2.
impl FromStr for DatasetName {
    type Err = CorpusError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        [DatasetName::WikiText2, DatasetName::Ptb, DatasetName::C4]
            .into_iter()
            .find(|dataset| name.contains(dataset.as_str()))
            .ok_or_else(|| CorpusError::UnknownDataset(name.to_string()))
    }
}

impl fmt::Display for DatasetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Validation,
    Test,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Validation => "validation",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Parquet file, documents in the named string column
    Parquet { column: &'static str },
    /// Gzipped JSON lines, documents in the `text` field
    JsonLines,
}

/// A single dataset file in a Hub dataset repo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorpusFile {
    pub repo: &'static str,
    pub revision: &'static str,
    pub path: &'static str,
    pub format: FileFormat,
}

impl CorpusFile {
    const fn parquet(
        repo: &'static str,
        revision: &'static str,
        path: &'static str,
        column: &'static str,
    ) -> Self {
        Self {
            repo,
            revision,
            path,
            format: FileFormat::Parquet { column },
        }
    }

    const fn json_lines(repo: &'static str, revision: &'static str, path: &'static str) -> Self {
        Self {
            repo,
            revision,
            path,
            format: FileFormat::JsonLines,
        }
    }

    /// Reads every document of an already-downloaded copy of this file.
    pub fn read_documents(&self, local: impl Into<PathBuf>) -> Result<Vec<String>> {
        match self.format {
            FileFormat::Parquet { column } => {
                ParquetSource::new(local, column, PARQUET_BATCH_SIZE).read_all()
            }
            FileFormat::JsonLines => JsonlSource::new(local).read_all(),
        }
    }
}

/// Anything that can hand back the raw documents of a dataset split, in order.
///
/// Implementations:
/// - [`HubCorpusProvider`]: downloads from the Hugging Face Hub
/// - tests provide in-memory corpora
pub trait CorpusProvider {
    fn load_split(&self, dataset: DatasetName, split: Split) -> Result<Vec<String>>;
}

/// How the Hub is reached: cache location and progress display.
#[derive(Debug, Clone, Default)]
pub struct HubSettings {
    pub cache_dir: Option<PathBuf>,
    pub progress: bool,
}

impl HubSettings {
    pub fn from_config(config: &LoaderConfig) -> Self {
        Self {
            cache_dir: config.cache_dir.clone(),
            progress: config.progress,
        }
    }

    pub(crate) fn api(&self, token: Option<&str>) -> Result<Api> {
        let mut builder = ApiBuilder::new()
            .with_progress(self.progress)
            .with_token(token.map(str::to_string));
        if let Some(dir) = &self.cache_dir {
            builder = builder.with_cache_dir(dir.clone());
        }
        builder.build().context("Failed to initialise the Hugging Face Hub client")
    }
}

/// Downloads dataset files through hf-hub (cached on disk) and reads their documents.
#[derive(Debug, Clone, Default)]
pub struct HubCorpusProvider {
    settings: HubSettings,
    hf_token: Option<String>,
}

impl HubCorpusProvider {
    pub fn new(settings: HubSettings, hf_token: Option<String>) -> Self {
        Self { settings, hf_token }
    }

    fn fetch(&self, file: &CorpusFile) -> Result<PathBuf> {
        let api = self.settings.api(self.hf_token.as_deref())?;
        let repo = api.repo(Repo::with_revision(
            file.repo.to_string(),
            RepoType::Dataset,
            file.revision.to_string(),
        ));
        Ok(repo.get(file.path)?)
    }
}

impl CorpusProvider for HubCorpusProvider {
    fn load_split(&self, dataset: DatasetName, split: Split) -> Result<Vec<String>> {
        let what = format!("{} {} split", dataset, split);
        let file = dataset.source(split).ok_or_else(|| CorpusError::Fetch {
            what: what.clone(),
            source: format!("{} has no {} split", dataset, split).into(),
        })?;

        tracing::info!("Fetching {} from {}:{}", what, file.repo, file.path);
        let documents = self
            .fetch(&file)
            .and_then(|local| file.read_documents(local))
            .map_err(|e| CorpusError::Fetch {
                what: what.clone(),
                source: e.into(),
            })?;

        tracing::info!("Loaded {} documents for {}", documents.len(), what);
        Ok(documents)
    }
}
