//! src/loaders.rs
//!
//! `get_loaders`: dataset dispatch and the per-corpus sampling procedures.
//!
//! ```text
//!  LoaderConfig ──> DatasetName ──┬─ WikiText-2 / PTB: tokenize whole split ─> WindowSampler
//!                                 ├─ C4 (real):        per-document draws ────> DocumentSampler
//!                                 └─ C4 (synthetic):   random ids, no corpus fetch
//!                                                  │
//!                                                  ↓
//!                          (TrainSet, ValidationStream, Tokenizer)
//! ```
//!
//! Randomness: the training draws use an RNG seeded with `config.seed`. The C4
//! validation draws use a second RNG seeded with [`VALIDATION_SEED`], so the
//! validation stream is the same for every training seed.

use crate::config::LoaderConfig;
use crate::corpus::{CorpusProvider, DatasetName, HubCorpusProvider, HubSettings, Split};
use crate::dataset::{TrainSet, ValidationStream};
use crate::sample::Sample;
use crate::sampler::{seeded_rng, DocumentSampler, WindowSampler, VALIDATION_SEED};
use crate::tokenizer::{without_length_limits, HubTokenizerProvider, Tokenize, TokenizerProvider};
use anyhow::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use tokenizers::Tokenizer;

/// Length of the synthetic C4 validation stream.
pub const SYNTHETIC_VALIDATION_TOKENS: usize = 524_288;

/// The three results of a load: calibration windows, eval stream, tokenizer.
pub type Loaders = (TrainSet, ValidationStream, Tokenizer);

/// Loads a corpus from the Hugging Face Hub and samples it.
///
/// # Example
/// ```ignore
/// let config = LoaderConfig::builder("wikitext2")
///     .model("meta-llama/Llama-2-7b-hf")
///     .nsamples(128)
///     .seqlen(2048)
///     .hf_token(std::env::var("HF_TOKEN").ok())
///     .build();
/// let (train, validation, tokenizer) = get_loaders(&config)?;
/// ```
pub fn get_loaders(config: &LoaderConfig) -> Result<Loaders> {
    let settings = HubSettings::from_config(config);
    let corpus = HubCorpusProvider::new(settings.clone(), config.hf_token.clone());
    let tokenizers = HubTokenizerProvider::new(settings);
    get_loaders_with(config, &corpus, &tokenizers)
}

/// Same as [`get_loaders`] with caller-supplied collaborators.
pub fn get_loaders_with(
    config: &LoaderConfig,
    corpus: &dyn CorpusProvider,
    tokenizers: &dyn TokenizerProvider,
) -> Result<Loaders> {
    let dataset: DatasetName = config.name.parse()?;
    config.validate()?;

    tracing::info!(
        "Preparing {} (nsamples={}, seqlen={}, seed={}, model={})",
        dataset,
        config.nsamples,
        config.seqlen,
        config.seed,
        config.model
    );

    let (train, validation, tokenizer) = match dataset {
        DatasetName::WikiText2 | DatasetName::Ptb => {
            load_contiguous(dataset, config, corpus, tokenizers)?
        }
        DatasetName::C4 if config.synthetic_data => load_c4_synthetic(config, tokenizers)?,
        DatasetName::C4 => load_c4(config, corpus, tokenizers)?,
    };

    tracing::info!(
        "{}: {} training windows, validation stream of {} tokens",
        dataset,
        train.len(),
        validation.len()
    );

    let train = train
        .with_metadata("dataset", dataset.as_str())
        .with_metadata("seed", config.seed.to_string())
        .with_metadata("seqlen", config.seqlen.to_string())
        .with_metadata(
            "synthetic",
            (config.synthetic_data && dataset == DatasetName::C4).to_string(),
        );
    Ok((train, validation, tokenizer))
}

fn load_tokenizer(config: &LoaderConfig, tokenizers: &dyn TokenizerProvider) -> Result<Tokenizer> {
    let tokenizer = tokenizers.load(&config.model, config.hf_token.as_deref())?;
    without_length_limits(tokenizer, &config.model)
}

/// WikiText-2 and PTB: tokenize each split once, draw windows from the train stream,
/// return the eval split unwindowed.
fn load_contiguous(
    dataset: DatasetName,
    config: &LoaderConfig,
    corpus: &dyn CorpusProvider,
    tokenizers: &dyn TokenizerProvider,
) -> Result<Loaders> {
    let eval_split = dataset.eval_split();
    let train_docs = corpus.load_split(dataset, Split::Train)?;
    let eval_docs = corpus.load_split(dataset, eval_split)?;

    let tokenizer = load_tokenizer(config, tokenizers)?;
    let tokenize = Tokenize::new(&tokenizer);

    let train_tokens = tokenize.joined(&train_docs)?;
    let eval_tokens = tokenize.joined(&eval_docs)?;
    tracing::debug!(
        "{}: {} train tokens, {} {} tokens",
        dataset,
        train_tokens.len(),
        eval_tokens.len(),
        eval_split
    );

    let sampler = WindowSampler::new(train_tokens.len(), config.seqlen, Split::Train.as_str())?;
    let mut rng = seeded_rng(config.seed);
    let samples = (0..config.nsamples)
        .map(|_| Sample::from_window(&train_tokens[sampler.draw(&mut rng)]))
        .collect::<Result<Vec<_>>>()?;

    let validation = ValidationStream::from_ids(&eval_tokens);
    Ok((TrainSet::new(samples), validation, tokenizer))
}

/// C4: rejection-sample documents for both the training windows and the
/// validation stream.
fn load_c4(
    config: &LoaderConfig,
    corpus: &dyn CorpusProvider,
    tokenizers: &dyn TokenizerProvider,
) -> Result<Loaders> {
    tracing::info!("Loading C4 real dataset");
    let train_docs = corpus.load_split(DatasetName::C4, Split::Train)?;
    let eval_docs = corpus.load_split(DatasetName::C4, Split::Validation)?;

    let tokenizer = load_tokenizer(config, tokenizers)?;
    let tokenize = Tokenize::new(&tokenizer);

    let train_sampler = DocumentSampler::new(
        &train_docs,
        tokenize,
        config.seqlen,
        config.max_document_draws,
        Split::Train.as_str(),
    )?;
    let mut rng = seeded_rng(config.seed);
    let samples = (0..config.nsamples)
        .map(|_| train_sampler.draw(&mut rng).and_then(|w| Sample::from_window(&w)))
        .collect::<Result<Vec<_>>>()?;

    let eval_sampler = DocumentSampler::new(
        &eval_docs,
        tokenize,
        config.seqlen,
        config.max_document_draws,
        Split::Validation.as_str(),
    )?;
    let mut rng = seeded_rng(VALIDATION_SEED);
    let mut eval_tokens = Vec::new();
    for _ in 0..config.c4_validation_windows {
        eval_tokens.extend(eval_sampler.draw(&mut rng)?);
    }

    let validation = ValidationStream::from_ids(&eval_tokens);
    Ok((TrainSet::new(samples), validation, tokenizer))
}

/// C4 synthetic: shape-compatible random data for benchmarking, no corpus fetch.
fn load_c4_synthetic(config: &LoaderConfig, tokenizers: &dyn TokenizerProvider) -> Result<Loaders> {
    tracing::info!("Loading C4 synthetic dataset");
    let tokenizer = load_tokenizer(config, tokenizers)?;

    let mut rng = seeded_rng(config.seed);
    let samples = (0..config.nsamples)
        .map(|_| {
            let ids: Vec<i64> = (0..config.seqlen)
                .map(|_| rng.random_range(0..config.synthetic_token_bound))
                .collect();
            Sample::synthetic(&ids)
        })
        .collect();

    let mut rng = seeded_rng(VALIDATION_SEED);
    let mut permutation: Vec<i64> = (0..SYNTHETIC_VALIDATION_TOKENS as i64).collect();
    permutation.shuffle(&mut rng);

    let validation = ValidationStream::from_ids(&permutation);
    Ok((TrainSet::new(samples), validation, tokenizer))
}
