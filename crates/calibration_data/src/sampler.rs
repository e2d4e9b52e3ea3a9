use crate::error::CorpusError;
use crate::tokenizer::Tokenize;
use anyhow::{ensure, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::ops::Range;

/// Seed used for the C4 validation draws, regardless of the caller's seed.
pub const VALIDATION_SEED: u64 = 0;

/// Accepted draws slower than this are logged as a warning.
const SLOW_DRAW_ATTEMPTS: usize = 1_000;

/// Creates the owned RNG for one sequence of draws.
///
/// Every call site gets its own generator, so training draws and the C4
/// validation draws never consume each other's random stream.
#[inline]
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Draws a window start uniformly from `[0, len - seqlen - 1]`.
///
/// The last possible start (`len - seqlen`) is never drawn. When
/// `len == seqlen` the only window starts at 0.
#[inline]
pub fn draw_window_start(rng: &mut StdRng, len: usize, seqlen: usize) -> usize {
    let max_start = len.saturating_sub(seqlen + 1);
    rng.random_range(0..=max_start)
}

/// ============================================================================
/// Draws fixed-length windows from one long token stream.
///
/// Used for WikiText-2 and PTB, where each split is tokenized once as a whole.
///
/// # Arguments:
/// - `total_tokens`: Length of the tokenized split
/// - `seqlen`: Window length. Must not exceed `total_tokens`.
/// - `split`: Label for error messages
///
/// # Example
/// ```ignore
/// let sampler = WindowSampler::new(tokens.len(), 2048, "train")?;
/// let mut rng = seeded_rng(seed);
/// let window = &tokens[sampler.draw(&mut rng)];
/// ```
#[derive(Debug, Clone)]
pub struct WindowSampler {
    total_tokens: usize,
    seqlen: usize,
}

impl WindowSampler {
    pub fn new(total_tokens: usize, seqlen: usize, split: &str) -> Result<Self> {
        ensure!(seqlen > 0, "seqlen must be > 0, but got seqlen={}", seqlen);
        ensure!(
            total_tokens >= seqlen,
            CorpusError::CorpusTooShort {
                split: split.to_string(),
                tokens: total_tokens,
                seqlen,
            }
        );
        Ok(Self {
            total_tokens,
            seqlen,
        })
    }

    /// Token range of the next window.
    pub fn draw(&self, rng: &mut StdRng) -> Range<usize> {
        let start = draw_window_start(rng, self.total_tokens, self.seqlen);
        start..start + self.seqlen
    }
}

/// ============================================================================
/// Draws fixed-length windows from a pool of documents by rejection sampling.
///
/// Used for C4, where documents are tokenized one at a time:
/// 1. Pick a document index uniformly from the pool.
/// 2. Tokenize it. If it has fewer than `seqlen` tokens, reject and go to 1.
/// 3. Draw a window start inside the document (see [`draw_window_start`]).
///
/// Step 1 is attempted at most `max_draws` times per window; past that the
/// draw fails with [`CorpusError::NoEligibleDocument`] instead of spinning on a
/// pool where no document is long enough.
pub struct DocumentSampler<'a> {
    documents: &'a [String],
    tokenize: Tokenize<'a>,
    seqlen: usize,
    max_draws: usize,
    split: &'a str,
}

impl<'a> DocumentSampler<'a> {
    pub fn new(
        documents: &'a [String],
        tokenize: Tokenize<'a>,
        seqlen: usize,
        max_draws: usize,
        split: &'a str,
    ) -> Result<Self> {
        ensure!(seqlen > 0, "seqlen must be > 0, but got seqlen={}", seqlen);
        ensure!(
            !documents.is_empty(),
            CorpusError::NoEligibleDocument {
                split: split.to_string(),
                seqlen,
                draws: 0,
            }
        );
        Ok(Self {
            documents,
            tokenize,
            seqlen,
            max_draws: max_draws.max(1),
            split,
        })
    }

    /// Token ids of the next window, exactly `seqlen` long.
    pub fn draw(&self, rng: &mut StdRng) -> Result<Vec<i64>> {
        for attempt in 1..=self.max_draws {
            let index = rng.random_range(0..self.documents.len());
            let tokens = self.tokenize.ids(&self.documents[index])?;
            if tokens.len() < self.seqlen {
                continue;
            }

            let start = draw_window_start(rng, tokens.len(), self.seqlen);
            if attempt > SLOW_DRAW_ATTEMPTS {
                tracing::warn!(
                    "{} draw needed {} attempts to find a document of >= {} tokens",
                    self.split,
                    attempt,
                    self.seqlen
                );
            }
            tracing::debug!(
                "{} draw: document {} ({} tokens) accepted after {} attempt(s), start {}",
                self.split,
                index,
                tokens.len(),
                attempt,
                start
            );
            return Ok(tokens[start..start + self.seqlen].to_vec());
        }

        Err(CorpusError::NoEligibleDocument {
            split: self.split.to_string(),
            seqlen: self.seqlen,
            draws: self.max_draws,
        }
        .into())
    }
}
