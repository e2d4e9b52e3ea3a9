use anyhow::Result;
use calibration_data::{get_loaders, LoaderConfig, IGNORE_INDEX};
use clap::Parser;
use std::path::PathBuf;

/// Draw calibration windows and a validation stream from WikiText-2, PTB or C4.
#[derive(Parser, Debug)]
#[command(name = "calibration-data", version, about)]
struct Cli {
    /// Dataset selector: any name containing `wikitext2`, `ptb` or `c4`
    #[arg(long)]
    dataset: String,

    /// Model id whose tokenizer is used (e.g. meta-llama/Llama-2-7b-hf)
    #[arg(long)]
    model: String,

    #[arg(long, default_value_t = calibration_data::config::DEFAULT_NSAMPLES)]
    nsamples: usize,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long, default_value_t = calibration_data::config::DEFAULT_SEQLEN)]
    seqlen: usize,

    /// C4 only: random token ids instead of real text
    #[arg(long)]
    synthetic: bool,

    /// Hugging Face token for gated models
    #[arg(long, env = "HF_TOKEN", hide_env_values = true)]
    hf_token: Option<String>,

    /// Hub cache directory (defaults to ~/.cache/huggingface/hub)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Give up on C4 rejection sampling after this many document draws per window
    #[arg(long, default_value_t = calibration_data::config::DEFAULT_MAX_DOCUMENT_DRAWS)]
    max_document_draws: usize,

    /// Exclusive upper bound for synthetic token ids
    #[arg(long, default_value_t = calibration_data::config::DEFAULT_SYNTHETIC_TOKEN_BOUND)]
    synthetic_token_bound: i64,

    /// C4 only: windows concatenated into the validation stream
    #[arg(long, default_value_t = calibration_data::config::DEFAULT_C4_VALIDATION_WINDOWS)]
    c4_validation_windows: usize,

    /// Show download progress bars
    #[arg(long)]
    progress: bool,
}

impl Cli {
    fn into_config(self) -> LoaderConfig {
        let mut builder = LoaderConfig::builder(self.dataset)
            .model(self.model)
            .nsamples(self.nsamples)
            .seed(self.seed)
            .seqlen(self.seqlen)
            .synthetic_data(self.synthetic)
            .hf_token(self.hf_token)
            .max_document_draws(self.max_document_draws)
            .synthetic_token_bound(self.synthetic_token_bound)
            .c4_validation_windows(self.c4_validation_windows)
            .progress(self.progress);
        if let Some(dir) = self.cache_dir {
            builder = builder.cache_dir(dir);
        }
        builder.build()
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("calibration_data=info")),
        )
        .init();

    let config = Cli::parse().into_config();
    let (train, validation, tokenizer) = get_loaders(&config)?;

    let masked = match train.get(0) {
        Some(sample) => {
            let targets = Vec::<i64>::try_from(sample.target_ids()?.view([-1]))?;
            targets.iter().filter(|&&t| t == IGNORE_INDEX).count()
        }
        None => 0,
    };
    let shape = match train.get(0) {
        Some(sample) => sample.input_ids()?.size(),
        None => Vec::new(),
    };

    println!("dataset:            {}", train.metadata("dataset").unwrap_or("?"));
    println!("training windows:   {} x {:?}", train.len(), shape);
    println!("masked targets:     {} per window", masked);
    println!("validation tokens:  {}", validation.len());
    println!(
        "eval windows:       {} of {} tokens",
        validation.num_eval_windows(config.seqlen),
        config.seqlen
    );
    println!("tokenizer vocab:    {}", tokenizer.get_vocab_size(true));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_reaches_every_tunable() {
        let cli = Cli::try_parse_from([
            "calibration-data",
            "--dataset",
            "c4",
            "--model",
            "gpt2",
            "--seqlen",
            "512",
            "--c4-validation-windows",
            "32",
            "--max-document-draws",
            "100",
            "--cache-dir",
            "/tmp/hub",
        ])
        .unwrap();
        let config = cli.into_config();

        assert_eq!(config.seqlen, 512);
        assert_eq!(config.c4_validation_windows, 32);
        assert_eq!(config.max_document_draws, 100);
        assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/hub")));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_defaults_match_library_defaults() {
        let cli = Cli::try_parse_from(["calibration-data", "--dataset", "ptb", "--model", "gpt2"])
            .unwrap();
        let config = cli.into_config();

        assert_eq!(config.nsamples, calibration_data::config::DEFAULT_NSAMPLES);
        assert_eq!(
            config.c4_validation_windows,
            calibration_data::config::DEFAULT_C4_VALIDATION_WINDOWS
        );
        assert!(!config.synthetic_data);
    }
}
