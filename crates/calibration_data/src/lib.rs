pub mod config;
pub mod corpus;
pub mod dataset;
pub mod error;
pub mod loaders;
pub mod readers;
pub mod sample;
pub mod sampler;
pub mod tokenizer;

pub use config::LoaderConfig;
pub use corpus::{CorpusProvider, DatasetName, Split};
pub use dataset::{TrainSet, ValidationStream};
pub use error::CorpusError;
pub use loaders::{get_loaders, get_loaders_with, Loaders};
pub use sample::{Sample, IGNORE_INDEX};
pub use tokenizer::TokenizerProvider;
