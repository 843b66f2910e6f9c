pub mod cli;
pub mod color;
pub mod config;
pub mod error;
pub mod extract;
pub mod processor;
mod query;
pub mod record;
pub mod texture;
pub mod utils;

pub use config::Opts;
pub use error::{Error, Result};
pub use extract::FeatureExtractor;
pub use processor::{DatasetProcessor, IndexReport};
pub use record::{ImageRecord, SimilarityResult};
