use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::*;
use crate::processor::{DatasetProcessor, DEFAULT_SUFFIXES};

#[derive(Parser, Debug, Clone)]
#[command(name = "wardrobe", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// Extract visual features for every image under a directory and cache them
    Index(IndexCommand),
    /// Rank indexed images against a free-text query
    Search(SearchCommand),
    /// Print diagnostics for the cached index
    Show(ShowCommand),
}

/// Options shared by every subcommand that touches a corpus.
#[derive(Parser, Debug, Clone)]
pub struct CorpusOptions {
    /// Root directory of the image corpus
    pub path: PathBuf,
    /// Metadata cache file, defaults to <PATH>/.wardrobe-metadata.json
    #[arg(short, long, value_name = "FILE")]
    pub cache: Option<PathBuf>,
    /// File suffixes to index, comma separated
    #[arg(short, long, value_name = "SUFFIXES", default_value = DEFAULT_SUFFIXES)]
    pub suffix: String,
}

impl CorpusOptions {
    pub fn processor(&self) -> DatasetProcessor {
        let mut processor =
            DatasetProcessor::new(&self.path).with_suffixes(&self.suffix);
        if let Some(cache) = &self.cache {
            processor = processor.with_cache_file(cache);
        }
        processor
    }
}
