use anyhow::Result;
use clap::{Parser, ValueEnum};
use tokio::task::block_in_place;

use crate::cli::SubCommandExtend;
use crate::config::{CorpusOptions, Opts};
use crate::record::SimilarityResult;

#[derive(Parser, Debug, Clone)]
pub struct SearchCommand {
    #[command(flatten)]
    pub corpus: CorpusOptions,
    /// Free-text query, e.g. "blue dress casual"
    pub query: String,
    /// Maximum number of results
    #[arg(long, value_name = "COUNT", default_value_t = 10)]
    pub count: usize,
    /// Output format
    #[arg(long, value_name = "FORMAT", value_enum, default_value = "table")]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for SearchCommand {
    async fn run(&self, _opts: &Opts) -> anyhow::Result<()> {
        let mut processor = self.corpus.processor();
        // cache hit expected here; extraction only runs for unindexed files
        block_in_place(|| processor.initialize())?;

        let results = processor.find_similar_outfits(&self.query, Some(self.count))?;
        print_result(&results, self)
    }
}

fn print_result(results: &[SimilarityResult], opts: &SearchCommand) -> Result<()> {
    match opts.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(results)?)
        }
        OutputFormat::Table => {
            for result in results {
                println!(
                    "{:.3}\t{}\t[{}]\t{}",
                    result.similarity_score,
                    result.record.filename,
                    result.record.colors.join(", "),
                    result.record.visual_features.texture.texture_type
                );
            }
        }
    }
    Ok(())
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Table,
}
