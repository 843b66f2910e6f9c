use clap::Parser;
use tokio::task::block_in_place;

use crate::cli::SubCommandExtend;
use crate::config::{CorpusOptions, Opts};

#[derive(Parser, Debug, Clone)]
pub struct ShowCommand {
    #[command(flatten)]
    pub corpus: CorpusOptions,
}

impl SubCommandExtend for ShowCommand {
    async fn run(&self, _opts: &Opts) -> anyhow::Result<()> {
        let mut processor = self.corpus.processor();
        block_in_place(|| processor.initialize())?;

        println!("base path : {}", processor.base_path().display());
        println!("cache file: {}", processor.metadata_cache_file().display());
        let records = processor.metadata()?;
        println!("indexed   : {} images", records.len());
        for record in records {
            println!(
                "{}\t[{}]\t{}",
                record.filename,
                record.colors.join(", "),
                record.visual_features.texture.texture_type
            );
        }
        Ok(())
    }
}
