use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use log::warn;
use tokio::task::block_in_place;

use crate::cli::SubCommandExtend;
use crate::config::{CorpusOptions, Opts};

#[derive(Parser, Debug, Clone)]
pub struct IndexCommand {
    #[command(flatten)]
    pub corpus: CorpusOptions,
    /// Ignore any existing cache and re-extract every image
    #[arg(long)]
    pub force: bool,
}

impl SubCommandExtend for IndexCommand {
    async fn run(&self, _opts: &Opts) -> anyhow::Result<()> {
        let mut processor = self.corpus.processor();

        // Ctrl-C aborts after the image currently being extracted
        let cancel = Arc::new(AtomicBool::new(false));
        tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("cancelling after the current image");
                    cancel.store(true, Ordering::Relaxed);
                }
            }
        });

        let report = block_in_place(|| {
            if self.force {
                processor.rebuild_with_cancel(&cancel)
            } else {
                processor.initialize_with_cancel(&cancel)
            }
        })?;

        println!(
            "indexed {} images (+{} -{}, {} kept, {} skipped) -> {}",
            processor.metadata()?.len(),
            report.added,
            report.removed,
            report.kept,
            report.skipped,
            processor.metadata_cache_file().display()
        );
        Ok(())
    }
}
