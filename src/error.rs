use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The image could not be decoded. Recovered by skipping the file.
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// The image decoded but has zero width or height.
    #[error("image has zero spatial extent")]
    EmptyImage,
    /// The metadata cache exists but does not parse. Recovered by rebuilding.
    #[error("metadata cache is corrupt: {0}")]
    CacheCorrupt(#[from] serde_json::Error),
    /// A query was issued before `initialize` completed.
    #[error("dataset processor is not initialized")]
    NotInitialized,
    /// The query contained no usable tokens.
    #[error("query is empty")]
    EmptyQuery,
    /// Indexing was cancelled before reconciliation finished.
    #[error("indexing cancelled")]
    Cancelled,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
