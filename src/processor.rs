use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::unbounded;
use indicatif::ProgressBar;
use log::{debug, info, warn};
use regex::Regex;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::extract::FeatureExtractor;
use crate::query;
use crate::record::{ImageRecord, SimilarityResult};
use crate::utils::pb_style;

/// Default cache location, relative to the corpus root.
pub const DEFAULT_CACHE_FILE: &str = ".wardrobe-metadata.json";

/// Recognized image suffixes; anything else under the corpus root is skipped.
pub const DEFAULT_SUFFIXES: &str = "jpg,jpeg,png,gif,webp,bmp";

/// Counts from one reconciliation pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct IndexReport {
    /// Newly extracted records.
    pub added: usize,
    /// Cached records whose source file no longer exists.
    pub removed: usize,
    /// Cached records reused without re-extraction.
    pub kept: usize,
    /// Files that failed to decode and were skipped.
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Uninitialized,
    Ready,
}

/// Owns the corpus index: discovers images under `base_path`, drives the
/// feature extractor for uncached files, and persists the collection to
/// `metadata_cache_file`. The in-memory collection and the cache file have no
/// other writer.
pub struct DatasetProcessor {
    base_path: PathBuf,
    metadata_cache_file: PathBuf,
    fashion_images_metadata: Vec<ImageRecord>,
    extractor: FeatureExtractor,
    suffixes: Regex,
    state: State,
}

impl DatasetProcessor {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        let base_path = base_path.as_ref().to_path_buf();
        let metadata_cache_file = base_path.join(DEFAULT_CACHE_FILE);
        Self {
            base_path,
            metadata_cache_file,
            fashion_images_metadata: Vec::new(),
            extractor: FeatureExtractor::new(),
            suffixes: suffix_regex(DEFAULT_SUFFIXES),
            state: State::Uninitialized,
        }
    }

    pub fn with_cache_file(mut self, path: impl AsRef<Path>) -> Self {
        self.metadata_cache_file = path.as_ref().to_path_buf();
        self
    }

    /// Comma-separated suffix allow-list, e.g. `"jpg,png"`.
    pub fn with_suffixes(mut self, suffixes: &str) -> Self {
        self.suffixes = suffix_regex(suffixes);
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn metadata_cache_file(&self) -> &Path {
        &self.metadata_cache_file
    }

    /// The indexed records, in filename order. Fails before initialization.
    pub fn metadata(&self) -> Result<&[ImageRecord]> {
        self.ensure_ready()?;
        Ok(&self.fashion_images_metadata)
    }

    /// Load the cache if possible, reconcile it against the files currently
    /// under `base_path`, extract whatever is missing and persist the result
    /// if anything changed. Idempotent: a second run over an unchanged corpus
    /// extracts nothing and leaves the cache file untouched.
    pub fn initialize(&mut self) -> Result<IndexReport> {
        self.reconcile(false, None)
    }

    /// `initialize`, checking `cancel` between images. A cancelled run
    /// persists nothing and leaves the processor unready.
    pub fn initialize_with_cancel(&mut self, cancel: &AtomicBool) -> Result<IndexReport> {
        self.reconcile(false, Some(cancel))
    }

    /// Ignore any existing cache and re-extract the whole corpus.
    pub fn rebuild(&mut self) -> Result<IndexReport> {
        self.reconcile(true, None)
    }

    pub fn rebuild_with_cancel(&mut self, cancel: &AtomicBool) -> Result<IndexReport> {
        self.reconcile(true, Some(cancel))
    }

    /// Rank every indexed record against a free-text query, best match first.
    /// Only valid once initialization has completed.
    pub fn find_similar_outfits(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<SimilarityResult>> {
        self.ensure_ready()?;
        query::rank(query, &self.fashion_images_metadata, limit)
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.state {
            State::Ready => Ok(()),
            State::Uninitialized => Err(Error::NotInitialized),
        }
    }

    fn reconcile(&mut self, force: bool, cancel: Option<&AtomicBool>) -> Result<IndexReport> {
        let listing = self.discover()?;
        debug!("{} image files under {}", listing.len(), self.base_path.display());

        let cached = if force { Vec::new() } else { self.load_cache() };
        let mut by_name: HashMap<String, ImageRecord> =
            cached.into_iter().map(|r| (r.filename.clone(), r)).collect();

        let mut records = Vec::with_capacity(listing.len());
        let mut to_extract = Vec::new();
        for (filename, path) in listing {
            match by_name.remove(&filename) {
                Some(record) => records.push(record),
                None => to_extract.push((filename, path)),
            }
        }
        let removed = by_name.len();
        let kept = records.len();

        let mut skipped = 0usize;
        if !to_extract.is_empty() {
            info!("extracting features for {} new images", to_extract.len());
            let extractor = &self.extractor;
            let pb = ProgressBar::new(to_extract.len() as u64).with_style(pb_style());
            let (tx, rx) = unbounded();
            // Extraction fans out over the rayon pool; the channel funnels
            // results back so this thread stays the only writer of `records`.
            rayon::scope(|s| {
                for (filename, path) in to_extract {
                    let tx = tx.clone();
                    let pb = pb.clone();
                    s.spawn(move |_| {
                        if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                            return;
                        }
                        let result = extractor.extract_path(&path);
                        pb.inc(1);
                        let _ = tx.send((filename, result));
                    });
                }
            });
            drop(tx);
            for (filename, result) in rx {
                match result {
                    Ok(features) => records.push(ImageRecord::new(filename, features)),
                    Err(e) => {
                        warn!("skipping {filename}: {e}");
                        skipped += 1;
                    }
                }
            }
            pb.finish_and_clear();
            if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                return Err(Error::Cancelled);
            }
        }

        records.sort_by(|a, b| a.filename.cmp(&b.filename));
        let added = records.len() - kept;

        if force || added > 0 || removed > 0 {
            self.save_cache(&records)?;
            info!(
                "cache updated: {} records (+{added} -{removed}) at {}",
                records.len(),
                self.metadata_cache_file.display()
            );
        } else {
            debug!("corpus unchanged, cache left as-is");
        }

        self.fashion_images_metadata = records;
        self.state = State::Ready;
        Ok(IndexReport { added, removed, kept, skipped })
    }

    /// Image files under `base_path` as (relative filename, absolute path),
    /// sorted by filename. An inaccessible root is fatal; unreadable entries
    /// below it are skipped like any non-image file.
    fn discover(&self) -> Result<Vec<(String, PathBuf)>> {
        let meta = fs::metadata(&self.base_path)?;
        if !meta.is_dir() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("corpus root {} is not a directory", self.base_path.display()),
            )));
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.base_path).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let Some(ext) = path.extension() else {
                continue;
            };
            if !self.suffixes.is_match(&ext.to_string_lossy()) {
                continue;
            }
            let rel = path.strip_prefix(&self.base_path).unwrap_or(path);
            let filename = rel.to_string_lossy().replace('\\', "/");
            entries.push((filename, path.to_path_buf()));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    /// A missing or corrupt cache is treated as absent; corruption is logged
    /// and the affected records are simply re-extracted.
    fn load_cache(&self) -> Vec<ImageRecord> {
        let data = match fs::read(&self.metadata_cache_file) {
            Ok(data) => data,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_slice::<Vec<ImageRecord>>(&data) {
            Ok(records) => {
                debug!("loaded {} cached records", records.len());
                records
            }
            Err(e) => {
                warn!(
                    "metadata cache {} is corrupt ({e}), rebuilding",
                    self.metadata_cache_file.display()
                );
                Vec::new()
            }
        }
    }

    /// Write-to-temp then rename, so a concurrent reader never observes a
    /// partially written cache.
    fn save_cache(&self, records: &[ImageRecord]) -> Result<()> {
        if let Some(parent) = self.metadata_cache_file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_vec_pretty(records)?;
        let tmp = self.metadata_cache_file.with_extension("tmp");
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, &self.metadata_cache_file)?;
        Ok(())
    }
}

fn suffix_regex(suffixes: &str) -> Regex {
    let pattern = format!("(?i)^({})$", suffixes.replace(',', "|"));
    Regex::new(&pattern).expect("failed to build suffix regex")
}
