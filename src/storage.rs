//! CSV-backed candle cache.
//!
//! The binary keeps one CSV file per symbol/interval so repeated runs resume
//! fetching from one interval past the last cached candle instead of
//! re-downloading the whole history.

use std::fs::File;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::series::{Candle, TimestampMS};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// On-disk cache for a single candle series
#[derive(Debug, Clone)]
pub struct CandleStore {
    path: PathBuf,
}

impl CandleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load all cached candles, oldest first
    pub fn load(&self) -> Result<Vec<Candle>, StorageError> {
        let file = File::open(&self.path)?;
        let mut reader = csv::Reader::from_reader(file);

        let mut candles = Vec::new();
        for record in reader.deserialize() {
            let candle: Candle = record?;
            candles.push(candle);
        }

        // CSV rows may have been appended out of order across runs
        candles.sort_by_key(|c| c.open_time);

        info!(
            "📂 Loaded {} cached candles from {}",
            candles.len(),
            self.path.display()
        );
        Ok(candles)
    }

    /// Write the full series, replacing any existing file
    pub fn save(&self, candles: &[Candle]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(&self.path)?;
        let mut writer = csv::Writer::from_writer(file);
        for candle in candles {
            writer.serialize(candle)?;
        }
        writer.flush()?;

        info!(
            "💾 Saved {} candles to {}",
            candles.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Open time of the newest cached candle, if the cache exists
    pub fn last_open_time(&self) -> Result<Option<TimestampMS>, StorageError> {
        if !self.exists() {
            debug!("Cache file {} does not exist yet", self.path.display());
            return Ok(None);
        }
        let candles = self.load()?;
        Ok(candles.last().map(|c| c.open_time))
    }
}
