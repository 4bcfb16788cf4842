use crate::wisdom::{CachedWisdom, WisdomError, WisdomRecord};
use chrono::{Local, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const LOG_TARGET: &str = "dharma_daily::wisdom::cache";

/// File name of the single cached record.
pub const STORAGE_KEY: &str = "dharma_daily_wisdom_v2.json";

/// Formats a date the way the cache keys records, e.g. `Mon Oct 19 2026`.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%a %b %d %Y").to_string()
}

/// Today's cache key in local time.
pub fn today() -> String {
    date_key(Local::now().date_naive())
}

/// Same-day cache for the teaching, stored as one JSON file.
#[derive(Debug, Clone)]
pub struct WisdomCache {
    path: PathBuf,
}

impl WisdomCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the default cache file path
    pub fn default_path() -> PathBuf {
        let base = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("dharma-daily").join(STORAGE_KEY)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored record, whatever day it is from.
    pub fn read(&self) -> Result<Option<CachedWisdom>, WisdomError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let cached: CachedWisdom = serde_json::from_str(&content)?;
        Ok(Some(cached))
    }

    /// Returns the stored teaching only if it was saved on `date`.
    ///
    /// An unreadable or corrupt file counts as a miss.
    pub fn load_for(&self, date: &str) -> Option<WisdomRecord> {
        match self.read() {
            Ok(Some(cached)) if cached.date == date => {
                debug!(target: LOG_TARGET, "Cache hit for {}", date);
                Some(cached.data)
            }
            Ok(Some(cached)) => {
                debug!(target: LOG_TARGET, "Cached teaching is from {}, not {}", cached.date, date);
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(target: LOG_TARGET, "Ignoring unreadable cache at {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Overwrites the stored record.
    pub fn store(&self, date: &str, record: &WisdomRecord) -> Result<(), WisdomError> {
        let cached = CachedWisdom {
            date: date.to_string(),
            data: record.clone(),
        };
        let content = serde_json::to_string_pretty(&cached)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, content)?;
        debug!(target: LOG_TARGET, "Stored teaching '{}' for {}", record.term, date);
        Ok(())
    }
}
