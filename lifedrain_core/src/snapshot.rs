//! Meter snapshot persistence with file locking.
//!
//! Meter values are session-scoped by default. Hosts that opt into keeping
//! values across restarts save a snapshot on exit and restore it after the
//! profile loads.

use crate::{CategoryKey, Error, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Every category's meter value at one moment
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeterSnapshot {
    pub saved_at: DateTime<Utc>,
    pub values: BTreeMap<CategoryKey, i64>,
}

impl Default for MeterSnapshot {
    fn default() -> Self {
        Self::new(BTreeMap::new())
    }
}

impl MeterSnapshot {
    pub fn new(values: BTreeMap<CategoryKey, i64>) -> Self {
        Self {
            saved_at: Utc::now(),
            values,
        }
    }

    /// Load a snapshot with shared locking
    ///
    /// A missing or unreadable file yields an empty snapshot; a broken
    /// snapshot only costs the saved values, never the session.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No snapshot found at {:?}, starting full", path);
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open snapshot {:?}: {}. Starting full.", path, e);
                return Ok(Self::default());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock snapshot {:?}: {}. Starting full.", path, e);
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read snapshot {:?}: {}. Starting full.", path, e);
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<MeterSnapshot>(&contents) {
            Ok(snapshot) => {
                tracing::debug!(
                    "Loaded {} meter values from {:?}",
                    snapshot.values.len(),
                    path
                );
                Ok(snapshot)
            }
            Err(e) => {
                tracing::warn!("Failed to parse snapshot {:?}: {}. Starting full.", path, e);
                Ok(Self::default())
            }
        }
    }

    /// Save atomically: temp file in the same directory, exclusive lock,
    /// sync, rename over the original.
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved {} meter values to {:?}", self.values.len(), path);
        Ok(())
    }
}
