//! CSV export of replay traces.

use crate::Result;
use serde::Serialize;
use std::path::Path;

/// Engine state after one replayed step
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TraceRow {
    pub elapsed_ms: u64,
    pub step: String,
    pub screen: String,
    pub category: Option<i64>,
    pub visible_value: Option<i64>,
    pub timer_running: bool,
    pub completed_pending: bool,
}

/// Write `rows` to a fresh CSV file with headers, synced to disk.
pub fn write_csv(path: &Path, rows: &[TraceRow]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Wrote {} trace rows to {:?}", rows.len(), path);
    Ok(())
}
