//! Event journal: host lifecycle events recorded as JSON Lines.
//!
//! Each line is either an [`Event`] object (`{"event": "tick"}`) or a clock
//! advance (`{"advance_ms": 3000}`). Appends and reads take `fs2` locks so a
//! recording host and a replaying tool can share the file.

use crate::{Error, Event, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// One line of a journal
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptStep {
    /// Let virtual time pass; the running timer fires the ticks that fall due
    Advance { advance_ms: u64 },
    Event(Event),
}

impl ScriptStep {
    pub fn label(&self) -> String {
        match self {
            ScriptStep::Advance { advance_ms } => format!("advance({}ms)", advance_ms),
            ScriptStep::Event(event) => event.label(),
        }
    }
}

impl From<Event> for ScriptStep {
    fn from(event: Event) -> Self {
        ScriptStep::Event(event)
    }
}

/// Destination for recorded steps
pub trait JournalSink {
    fn append(&mut self, step: &ScriptStep) -> Result<()>;
}

/// JSONL journal with file locking
pub struct JsonlJournal {
    path: PathBuf,
}

impl JsonlJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl JournalSink for JsonlJournal {
    fn append(&mut self, step: &ScriptStep) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(step)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended {} to journal", step.label());
        Ok(())
    }
}

/// Read every step of a journal in order.
///
/// Blank lines and `#` comments are skipped. A malformed line fails the whole
/// read: every later value depends on it.
pub fn read_journal(path: &Path) -> Result<Vec<ScriptStep>> {
    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut steps = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let step = serde_json::from_str::<ScriptStep>(trimmed).map_err(|e| {
            Error::Journal(format!("line {}: {}: {}", line_num + 1, e, trimmed))
        })?;
        steps.push(step);
    }

    file.unlock()?;
    tracing::debug!("Read {} steps from journal {:?}", steps.len(), path);
    Ok(steps)
}
