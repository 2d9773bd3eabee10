#![forbid(unsafe_code)]

//! Core state machine for the Life Drain study meter.
//!
//! This crate provides:
//! - A clamped per-category meter with freeze/thaw on category switches
//! - The drain engine interpreting host lifecycle events
//! - The timer seam and pause key binding for host integration
//! - Configuration, event journals, replay, snapshots and traces

pub mod types;
pub mod error;
pub mod meter;
pub mod store;
pub mod session;
pub mod timer;
pub mod engine;
pub mod keys;
pub mod config;
pub mod logging;
pub mod journal;
pub mod replay;
pub mod snapshot;
pub mod trace;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use meter::Meter;
pub use store::CategoryStore;
pub use session::SessionState;
pub use timer::{NullDriver, TimerDriver, VirtualTimer};
pub use engine::DrainEngine;
pub use keys::{KeyOutcome, PauseBinding};
pub use config::{Config, DrainConfig};
pub use journal::{read_journal, JournalSink, JsonlJournal, ScriptStep};
pub use replay::Replayer;
pub use snapshot::MeterSnapshot;
pub use trace::TraceRow;
