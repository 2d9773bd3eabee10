//! Per-session progress flags consumed by the drain engine.

use crate::Screen;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// A completed unit of work whose recovery has not been granted yet
    pub completed_pending: bool,
    pub current_screen: Screen,
}

impl SessionState {
    /// Consume the pending completion, returning whether one was pending.
    pub fn take_pending(&mut self) -> bool {
        std::mem::replace(&mut self.completed_pending, false)
    }
}
