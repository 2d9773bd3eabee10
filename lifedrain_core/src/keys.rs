//! Pause key binding composed in front of the host's own key handling.

use crate::timer::TimerDriver;
use crate::{Config, DrainEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The binding consumed the key
    Handled,
    /// The key was forwarded to the next handler
    Passed,
}

/// Toggles the drain when its key is pressed and forwards every other key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PauseBinding {
    key: String,
}

impl PauseBinding {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.keys.pause.clone())
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Offer `key` to the binding; unmatched keys go to `pass_through`.
    pub fn intercept<D, F>(
        &self,
        engine: &mut DrainEngine<D>,
        key: &str,
        pass_through: F,
    ) -> KeyOutcome
    where
        D: TimerDriver,
        F: FnOnce(&str),
    {
        if key == self.key {
            engine.on_toggle_pause();
            KeyOutcome::Handled
        } else {
            pass_through(key);
            KeyOutcome::Passed
        }
    }
}
