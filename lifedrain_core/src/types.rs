//! Core domain types for the Life Drain system.
//!
//! This module defines the vocabulary shared by the store and the engine:
//! - Category keys
//! - Host screens
//! - Host lifecycle events

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Category Types
// ============================================================================

/// Stable identifier of a category (a study deck id on the host side)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryKey(pub i64);

impl CategoryKey {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> i64 {
        self.0
    }
}

impl From<i64> for CategoryKey {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CategoryKey {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(CategoryKey)
    }
}

// ============================================================================
// Screen Types
// ============================================================================

/// Logical screen the host is currently showing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    #[default]
    None,
    Overview,
    Review,
    Other,
}

impl Screen {
    /// Map a host state name onto a screen.
    ///
    /// Only `overview` and `review` are meaningful to the meter; every other
    /// host state (deck browser, editor, ...) is `Other`.
    pub fn from_host_state(state: &str) -> Self {
        match state {
            "overview" => Screen::Overview,
            "review" => Screen::Review,
            _ => Screen::Other,
        }
    }

    /// Screens on which a category is active and the meter is shown
    pub fn is_reviewing_context(&self) -> bool {
        matches!(self, Screen::Overview | Screen::Review)
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Screen::None => "none",
            Screen::Overview => "overview",
            Screen::Review => "review",
            Screen::Other => "other",
        };
        f.write_str(name)
    }
}

impl FromStr for Screen {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Screen::None),
            "overview" => Ok(Screen::Overview),
            "review" => Ok(Screen::Review),
            "other" => Ok(Screen::Other),
            other => Err(format!("unknown screen: {}", other)),
        }
    }
}

// ============================================================================
// Event Types
// ============================================================================

/// A host lifecycle event delivered to the drain engine
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// The host profile finished loading with these known categories
    ProfileLoaded { categories: Vec<CategoryKey> },
    /// The host moved to a different screen; `category` is the host's current
    /// category resolved at dispatch time
    ScreenChanged {
        screen: Screen,
        #[serde(default)]
        category: Option<CategoryKey>,
    },
    /// A new unit of work is shown to the user
    WorkItemPresented,
    /// The user finished the current unit of work
    WorkItemCompleted,
    /// The host discarded the current unit of work (undo)
    SessionReset,
    /// External pause/resume request
    TogglePause,
    /// One firing of the decay timer
    Tick,
}

impl Event {
    /// Short label used in logs and traces
    pub fn label(&self) -> String {
        match self {
            Event::ProfileLoaded { categories } => {
                format!("profile_loaded({})", categories.len())
            }
            Event::ScreenChanged { screen, .. } => format!("screen_changed({})", screen),
            Event::WorkItemPresented => "work_item_presented".into(),
            Event::WorkItemCompleted => "work_item_completed".into(),
            Event::SessionReset => "session_reset".into(),
            Event::TogglePause => "toggle_pause".into(),
            Event::Tick => "tick".into(),
        }
    }
}
