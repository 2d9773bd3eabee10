//! Configuration file support for Life Drain.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/lifedrain/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub drain: DrainConfig,

    #[serde(default)]
    pub bar: BarConfig,

    #[serde(default)]
    pub keys: KeyConfig,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub persistence: PersistenceConfig,
}

/// Meter and decay parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainConfig {
    #[serde(default = "default_max_value")]
    pub max_value: i64,

    #[serde(default = "default_recover_value")]
    pub recover_value: i64,

    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            max_value: default_max_value(),
            recover_value: default_recover_value(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl DrainConfig {
    /// Apply defensive corrections so the meter is always displayable.
    pub fn normalized(mut self) -> Self {
        if self.max_value <= 0 {
            tracing::warn!("max_value {} is not positive, using 1", self.max_value);
            self.max_value = 1;
        }
        if self.tick_interval_ms == 0 {
            tracing::warn!(
                "tick_interval_ms is 0, using {}",
                default_tick_interval_ms()
            );
            self.tick_interval_ms = default_tick_interval_ms();
        }
        self
    }
}

/// Where the host docks the bar
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarPosition {
    Top,
    Bottom,
}

/// Presentation settings handed through to the host's bar widget.
///
/// The core never interprets these beyond [`BarConfig::dock_position`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BarConfig {
    #[serde(default = "default_position")]
    pub position: String,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_text_color")]
    pub text_color: String,

    #[serde(default = "default_background_color")]
    pub background_color: String,

    #[serde(default = "default_foreground_color")]
    pub foreground_color: String,

    #[serde(default)]
    pub border_radius: u32,

    #[serde(default = "default_custom_style")]
    pub custom_style: String,
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            position: default_position(),
            height: default_height(),
            text_color: default_text_color(),
            background_color: default_background_color(),
            foreground_color: default_foreground_color(),
            border_radius: 0,
            custom_style: default_custom_style(),
        }
    }
}

impl BarConfig {
    /// Anything other than `top` docks at the bottom.
    pub fn dock_position(&self) -> BarPosition {
        if self.position.eq_ignore_ascii_case("top") {
            BarPosition::Top
        } else {
            BarPosition::Bottom
        }
    }
}

/// Key bindings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyConfig {
    #[serde(default = "default_pause_key")]
    pub pause: String,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            pause: default_pause_key(),
        }
    }
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Meter values are session-scoped unless `keep_values` is set
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct PersistenceConfig {
    #[serde(default)]
    pub keep_values: bool,
}

// Default value functions
fn default_max_value() -> i64 {
    150
}

fn default_recover_value() -> i64 {
    22
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_position() -> String {
    "bottom".into()
}

fn default_height() -> u32 {
    17
}

fn default_text_color() -> String {
    "#dddddd".into()
}

fn default_background_color() -> String {
    "#222222".into()
}

fn default_foreground_color() -> String {
    "#666666".into()
}

fn default_custom_style() -> String {
    "default".into()
}

fn default_pause_key() -> String {
    "p".into()
}

fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".local/share"));
    base.join("lifedrain")
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config"));
        base.join("lifedrain").join("config.toml")
    }

    /// Copy of this config with defensive corrections applied
    pub fn normalized(&self) -> Self {
        let mut config = self.clone();
        config.drain = config.drain.normalized();
        config
    }

    /// The immutable engine parameters
    pub fn drain(&self) -> DrainConfig {
        self.drain.normalized()
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = self.to_toml()?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }
}
