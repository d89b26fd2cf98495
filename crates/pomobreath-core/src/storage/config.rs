//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Focus timer durations and auto-start behaviour
//! - Breathing defaults and the selected technique
//! - History retention
//! - Notification and tick-driver settings
//!
//! Configuration is stored at `~/.config/pomobreath/config.toml`.
//! Plans are built from it explicitly; nothing observes it implicitly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::error::{ConfigError, CoreError, ValidationError};
use crate::timer::{check_range, BreathingPattern, BreathingTechnique, FocusSettings, PhasePlan};

pub const KEEP_COUNT_RANGE: (u64, u64) = (20, 2000);
pub const TICK_INTERVAL_MS_RANGE: (u64, u64) = (50, 1000);

/// Breathing defaults used by the custom technique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreathingConfig {
    #[serde(default = "default_four")]
    pub inhale_secs: u32,
    #[serde(default = "default_four")]
    pub hold_secs: u32,
    #[serde(default = "default_four")]
    pub exhale_secs: u32,
    #[serde(default = "default_cycles")]
    pub cycles: u32,
    #[serde(default = "default_true")]
    pub haptics: bool,
    #[serde(default = "default_technique")]
    pub technique: BreathingTechnique,
}

/// Session history configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Keep only the most recent N sessions.
    #[serde(default = "default_keep_count")]
    pub keep_count: u32,
    #[serde(default = "default_true")]
    pub show_breaks: bool,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Tick driver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/pomobreath/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub focus: FocusSettings,
    #[serde(default)]
    pub breathing: BreathingConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub driver: DriverConfig,
}

// Default functions
fn default_four() -> u32 {
    4
}
fn default_cycles() -> u32 {
    6
}
fn default_true() -> bool {
    true
}
fn default_technique() -> BreathingTechnique {
    BreathingTechnique::Custom
}
fn default_keep_count() -> u32 {
    200
}
fn default_tick_interval_ms() -> u64 {
    250
}

impl Default for BreathingConfig {
    fn default() -> Self {
        Self {
            inhale_secs: 4,
            hold_secs: 4,
            exhale_secs: 4,
            cycles: 6,
            haptics: true,
            technique: default_technique(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            keep_count: default_keep_count(),
            show_breaks: true,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl BreathingConfig {
    pub fn pattern(&self) -> BreathingPattern {
        BreathingPattern::new(self.inhale_secs, self.hold_secs, self.exhale_secs, self.cycles)
    }
}

impl DriverConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Location of `config.toml` inside the data directory.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Restore one top-level section (`focus`, `breathing`, `history`,
    /// `notifications` or `driver`) to its defaults.
    pub fn reset_section(&mut self, section: &str) -> Result<(), ConfigError> {
        match section {
            "focus" => self.focus = FocusSettings::default(),
            "breathing" => self.breathing = BreathingConfig::default(),
            "history" => self.history = HistoryConfig::default(),
            "notifications" => self.notifications = NotificationsConfig::default(),
            "driver" => self.driver = DriverConfig::default(),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Load from disk or return (and write) the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value in memory by dot-separated key, validating the result.
    /// The receiver is left untouched on error.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed or
    /// is out of range, or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        self.apply(key, value)?;
        self.save()?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.focus.validate()?;
        self.breathing.pattern().validate()?;
        check_range("history.keep_count", self.history.keep_count as u64, KEEP_COUNT_RANGE)?;
        check_range(
            "driver.tick_interval_ms",
            self.driver.tick_interval_ms,
            TICK_INTERVAL_MS_RANGE,
        )?;
        Ok(())
    }

    pub fn focus_plan(&self) -> Result<PhasePlan, ValidationError> {
        self.focus.plan()
    }

    /// Plan for `technique`, or the configured technique when `None`.
    pub fn breathing_plan(
        &self,
        technique: Option<BreathingTechnique>,
    ) -> Result<PhasePlan, ValidationError> {
        technique
            .unwrap_or(self.breathing.technique)
            .plan(self.breathing.pattern())
    }
}
