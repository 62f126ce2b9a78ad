//! Configuration types for the subscription tracker.

use crate::error::{Result, TrackerError};
use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for the tracker daemon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Record store settings.
    pub database: DatabaseConfig,
    /// Daily reminder trigger settings.
    pub reminder: ReminderConfig,
    /// Outbound email delivery settings.
    pub email: EmailConfig,
}

impl TrackerConfig {
    /// Load configuration from a TOML file.
    ///
    /// Missing keys fall back to their defaults; a missing file is an error
    /// (callers that want defaults use `TrackerConfig::default()`).
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| TrackerError::Config(format!("{}: {e}", path.display())))
    }
}

/// Record store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("subtrack.db"),
        }
    }
}

/// Daily reminder trigger configuration.
///
/// Only the trigger time and the civil timezone are tunable; the batch
/// window offsets are design constants in the scheduler engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    /// Wall-clock trigger time, `HH:MM` (24-hour).
    pub trigger_time: String,
    /// IANA timezone name the trigger time is interpreted in.
    pub timezone: String,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            trigger_time: "09:00".to_owned(),
            timezone: "Asia/Kolkata".to_owned(),
        }
    }
}

impl ReminderConfig {
    /// Parse the configured trigger time.
    pub fn trigger_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.trigger_time, "%H:%M")
            .map_err(|e| TrackerError::Config(format!("bad trigger_time {:?}: {e}", self.trigger_time)))
    }

    /// Parse the configured timezone name.
    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| TrackerError::Config(format!("bad timezone {:?}: {e}", self.timezone)))
    }
}

/// Outbound email delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Delivery API endpoint messages are POSTed to.
    pub endpoint: String,
    /// Sender address.
    pub from_address: String,
    /// Sender display name.
    pub from_name: String,
    /// Bearer token for the delivery API (empty = unauthenticated).
    pub access_token: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8025/api/send".to_owned(),
            from_address: "reminders@subtrack.local".to_owned(),
            from_name: "Subscription Tracker".to_owned(),
            access_token: String::new(),
        }
    }
}
