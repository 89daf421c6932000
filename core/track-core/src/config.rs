//! Tracker configuration.
//!
//! Loaded from `~/.shiptrack/config.toml` when present. Every section is
//! optional; a missing file means defaults, a malformed one is an error.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::ephemeral::MAX_EPHEMERAL_ROWS;
use crate::error::{Result, TrackError};
use crate::reconcile::MAX_ACTIVITY_ROWS;

pub const CONFIG_DIR: &str = ".shiptrack";
pub const CONFIG_FILE: &str = "config.toml";

/// Ten years.
pub const MAX_DELIVERY_ESTIMATE_DAYS: i64 = 3650;
/// `FixedOffset` only accepts offsets strictly inside one day.
pub const MAX_UTC_OFFSET_MINUTES: i32 = 24 * 60 - 1;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
    #[serde(default)]
    pub map: MapConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Rows shown in the history table.
    pub max_rows: usize,
    /// Superseded snapshots kept per tracking view.
    pub max_ephemeral: usize,
    /// Persisted activities kept from each fetch, newest first.
    pub fetch_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_rows: MAX_ACTIVITY_ROWS,
            max_ephemeral: MAX_EPHEMERAL_ROWS,
            fetch_limit: MAX_ACTIVITY_ROWS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// `chrono` strftime pattern for table and summary timestamps.
    pub timestamp_format: String,
    /// Fixed display offset; `None` uses the machine's local zone.
    pub utc_offset_minutes: Option<i32>,
    pub empty_placeholder: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timestamp_format: "%Y-%m-%d %H:%M:%S".to_string(),
            utc_offset_minutes: None,
            empty_placeholder: "No activities yet.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    pub tracking_prefix: String,
    pub delivery_estimate_days: i64,
    pub initial_status: String,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            tracking_prefix: "ST".to_string(),
            delivery_estimate_days: 7,
            initial_status: "Registered".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// `[lat, lon]` shown when nothing could be geocoded.
    pub fallback_center: [f64; 2],
    pub fallback_zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            fallback_center: [51.505, -0.09],
            fallback_zoom: 5,
        }
    }
}

/// Returns `~/.shiptrack/config.toml`.
pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(TrackError::HomeDirNotFound)?;
    Ok(home.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Loads configuration from `path`, or the default location when `None`.
pub fn load_config(path: Option<PathBuf>) -> Result<TrackerConfig> {
    let config_path = match path {
        Some(path) => path,
        None => default_config_path()?,
    };

    if !config_path.exists() {
        return Ok(TrackerConfig::default());
    }

    let content = fs_err::read_to_string(&config_path).map_err(|source| TrackError::Io {
        context: format!("reading config {}", config_path.display()),
        source,
    })?;
    parse_config(&config_path, &content)
}

fn parse_config(path: &Path, content: &str) -> Result<TrackerConfig> {
    let config =
        toml::from_str::<TrackerConfig>(content).map_err(|err| TrackError::ConfigMalformed {
            path: path.to_path_buf(),
            details: err.to_string(),
        })?;
    config
        .validate()
        .map_err(|details| TrackError::ConfigMalformed {
            path: path.to_path_buf(),
            details,
        })?;
    Ok(config)
}

impl TrackerConfig {
    /// Range checks for values chrono would reject at use time.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let days = self.registration.delivery_estimate_days;
        if !(0..=MAX_DELIVERY_ESTIMATE_DAYS).contains(&days) {
            return Err(format!(
                "registration.delivery_estimate_days must be within 0..={}, got {}",
                MAX_DELIVERY_ESTIMATE_DAYS, days
            ));
        }
        if let Some(minutes) = self.display.utc_offset_minutes {
            if !(-MAX_UTC_OFFSET_MINUTES..=MAX_UTC_OFFSET_MINUTES).contains(&minutes) {
                return Err(format!(
                    "display.utc_offset_minutes must be within -{0}..={0}, got {1}",
                    MAX_UTC_OFFSET_MINUTES, minutes
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_file_missing() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("missing.toml");
        let config = load_config(Some(path)).expect("load config");

        assert_eq!(config.history.max_rows, 10);
        assert_eq!(config.history.max_ephemeral, 9);
        assert_eq!(config.history.fetch_limit, 10);
        assert_eq!(config.display.empty_placeholder, "No activities yet.");
        assert_eq!(config.registration.tracking_prefix, "ST");
        assert_eq!(config.map.fallback_zoom, 5);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("config.toml");
        fs_err::write(
            &path,
            r#"
[history]
max_rows = 5

[display]
utc_offset_minutes = -300
timestamp_format = "%d/%m/%Y %H:%M"

[map]
fallback_center = [40.0, -73.0]
"#,
        )
        .expect("write config");

        let config = load_config(Some(path)).expect("load config");
        assert_eq!(config.history.max_rows, 5);
        assert_eq!(config.history.max_ephemeral, 9);
        assert_eq!(config.display.utc_offset_minutes, Some(-300));
        assert_eq!(config.display.timestamp_format, "%d/%m/%Y %H:%M");
        assert_eq!(config.display.empty_placeholder, "No activities yet.");
        assert_eq!(config.map.fallback_center, [40.0, -73.0]);
        assert_eq!(config.registration.delivery_estimate_days, 7);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("config.toml");
        fs_err::write(&path, "[history]\nmax_rows = \"ten\"\n").expect("write config");

        let err = load_config(Some(path)).expect_err("malformed");
        assert!(matches!(err, TrackError::ConfigMalformed { .. }));
    }

    #[test]
    fn out_of_range_delivery_estimate_is_rejected() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("config.toml");
        fs_err::write(
            &path,
            "[registration]\ndelivery_estimate_days = 100000000\n",
        )
        .expect("write config");

        let err = load_config(Some(path)).expect_err("out of range");
        match err {
            TrackError::ConfigMalformed { details, .. } => {
                assert!(details.contains("delivery_estimate_days"));
            }
            other => panic!("expected ConfigMalformed, got {:?}", other),
        }
    }

    #[test]
    fn out_of_range_utc_offset_is_rejected() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("config.toml");
        fs_err::write(&path, "[display]\nutc_offset_minutes = 1440\n").expect("write config");

        let err = load_config(Some(path)).expect_err("out of range");
        match err {
            TrackError::ConfigMalformed { details, .. } => {
                assert!(details.contains("utc_offset_minutes"));
            }
            other => panic!("expected ConfigMalformed, got {:?}", other),
        }

        let edge = TrackerConfig {
            display: DisplayConfig {
                utc_offset_minutes: Some(-MAX_UTC_OFFSET_MINUTES),
                ..DisplayConfig::default()
            },
            ..TrackerConfig::default()
        };
        assert!(edge.validate().is_ok());
    }
}
