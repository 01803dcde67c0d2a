//! Settings loaded with Figment.
//!
//! Layers, later ones winning:
//! 1. Built-in defaults
//! 2. `config/electrode_map.toml` (or the path given on the command line); a missing file
//!    is skipped
//! 3. Environment variables prefixed with `ELECTRODE_MAP_`, using `__` between sections,
//!    e.g. `ELECTRODE_MAP_DISPLAY__MAX_CHANNEL=64`
//!
//! # Example
//! ```no_run
//! use electrode_map::config::Settings;
//!
//! let settings = Settings::load()?;
//! println!("refresh every {:?}", settings.display.refresh_interval);
//! # Ok::<(), electrode_map::error::MapError>(())
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::array::DEFAULT_MAX_CHANNEL;
use crate::error::{MapError, MapResult};
use crate::tracing_init::OutputFormat;

/// Config file read when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/electrode_map.toml";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "ELECTRODE_MAP_";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Name and logging
    pub application: ApplicationSettings,
    /// Refresh, channel range and window
    pub display: DisplaySettings,
    /// Color table and default montage paths
    pub resources: ResourceSettings,
    /// Live reading source
    pub amplifier: AmplifierSettings,
}

/// Application-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    /// Window title and log name
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log output format (pretty, compact, json)
    pub log_format: OutputFormat,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            name: "Electrode Map".to_string(),
            log_level: "info".to_string(),
            log_format: OutputFormat::Pretty,
        }
    }
}

/// Display settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Impedance refresh period, e.g. "300ms"
    #[serde(with = "humantime_serde")]
    pub refresh_interval: Duration,
    /// Highest assignable hardware channel
    pub max_channel: u32,
    /// Show channel numbers instead of labels at startup
    pub show_channel_numbers: bool,
    /// Initial window width
    pub window_width: f32,
    /// Initial window height
    pub window_height: f32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            refresh_interval: crate::refresh::DEFAULT_INTERVAL,
            max_channel: DEFAULT_MAX_CHANNEL,
            show_channel_numbers: false,
            window_width: 1200.0,
            window_height: 900.0,
        }
    }
}

/// Resource file locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceSettings {
    /// Optional color table; the generated gradient is used when absent
    pub color_map_path: PathBuf,
    /// Montage applied at startup when present
    pub default_montage_path: PathBuf,
}

impl Default for ResourceSettings {
    fn default() -> Self {
        Self {
            color_map_path: PathBuf::from("resources/heat.map"),
            default_montage_path: PathBuf::from("resources/default_montage.json"),
        }
    }
}

/// Which amplifier backs the live readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AmplifierDriver {
    /// Simulated device
    #[default]
    Mock,
    /// No device; values stay at zero
    None,
}

/// Amplifier settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmplifierSettings {
    /// Device backing the readings
    pub driver: AmplifierDriver,
    /// Channels reported by the mock driver
    pub channel_count: usize,
    /// Fixed seed for reproducible mock readings
    pub seed: Option<u64>,
}

impl Default for AmplifierSettings {
    fn default() -> Self {
        Self {
            driver: AmplifierDriver::Mock,
            channel_count: 64,
            seed: None,
        }
    }
}

impl Settings {
    /// Load from [`DEFAULT_CONFIG_PATH`] and the environment.
    pub fn load() -> MapResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load from a specific file path and the environment, then validate.
    pub fn load_from<P: AsRef<Path>>(path: P) -> MapResult<Self> {
        let settings: Settings = Self::figment(path.as_ref()).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// The provider stack, exposed so callers can merge extra layers.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate semantic constraints serde cannot express.
    pub fn validate(&self) -> MapResult<()> {
        let level = self.application.log_level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(MapError::Configuration(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }
        if self.display.max_channel < 1 {
            return Err(MapError::Configuration(
                "display.max_channel must be at least 1".to_string(),
            ));
        }
        if self.display.refresh_interval.is_zero() {
            return Err(MapError::Configuration(
                "display.refresh_interval must be greater than zero".to_string(),
            ));
        }
        if self.amplifier.channel_count < 1 {
            return Err(MapError::Configuration(
                "amplifier.channel_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn toml_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        settings.validate().unwrap();
        assert_eq!(settings.display.refresh_interval, Duration::from_millis(300));
        assert_eq!(settings.display.max_channel, 256);
        assert_eq!(settings.amplifier.driver, AmplifierDriver::Mock);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let settings = Settings::load_from("/nonexistent/electrode_map.toml").unwrap();
        assert_eq!(settings.display, DisplaySettings::default());
    }

    #[test]
    fn file_overrides_defaults() {
        let file = toml_file(
            r#"
            [display]
            refresh_interval = "1s 500ms"
            max_channel = 32

            [amplifier]
            driver = "none"
            seed = 7
            "#,
        );
        let settings = Settings::load_from(file.path()).unwrap();

        assert_eq!(settings.display.refresh_interval, Duration::from_millis(1500));
        assert_eq!(settings.display.max_channel, 32);
        assert!(!settings.display.show_channel_numbers);
        assert_eq!(settings.amplifier.driver, AmplifierDriver::None);
        assert_eq!(settings.amplifier.seed, Some(7));
        assert_eq!(settings.amplifier.channel_count, 64);
    }

    #[test]
    fn zero_max_channel_is_rejected() {
        let file = toml_file("[display]\nmax_channel = 0\n");
        let err = Settings::load_from(file.path()).unwrap_err();
        assert!(matches!(err, MapError::Configuration(ref msg) if msg.contains("max_channel")));
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let mut settings = Settings::default();
        settings.application.log_level = "verbose".into();
        assert!(settings.validate().is_err());
        settings.application.log_level = "DEBUG".into();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn unknown_driver_fails_extraction() {
        let file = toml_file("[amplifier]\ndriver = \"usb\"\n");
        assert!(matches!(
            Settings::load_from(file.path()),
            Err(MapError::Config(_))
        ));
    }

    #[test]
    fn zero_refresh_interval_is_rejected() {
        let mut settings = Settings::default();
        settings.display.refresh_interval = Duration::ZERO;
        assert!(settings.validate().is_err());
    }
}
