//! Handles application configuration loading and management.
//!
//! This module defines the `AppConfig` struct which holds configuration
//! parameters like the deck location, background music override and autoplay
//! period. It provides the `load_config` function to read these settings from
//! an INI file.

use std::path::PathBuf;
use std::time::Duration;

use configparser::ini::Ini;
use super::errors::ConfigError;
use log::{info, debug, error};

/// Default configuration file location when none is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/slide_deck.conf";
/// Autoplay period used when `autoplay_interval_ms` is not set.
pub const DEFAULT_AUTOPLAY_INTERVAL_MS: u64 = 7000;

const SETTINGS_SECTION: &str = "settings";

/// Holds the application's configuration parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub deck_path: PathBuf,
    /// Overrides the `music` entry of the deck file when set.
    pub music_path: Option<PathBuf>,
    pub autoplay_interval: Duration,
    pub window_width: f32,
    pub window_height: f32,
    pub fullscreen: bool,
}

/// Loads application configuration from the specified INI file path.
///
/// Reads settings from the `[settings]` section of the INI file.
///
/// # Arguments
/// * `path` - The path to the configuration file (e.g., "/etc/slide_deck.conf").
///
/// # Errors
/// Returns `ConfigError` if the file cannot be read, is malformed,
/// if `deck_path` is missing, or if an optional key holds an invalid value.
#[must_use = "loading configuration can fail, the Result must be handled"]
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    info!("Attempting to load config from: {}", path);
    let contents = std::fs::read_to_string(path).map_err(|e| {
        error!("Error reading config file '{}': {}", path, e);
        ConfigError::Io(e)
    })?;
    let app_config = parse_config(&contents).map_err(|e| {
        error!("Error in config file '{}': {}", path, e);
        e
    })?;
    info!("Configuration loaded successfully from {}: {:?}", path, app_config);
    Ok(app_config)
}

/// Parses INI text into an `AppConfig`, applying defaults for optional keys.
pub fn parse_config(contents: &str) -> Result<AppConfig, ConfigError> {
    let mut config_parser = Ini::new();
    config_parser.read(contents.to_string()).map_err(ConfigError::Parse)?;

    let get_optional = |key_name: &str| {
        config_parser
            .get(SETTINGS_SECTION, key_name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let deck_path = get_optional("deck_path").ok_or_else(|| {
        error!("Missing configuration key 'deck_path' in section '[settings]'");
        ConfigError::MissingKey("deck_path".to_string())
    })?;
    debug!("Loaded config value for key 'deck_path': {}", deck_path);

    let music_path = get_optional("music_path").map(PathBuf::from);
    debug!("Loaded config value for key 'music_path': {:?}", music_path);

    let interval_ms = match get_optional("autoplay_interval_ms") {
        Some(raw) => match raw.parse::<u64>() {
            Ok(ms) if ms > 0 => ms,
            _ => return Err(invalid("autoplay_interval_ms", raw)),
        },
        None => DEFAULT_AUTOPLAY_INTERVAL_MS,
    };
    debug!("Autoplay interval: {} ms", interval_ms);

    let window_width = parse_dimension(get_optional("window_width"), "window_width", 1024.0)?;
    let window_height = parse_dimension(get_optional("window_height"), "window_height", 768.0)?;

    let fullscreen = match get_optional("fullscreen").map(|v| v.to_lowercase()) {
        None => false,
        Some(v) if matches!(v.as_str(), "true" | "yes" | "on" | "1") => true,
        Some(v) if matches!(v.as_str(), "false" | "no" | "off" | "0") => false,
        Some(v) => return Err(invalid("fullscreen", v)),
    };

    Ok(AppConfig {
        deck_path: PathBuf::from(deck_path),
        music_path,
        autoplay_interval: Duration::from_millis(interval_ms),
        window_width,
        window_height,
        fullscreen,
    })
}

fn parse_dimension(raw: Option<String>, key: &str, default: f32) -> Result<f32, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => match v.parse::<f32>() {
            Ok(px) if px.is_finite() && px > 0.0 => Ok(px),
            _ => Err(invalid(key, v)),
        },
    }
}

fn invalid(key: &str, value: String) -> ConfigError {
    error!("Invalid value '{}' for configuration key '{}'", value, key);
    ConfigError::InvalidValue { key: key.to_string(), value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = parse_config("[settings]\ndeck_path = /srv/talk/deck.json\n").unwrap();
        assert_eq!(cfg.deck_path, PathBuf::from("/srv/talk/deck.json"));
        assert_eq!(cfg.music_path, None);
        assert_eq!(cfg.autoplay_interval, Duration::from_millis(7000));
        assert_eq!(cfg.window_width, 1024.0);
        assert_eq!(cfg.window_height, 768.0);
        assert!(!cfg.fullscreen);
    }

    #[test]
    fn optional_keys_are_read() {
        let cfg = parse_config(
            "[settings]\n\
             deck_path = deck.json\n\
             music_path = theme.mp3\n\
             autoplay_interval_ms = 2500\n\
             window_width = 1920\n\
             window_height = 1080\n\
             fullscreen = yes\n",
        )
        .unwrap();
        assert_eq!(cfg.music_path, Some(PathBuf::from("theme.mp3")));
        assert_eq!(cfg.autoplay_interval, Duration::from_millis(2500));
        assert_eq!(cfg.window_width, 1920.0);
        assert_eq!(cfg.window_height, 1080.0);
        assert!(cfg.fullscreen);
    }

    #[test]
    fn missing_deck_path_is_reported() {
        let err = parse_config("[settings]\nfullscreen = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey(ref k) if k == "deck_path"));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = parse_config("[settings]\ndeck_path = d.json\nautoplay_interval_ms = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "autoplay_interval_ms"));
    }

    #[test]
    fn unknown_fullscreen_value_is_rejected() {
        let err = parse_config("[settings]\ndeck_path = d.json\nfullscreen = maybe\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref value, .. } if value == "maybe"));
    }

    #[test]
    fn load_config_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[settings]\ndeck_path = /tmp/deck.json").unwrap();
        let cfg = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.deck_path, PathBuf::from("/tmp/deck.json"));
    }

    #[test]
    fn load_config_maps_missing_file_to_io() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.conf");
        let err = load_config(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
