//! Defines the custom error types used throughout the `slide_deck_rs` application.
//!
//! This module centralizes error handling, providing specific error enums for
//! different categories of issues (configuration, deck loading, media playback),
//! and a top-level `AppError` to wrap them. Each error type implements
//! `Debug`, `Display`, and `std::error::Error` traits, and provides `From`
//! implementations for common underlying error types.

use std::error::Error as StdError;
use std::fmt;

// --- ConfigError ---
/// Errors related to application configuration loading and parsing.
#[must_use = "a configuration error should be handled or propagated"]
#[derive(Debug)]
pub enum ConfigError {
    /// An I/O error occurred while trying to read the configuration file.
    Io(std::io::Error),
    /// An error occurred while parsing the configuration file content.
    Parse(String),
    /// A required configuration key was missing from the file.
    MissingKey(String),
    /// A key was present but its value could not be interpreted.
    InvalidValue { key: String, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Configuration I/O error: {}", e),
            ConfigError::Parse(e) => write!(f, "Configuration parse error: {}", e),
            ConfigError::MissingKey(key) => write!(f, "Missing configuration key: '{}'", key),
            ConfigError::InvalidValue { key, value } => {
                write!(f, "Invalid value '{}' for configuration key '{}'", value, key)
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

// --- DeckError ---
/// Errors related to reading the slide deck file.
#[must_use = "a deck error should be handled or propagated"]
#[derive(Debug)]
pub enum DeckError {
    /// The deck file could not be read.
    Io(std::io::Error),
    /// The deck file is not valid deck JSON.
    SerdeJson(serde_json::Error),
    /// The deck parsed correctly but contains no slides.
    Empty(String),
}

impl fmt::Display for DeckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeckError::Io(e) => write!(f, "Deck I/O error: {}", e),
            DeckError::SerdeJson(e) => write!(f, "Deck JSON error: {}", e),
            DeckError::Empty(path) => write!(f, "Deck '{}' contains no slides", path),
        }
    }
}

impl StdError for DeckError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            DeckError::Io(e) => Some(e),
            DeckError::SerdeJson(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DeckError {
    fn from(err: std::io::Error) -> Self {
        DeckError::Io(err)
    }
}

impl From<serde_json::Error> for DeckError {
    fn from(err: serde_json::Error) -> Self {
        DeckError::SerdeJson(err)
    }
}

// --- MediaError ---
/// Errors related to media handling (slide images, background music).
#[must_use = "a media error should be handled or propagated"]
#[derive(Debug)]
pub enum MediaError {
    /// An I/O error occurred while reading a media file.
    Io(std::io::Error),
    /// An error occurred during image decoding via the `image` crate.
    Image(image::ImageError),
    /// An error occurred during audio decoding via `ffmpeg-next`.
    Ffmpeg(ffmpeg_next::Error),
    /// The audio host refused to open or start an output stream.
    AudioDevice(String),
    /// A play request was rejected before any audio was produced.
    PlayRejected(String),
    /// The background task serving media requests is gone.
    ChannelClosed(String),
    /// A generic media-related error.
    Generic(String),
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaError::Io(e) => write!(f, "Media I/O error: {}", e),
            MediaError::Image(e) => write!(f, "Image processing error: {}", e),
            MediaError::Ffmpeg(e) => write!(f, "FFmpeg error: {}", e),
            MediaError::AudioDevice(s) => write!(f, "Audio device error: {}", s),
            MediaError::PlayRejected(s) => write!(f, "Play request rejected: {}", s),
            MediaError::ChannelClosed(s) => write!(f, "Media channel closed: {}", s),
            MediaError::Generic(s) => write!(f, "Media error: {}", s),
        }
    }
}

impl StdError for MediaError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            MediaError::Io(e) => Some(e),
            MediaError::Image(e) => Some(e),
            MediaError::Ffmpeg(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MediaError {
    fn from(err: std::io::Error) -> Self { MediaError::Io(err) }
}
impl From<image::ImageError> for MediaError {
    fn from(err: image::ImageError) -> Self { MediaError::Image(err) }
}
impl From<ffmpeg_next::Error> for MediaError {
    fn from(err: ffmpeg_next::Error) -> Self { MediaError::Ffmpeg(err) }
}


// --- AppError (Top-level error enum) ---
/// A top-level error type that can encompass any error within the application.
#[must_use = "an application error should be handled or propagated"]
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Deck(DeckError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "Application Configuration Error: {}", e),
            AppError::Deck(e) => write!(f, "Application Deck Error: {}", e),
        }
    }
}

impl StdError for AppError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::Deck(e) => Some(e),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self { AppError::Config(err) }
}
impl From<DeckError> for AppError {
    fn from(err: DeckError) -> Self { AppError::Deck(err) }
}
