//! Defines the core data structures and enums used in the slide deck application.
//!
//! This includes models for slides and the deck document read from disk,
//! the application state, and font assets.

use serde::Deserialize;
use egui::{FontId, FontFamily};

/// Represents a single slide in the deck.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Slide {
    /// Primary heading of the slide.
    pub title: Option<String>,
    /// Secondary heading, used for the thumbnail label when `title` is absent.
    pub subtitle: Option<String>,
    /// Free text shown below the headings.
    pub body: Option<String>,
    /// Image file, relative to the deck file unless absolute.
    pub image: Option<String>,
    /// Hex color string for slide text (e.g., "#FFFFFF").
    pub text_color: Option<String>,
    /// Hex color string for the slide background (e.g., "#202020").
    pub background_color: Option<String>,
}

impl Slide {
    /// The primary heading text, if the slide carries a non-blank one.
    pub fn primary_heading(&self) -> Option<&str> {
        [self.title.as_deref(), self.subtitle.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

/// Represents the deck document read from the deck file.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct DeckDocument {
    /// Window title for the presentation.
    #[serde(default)]
    pub title: Option<String>,
    /// Background music file, relative to the deck file unless absolute.
    #[serde(default)]
    pub music: Option<String>,
    /// Slides in presentation order.
    #[serde(default)]
    pub slides: Vec<Slide>,
}

/// Holds predefined font identifiers for slide text.
#[derive(Clone, Debug)]
pub struct FontAssets {
    pub title: FontId,
    pub subtitle: FontId,
    pub body: FontId,
}

impl FontAssets {
    /// Creates a new `FontAssets` collection with default font sizes.
    pub fn new() -> Self {
        Self {
            title: FontId::new(44.0, FontFamily::Proportional),
            subtitle: FontId::new(30.0, FontFamily::Proportional),
            body: FontId::new(22.0, FontFamily::Proportional),
        }
    }
}

/// Represents the overall state of the application.
/// Used to control UI display and application flow.
#[derive(Clone, Debug, PartialEq)]
pub enum AppState {
    /// Deck loaded and being presented.
    Presenting,
    /// An error occurred that prevents presenting. The String contains the error message.
    Error(String),
}
