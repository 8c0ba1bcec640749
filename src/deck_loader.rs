//! Reads the slide deck from disk.
//!
//! The deck is a JSON document listing slides in presentation order, with an
//! optional background-music file. Asset paths inside the deck are resolved
//! against the directory containing the deck file.

use std::path::{Path, PathBuf};

use super::errors::DeckError;
use super::model::DeckDocument;
use log::{info, error, debug, trace};

/// A deck document together with the directory its relative asset paths point into.
#[derive(Clone, Debug)]
pub struct LoadedDeck {
    pub document: DeckDocument,
    pub base_dir: PathBuf,
}

impl LoadedDeck {
    /// Resolves an asset path from the deck against the deck's directory.
    pub fn resolve_asset(&self, asset: &str) -> PathBuf {
        let path = Path::new(asset);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Background music file: the configured override, else the deck's own entry.
    pub fn music_path(&self, override_path: Option<&Path>) -> Option<PathBuf> {
        override_path
            .map(Path::to_path_buf)
            .or_else(|| self.document.music.as_deref().map(|m| self.resolve_asset(m)))
    }
}

/// Loads and validates the deck file at `path`.
///
/// # Errors
/// Returns `DeckError` if the file cannot be read, is not valid deck JSON,
/// or lists no slides.
#[must_use = "loading the deck can fail; the Result must be handled"]
pub fn load_deck(path: &Path) -> Result<LoadedDeck, DeckError> {
    debug!("Loading deck from: {}", path.display());
    let raw = std::fs::read_to_string(path).map_err(|e| {
        error!("Failed to read deck file '{}': {}", path.display(), e);
        DeckError::Io(e)
    })?;

    let document: DeckDocument = serde_json::from_str(&raw).map_err(|e| {
        error!("Failed to parse deck file '{}': {}", path.display(), e);
        DeckError::from(e)
    })?;

    if document.slides.is_empty() {
        error!("Deck file '{}' has no slides.", path.display());
        return Err(DeckError::Empty(path.display().to_string()));
    }

    for (i, slide) in document.slides.iter().enumerate() {
        trace!("Slide {}: heading={:?}, image={:?}", i, slide.primary_heading(), slide.image);
    }

    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    info!("Loaded deck '{}' with {} slide(s).", path.display(), document.slides.len());
    Ok(LoadedDeck { document, base_dir })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_deck(dir: &Path, json: &str) -> PathBuf {
        let path = dir.join("deck.json");
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn loads_slides_and_resolves_assets() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_deck(
            dir.path(),
            r#"{"title":"Talk","music":"audio/theme.mp3","slides":[{"title":"One","image":"img/a.png"},{"title":"Two"}]}"#,
        );
        let deck = load_deck(&path).unwrap();
        assert_eq!(deck.document.slides.len(), 2);
        assert_eq!(deck.base_dir, dir.path());
        assert_eq!(deck.resolve_asset("img/a.png"), dir.path().join("img/a.png"));
        assert_eq!(deck.music_path(None), Some(dir.path().join("audio/theme.mp3")));
    }

    #[test]
    fn configured_music_overrides_deck_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_deck(dir.path(), r#"{"music":"theme.mp3","slides":[{}]}"#);
        let deck = load_deck(&path).unwrap();
        let chosen = deck.music_path(Some(Path::new("/opt/other.ogg")));
        assert_eq!(chosen, Some(PathBuf::from("/opt/other.ogg")));
    }

    #[test]
    fn absolute_asset_paths_are_kept() {
        let deck = LoadedDeck { document: DeckDocument::default(), base_dir: PathBuf::from("/decks") };
        assert_eq!(deck.resolve_asset("/img/x.png"), PathBuf::from("/img/x.png"));
    }

    #[test]
    fn empty_deck_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_deck(dir.path(), r#"{"slides":[]}"#);
        assert!(matches!(load_deck(&path), Err(DeckError::Empty(_))));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_deck(dir.path(), "{ not json");
        assert!(matches!(load_deck(&path), Err(DeckError::SerdeJson(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_deck(&dir.path().join("nope.json")), Err(DeckError::Io(_))));
    }
}
