//! Deck files: a whole carousel described in TOML
//!
//! ```toml
//! [header]
//! name = "Ada Lovelace"
//! handle = "@ada"
//! alignment = "start"
//! profile_image = "avatar.png"
//!
//! [[slides]]
//! text = "First slide"
//! cta = "Swipe"
//! text_size = 32
//! alignment = "justify"
//! image = "chart.jpg"
//! ```
//!
//! Image paths are relative to the deck file. Loading a deck replays it as
//! ordinary store edits.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::error::{ImageError, StoreError};
use crate::store::{
    HeaderAlignment, HeaderField, ImageRef, SlideField, SlideStore, TextAlignment,
};

/// Errors that can occur when loading a deck
#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Failed to read deck file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse deck TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to load image '{}': {source}", path.display())]
    Image { path: PathBuf, source: ImageError },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlDeck {
    #[serde(default)]
    header: TomlHeader,
    #[serde(default)]
    slides: Vec<TomlSlide>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlHeader {
    name: Option<String>,
    handle: Option<String>,
    alignment: Option<HeaderAlignment>,
    profile_image: Option<PathBuf>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TomlSlide {
    text: Option<String>,
    cta: Option<String>,
    text_size: Option<u32>,
    cta_size: Option<u32>,
    alignment: Option<TextAlignment>,
    image: Option<PathBuf>,
}

/// A parsed deck, as the edits that rebuild it
#[derive(Debug, Clone, Default)]
pub struct Deck {
    header: Vec<HeaderField>,
    slides: Vec<Vec<SlideField>>,
}

impl Deck {
    /// Load a deck file, resolving images next to it
    pub fn from_file(path: &Path) -> Result<Self, DeckError> {
        let content = std::fs::read_to_string(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_str(&content, base)
    }

    /// Parse deck TOML, resolving image paths against `base_dir`
    pub fn from_str(content: &str, base_dir: &Path) -> Result<Self, DeckError> {
        let parsed: TomlDeck = toml::from_str(content)?;
        let load = |relative: &Path| {
            let path = base_dir.join(relative);
            ImageRef::from_file(&path).map_err(|source| DeckError::Image { path, source })
        };

        let mut header = Vec::new();
        if let Some(name) = parsed.header.name {
            header.push(HeaderField::DisplayName(name));
        }
        if let Some(handle) = parsed.header.handle {
            header.push(HeaderField::Handle(handle));
        }
        if let Some(alignment) = parsed.header.alignment {
            header.push(HeaderField::Alignment(alignment));
        }
        if let Some(path) = &parsed.header.profile_image {
            header.push(HeaderField::ProfileImage(Some(load(path.as_path())?)));
        }

        let mut slides = Vec::with_capacity(parsed.slides.len());
        for slide in parsed.slides {
            let mut fields = Vec::new();
            if let Some(text) = slide.text {
                fields.push(SlideField::Text(text));
            }
            if let Some(cta) = slide.cta {
                fields.push(SlideField::Cta(cta));
            }
            if let Some(size) = slide.text_size {
                fields.push(SlideField::TextSize(size));
            }
            if let Some(size) = slide.cta_size {
                fields.push(SlideField::CtaSize(size));
            }
            if let Some(alignment) = slide.alignment {
                fields.push(SlideField::Alignment(alignment));
            }
            if let Some(path) = &slide.image {
                fields.push(SlideField::Image(Some(load(path.as_path())?)));
            }
            slides.push(fields);
        }

        Ok(Self { header, slides })
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Append the deck's slides to `store` and apply its header
    pub fn apply(self, store: &mut SlideStore) -> Result<(), DeckError> {
        for field in self.header {
            store.update_header(field);
        }
        for fields in self.slides {
            store.add();
            let index = store.len() - 1;
            for field in fields {
                store.update(index, field)?;
            }
        }
        debug!(slides = store.len(), "deck applied");
        Ok(())
    }

    /// Build a fresh store holding exactly this deck
    pub fn into_store(self) -> Result<SlideStore, DeckError> {
        let mut store = SlideStore::empty();
        self.apply(&mut store)?;
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SlideId;

    #[test]
    fn test_parse_deck() {
        let deck = Deck::from_str(
            r#"
[header]
name = "Ada"
handle = "@ada"
alignment = "end"

[[slides]]
text = "One"
alignment = "justify"

[[slides]]
cta = "Two"
cta_size = 4
"#,
            Path::new("."),
        )
        .unwrap();

        let store = deck.into_store().unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.ids(), vec![SlideId(1), SlideId(2)]);
        assert_eq!(snapshot.header().display_name, "Ada");
        assert_eq!(snapshot.header().alignment, HeaderAlignment::End);

        let first = &snapshot.slides()[0];
        assert_eq!(first.text, "One");
        assert_eq!(first.alignment, TextAlignment::Justify);

        let second = &snapshot.slides()[1];
        assert_eq!(second.cta, "Two");
        assert_eq!(second.cta_size, 10);
        assert_eq!(second.text_size, 28);
    }

    #[test]
    fn test_empty_deck() {
        let deck = Deck::from_str("", Path::new(".")).unwrap();
        assert_eq!(deck.slide_count(), 0);
        assert!(deck.into_store().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let result = Deck::from_str("[[slides]]\ncolour = \"red\"\n", Path::new("."));
        assert!(matches!(result, Err(DeckError::ParseError(_))));
    }

    #[test]
    fn test_missing_image_reports_path() {
        let result = Deck::from_str(
            "[[slides]]\nimage = \"missing.png\"\n",
            Path::new("/nonexistent"),
        );
        match result {
            Err(DeckError::Image { path, .. }) => {
                assert_eq!(path, Path::new("/nonexistent/missing.png"))
            }
            other => panic!("expected image error, got {:?}", other.map(|d| d.slide_count())),
        }
    }
}
