//! Card theme: colors and font family
//!
//! Themes are loaded from TOML. Any key left out of the file falls back to
//! the built-in look: white text on a black card, grey handle, white matte
//! behind the rounded corners.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading or parsing a theme
#[derive(Error, Debug)]
pub enum ThemeError {
    #[error("Failed to read theme file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse theme TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid color for '{key}': {value} (expected #rgb or #rrggbb)")]
    InvalidColor { key: &'static str, value: String },
}

/// Colors and typography applied to every slide
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Card fill
    pub background: String,
    /// Body, CTA and display name color
    pub text: String,
    /// Handle color
    pub muted: String,
    /// Surface color outside the rounded card
    pub matte: String,
    /// Font family requested for every text run
    pub font_family: String,
}

#[derive(Deserialize, Default)]
struct TomlTheme {
    metadata: Option<TomlMetadata>,
    #[serde(default)]
    colors: TomlColors,
    #[serde(default)]
    fonts: TomlFonts,
}

#[derive(Deserialize)]
struct TomlMetadata {
    name: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize, Default)]
struct TomlColors {
    background: Option<String>,
    text: Option<String>,
    muted: Option<String>,
    matte: Option<String>,
}

#[derive(Deserialize, Default)]
struct TomlFonts {
    family: Option<String>,
}

impl Theme {
    /// Load theme from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ThemeError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load theme from TOML string
    pub fn from_str(content: &str) -> Result<Self, ThemeError> {
        let parsed: TomlTheme = toml::from_str(content)?;
        let defaults = Self::default();

        let theme = Theme {
            name: parsed.metadata.as_ref().and_then(|m| m.name.clone()),
            description: parsed.metadata.as_ref().and_then(|m| m.description.clone()),
            background: parsed.colors.background.unwrap_or(defaults.background),
            text: parsed.colors.text.unwrap_or(defaults.text),
            muted: parsed.colors.muted.unwrap_or(defaults.muted),
            matte: parsed.colors.matte.unwrap_or(defaults.matte),
            font_family: parsed.fonts.family.unwrap_or(defaults.font_family),
        };
        theme.validate()?;
        Ok(theme)
    }

    fn validate(&self) -> Result<(), ThemeError> {
        for (key, value) in [
            ("background", &self.background),
            ("text", &self.text),
            ("muted", &self.muted),
            ("matte", &self.matte),
        ] {
            if parse_hex_color(value).is_none() {
                return Err(ThemeError::InvalidColor {
                    key,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    /// Matte color as RGB components
    pub fn matte_rgb(&self) -> (u8, u8, u8) {
        parse_hex_color(&self.matte).unwrap_or((255, 255, 255))
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: None,
            description: None,
            background: "#000000".to_string(),
            text: "#ffffff".to_string(),
            muted: "#aaaaaa".to_string(),
            matte: "#ffffff".to_string(),
            font_family: "sans-serif".to_string(),
        }
    }
}

/// Parse `#rgb` or `#rrggbb` into components
pub fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
    let hex = value.strip_prefix('#')?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut chars = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
            Some((chars.next()??, chars.next()??, chars.next()??))
        }
        6 => Some((
            channel(hex.get(0..2)?)?,
            channel(hex.get(2..4)?)?,
            channel(hex.get(4..6)?)?,
        )),
        _ => None,
    }
}
