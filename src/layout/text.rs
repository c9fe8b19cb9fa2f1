//! Text measurement and line wrapping
//!
//! Wrapping needs advance widths. [`FontMeasure`] reads them from the same
//! font database the rasterizer shapes with; [`HeuristicMeasure`] is a
//! font-independent fallback used when no face is available and in tests.

use std::sync::Arc;

use fontdb::{Database, Family, Query, Weight};

use super::types::FontWeight;

/// Width of a single-line text run, in canvas units
pub trait TextMeasure: Send + Sync {
    fn measure(&self, text: &str, font_size: f64, weight: FontWeight) -> f64;
}

/// Advance widths estimated from character classes
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicMeasure;

/// Bold faces run slightly wider than regular ones
const BOLD_WIDTH_FACTOR: f64 = 1.06;

impl HeuristicMeasure {
    /// Approximate advance of `c` in em units
    pub fn char_width(c: char) -> f64 {
        match c {
            ' ' => 0.28,
            'i' | 'j' | 'l' | '.' | ',' | '\'' | '!' | '|' | ':' | ';' => 0.28,
            'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | '-' => 0.36,
            'm' | 'w' | 'M' | 'W' | '@' => 0.86,
            '0'..='9' => 0.56,
            c if c.is_ascii_uppercase() => 0.68,
            c if c.is_ascii() => 0.54,
            // CJK and emoji render roughly square
            _ => 1.0,
        }
    }
}

impl TextMeasure for HeuristicMeasure {
    fn measure(&self, text: &str, font_size: f64, weight: FontWeight) -> f64 {
        let ems: f64 = text.chars().map(Self::char_width).sum();
        let width = ems * font_size;
        match weight {
            FontWeight::Regular => width,
            FontWeight::Bold => width * BOLD_WIDTH_FACTOR,
        }
    }
}

/// Advance widths read from the font faces the rasterizer will use
pub struct FontMeasure {
    fonts: Arc<Database>,
    family: String,
}

impl FontMeasure {
    /// Create a measurer, or `None` when no face in `fonts` matches `family`
    pub fn new(fonts: Arc<Database>, family: impl Into<String>) -> Option<Self> {
        let measure = Self {
            fonts,
            family: family.into(),
        };
        measure.face_id(FontWeight::Regular)?;
        Some(measure)
    }

    fn face_id(&self, weight: FontWeight) -> Option<fontdb::ID> {
        let requested = family_from_name(&self.family);
        let families = [requested, Family::SansSerif];
        let query = Query {
            families: &families,
            weight: match weight {
                FontWeight::Regular => Weight::NORMAL,
                FontWeight::Bold => Weight::BOLD,
            },
            ..Query::default()
        };
        self.fonts.query(&query)
    }
}

impl TextMeasure for FontMeasure {
    fn measure(&self, text: &str, font_size: f64, weight: FontWeight) -> f64 {
        let fallback = || HeuristicMeasure.measure(text, font_size, weight);
        let Some(id) = self.face_id(weight) else {
            return fallback();
        };

        self.fonts
            .with_face_data(id, |data, index| {
                let face = ttf_parser::Face::parse(data, index).ok()?;
                let units_per_em = f64::from(face.units_per_em());
                let ems: f64 = text
                    .chars()
                    .map(|c| {
                        face.glyph_index(c)
                            .and_then(|glyph| face.glyph_hor_advance(glyph))
                            .map(|advance| f64::from(advance) / units_per_em)
                            .unwrap_or_else(|| HeuristicMeasure::char_width(c))
                    })
                    .sum();
                Some(ems * font_size)
            })
            .flatten()
            .unwrap_or_else(fallback)
    }
}

/// Map a CSS-style family name onto a fontdb family
pub fn family_from_name(name: &str) -> Family<'_> {
    match name {
        "sans-serif" => Family::SansSerif,
        "serif" => Family::Serif,
        "monospace" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        other => Family::Name(other),
    }
}

/// Greedily break `text` into lines no wider than `max_width`
///
/// Whitespace runs collapse to single spaces. A word wider than the box is
/// never split; it takes a line of its own and overflows.
pub fn wrap_words<'a>(
    text: &'a str,
    max_width: f64,
    font_size: f64,
    weight: FontWeight,
    measure: &dyn TextMeasure,
) -> Vec<Vec<&'a str>> {
    let mut lines: Vec<Vec<&str>> = vec![];
    let mut current: Vec<&str> = vec![];

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push(word);
            continue;
        }

        let candidate = format!("{} {}", current.join(" "), word);
        if measure.measure(&candidate, font_size, weight) <= max_width {
            current.push(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push(word);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
