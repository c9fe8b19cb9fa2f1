//! Slide and header records

use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageFormat, ImageReader};
use serde::{Deserialize, Serialize};

use crate::error::ImageError;

/// Default body text size in pixels
pub const DEFAULT_TEXT_SIZE: u32 = 28;

/// Default call-to-action text size in pixels
pub const DEFAULT_CTA_SIZE: u32 = 48;

/// Increment applied by a single size step
pub const SIZE_STEP: u32 = 2;

/// Smallest font size a slide may carry
pub const MIN_FONT_SIZE: u32 = 10;

/// Stable slide identifier, independent of the slide's position in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlideId(pub u32);

impl SlideId {
    /// Identifier that follows this one
    pub fn next(self) -> SlideId {
        SlideId(self.0 + 1)
    }
}

impl fmt::Display for SlideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Horizontal alignment of the body and CTA text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Justify,
}

/// Placement of the profile header row across the card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderAlignment {
    Start,
    #[default]
    Center,
    End,
}

/// Opaque handle to an encoded image supplied by the form UI
///
/// The encoded bytes are shared, so cloning a reference into every snapshot
/// is cheap. Format and pixel dimensions are read once, on construction.
#[derive(Clone, PartialEq)]
pub struct ImageRef {
    bytes: Arc<[u8]>,
    format: ImageFormat,
    width: u32,
    height: u32,
}

impl ImageRef {
    /// Wrap encoded image bytes (PNG, JPEG, GIF or WebP)
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, ImageError> {
        let bytes: Vec<u8> = bytes.into();
        let format = image::guess_format(&bytes)?;
        if !matches!(
            format,
            ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Gif | ImageFormat::WebP
        ) {
            return Err(ImageError::Unsupported(format!("{:?}", format)));
        }

        let (width, height) =
            ImageReader::with_format(Cursor::new(&bytes), format).into_dimensions()?;
        if width == 0 || height == 0 {
            return Err(ImageError::Unsupported("image has no pixels".to_string()));
        }

        Ok(Self {
            bytes: bytes.into(),
            format,
            width,
            height,
        })
    }

    /// Read and wrap an image file
    pub fn from_file(path: &Path) -> Result<Self, ImageError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Intrinsic size in pixels as `(width, height)`
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Encode the image as a `data:` URI for embedding in a scene
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), STANDARD.encode(&self.bytes))
    }
}

impl fmt::Debug for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageRef")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Profile header shared by every slide
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeaderState {
    pub profile_image: Option<ImageRef>,
    pub display_name: String,
    pub handle: String,
    pub alignment: HeaderAlignment,
}

/// One carousel slide
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    pub id: SlideId,
    pub text: String,
    pub image: Option<ImageRef>,
    pub cta: String,
    pub text_size: u32,
    pub cta_size: u32,
    pub alignment: TextAlignment,
}

impl Slide {
    /// Create a slide with default field values
    pub fn new(id: SlideId) -> Self {
        Self {
            id,
            text: String::new(),
            image: None,
            cta: String::new(),
            text_size: DEFAULT_TEXT_SIZE,
            cta_size: DEFAULT_CTA_SIZE,
            alignment: TextAlignment::default(),
        }
    }

    /// Replace a single field
    ///
    /// Sizes are clamped to [`MIN_FONT_SIZE`]; every other value is taken as is.
    pub fn apply(&mut self, field: SlideField) {
        match field {
            SlideField::Text(text) => self.text = text,
            SlideField::Image(image) => self.image = image,
            SlideField::Cta(cta) => self.cta = cta,
            SlideField::TextSize(size) => self.text_size = size.max(MIN_FONT_SIZE),
            SlideField::CtaSize(size) => self.cta_size = size.max(MIN_FONT_SIZE),
            SlideField::Alignment(alignment) => self.alignment = alignment,
        }
    }

    /// Move one of the size fields by [`SIZE_STEP`], never below the floor
    pub fn step_size(&mut self, which: SizeField, step: Step) {
        let current = match which {
            SizeField::Text => &mut self.text_size,
            SizeField::Cta => &mut self.cta_size,
        };
        *current = match step {
            Step::Up => current.saturating_add(SIZE_STEP),
            Step::Down => current.saturating_sub(SIZE_STEP).max(MIN_FONT_SIZE),
        };
    }
}

/// A single-field edit to a slide
#[derive(Debug, Clone, PartialEq)]
pub enum SlideField {
    Text(String),
    Image(Option<ImageRef>),
    Cta(String),
    TextSize(u32),
    CtaSize(u32),
    Alignment(TextAlignment),
}

/// A single-field edit to the shared header
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderField {
    ProfileImage(Option<ImageRef>),
    DisplayName(String),
    Handle(String),
    Alignment(HeaderAlignment),
}

impl HeaderState {
    pub fn apply(&mut self, field: HeaderField) {
        match field {
            HeaderField::ProfileImage(image) => self.profile_image = image,
            HeaderField::DisplayName(name) => self.display_name = name,
            HeaderField::Handle(handle) => self.handle = handle,
            HeaderField::Alignment(alignment) => self.alignment = alignment,
        }
    }
}

/// Which size a step applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeField {
    Text,
    Cta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Up,
    Down,
}
