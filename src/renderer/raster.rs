//! Offscreen rasterization of resolved layouts
//!
//! A layout is serialized to an SVG scene, parsed by `usvg`, drawn by
//! `resvg` onto a private `tiny-skia` pixmap and encoded as JPEG. Each call
//! owns its pixmap and parse options; only the font database is shared, and
//! it is never written after construction.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use fontdb::Database;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use tiny_skia::{Color, Pixmap, Transform};
use tracing::debug;

use crate::error::RasterError;
use crate::layout::ResolvedLayout;
use crate::store::SlideId;
use crate::theme::Theme;

use super::config::clamp_quality;
use super::svg::render_svg;
use super::RasterConfig;

/// An exported slide image
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    slide_id: SlideId,
    bytes: Bytes,
    width: u32,
    height: u32,
}

impl Artifact {
    /// File extension of every artifact
    pub const EXTENSION: &'static str = "jpeg";

    pub fn new(slide_id: SlideId, bytes: Bytes, width: u32, height: u32) -> Self {
        Self {
            slide_id,
            bytes,
            width,
            height,
        }
    }

    pub fn slide_id(&self) -> SlideId {
        self.slide_id
    }

    /// Encoded image bytes
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn mime_type(&self) -> &'static str {
        "image/jpeg"
    }

    /// Suggested download name, `slide-<id>.jpeg`
    pub fn file_name(&self) -> String {
        format!("slide-{}.{}", self.slide_id, Self::EXTENSION)
    }

    /// The artifact as a `data:` URL
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), STANDARD.encode(&self.bytes))
    }
}

/// Draws resolved layouts onto offscreen surfaces
#[derive(Clone)]
pub struct Rasterizer {
    config: RasterConfig,
    fonts: Arc<Database>,
    matte: Color,
}

impl Rasterizer {
    pub fn new(config: RasterConfig, theme: &Theme, fonts: Arc<Database>) -> Self {
        let (r, g, b) = theme.matte_rgb();
        Self {
            config,
            fonts,
            matte: Color::from_rgba8(r, g, b, 255),
        }
    }

    pub fn config(&self) -> &RasterConfig {
        &self.config
    }

    /// Fonts used for shaping; shared with text measurement
    pub fn fonts(&self) -> &Arc<Database> {
        &self.fonts
    }

    /// The SVG scene a layout is drawn from
    pub fn scene(&self, layout: &ResolvedLayout) -> String {
        render_svg(layout, &self.config.svg)
    }

    /// Draw a layout and encode it as JPEG
    pub fn rasterize(&self, layout: &ResolvedLayout) -> Result<Artifact, RasterError> {
        let pixmap = self.draw(layout)?;
        let bytes = encode_jpeg(&pixmap, self.config.jpeg_quality)?;
        debug!(
            slide_id = %layout.slide_id,
            bytes = bytes.len(),
            "slide rasterized"
        );
        Ok(Artifact::new(
            layout.slide_id,
            bytes,
            pixmap.width(),
            pixmap.height(),
        ))
    }

    /// Draw a layout onto a fresh pixmap of the canvas size
    pub fn draw(&self, layout: &ResolvedLayout) -> Result<Pixmap, RasterError> {
        let size = layout.size.round().max(1.0) as u32;

        let mut options = usvg::Options::default();
        options.fontdb = Arc::clone(&self.fonts);

        let tree = usvg::Tree::from_str(&self.scene(layout), &options)?;

        let mut pixmap = Pixmap::new(size, size).ok_or(RasterError::Surface {
            width: size,
            height: size,
        })?;
        pixmap.fill(self.matte);

        let tree_size = tree.size();
        let transform = Transform::from_scale(
            size as f32 / tree_size.width(),
            size as f32 / tree_size.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        Ok(pixmap)
    }
}

/// Encode a pixmap as baseline JPEG, dropping alpha
pub fn encode_jpeg(pixmap: &Pixmap, quality: u8) -> Result<Bytes, RasterError> {
    let rgb: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|pixel| {
            let c = pixel.demultiply();
            [c.red(), c.green(), c.blue()]
        })
        .collect();

    let image =
        RgbImage::from_raw(pixmap.width(), pixmap.height(), rgb).ok_or(RasterError::Surface {
            width: pixmap.width(),
            height: pixmap.height(),
        })?;

    let mut output = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut output, clamp_quality(quality));
    encoder.encode_image(&image)?;

    Ok(Bytes::from(output))
}
