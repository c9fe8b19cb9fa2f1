//! Renderer for turning resolved layouts into scenes and images
//!
//! A [`ResolvedLayout`](crate::layout::ResolvedLayout) is first written as an
//! SVG scene, then drawn offscreen and encoded by the [`Rasterizer`].

pub mod config;
pub mod fonts;
pub mod raster;
pub mod svg;

pub use config::{clamp_quality, RasterConfig, SvgConfig, DEFAULT_JPEG_QUALITY};
pub use fonts::load_fonts;
pub use raster::{encode_jpeg, Artifact, Rasterizer};
pub use svg::{render_svg, SvgBuilder};
