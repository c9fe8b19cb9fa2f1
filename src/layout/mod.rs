//! Layout engine for computing slide element positions and sizes
//!
//! This module takes a header and a slide and computes the spatial layout,
//! producing a [`ResolvedLayout`] tree with every block positioned on the
//! fixed-size canvas.

pub mod config;
pub mod engine;
pub mod text;
pub mod types;

pub use config::LayoutConfig;
pub use engine::{compute, LayoutEngine};
pub use text::{wrap_words, FontMeasure, HeuristicMeasure, TextMeasure};
pub use types::*;
