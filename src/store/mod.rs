//! Slide data model
//!
//! The store owns the ordered slides and the shared profile header. Every
//! mutation publishes a fresh [`CarouselSnapshot`]; the layout and export
//! layers only ever see snapshots.

mod slide_store;
mod types;

pub use slide_store::{CarouselSnapshot, SlideStore};
pub use types::{
    HeaderAlignment, HeaderField, HeaderState, ImageRef, SizeField, Slide, SlideField, SlideId,
    Step, TextAlignment, DEFAULT_CTA_SIZE, DEFAULT_TEXT_SIZE, MIN_FONT_SIZE, SIZE_STEP,
};
