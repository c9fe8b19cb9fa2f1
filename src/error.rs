//! Error types shared across the store, rendering and export layers

use thiserror::Error;

use crate::store::SlideId;

/// Errors raised by [`SlideStore`](crate::store::SlideStore) mutations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The targeted slide index does not exist
    #[error("slide index {index} out of range (store holds {len} slides)")]
    OutOfRange { index: usize, len: usize },
}

/// Errors raised while building an [`ImageRef`](crate::store::ImageRef)
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),

    /// Encoded bytes are an image, but not one the renderer can embed
    #[error("unsupported image format: {0}")]
    Unsupported(String),

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Errors raised while drawing a resolved layout offscreen
#[derive(Debug, Error)]
pub enum RasterError {
    /// The generated scene could not be parsed back by the SVG engine
    #[error("invalid scene: {0}")]
    Svg(#[from] usvg::Error),

    /// The offscreen surface could not be allocated
    #[error("cannot allocate a {width}x{height} surface")]
    Surface { width: u32, height: u32 },

    #[error("failed to encode artifact: {0}")]
    Encode(#[from] image::ImageError),
}

/// Per-slide capture failures
///
/// These never abort an export batch; the coordinator records a null
/// artifact for the slide and moves on.
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    /// No offscreen render target exists for the slide at capture time
    #[error("render target for slide {id} is unavailable")]
    Unavailable { id: SlideId },

    /// The offscreen host did not confirm the requested revision in time
    #[error("render of revision {revision} was not committed in time")]
    CommitTimeout { revision: u64 },

    #[error("rasterizing slide {id} failed: {message}")]
    Raster { id: SlideId, message: String },

    /// The capture task panicked or was cancelled
    #[error("capture of slide {id} aborted: {message}")]
    Aborted { id: SlideId, message: String },
}

impl CaptureError {
    /// Slide the failure belongs to, if it is scoped to one
    pub fn slide_id(&self) -> Option<SlideId> {
        match self {
            Self::Unavailable { id } | Self::Raster { id, .. } | Self::Aborted { id, .. } => {
                Some(*id)
            }
            Self::CommitTimeout { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_display() {
        let err = StoreError::OutOfRange { index: 4, len: 2 };
        assert_eq!(
            err.to_string(),
            "slide index 4 out of range (store holds 2 slides)"
        );
    }

    #[test]
    fn test_capture_error_slide_id() {
        let err = CaptureError::Unavailable { id: SlideId(7) };
        assert_eq!(err.slide_id(), Some(SlideId(7)));
        assert!(err.to_string().contains("slide 7"));

        let timeout = CaptureError::CommitTimeout { revision: 3 };
        assert_eq!(timeout.slide_id(), None);
    }
}
