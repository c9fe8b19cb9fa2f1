//! Offscreen capture and batch export
//!
//! [`OffscreenHost`] keeps one render target per slide id and signals when
//! the targets reflect a store revision. [`ExportCoordinator`] waits for that
//! signal, captures every slide concurrently and gathers the results in store
//! order.

mod coordinator;
mod target;

pub use coordinator::{
    DownloadLink, ExportBatch, ExportConfig, ExportCoordinator, ExportEntry,
    DEFAULT_COMMIT_TIMEOUT,
};
pub use target::{OffscreenHost, RenderFrame, RenderHost, RenderTarget};

pub use crate::renderer::Artifact;
