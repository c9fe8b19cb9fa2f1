//! Batch export of every slide

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::CaptureError;
use crate::renderer::{Artifact, Rasterizer};
use crate::store::{CarouselSnapshot, SlideId};

use super::target::{RenderFrame, RenderHost};

/// Default bound on waiting for the offscreen host to commit
pub const DEFAULT_COMMIT_TIMEOUT: Duration = Duration::from_secs(2);

/// Configuration for export batches
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// How long to wait for the render-committed signal before capturing
    pub commit_timeout: Duration,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            commit_timeout: DEFAULT_COMMIT_TIMEOUT,
        }
    }
}

impl ExportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_commit_timeout(mut self, commit_timeout: Duration) -> Self {
        self.commit_timeout = commit_timeout;
        self
    }
}

/// One slide's export outcome; `artifact` is `None` when capture failed
#[derive(Debug, Clone, PartialEq)]
pub struct ExportEntry {
    pub id: SlideId,
    pub artifact: Option<Artifact>,
}

/// A retrievable link for the download list
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadLink {
    pub id: SlideId,
    pub label: String,
    pub file_name: String,
    pub artifact: Artifact,
}

impl DownloadLink {
    fn new(id: SlideId, artifact: &Artifact) -> Self {
        Self {
            id,
            label: format!("Download Slide {}", id),
            file_name: artifact.file_name(),
            artifact: artifact.clone(),
        }
    }

    /// `data:` URL of the artifact
    pub fn href(&self) -> String {
        self.artifact.data_url()
    }
}

/// Result of one `export_all` call, in store display order
#[derive(Debug, Clone, PartialEq)]
pub struct ExportBatch {
    generation: u64,
    revision: u64,
    entries: Vec<ExportEntry>,
}

impl ExportBatch {
    /// Sequence number of the request that produced this batch
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Store revision the batch was exported from
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn entries(&self) -> &[ExportEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<SlideId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    /// Successfully captured artifacts, in order
    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.entries.iter().filter_map(|e| e.artifact.as_ref())
    }

    /// Ids whose capture failed
    pub fn failed(&self) -> Vec<SlideId> {
        self.entries
            .iter()
            .filter(|e| e.artifact.is_none())
            .map(|e| e.id)
            .collect()
    }

    /// Download list: one link per non-null artifact
    pub fn downloads(&self) -> Vec<DownloadLink> {
        self.entries
            .iter()
            .filter_map(|e| e.artifact.as_ref().map(|a| DownloadLink::new(e.id, a)))
            .collect()
    }
}

/// Captures every slide of a snapshot from a [`RenderHost`]
pub struct ExportCoordinator {
    host: Arc<dyn RenderHost>,
    rasterizer: Rasterizer,
    config: ExportConfig,
    generation: AtomicU64,
    latest: RwLock<Option<Arc<ExportBatch>>>,
}

impl ExportCoordinator {
    pub fn new(host: Arc<dyn RenderHost>, rasterizer: Rasterizer, config: ExportConfig) -> Self {
        Self {
            host,
            rasterizer,
            config,
            generation: AtomicU64::new(0),
            latest: RwLock::new(None),
        }
    }

    pub fn host(&self) -> &Arc<dyn RenderHost> {
        &self.host
    }

    pub fn rasterizer(&self) -> &Rasterizer {
        &self.rasterizer
    }

    /// Newest finished batch
    pub async fn latest(&self) -> Option<Arc<ExportBatch>> {
        self.latest.read().await.clone()
    }

    /// Export every slide in `snapshot`
    ///
    /// Captures run concurrently, one blocking task per slide. A failed
    /// capture becomes a `None` entry; no error escapes the batch. The
    /// result replaces [`latest`](Self::latest) unless a newer request has
    /// already finished.
    pub async fn export_all(&self, snapshot: Arc<CarouselSnapshot>) -> Arc<ExportBatch> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let revision = snapshot.revision();
        let ids = snapshot.ids();
        info!(generation, revision, slides = ids.len(), "export started");

        let frame = match timeout(
            self.config.commit_timeout,
            self.host.render_committed(Arc::clone(&snapshot)),
        )
        .await
        {
            Ok(Ok(frame)) if frame.revision() == revision => {
                debug!(generation, revision, targets = frame.len(), "render committed");
                Some(frame)
            }
            Ok(Ok(frame)) => {
                warn!(
                    generation,
                    revision,
                    frame_revision = frame.revision(),
                    "host committed a different revision"
                );
                None
            }
            Ok(Err(err)) => {
                warn!(generation, error = %err, "render not committed");
                None
            }
            Err(_) => {
                let err = CaptureError::CommitTimeout { revision };
                warn!(generation, error = %err, "render not committed");
                None
            }
        };

        let results: Vec<Result<Artifact, CaptureError>> = match &frame {
            Some(frame) => join_all(ids.iter().map(|&id| self.capture(frame, id))).await,
            None => ids
                .iter()
                .map(|&id| Err(CaptureError::Unavailable { id }))
                .collect(),
        };

        let entries: Vec<ExportEntry> = ids
            .into_iter()
            .zip(results)
            .map(|(id, result)| match result {
                Ok(artifact) => ExportEntry {
                    id,
                    artifact: Some(artifact),
                },
                Err(err) => {
                    warn!(generation, slide_id = %id, error = %err, "slide left out of export");
                    ExportEntry { id, artifact: None }
                }
            })
            .collect();

        let batch = Arc::new(ExportBatch {
            generation,
            revision,
            entries,
        });
        info!(
            generation,
            exported = batch.artifacts().count(),
            failed = batch.failed().len(),
            "export finished"
        );

        self.publish(Arc::clone(&batch)).await;
        batch
    }

    /// Capture one slide from a committed frame
    pub async fn capture(
        &self,
        frame: &RenderFrame,
        id: SlideId,
    ) -> Result<Artifact, CaptureError> {
        let target = frame
            .target(id)
            .filter(|t| t.revision() == frame.revision())
            .ok_or(CaptureError::Unavailable { id })?;

        let rasterizer = self.rasterizer.clone();
        tokio::task::spawn_blocking(move || rasterizer.rasterize(target.layout()))
            .await
            .map_err(|err| CaptureError::Aborted {
                id,
                message: err.to_string(),
            })?
            .map_err(|err| CaptureError::Raster {
                id,
                message: err.to_string(),
            })
    }

    async fn publish(&self, batch: Arc<ExportBatch>) {
        let mut latest = self.latest.write().await;
        match latest.as_ref() {
            Some(current) if current.generation > batch.generation => {
                debug!(
                    generation = batch.generation,
                    newer = current.generation,
                    "discarding superseded export"
                );
            }
            _ => *latest = Some(batch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::OffscreenHost;
    use crate::layout::LayoutEngine;
    use crate::renderer::RasterConfig;
    use crate::store::SlideStore;
    use crate::theme::Theme;
    use async_trait::async_trait;
    use fontdb::Database;

    use crate::export::RenderTarget;
    use crate::store::SlideField;

    fn rasterizer() -> Rasterizer {
        let config = RasterConfig::default().with_system_fonts(false);
        Rasterizer::new(config, &Theme::default(), Arc::new(Database::new()))
    }

    fn coordinator(host: Arc<dyn RenderHost>) -> ExportCoordinator {
        ExportCoordinator::new(host, rasterizer(), ExportConfig::default())
    }

    /// Host that never confirms a commit
    struct StalledHost;

    #[async_trait]
    impl RenderHost for StalledHost {
        async fn render_committed(
            &self,
            _: Arc<CarouselSnapshot>,
        ) -> Result<Arc<RenderFrame>, CaptureError> {
            std::future::pending().await
        }
    }

    /// Host that always hands back the same frame
    struct FixedHost(Arc<RenderFrame>);

    #[async_trait]
    impl RenderHost for FixedHost {
        async fn render_committed(
            &self,
            _: Arc<CarouselSnapshot>,
        ) -> Result<Arc<RenderFrame>, CaptureError> {
            Ok(Arc::clone(&self.0))
        }
    }

    #[tokio::test]
    async fn test_export_keeps_store_order() {
        let mut store = SlideStore::new();
        store.add();
        store.add();
        store.remove(SlideId(2));

        let host = Arc::new(OffscreenHost::new(LayoutEngine::default()));
        let batch = coordinator(host).export_all(store.snapshot()).await;

        assert_eq!(batch.ids(), vec![SlideId(1), SlideId(3)]);
        assert_eq!(batch.artifacts().count(), 2);
        assert!(batch.failed().is_empty());
    }

    #[tokio::test]
    async fn test_empty_store_exports_nothing() {
        let store = SlideStore::empty();
        let host = Arc::new(OffscreenHost::new(LayoutEngine::default()));
        let batch = coordinator(host).export_all(store.snapshot()).await;

        assert!(batch.is_empty());
        assert!(batch.downloads().is_empty());
    }

    #[tokio::test]
    async fn test_commit_timeout_yields_null_entries() {
        let store = SlideStore::new();
        let coordinator = ExportCoordinator::new(
            Arc::new(StalledHost),
            rasterizer(),
            ExportConfig::new().with_commit_timeout(Duration::from_millis(20)),
        );

        let batch = coordinator.export_all(store.snapshot()).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.failed(), vec![SlideId(1)]);
    }

    #[tokio::test]
    async fn test_capture_of_unknown_slide_is_unavailable() {
        let host = Arc::new(OffscreenHost::new(LayoutEngine::default()));
        let err = coordinator(host)
            .capture(&RenderFrame::default(), SlideId(9))
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::Unavailable { id } if id == SlideId(9)));
    }

    #[tokio::test]
    async fn test_export_captures_the_requested_snapshot() {
        let mut store = SlideStore::new();
        let old = store.snapshot();
        store.update(0, SlideField::Text("edited".to_string())).unwrap();

        // The live targets already show the edit
        let host = Arc::new(OffscreenHost::new(LayoutEngine::default()));
        host.sync(store.snapshot()).await;
        let coordinator = coordinator(host.clone());

        let batch = coordinator.export_all(Arc::clone(&old)).await;
        assert_eq!(batch.revision(), old.revision());

        let layout = host.engine().resolve(old.header(), &old.slides()[0]);
        let expected = coordinator.rasterizer().rasterize(&layout).unwrap();
        let artifact = batch.artifacts().next().unwrap();
        assert_eq!(artifact.bytes(), expected.bytes());
    }

    #[tokio::test]
    async fn test_frame_from_other_revision_is_not_captured() {
        let mut store = SlideStore::new();
        let old = store.snapshot();
        store.add();

        let engine = LayoutEngine::default();
        let newer = OffscreenHost::new(engine).resolve(&store.snapshot());
        let coordinator = coordinator(Arc::new(FixedHost(Arc::new(newer))));

        let batch = coordinator.export_all(old).await;
        assert_eq!(batch.ids(), vec![SlideId(1)]);
        assert_eq!(batch.failed(), vec![SlideId(1)]);
    }

    #[tokio::test]
    async fn test_target_from_other_revision_is_not_captured() {
        let store = SlideStore::new();
        let snapshot = store.snapshot();
        let host = OffscreenHost::new(LayoutEngine::default());
        let layout = host.engine().resolve(snapshot.header(), &snapshot.slides()[0]);
        let frame = RenderFrame::new(
            snapshot.revision() + 1,
            [Arc::new(RenderTarget::new(SlideId(1), snapshot.revision(), layout))],
        );

        let err = coordinator(Arc::new(host))
            .capture(&frame, SlideId(1))
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_latest_tracks_newest_generation() {
        let store = SlideStore::new();
        let host = Arc::new(OffscreenHost::new(LayoutEngine::default()));
        let coordinator = coordinator(host);
        assert!(coordinator.latest().await.is_none());

        let first = coordinator.export_all(store.snapshot()).await;
        let second = coordinator.export_all(store.snapshot()).await;
        assert!(second.generation() > first.generation());

        // A late finisher from an older request must not win
        coordinator.publish(first).await;
        let latest = coordinator.latest().await.unwrap();
        assert_eq!(latest.generation(), second.generation());
    }

    #[test]
    fn test_download_links() {
        let artifact = Artifact::new(SlideId(4), bytes::Bytes::from_static(&[0xFF, 0xD8]), 1, 1);
        let batch = ExportBatch {
            generation: 1,
            revision: 1,
            entries: vec![
                ExportEntry {
                    id: SlideId(4),
                    artifact: Some(artifact),
                },
                ExportEntry {
                    id: SlideId(5),
                    artifact: None,
                },
            ],
        };

        let links = batch.downloads();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].label, "Download Slide 4");
        assert_eq!(links[0].file_name, "slide-4.jpeg");
        assert!(links[0].href().starts_with("data:image/jpeg;base64,"));
        assert_eq!(batch.ids(), vec![SlideId(4), SlideId(5)]);
    }
}
