//! Offscreen render targets keyed by slide id

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::CaptureError;
use crate::layout::{LayoutEngine, ResolvedLayout};
use crate::store::{CarouselSnapshot, SlideId};

/// The offscreen representation of one slide
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTarget {
    slide_id: SlideId,
    revision: u64,
    layout: ResolvedLayout,
}

impl RenderTarget {
    pub fn new(slide_id: SlideId, revision: u64, layout: ResolvedLayout) -> Self {
        Self {
            slide_id,
            revision,
            layout,
        }
    }

    pub fn slide_id(&self) -> SlideId {
        self.slide_id
    }

    /// Store revision the layout was resolved from
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn layout(&self) -> &ResolvedLayout {
        &self.layout
    }
}

/// Render targets for exactly one snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderFrame {
    revision: u64,
    targets: HashMap<SlideId, Arc<RenderTarget>>,
}

impl RenderFrame {
    pub fn new(revision: u64, targets: impl IntoIterator<Item = Arc<RenderTarget>>) -> Self {
        Self {
            revision,
            targets: targets.into_iter().map(|t| (t.slide_id(), t)).collect(),
        }
    }

    /// Revision of the snapshot the frame was resolved from
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Target for `id`, or `None` when the slide has no offscreen element
    pub fn target(&self, id: SlideId) -> Option<Arc<RenderTarget>> {
        self.targets.get(&id).cloned()
    }

    pub fn targets(&self) -> impl Iterator<Item = &Arc<RenderTarget>> {
        self.targets.values()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Holds the offscreen targets that export captures from
#[async_trait]
pub trait RenderHost: Send + Sync {
    /// Resolve once the offscreen elements reflect `snapshot`
    ///
    /// The returned frame holds targets for that snapshot and no other, so
    /// edits committed later never show up in it.
    async fn render_committed(
        &self,
        snapshot: Arc<CarouselSnapshot>,
    ) -> Result<Arc<RenderFrame>, CaptureError>;
}

struct Committed {
    snapshot: Arc<CarouselSnapshot>,
    frame: Arc<RenderFrame>,
}

/// In-process host that keeps one resolved layout per slide
///
/// Targets are keyed by slide id, never by position, so reordering or
/// removing slides cannot make a capture pick up a neighbour's content.
/// The live frame follows the newest snapshot seen; the last committed
/// store revision is published on a watch channel.
pub struct OffscreenHost {
    engine: LayoutEngine,
    live: RwLock<Option<Committed>>,
    committed: watch::Sender<Option<u64>>,
}

impl OffscreenHost {
    pub fn new(engine: LayoutEngine) -> Self {
        let (committed, _rx) = watch::channel(None);
        Self {
            engine,
            live: RwLock::new(None),
            committed,
        }
    }

    pub fn engine(&self) -> &LayoutEngine {
        &self.engine
    }

    /// Last store revision the live targets reflect, `None` before the first sync
    pub fn committed_revision(&self) -> Option<u64> {
        *self.committed.borrow()
    }

    /// Watch the committed revision
    pub fn committed(&self) -> watch::Receiver<Option<u64>> {
        self.committed.subscribe()
    }

    /// Live target for `id`
    pub async fn target(&self, id: SlideId) -> Option<Arc<RenderTarget>> {
        let live = self.live.read().await;
        live.as_ref().and_then(|c| c.frame.target(id))
    }

    pub async fn len(&self) -> usize {
        let live = self.live.read().await;
        live.as_ref().map_or(0, |c| c.frame.len())
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Resolve every slide of `snapshot` into a frame
    pub fn resolve(&self, snapshot: &CarouselSnapshot) -> RenderFrame {
        let revision = snapshot.revision();
        RenderFrame::new(
            revision,
            snapshot.slides().iter().map(|slide| {
                let layout = self.engine.resolve(snapshot.header(), slide);
                Arc::new(RenderTarget::new(slide.id, revision, layout))
            }),
        )
    }

    /// Rebuild the live targets from `snapshot`
    ///
    /// Snapshots older than the committed revision are ignored. Targets of
    /// slides missing from the snapshot are dropped.
    pub async fn sync(&self, snapshot: Arc<CarouselSnapshot>) {
        let frame = Arc::new(self.resolve(&snapshot));
        self.commit(snapshot, frame).await;
    }

    async fn commit(&self, snapshot: Arc<CarouselSnapshot>, frame: Arc<RenderFrame>) {
        let mut live = self.live.write().await;
        let revision = snapshot.revision();
        if let Some(current) = live.as_ref() {
            let committed = current.snapshot.revision();
            if revision < committed {
                debug!(revision, committed, "ignoring stale snapshot");
                return;
            }
        }

        debug!(revision, targets = frame.len(), "render targets committed");
        *live = Some(Committed { snapshot, frame });
        self.committed.send_replace(Some(revision));
    }

    /// Live frame, if it was resolved from a snapshot equal to `snapshot`
    async fn live_frame_for(&self, snapshot: &Arc<CarouselSnapshot>) -> Option<Arc<RenderFrame>> {
        let live = self.live.read().await;
        live.as_ref()
            .filter(|c| Arc::ptr_eq(&c.snapshot, snapshot) || *c.snapshot == **snapshot)
            .map(|c| Arc::clone(&c.frame))
    }

    /// Keep the live targets in step with a store subscription
    ///
    /// The task ends when the store is dropped.
    pub fn follow(
        self: Arc<Self>,
        mut snapshots: watch::Receiver<Arc<CarouselSnapshot>>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let snapshot = Arc::clone(&snapshots.borrow_and_update());
                self.sync(snapshot).await;
                if snapshots.changed().await.is_err() {
                    break;
                }
            }
        })
    }
}

#[async_trait]
impl RenderHost for OffscreenHost {
    async fn render_committed(
        &self,
        snapshot: Arc<CarouselSnapshot>,
    ) -> Result<Arc<RenderFrame>, CaptureError> {
        if let Some(frame) = self.live_frame_for(&snapshot).await {
            return Ok(frame);
        }

        // Older snapshots get a private frame; the live one stays current
        let frame = Arc::new(self.resolve(&snapshot));
        self.commit(snapshot, Arc::clone(&frame)).await;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ElementRole;
    use crate::store::{SlideField, SlideStore};

    fn host() -> OffscreenHost {
        OffscreenHost::new(LayoutEngine::default())
    }

    #[tokio::test]
    async fn test_sync_builds_target_per_slide() {
        let mut store = SlideStore::new();
        store.add();
        store.add();

        let host = host();
        host.sync(store.snapshot()).await;

        assert_eq!(host.len().await, 3);
        assert_eq!(host.committed_revision(), Some(store.snapshot().revision()));
        let target = host.target(SlideId(2)).await.unwrap();
        assert_eq!(target.slide_id(), SlideId(2));
        assert_eq!(target.layout().slide_id, SlideId(2));
    }

    #[tokio::test]
    async fn test_removed_slide_loses_its_target() {
        let mut store = SlideStore::new();
        store.add();
        let host = host();
        host.sync(store.snapshot()).await;

        store.remove(SlideId(1));
        let frame = host.render_committed(store.snapshot()).await.unwrap();

        assert!(frame.target(SlideId(1)).is_none());
        assert!(host.target(SlideId(1)).await.is_none());
        assert!(host.target(SlideId(2)).await.is_some());
    }

    #[tokio::test]
    async fn test_stale_snapshot_is_ignored() {
        let mut store = SlideStore::new();
        let old = store.snapshot();
        store.update(0, SlideField::Text("new".to_string())).unwrap();

        let host = host();
        host.sync(store.snapshot()).await;
        host.sync(old).await;

        let target = host.target(SlideId(1)).await.unwrap();
        assert_eq!(target.revision(), store.snapshot().revision());
    }

    #[tokio::test]
    async fn test_committing_older_snapshot_returns_its_own_frame() {
        let mut store = SlideStore::new();
        let old = store.snapshot();
        store.update(0, SlideField::Text("new".to_string())).unwrap();

        let host = host();
        host.sync(store.snapshot()).await;

        let frame = host.render_committed(Arc::clone(&old)).await.unwrap();
        assert_eq!(frame.revision(), old.revision());
        let expected = host.engine().resolve(old.header(), &old.slides()[0]);
        assert_eq!(frame.target(SlideId(1)).unwrap().layout(), &expected);

        // The live frame still shows the newest edit
        let live = host.target(SlideId(1)).await.unwrap();
        assert_eq!(live.revision(), store.snapshot().revision());
    }

    #[tokio::test]
    async fn test_same_revision_different_content_is_resolved_again() {
        let mut first = SlideStore::new();
        first.update(0, SlideField::Text("first".to_string())).unwrap();
        let mut second = SlideStore::new();
        second.update(0, SlideField::Text("second".to_string())).unwrap();
        assert_eq!(first.snapshot().revision(), second.snapshot().revision());

        let host = host();
        host.sync(first.snapshot()).await;
        let frame = host.render_committed(second.snapshot()).await.unwrap();

        let target = frame.target(SlideId(1)).unwrap();
        let body = target.layout().text(ElementRole::Body).unwrap();
        assert_eq!(body.lines[0].text(), "second");
    }

    #[tokio::test]
    async fn test_follow_tracks_store_edits() {
        let mut store = SlideStore::new();
        let host = Arc::new(host());
        let mut committed = host.committed();
        let handle = Arc::clone(&host).follow(store.subscribe());

        let revision = store.add().revision();
        committed
            .wait_for(|rev| rev.is_some_and(|r| r >= revision))
            .await
            .unwrap();
        assert!(host.target(SlideId(2)).await.is_some());

        drop(store);
        handle.await.unwrap();
    }
}
