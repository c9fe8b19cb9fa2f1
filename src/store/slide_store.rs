//! Ordered slide collection with snapshot publication

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::error::StoreError;

use super::types::{HeaderField, HeaderState, SizeField, Slide, SlideField, SlideId, Step};

/// Immutable view of the whole carousel at one revision
///
/// Both the editor view and the render path read snapshots; neither ever
/// holds a mutable alias into the store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CarouselSnapshot {
    revision: u64,
    header: HeaderState,
    slides: Vec<Slide>,
}

impl CarouselSnapshot {
    /// Assemble an unpublished snapshot at revision 0
    ///
    /// Slides keep the given order; ids are taken as is.
    pub fn from_slides(header: HeaderState, slides: Vec<Slide>) -> Self {
        Self {
            revision: 0,
            header,
            slides,
        }
    }

    /// Monotonic counter, bumped by every committed mutation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn header(&self) -> &HeaderState {
        &self.header
    }

    /// Slides in display order
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    /// Slide ids in display order
    pub fn ids(&self) -> Vec<SlideId> {
        self.slides.iter().map(|s| s.id).collect()
    }

    pub fn slide(&self, id: SlideId) -> Option<&Slide> {
        self.slides.iter().find(|s| s.id == id)
    }

    fn next_id(&self) -> SlideId {
        self.slides
            .iter()
            .map(|s| s.id)
            .max()
            .map(SlideId::next)
            .unwrap_or(SlideId(1))
    }
}

/// State container for the slides and the shared header
///
/// Mutations never touch a published snapshot. Each one clones the current
/// state, edits the copy and publishes it under a new revision.
pub struct SlideStore {
    current: Arc<CarouselSnapshot>,
    tx: watch::Sender<Arc<CarouselSnapshot>>,
}

impl SlideStore {
    /// Create a session store holding one default slide
    pub fn new() -> Self {
        let mut store = Self::empty();
        store.add();
        store
    }

    /// Create a store with no slides
    pub fn empty() -> Self {
        Self::from_snapshot(CarouselSnapshot::default())
    }

    fn from_snapshot(snapshot: CarouselSnapshot) -> Self {
        let current = Arc::new(snapshot);
        let (tx, _rx) = watch::channel(Arc::clone(&current));
        Self { current, tx }
    }

    /// Current immutable state
    pub fn snapshot(&self) -> Arc<CarouselSnapshot> {
        Arc::clone(&self.current)
    }

    /// Receive every snapshot published after this call
    pub fn subscribe(&self) -> watch::Receiver<Arc<CarouselSnapshot>> {
        self.tx.subscribe()
    }

    pub fn len(&self) -> usize {
        self.current.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.slides.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Slide> {
        self.current.slides.get(index)
    }

    /// Display position of the slide with `id`
    pub fn position(&self, id: SlideId) -> Option<usize> {
        self.current.slides.iter().position(|s| s.id == id)
    }

    /// Append a default slide with the next free id
    pub fn add(&mut self) -> Arc<CarouselSnapshot> {
        self.commit(|state| {
            let id = state.next_id();
            debug!(slide_id = %id, "adding slide");
            state.slides.push(Slide::new(id));
        })
    }

    /// Remove the slide with `id`; unknown ids leave the store untouched
    pub fn remove(&mut self, id: SlideId) -> Arc<CarouselSnapshot> {
        if self.position(id).is_none() {
            return self.snapshot();
        }
        self.commit(|state| {
            debug!(slide_id = %id, "removing slide");
            state.slides.retain(|s| s.id != id);
        })
    }

    /// Replace one field on the slide at `index`
    ///
    /// Text and CTA sizes below the minimum font size are raised to it, the
    /// same floor that [`adjust_size`](Self::adjust_size) applies.
    pub fn update(
        &mut self,
        index: usize,
        field: SlideField,
    ) -> Result<Arc<CarouselSnapshot>, StoreError> {
        self.check_index(index)?;
        Ok(self.commit(|state| state.slides[index].apply(field)))
    }

    /// Step the text or CTA size of the slide at `index`
    pub fn adjust_size(
        &mut self,
        index: usize,
        which: SizeField,
        step: Step,
    ) -> Result<Arc<CarouselSnapshot>, StoreError> {
        self.check_index(index)?;
        Ok(self.commit(|state| state.slides[index].step_size(which, step)))
    }

    /// Replace one field on the shared header
    pub fn update_header(&mut self, field: HeaderField) -> Arc<CarouselSnapshot> {
        self.commit(|state| state.header.apply(field))
    }

    fn check_index(&self, index: usize) -> Result<(), StoreError> {
        let len = self.len();
        if index >= len {
            return Err(StoreError::OutOfRange { index, len });
        }
        Ok(())
    }

    fn commit(&mut self, edit: impl FnOnce(&mut CarouselSnapshot)) -> Arc<CarouselSnapshot> {
        let mut next = CarouselSnapshot::clone(&self.current);
        edit(&mut next);
        next.revision += 1;

        self.current = Arc::new(next);
        self.tx.send_replace(Arc::clone(&self.current));
        self.snapshot()
    }
}

impl Default for SlideStore {
    fn default() -> Self {
        Self::new()
    }
}
