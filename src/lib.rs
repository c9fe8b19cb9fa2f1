//! Carousel Studio - square social-media slides rendered offscreen
//!
//! The crate holds an ordered list of slides sharing a profile header,
//! resolves each slide into a fixed-size layout, draws it offscreen and
//! exports every slide as a JPEG in one batch.
//!
//! # Example
//!
//! ```no_run
//! use carousel_studio::{CarouselComposer, ComposerConfig, SlideField};
//!
//! # async fn run() -> Result<(), carousel_studio::StoreError> {
//! let mut composer = CarouselComposer::new(ComposerConfig::default());
//! composer.update(0, SlideField::Text("Hello".to_string()))?;
//! composer.add();
//!
//! let batch = composer.export_all().await;
//! for link in batch.downloads() {
//!     println!("{} -> {}", link.label, link.file_name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod deck;
pub mod error;
pub mod export;
pub mod layout;
pub mod renderer;
pub mod store;
pub mod theme;

use std::sync::Arc;

use fontdb::Database;
use tokio::task::JoinHandle;

pub use deck::{Deck, DeckError};
pub use error::{CaptureError, ImageError, RasterError, StoreError};
pub use export::{
    Artifact, DownloadLink, ExportBatch, ExportConfig, ExportCoordinator, ExportEntry,
    OffscreenHost, RenderFrame, RenderHost, RenderTarget,
};
pub use layout::{FontMeasure, LayoutConfig, LayoutEngine, ResolvedLayout};
pub use renderer::{load_fonts, render_svg, RasterConfig, Rasterizer, SvgConfig};
pub use store::{
    CarouselSnapshot, HeaderAlignment, HeaderField, HeaderState, ImageRef, SizeField, Slide,
    SlideField, SlideId, SlideStore, Step, TextAlignment,
};
pub use theme::{Theme, ThemeError};

/// Configuration for the complete composer
#[derive(Debug, Clone, Default)]
pub struct ComposerConfig {
    /// Canvas geometry
    pub layout: LayoutConfig,
    /// Offscreen drawing and encoding
    pub raster: RasterConfig,
    /// Colors and font family
    pub theme: Theme,
    pub export: ExportConfig,
}

impl ComposerConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(mut self, config: LayoutConfig) -> Self {
        self.layout = config;
        self
    }

    pub fn with_raster(mut self, config: RasterConfig) -> Self {
        self.raster = config;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_export(mut self, config: ExportConfig) -> Self {
        self.export = config;
        self
    }
}

/// Slide editing and export behind one handle
///
/// Edits go to the [`SlideStore`]; export reads the store's latest snapshot
/// through the offscreen host, so an edit made while an export is running
/// never changes that export's slide list.
pub struct CarouselComposer {
    store: SlideStore,
    host: Arc<OffscreenHost>,
    coordinator: ExportCoordinator,
}

impl CarouselComposer {
    /// Create a composer with one default slide, loading fonts per `config`
    pub fn new(config: ComposerConfig) -> Self {
        let fonts = load_fonts(&config.raster);
        Self::with_fonts(config, fonts)
    }

    /// Create a composer sharing an already loaded font database
    pub fn with_fonts(config: ComposerConfig, fonts: Arc<Database>) -> Self {
        Self::with_store(config, fonts, SlideStore::new())
    }

    /// Create a composer around an existing store
    pub fn with_store(config: ComposerConfig, fonts: Arc<Database>, store: SlideStore) -> Self {
        let mut engine = LayoutEngine::new(config.layout, config.theme.clone());
        if let Some(measure) = FontMeasure::new(Arc::clone(&fonts), config.theme.font_family.clone())
        {
            engine = engine.with_measure(Arc::new(measure));
        }

        let host = Arc::new(OffscreenHost::new(engine));
        let rasterizer = Rasterizer::new(config.raster, &config.theme, fonts);
        let coordinator = ExportCoordinator::new(
            Arc::clone(&host) as Arc<dyn RenderHost>,
            rasterizer,
            config.export,
        );

        Self {
            store,
            host,
            coordinator,
        }
    }

    pub fn store(&self) -> &SlideStore {
        &self.store
    }

    pub fn snapshot(&self) -> Arc<CarouselSnapshot> {
        self.store.snapshot()
    }

    pub fn host(&self) -> &Arc<OffscreenHost> {
        &self.host
    }

    pub fn coordinator(&self) -> &ExportCoordinator {
        &self.coordinator
    }

    /// Append a default slide
    pub fn add(&mut self) -> Arc<CarouselSnapshot> {
        self.store.add()
    }

    pub fn remove(&mut self, id: SlideId) -> Arc<CarouselSnapshot> {
        self.store.remove(id)
    }

    pub fn update(
        &mut self,
        index: usize,
        field: SlideField,
    ) -> Result<Arc<CarouselSnapshot>, StoreError> {
        self.store.update(index, field)
    }

    pub fn adjust_size(
        &mut self,
        index: usize,
        which: SizeField,
        step: Step,
    ) -> Result<Arc<CarouselSnapshot>, StoreError> {
        self.store.adjust_size(index, which, step)
    }

    pub fn update_header(&mut self, field: HeaderField) -> Arc<CarouselSnapshot> {
        self.store.update_header(field)
    }

    /// Layout of the slide at `index` as the editor preview shows it
    pub fn preview(&self, index: usize) -> Option<ResolvedLayout> {
        let snapshot = self.store.snapshot();
        let slide = snapshot.slides().get(index)?;
        Some(self.host.engine().resolve(snapshot.header(), slide))
    }

    /// SVG scene of the slide at `index`
    pub fn scene(&self, index: usize) -> Option<String> {
        let layout = self.preview(index)?;
        Some(self.coordinator.rasterizer().scene(&layout))
    }

    /// Keep render targets current as edits happen
    ///
    /// Must be called inside a tokio runtime.
    pub fn follow_store(&self) -> JoinHandle<()> {
        Arc::clone(&self.host).follow(self.store.subscribe())
    }

    /// Export every slide of the current snapshot
    pub async fn export_all(&self) -> Arc<ExportBatch> {
        self.coordinator.export_all(self.store.snapshot()).await
    }

    /// Newest finished export
    pub async fn latest(&self) -> Option<Arc<ExportBatch>> {
        self.coordinator.latest().await
    }
}

impl Default for CarouselComposer {
    fn default() -> Self {
        Self::new(ComposerConfig::default())
    }
}
