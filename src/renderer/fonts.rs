//! Font discovery shared by text measurement and rasterization

use std::collections::HashSet;
use std::sync::Arc;

use fontdb::Database;
use tracing::{debug, warn};

use super::RasterConfig;

/// Load the font database described by `config`
///
/// Generic families are pointed at the first well-known face that is
/// installed, so `sans-serif` resolves the same way on every platform that
/// has one of them.
pub fn load_fonts(config: &RasterConfig) -> Arc<Database> {
    let mut db = Database::new();

    if config.load_system_fonts {
        db.load_system_fonts();
    }
    for dir in &config.font_dirs {
        debug!(dir = %dir.display(), "loading font directory");
        db.load_fonts_dir(dir);
    }

    let families: HashSet<String> = db
        .faces()
        .flat_map(|face| face.families.iter().map(|(name, _)| name.clone()))
        .collect();

    let pick = |candidates: &[&'static str]| {
        candidates
            .iter()
            .copied()
            .find(|family| families.contains(*family))
    };

    if let Some(family) = pick(&[
        "Arial",
        "Helvetica",
        "Liberation Sans",
        "DejaVu Sans",
        "Noto Sans",
    ]) {
        db.set_sans_serif_family(family);
    }
    if let Some(family) = pick(&["Times New Roman", "Times", "Liberation Serif", "DejaVu Serif"]) {
        db.set_serif_family(family);
    }
    if let Some(family) = pick(&["Courier New", "Courier", "Liberation Mono", "DejaVu Sans Mono"]) {
        db.set_monospace_family(family);
    }

    if db.is_empty() {
        warn!("no fonts found; slide text will not be drawn");
    } else {
        debug!(faces = db.len(), "font database ready");
    }

    Arc::new(db)
}
