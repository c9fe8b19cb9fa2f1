//! Configuration for scene generation and rasterization

use std::path::PathBuf;

/// Default JPEG quality: the maximum
pub const DEFAULT_JPEG_QUALITY: u8 = 100;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

/// Configuration options for SVG scene output
#[derive(Debug, Clone)]
pub struct SvgConfig {
    /// Whether to include the XML declaration
    pub standalone: bool,

    /// Whether to format output with indentation
    pub pretty_print: bool,

    /// Prefix for CSS class names (e.g., "cs-" for "cs-text")
    pub class_prefix: Option<String>,
}

impl Default for SvgConfig {
    fn default() -> Self {
        Self {
            standalone: true,
            pretty_print: true,
            class_prefix: Some("cs-".to_string()),
        }
    }
}

impl SvgConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether output is standalone
    pub fn with_standalone(mut self, standalone: bool) -> Self {
        self.standalone = standalone;
        self
    }

    /// Set whether to pretty-print output
    pub fn with_pretty_print(mut self, pretty: bool) -> Self {
        self.pretty_print = pretty;
        self
    }

    /// Set the CSS class prefix
    pub fn with_class_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.class_prefix = Some(prefix.into());
        self
    }
}

/// Configuration for the offscreen rasterizer
#[derive(Debug, Clone)]
pub struct RasterConfig {
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,

    /// Load fonts installed on the host
    pub load_system_fonts: bool,

    /// Extra directories scanned for font files
    pub font_dirs: Vec<PathBuf>,

    /// Scene settings used when drawing
    pub svg: SvgConfig,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            load_system_fonts: true,
            font_dirs: vec![],
            svg: SvgConfig::default().with_pretty_print(false),
        }
    }
}

impl RasterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the JPEG quality, clamped to 1-100
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = clamp_quality(quality);
        self
    }

    pub fn with_system_fonts(mut self, load: bool) -> Self {
        self.load_system_fonts = load;
        self
    }

    /// Add a directory to scan for font files
    pub fn with_font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.font_dirs.push(dir.into());
        self
    }
}

/// Clamp quality to valid range.
///
/// Values below 1 become 1, values above 100 become 100.
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY)
}
