//! Configuration for the layout engine

/// Geometry of the exported card
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Edge length of the square canvas
    pub canvas_size: f64,

    /// Padding between the canvas edge and every block
    pub padding: f64,

    /// Corner rounding of the card background
    pub corner_radius: f64,

    /// Vertical space below the header, body and image blocks
    pub block_gap: f64,

    /// Diameter of the profile image circle
    pub avatar_size: f64,

    /// Horizontal space between the profile image and the name column
    pub avatar_gap: f64,

    /// Font size of the display name
    pub name_font_size: f64,

    /// Font size of the handle
    pub handle_font_size: f64,

    /// Line box height as a multiple of the font size
    pub line_height: f64,

    /// Maximum slide image height as a fraction of the inner height
    pub image_max_height_fraction: f64,

    /// Top of the CTA block as a fraction of the canvas height
    pub cta_offset_fraction: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            canvas_size: 1080.0,
            padding: 40.0,
            corner_radius: 20.0,
            block_gap: 20.0,
            avatar_size: 80.0,
            avatar_gap: 20.0,
            name_font_size: 28.0,
            handle_font_size: 20.0,
            line_height: 1.2,
            image_max_height_fraction: 0.3,
            cta_offset_fraction: 0.75,
        }
    }
}

impl LayoutConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the canvas edge length
    pub fn with_canvas_size(mut self, size: f64) -> Self {
        self.canvas_size = size;
        self
    }

    /// Set the card padding
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    /// Set where the CTA block starts, as a fraction of the canvas height
    pub fn with_cta_offset_fraction(mut self, fraction: f64) -> Self {
        self.cta_offset_fraction = fraction;
        self
    }

    /// Set the maximum slide image height, as a fraction of the inner height
    pub fn with_image_max_height_fraction(mut self, fraction: f64) -> Self {
        self.image_max_height_fraction = fraction;
        self
    }

    /// Width available to text and images
    pub fn inner_width(&self) -> f64 {
        self.canvas_size - 2.0 * self.padding
    }

    /// Height inside the padding
    pub fn inner_height(&self) -> f64 {
        self.canvas_size - 2.0 * self.padding
    }

    /// Canvas edge length in whole pixels
    pub fn pixel_size(&self) -> u32 {
        self.canvas_size.round().max(1.0) as u32
    }
}
