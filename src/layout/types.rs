//! Core types for the layout engine

use crate::store::{ImageRef, SlideId, TextAlignment};

/// A 2D point in the coordinate system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A bounding box representing the spatial extent of an element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a zero-sized bounding box at the origin
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Right edge x-coordinate
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge y-coordinate
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Center point of the bounding box
    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::zero()
    }
}

/// Which point of a span its x coordinate refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

/// A run of text drawn at one anchor point
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub x: f64,
    pub anchor: TextAnchor,
}

/// One wrapped line; justified lines carry one span per word
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub baseline: f64,
    pub spans: Vec<TextSpan>,
}

impl TextLine {
    /// The line's words joined by single spaces
    pub fn text(&self) -> String {
        self.spans
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Fully wrapped and positioned text
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub font_family: String,
    pub font_size: f64,
    /// Line box height in canvas units
    pub line_height: f64,
    pub weight: FontWeight,
    pub fill: String,
    pub alignment: TextAlignment,
    pub lines: Vec<TextLine>,
}

/// Clip applied to an image element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageClip {
    None,
    Circle,
}

/// What an element draws
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    /// Rounded card background
    Canvas { fill: String, corner_radius: f64 },
    /// Positions children without drawing anything itself
    Group,
    /// Image stretched to the element bounds
    Image { image: ImageRef, clip: ImageClip },
    Text(TextBlock),
}

/// Semantic role of an element within a slide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementRole {
    Canvas,
    Header,
    Avatar,
    DisplayName,
    Handle,
    Body,
    SlideImage,
    Cta,
}

impl ElementRole {
    /// Stable name used for scene ids and log fields
    pub fn name(&self) -> &'static str {
        match self {
            Self::Canvas => "canvas",
            Self::Header => "header",
            Self::Avatar => "avatar",
            Self::DisplayName => "name",
            Self::Handle => "handle",
            Self::Body => "body",
            Self::SlideImage => "image",
            Self::Cta => "cta",
        }
    }
}

/// A positioned element in the resolved layout tree
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutElement {
    pub role: ElementRole,
    pub bounds: BoundingBox,
    pub kind: ElementKind,
    pub children: Vec<LayoutElement>,
}

impl LayoutElement {
    /// Create an element without children
    pub fn leaf(role: ElementRole, bounds: BoundingBox, kind: ElementKind) -> Self {
        Self {
            role,
            bounds,
            kind,
            children: vec![],
        }
    }

    /// Depth-first search for the first element with `role`
    pub fn find(&self, role: ElementRole) -> Option<&LayoutElement> {
        if self.role == role {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(role))
    }

    pub fn text_block(&self) -> Option<&TextBlock> {
        match &self.kind {
            ElementKind::Text(block) => Some(block),
            _ => None,
        }
    }
}

/// Complete layout of one slide, ready to rasterize
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLayout {
    pub slide_id: SlideId,
    /// Edge length of the square canvas
    pub size: f64,
    pub root: LayoutElement,
}

impl ResolvedLayout {
    pub fn find(&self, role: ElementRole) -> Option<&LayoutElement> {
        self.root.find(role)
    }

    /// Text block for a role, if the element exists and holds text
    pub fn text(&self, role: ElementRole) -> Option<&TextBlock> {
        self.find(role).and_then(LayoutElement::text_block)
    }
}
