//! SVG scene generation from resolved layouts
//!
//! The scene is the offscreen representation of a slide: a self-contained
//! document with images inlined as data URIs, drawn at the canvas size.

use crate::layout::{
    ElementKind, FontWeight, ImageClip, LayoutElement, ResolvedLayout, TextAnchor, TextBlock,
};

use super::SvgConfig;

/// Build SVG elements incrementally
pub struct SvgBuilder {
    config: SvgConfig,
    defs: Vec<String>,
    elements: Vec<String>,
    indent: usize,
}

impl SvgBuilder {
    /// Create a new SVG builder
    pub fn new(config: SvgConfig) -> Self {
        Self {
            config,
            defs: vec![],
            elements: vec![],
            indent: 1,
        }
    }

    fn prefix(&self) -> String {
        self.config.class_prefix.clone().unwrap_or_default()
    }

    fn indent_str(&self) -> String {
        if self.config.pretty_print {
            "  ".repeat(self.indent)
        } else {
            String::new()
        }
    }

    fn newline(&self) -> &str {
        if self.config.pretty_print {
            "\n"
        } else {
            ""
        }
    }

    /// Add a circular clip path definition
    pub fn add_circle_clip(&mut self, id: &str, cx: f64, cy: f64, r: f64) {
        self.defs.push(format!(
            r#"<clipPath id="{}"><circle cx="{}" cy="{}" r="{}"/></clipPath>"#,
            id, cx, cy, r
        ));
    }

    /// Add the rounded card background
    pub fn add_card(&mut self, id: &str, x: f64, y: f64, w: f64, h: f64, radius: f64, fill: &str) {
        let prefix = self.prefix();
        self.elements.push(format!(
            r#"{}<rect id="{}" class="{}card" x="{}" y="{}" width="{}" height="{}" rx="{}" ry="{}" fill="{}"/>"#,
            self.indent_str(),
            id,
            prefix,
            x,
            y,
            w,
            h,
            radius,
            radius,
            escape_xml(fill)
        ));
    }

    /// Add an image stretched to the given box
    pub fn add_image(
        &mut self,
        id: &str,
        href: &str,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        clip: Option<&str>,
    ) {
        let prefix = self.prefix();
        let clip_attr = clip
            .map(|c| format!(r#" clip-path="url(#{})""#, c))
            .unwrap_or_default();

        self.elements.push(format!(
            r#"{}<image id="{}" class="{}image" x="{}" y="{}" width="{}" height="{}" preserveAspectRatio="none"{} xlink:href="{}"/>"#,
            self.indent_str(),
            id,
            prefix,
            x,
            y,
            w,
            h,
            clip_attr,
            href
        ));
    }

    /// Add one text run
    pub fn add_text(&mut self, text: &str, x: f64, y: f64, anchor: &TextAnchor, styles: &str) {
        let prefix = self.prefix();
        let anchor_str = match anchor {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        };

        self.elements.push(format!(
            r#"{}<text class="{}text" x="{}" y="{}" text-anchor="{}"{}>{}</text>"#,
            self.indent_str(),
            prefix,
            x,
            y,
            anchor_str,
            styles,
            escape_xml(text)
        ));
    }

    /// Add a group element with optional ID and classes
    pub fn start_group(&mut self, id: Option<&str>, classes: &[String]) {
        let id_attr = id.map(|i| format!(r#" id="{}""#, i)).unwrap_or_default();
        let class_attr = if classes.is_empty() {
            String::new()
        } else {
            format!(r#" class="{}""#, classes.join(" "))
        };

        self.elements
            .push(format!("{}<g{}{}>", self.indent_str(), id_attr, class_attr));
        self.indent += 1;
    }

    /// Close a group element
    pub fn end_group(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.elements.push(format!("{}</g>", self.indent_str()));
    }

    /// Build the final SVG string for a square canvas
    pub fn build(self, size: f64) -> String {
        let nl = self.newline();

        let mut svg = String::new();

        if self.config.standalone {
            svg.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
            svg.push_str(nl);
        }

        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{0}" height="{0}" viewBox="0 0 {0} {0}">"#,
            size
        ));
        svg.push_str(nl);

        if !self.defs.is_empty() {
            svg.push_str("  <defs>");
            svg.push_str(nl);
            for def in &self.defs {
                svg.push_str("    ");
                svg.push_str(def);
                svg.push_str(nl);
            }
            svg.push_str("  </defs>");
            svg.push_str(nl);
        }

        for elem in &self.elements {
            svg.push_str(elem);
            svg.push_str(nl);
        }

        svg.push_str("</svg>");

        svg
    }
}

/// Render a resolved slide layout to an SVG string
pub fn render_svg(layout: &ResolvedLayout, config: &SvgConfig) -> String {
    let mut builder = SvgBuilder::new(config.clone());
    let scope = format!("slide-{}", layout.slide_id);
    render_element(&layout.root, &scope, &mut builder);
    builder.build(layout.size)
}

/// Render a single element to the builder
fn render_element(element: &LayoutElement, scope: &str, builder: &mut SvgBuilder) {
    let id = format!("{}-{}", scope, element.role.name());
    let b = &element.bounds;

    match &element.kind {
        ElementKind::Canvas {
            fill,
            corner_radius,
        } => {
            builder.add_card(&id, b.x, b.y, b.width, b.height, *corner_radius, fill);
            for child in &element.children {
                render_element(child, scope, builder);
            }
        }
        ElementKind::Group => {
            let classes = vec![format!("{}{}", builder.prefix(), element.role.name())];
            builder.start_group(Some(&id), &classes);
            for child in &element.children {
                render_element(child, scope, builder);
            }
            builder.end_group();
        }
        ElementKind::Image { image, clip } => {
            let clip_id = match clip {
                ImageClip::Circle => {
                    let clip_id = format!("{}-clip", id);
                    let c = b.center();
                    builder.add_circle_clip(&clip_id, c.x, c.y, b.width.min(b.height) / 2.0);
                    Some(clip_id)
                }
                ImageClip::None => None,
            };
            builder.add_image(
                &id,
                &image.data_uri(),
                b.x,
                b.y,
                b.width,
                b.height,
                clip_id.as_deref(),
            );
        }
        ElementKind::Text(block) => {
            let styles = format_text_styles(block);
            for line in &block.lines {
                for span in &line.spans {
                    builder.add_text(&span.text, span.x, line.baseline, &span.anchor, &styles);
                }
            }
        }
    }
}

/// Format font and fill attributes for a text block
fn format_text_styles(block: &TextBlock) -> String {
    let mut parts = vec![
        format!(r#" font-family="{}""#, escape_xml(&block.font_family)),
        format!(r#" font-size="{}""#, block.font_size),
    ];
    if block.weight == FontWeight::Bold {
        parts.push(r#" font-weight="bold""#.to_string());
    }
    parts.push(format!(r#" fill="{}""#, escape_xml(&block.fill)));
    parts.join("")
}

/// Escape special XML characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
