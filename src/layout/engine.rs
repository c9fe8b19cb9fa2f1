//! Slide layout computation
//!
//! Blocks stack top-down inside the padded card: header row, body text,
//! optional slide image. The CTA block is not part of the stack. Its top
//! sits at a fixed fraction of the canvas height, whatever the content
//! above it, so long CTA text can run past the bottom edge.

use std::sync::Arc;

use crate::store::{HeaderAlignment, HeaderState, ImageRef, Slide, TextAlignment};
use crate::theme::Theme;

use super::config::LayoutConfig;
use super::text::{wrap_words, HeuristicMeasure, TextMeasure};
use super::types::{
    BoundingBox, ElementKind, ElementRole, FontWeight, ImageClip, LayoutElement, ResolvedLayout,
    TextAnchor, TextBlock, TextLine, TextSpan,
};

/// Share of the font size above the baseline
const ASCENT_RATIO: f64 = 0.8;

/// Resolves slides into positioned layouts
///
/// Resolution is a pure function of the engine settings, the header and the
/// slide: the same inputs always yield the same layout.
#[derive(Clone)]
pub struct LayoutEngine {
    config: LayoutConfig,
    theme: Theme,
    measure: Arc<dyn TextMeasure>,
}

impl LayoutEngine {
    /// Create an engine that measures text with [`HeuristicMeasure`]
    pub fn new(config: LayoutConfig, theme: Theme) -> Self {
        Self {
            config,
            theme,
            measure: Arc::new(HeuristicMeasure),
        }
    }

    /// Replace the text measurer
    pub fn with_measure(mut self, measure: Arc<dyn TextMeasure>) -> Self {
        self.measure = measure;
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Resolve one slide against the shared header
    pub fn resolve(&self, header: &HeaderState, slide: &Slide) -> ResolvedLayout {
        let cfg = &self.config;
        let size = cfg.canvas_size;
        let mut children = Vec::with_capacity(4);

        let mut cursor = cfg.padding;

        let header_block = self.header_block(header, cursor);
        cursor = header_block.bounds.bottom() + cfg.block_gap;
        children.push(header_block);

        let body = self.paragraph(
            ElementRole::Body,
            &slide.text,
            f64::from(slide.text_size),
            slide.alignment,
            cursor,
        );
        cursor = body.bounds.bottom() + cfg.block_gap;
        children.push(body);

        if let Some(image) = &slide.image {
            children.push(self.slide_image(image, cursor));
        }

        children.push(self.paragraph(
            ElementRole::Cta,
            &slide.cta,
            f64::from(slide.cta_size),
            slide.alignment,
            size * cfg.cta_offset_fraction,
        ));

        ResolvedLayout {
            slide_id: slide.id,
            size,
            root: LayoutElement {
                role: ElementRole::Canvas,
                bounds: BoundingBox::new(0.0, 0.0, size, size),
                kind: ElementKind::Canvas {
                    fill: self.theme.background.clone(),
                    corner_radius: cfg.corner_radius,
                },
                children,
            },
        }
    }

    /// Header row: avatar slot, then a column with name over handle
    ///
    /// The avatar slot is reserved even without a profile image, so the
    /// name column does not move when the image is cleared.
    fn header_block(&self, header: &HeaderState, top: f64) -> LayoutElement {
        let cfg = &self.config;
        let name_h = line_box(&header.display_name, cfg.name_font_size, cfg.line_height);
        let handle_h = line_box(&header.handle, cfg.handle_font_size, cfg.line_height);
        let column_h = name_h + handle_h;

        let name_w = self
            .measure
            .measure(&header.display_name, cfg.name_font_size, FontWeight::Bold);
        let handle_w =
            self.measure
                .measure(&header.handle, cfg.handle_font_size, FontWeight::Regular);
        let column_w = name_w.max(handle_w);

        let slot_w = cfg.avatar_size + cfg.avatar_gap;
        let header_w = slot_w + column_w;
        let header_h = cfg.avatar_size.max(column_h);

        let x = cfg.padding
            + match header.alignment {
                HeaderAlignment::Start => 0.0,
                HeaderAlignment::Center => (cfg.inner_width() - header_w) / 2.0,
                HeaderAlignment::End => cfg.inner_width() - header_w,
            };

        let mut children = vec![];

        if let Some(image) = &header.profile_image {
            children.push(LayoutElement::leaf(
                ElementRole::Avatar,
                BoundingBox::new(
                    x,
                    top + (header_h - cfg.avatar_size) / 2.0,
                    cfg.avatar_size,
                    cfg.avatar_size,
                ),
                ElementKind::Image {
                    image: image.clone(),
                    clip: ImageClip::Circle,
                },
            ));
        }

        let column_x = x + slot_w;
        let column_top = top + (header_h - column_h) / 2.0;

        children.push(self.single_line(
            ElementRole::DisplayName,
            &header.display_name,
            BoundingBox::new(column_x, column_top, name_w, name_h),
            cfg.name_font_size,
            FontWeight::Bold,
            self.theme.text.clone(),
        ));
        children.push(self.single_line(
            ElementRole::Handle,
            &header.handle,
            BoundingBox::new(column_x, column_top + name_h, handle_w, handle_h),
            cfg.handle_font_size,
            FontWeight::Regular,
            self.theme.muted.clone(),
        ));

        LayoutElement {
            role: ElementRole::Header,
            bounds: BoundingBox::new(x, top, header_w, header_h),
            kind: ElementKind::Group,
            children,
        }
    }

    fn single_line(
        &self,
        role: ElementRole,
        text: &str,
        bounds: BoundingBox,
        font_size: f64,
        weight: FontWeight,
        fill: String,
    ) -> LayoutElement {
        let line_height = font_size * self.config.line_height;
        let lines = if text.is_empty() {
            vec![]
        } else {
            vec![TextLine {
                baseline: baseline(bounds.y, font_size, line_height),
                spans: vec![TextSpan {
                    text: text.to_string(),
                    x: bounds.x,
                    anchor: TextAnchor::Start,
                }],
            }]
        };

        LayoutElement::leaf(
            role,
            bounds,
            ElementKind::Text(TextBlock {
                font_family: self.theme.font_family.clone(),
                font_size,
                line_height,
                weight,
                fill,
                alignment: TextAlignment::Left,
                lines,
            }),
        )
    }

    /// Wrapped text spanning the full inner width
    fn paragraph(
        &self,
        role: ElementRole,
        text: &str,
        font_size: f64,
        alignment: TextAlignment,
        top: f64,
    ) -> LayoutElement {
        let cfg = &self.config;
        let left = cfg.padding;
        let width = cfg.inner_width();
        let line_height = font_size * cfg.line_height;

        let wrapped = wrap_words(
            text,
            width,
            font_size,
            FontWeight::Regular,
            self.measure.as_ref(),
        );
        let count = wrapped.len();

        let lines = wrapped
            .iter()
            .enumerate()
            .map(|(i, words)| {
                let is_last = i + 1 == count;
                let spans = match alignment {
                    TextAlignment::Left => vec![span(words.join(" "), left, TextAnchor::Start)],
                    TextAlignment::Center => vec![span(
                        words.join(" "),
                        left + width / 2.0,
                        TextAnchor::Middle,
                    )],
                    TextAlignment::Justify if !is_last && words.len() > 1 => {
                        self.justify(words, left, width, font_size)
                    }
                    TextAlignment::Justify => {
                        vec![span(words.join(" "), left, TextAnchor::Start)]
                    }
                };
                TextLine {
                    baseline: baseline(top + i as f64 * line_height, font_size, line_height),
                    spans,
                }
            })
            .collect();

        LayoutElement::leaf(
            role,
            BoundingBox::new(left, top, width, count as f64 * line_height),
            ElementKind::Text(TextBlock {
                font_family: self.theme.font_family.clone(),
                font_size,
                line_height,
                weight: FontWeight::Regular,
                fill: self.theme.text.clone(),
                alignment,
                lines,
            }),
        )
    }

    /// Spread the words of one line across the full width
    fn justify(&self, words: &[&str], left: f64, width: f64, font_size: f64) -> Vec<TextSpan> {
        let widths: Vec<f64> = words
            .iter()
            .map(|w| self.measure.measure(w, font_size, FontWeight::Regular))
            .collect();
        let gap = (width - widths.iter().sum::<f64>()) / (words.len() - 1) as f64;

        let mut x = left;
        let last = words.len() - 1;
        words
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (word, w))| {
                // Pin the last word to the right edge so rounding never shows
                let placed = if i == last {
                    span(word.to_string(), left + width, TextAnchor::End)
                } else {
                    span(word.to_string(), x, TextAnchor::Start)
                };
                x += w + gap;
                placed
            })
            .collect()
    }

    /// Slide image scaled down to fit, centered horizontally
    fn slide_image(&self, image: &ImageRef, top: f64) -> LayoutElement {
        let cfg = &self.config;
        let (iw, ih) = image.dimensions();
        let (iw, ih) = (f64::from(iw), f64::from(ih));

        let max_w = cfg.inner_width();
        let max_h = cfg.inner_height() * cfg.image_max_height_fraction;
        let scale = (max_w / iw).min(max_h / ih).min(1.0);
        let (w, h) = (iw * scale, ih * scale);

        LayoutElement::leaf(
            ElementRole::SlideImage,
            BoundingBox::new(cfg.padding + (max_w - w) / 2.0, top, w, h),
            ElementKind::Image {
                image: image.clone(),
                clip: ImageClip::None,
            },
        )
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default(), Theme::default())
    }
}

/// Resolve a slide with the default theme and text measurer
pub fn compute(header: &HeaderState, slide: &Slide, config: &LayoutConfig) -> ResolvedLayout {
    LayoutEngine::new(config.clone(), Theme::default()).resolve(header, slide)
}

/// Height of a one-line box; empty text collapses to nothing
fn line_box(text: &str, font_size: f64, line_height: f64) -> f64 {
    if text.is_empty() {
        0.0
    } else {
        font_size * line_height
    }
}

fn baseline(line_top: f64, font_size: f64, line_height: f64) -> f64 {
    line_top + (line_height - font_size) / 2.0 + font_size * ASCENT_RATIO
}

fn span(text: String, x: f64, anchor: TextAnchor) -> TextSpan {
    TextSpan { text, x, anchor }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{SlideField, SlideId};
    use image::codecs::png::PngEncoder;
    use image::{ImageEncoder, RgbImage};
    use pretty_assertions::assert_eq;

    fn image(width: u32, height: u32) -> ImageRef {
        let img = RgbImage::new(width, height);
        let mut buf = Vec::new();
        PngEncoder::new(&mut buf)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
        ImageRef::from_bytes(buf).unwrap()
    }

    fn slide_with(fields: Vec<SlideField>) -> Slide {
        let mut slide = Slide::new(SlideId(1));
        for field in fields {
            slide.apply(field);
        }
        slide
    }

    fn header() -> HeaderState {
        HeaderState {
            profile_image: None,
            display_name: "Roy Antony".to_string(),
            handle: "@royantony".to_string(),
            alignment: HeaderAlignment::Center,
        }
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let engine = LayoutEngine::default();
        let slide = slide_with(vec![
            SlideField::Text("A carousel slide with a few words of body copy".to_string()),
            SlideField::Cta("Swipe for more".to_string()),
            SlideField::Alignment(TextAlignment::Justify),
        ]);
        assert_eq!(
            engine.resolve(&header(), &slide),
            engine.resolve(&header(), &slide)
        );
    }

    #[test]
    fn test_canvas_properties() {
        let layout = LayoutEngine::default().resolve(&header(), &Slide::new(SlideId(3)));
        assert_eq!(layout.slide_id, SlideId(3));
        assert_eq!(layout.size, 1080.0);
        assert_eq!(
            layout.root.kind,
            ElementKind::Canvas {
                fill: "#000000".to_string(),
                corner_radius: 20.0
            }
        );
    }

    #[test]
    fn test_header_alignment_positions_row() {
        let engine = LayoutEngine::default();
        let slide = Slide::new(SlideId(1));
        let mut h = header();

        h.alignment = HeaderAlignment::Start;
        let start = engine.resolve(&h, &slide);
        let start_bounds = start.find(ElementRole::Header).unwrap().bounds;
        assert_eq!(start_bounds.x, 40.0);

        h.alignment = HeaderAlignment::End;
        let end = engine.resolve(&h, &slide);
        let end_bounds = end.find(ElementRole::Header).unwrap().bounds;
        assert!((end_bounds.right() - 1040.0).abs() < 1e-9);

        h.alignment = HeaderAlignment::Center;
        let center = engine.resolve(&h, &slide);
        let center_bounds = center.find(ElementRole::Header).unwrap().bounds;
        assert!((center_bounds.center().x - 540.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_profile_image_keeps_text_position() {
        let engine = LayoutEngine::default();
        let slide = Slide::new(SlideId(1));
        let without = engine.resolve(&header(), &slide);

        let mut with_avatar = header();
        with_avatar.profile_image = Some(image(10, 10));
        let with = engine.resolve(&with_avatar, &slide);

        assert!(without.find(ElementRole::Avatar).is_none());
        let avatar = with.find(ElementRole::Avatar).unwrap();
        assert_eq!(avatar.bounds.width, 80.0);
        assert!(matches!(
            avatar.kind,
            ElementKind::Image {
                clip: ImageClip::Circle,
                ..
            }
        ));
        assert_eq!(
            without.find(ElementRole::DisplayName).unwrap().bounds,
            with.find(ElementRole::DisplayName).unwrap().bounds
        );
    }

    #[test]
    fn test_image_scaled_to_height_limit_and_centered() {
        let slide = slide_with(vec![SlideField::Image(Some(image(600, 600)))]);
        let layout = LayoutEngine::default().resolve(&header(), &slide);
        let block = layout.find(ElementRole::SlideImage).unwrap().bounds;

        // 30% of the 1000-unit inner height
        assert!((block.height - 300.0).abs() < 1e-9);
        assert!((block.width - 300.0).abs() < 1e-9);
        assert!((block.center().x - 540.0).abs() < 1e-9);
    }

    #[test]
    fn test_small_image_is_not_upscaled() {
        let slide = slide_with(vec![SlideField::Image(Some(image(120, 60)))]);
        let layout = LayoutEngine::default().resolve(&header(), &slide);
        let block = layout.find(ElementRole::SlideImage).unwrap().bounds;
        assert_eq!((block.width, block.height), (120.0, 60.0));
    }

    #[test]
    fn test_wide_image_limited_by_width() {
        let slide = slide_with(vec![SlideField::Image(Some(image(4000, 400)))]);
        let layout = LayoutEngine::default().resolve(&header(), &slide);
        let block = layout.find(ElementRole::SlideImage).unwrap().bounds;
        assert!((block.width - 1000.0).abs() < 1e-9);
        assert!((block.height - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_cta_anchor_ignores_content() {
        let engine = LayoutEngine::default();
        let plain = slide_with(vec![SlideField::Cta("Follow".to_string())]);
        let busy = slide_with(vec![
            SlideField::Cta("Follow".to_string()),
            SlideField::Text("word ".repeat(80)),
            SlideField::Image(Some(image(500, 500))),
        ]);

        let a = engine.resolve(&header(), &plain);
        let b = engine.resolve(&header(), &busy);
        assert_eq!(a.find(ElementRole::Cta).unwrap().bounds.y, 810.0);
        assert_eq!(
            a.find(ElementRole::Cta).unwrap().bounds,
            b.find(ElementRole::Cta).unwrap().bounds
        );
    }

    #[test]
    fn test_long_cta_overflows_canvas() {
        let slide = slide_with(vec![
            SlideField::Cta("Swipe right to keep reading ".repeat(20)),
            SlideField::CtaSize(72),
        ]);
        let layout = LayoutEngine::default().resolve(&header(), &slide);
        let cta = layout.find(ElementRole::Cta).unwrap();
        assert!(cta.bounds.bottom() > layout.size);
    }

    #[test]
    fn test_empty_body_has_no_lines() {
        let layout = LayoutEngine::default().resolve(&header(), &Slide::new(SlideId(1)));
        let body = layout.text(ElementRole::Body).unwrap();
        assert!(body.lines.is_empty());
        assert_eq!(layout.find(ElementRole::Body).unwrap().bounds.height, 0.0);
    }

    #[test]
    fn test_body_uses_text_size_and_alignment() {
        let slide = slide_with(vec![
            SlideField::Text("Centered copy".to_string()),
            SlideField::TextSize(40),
            SlideField::Alignment(TextAlignment::Center),
        ]);
        let layout = LayoutEngine::default().resolve(&header(), &slide);
        let body = layout.text(ElementRole::Body).unwrap();
        assert_eq!(body.font_size, 40.0);
        assert_eq!(body.alignment, TextAlignment::Center);
        assert_eq!(body.lines[0].spans[0].anchor, TextAnchor::Middle);
        assert_eq!(body.lines[0].spans[0].x, 540.0);
    }

    #[test]
    fn test_justify_spreads_all_but_last_line() {
        let slide = slide_with(vec![
            SlideField::Text("lorem ipsum dolor sit amet ".repeat(12)),
            SlideField::Alignment(TextAlignment::Justify),
        ]);
        let layout = LayoutEngine::default().resolve(&header(), &slide);
        let body = layout.text(ElementRole::Body).unwrap();
        assert!(body.lines.len() > 1);

        let (last, rest) = body.lines.split_last().unwrap();
        for line in rest {
            let first = line.spans.first().unwrap();
            let end = line.spans.last().unwrap();
            assert_eq!(first.x, 40.0);
            assert_eq!(end.anchor, TextAnchor::End);
            assert_eq!(end.x, 1040.0);
        }
        assert_eq!(last.spans.len(), 1);
        assert_eq!(last.spans[0].anchor, TextAnchor::Start);
    }

    #[test]
    fn test_compute_matches_default_engine() {
        let slide = slide_with(vec![SlideField::Text("hello".to_string())]);
        assert_eq!(
            compute(&header(), &slide, &LayoutConfig::default()),
            LayoutEngine::default().resolve(&header(), &slide)
        );
    }
}
