//! Mapping from extracted elements to native slide shapes.

use super::writer::{
    Align, Anchor, Frame, Geometry, ImageFormat, Shape, SlidePart, TextStyle, MAX_FONT_PT, MIN_FONT_PT, SLIDE_HEIGHT_EMU,
    SLIDE_WIDTH_EMU,
};
use crate::extract::{ElementKind, ExtractedElement, ExtractedSlide};
use crate::theme::{parse_hex_color, Theme};
use base64::Engine as _;
use log::warn;

const ACCENT_BAR_EMU: i64 = 54_864;
const QUOTE_GAP_EMU: i64 = 137_160;
const DIVIDER_WIDTH_EMU: i64 = 12_700;

/// Scale a percentage box onto the 10in × 5.625in canvas.
pub fn frame_for(el: &ExtractedElement) -> Frame {
    Frame {
        x: scale(el.x, SLIDE_WIDTH_EMU),
        y: scale(el.y, SLIDE_HEIGHT_EMU),
        cx: scale(el.w, SLIDE_WIDTH_EMU),
        cy: scale(el.h, SLIDE_HEIGHT_EMU),
    }
}

fn scale(percent: f64, total: i64) -> i64 {
    (percent / 100.0 * total as f64).round() as i64
}

/// Resolve a slide background tag to a palette color.
pub fn slide_background(tag: &str, theme: &Theme) -> String {
    match theme.background_for(tag) {
        Some(color) => color.to_string(),
        None => {
            warn!(
                "Unknown background '{}' for theme {}; using the theme background",
                tag, theme.name
            );
            theme.background.to_string()
        }
    }
}

/// Emit every element of a slide, in document order.
pub fn emit_slide(slide: &ExtractedSlide, theme: &Theme, index: usize) -> SlidePart {
    let shapes = slide
        .elements
        .iter()
        .flat_map(|el| emit_element(el, theme))
        .collect();
    SlidePart {
        name: format!("Slide {} ({})", index + 1, slide.layout),
        background: slide_background(&slide.background, theme),
        shapes,
    }
}

/// Shapes for one element.
pub fn emit_element(el: &ExtractedElement, theme: &Theme) -> Vec<Shape> {
    let frame = frame_for(el);
    match el.kind {
        ElementKind::Heading => {
            let style = styled(el, base_style(theme.heading_font, 36.0, theme.text, true));
            vec![text_shape(frame, paragraphs(el), style, fill_override(el))]
        }
        ElementKind::Subheading => {
            let style = styled(el, base_style(theme.heading_font, 24.0, theme.muted, false));
            vec![text_shape(frame, paragraphs(el), style, fill_override(el))]
        }
        ElementKind::Text => {
            let style = styled(el, base_style(theme.body_font, 16.0, theme.text, false));
            vec![text_shape(frame, paragraphs(el), style, fill_override(el))]
        }
        ElementKind::BulletList => {
            let mut style = styled(el, base_style(theme.body_font, 16.0, theme.text, false));
            style.bullets = true;
            vec![text_shape(frame, paragraphs(el), style, fill_override(el))]
        }
        ElementKind::StatBox => emit_stat_box(el, frame, theme),
        ElementKind::Quote => emit_quote(el, frame, theme),
        ElementKind::Image => emit_image(el, frame, theme),
        ElementKind::Shape => emit_shape(el, frame, theme),
        ElementKind::Divider => emit_divider(el, frame, theme),
        ElementKind::Code => {
            let style = styled(el, base_style(theme.mono_font, 12.0, theme.text, false));
            let fill = fill_override(el).unwrap_or_else(|| theme.surface.to_string());
            vec![text_shape(frame, paragraphs(el), style, Some(fill))]
        }
    }
}

fn emit_stat_box(el: &ExtractedElement, frame: Frame, theme: &Theme) -> Vec<Shape> {
    let mut lines = el.lines();
    let first = lines.next().unwrap_or_default().to_string();
    let rest = lines.collect::<Vec<_>>().join(" ");
    let value = el.attr("value").map(str::to_string).unwrap_or(first);
    let label = el.attr("label").map(str::to_string).unwrap_or(rest);

    let band = |start: f64, extent: f64| Frame {
        x: frame.x,
        y: frame.y + (frame.cy as f64 * start).round() as i64,
        cx: frame.cx,
        cy: (frame.cy as f64 * extent).round() as i64,
    };

    let mut value_style = styled(el, base_style(theme.heading_font, 40.0, theme.primary, true));
    value_style.align = Align::Center;
    value_style.anchor = Anchor::Middle;
    let mut label_style = base_style(theme.body_font, 12.0, theme.muted, false);
    label_style.align = Align::Center;

    vec![
        Shape::Fill {
            frame,
            geometry: Geometry::RoundRect,
            color: fill_override(el).unwrap_or_else(|| theme.surface.to_string()),
        },
        text_shape(band(0.15, 0.50), vec![value], value_style, None),
        text_shape(band(0.65, 0.25), vec![label], label_style, None),
    ]
}

fn emit_quote(el: &ExtractedElement, frame: Frame, theme: &Theme) -> Vec<Shape> {
    let bar_color = el
        .attr("fill")
        .and_then(parse_hex_color)
        .unwrap_or_else(|| theme.accent.to_string());
    let bar = Frame {
        cx: ACCENT_BAR_EMU.min(frame.cx),
        ..frame
    };
    let inset = (ACCENT_BAR_EMU + QUOTE_GAP_EMU).min(frame.cx);
    let body = Frame {
        x: frame.x + inset,
        cx: frame.cx - inset,
        ..frame
    };

    let mut style = styled(el, base_style(theme.body_font, 20.0, theme.text, false));
    style.italic = true;

    let mut shapes = vec![Shape::Fill {
        frame: bar,
        geometry: Geometry::Rect,
        color: bar_color,
    }];
    match el.attr("cite") {
        Some(cite) => {
            let quote_h = (body.cy as f64 * 0.75).round() as i64;
            shapes.push(text_shape(Frame { cy: quote_h, ..body }, paragraphs(el), style, None));
            let mut cite_style = base_style(theme.body_font, 14.0, theme.muted, false);
            cite_style.align = Align::Right;
            shapes.push(text_shape(
                Frame {
                    y: body.y + quote_h,
                    cy: body.cy - quote_h,
                    ..body
                },
                vec![cite.to_string()],
                cite_style,
                None,
            ));
        }
        None => shapes.push(text_shape(body, paragraphs(el), style, None)),
    }
    shapes
}

fn emit_image(el: &ExtractedElement, frame: Frame, theme: &Theme) -> Vec<Shape> {
    let src = el.attr("src").unwrap_or_default();
    let description = el.attr("alt").unwrap_or_default().to_string();

    if src.starts_with("data:") {
        match decode_data_uri(src) {
            Some((format, data)) => {
                return vec![Shape::Picture {
                    frame,
                    data,
                    format,
                    description,
                }]
            }
            None => warn!("Could not decode inline image; emitting a placeholder"),
        }
    }

    let label = if description.is_empty() {
        "Image".to_string()
    } else {
        description
    };
    let mut style = base_style(theme.body_font, 12.0, theme.muted, false);
    style.align = Align::Center;
    style.anchor = Anchor::Middle;
    vec![
        Shape::Fill {
            frame,
            geometry: Geometry::Rect,
            color: theme.surface.to_string(),
        },
        text_shape(frame, vec![label], style, None),
    ]
}

fn emit_shape(el: &ExtractedElement, frame: Frame, theme: &Theme) -> Vec<Shape> {
    let geometry = match el.attr("shape").map(|s| s.to_ascii_lowercase()).as_deref() {
        Some("ellipse") | Some("circle") => Geometry::Ellipse,
        Some("rounded") | Some("round-rect") => Geometry::RoundRect,
        _ => Geometry::Rect,
    };
    let mut shapes = vec![Shape::Fill {
        frame,
        geometry,
        color: fill_override(el).unwrap_or_else(|| theme.primary.to_string()),
    }];
    if !el.text.is_empty() {
        let mut style = base_style(theme.body_font, 16.0, theme.background, false);
        style.align = Align::Center;
        style.anchor = Anchor::Middle;
        shapes.push(text_shape(frame, paragraphs(el), styled(el, style), None));
    }
    shapes
}

fn emit_divider(el: &ExtractedElement, frame: Frame, theme: &Theme) -> Vec<Shape> {
    let color = el
        .attr("color")
        .and_then(parse_hex_color)
        .unwrap_or_else(|| theme.muted.to_string());
    let line = if frame.cx >= frame.cy {
        Frame {
            y: frame.y + frame.cy / 2,
            cy: 0,
            ..frame
        }
    } else {
        Frame {
            x: frame.x + frame.cx / 2,
            cx: 0,
            ..frame
        }
    };
    vec![Shape::Line {
        frame: line,
        color,
        width_emu: DIVIDER_WIDTH_EMU,
    }]
}

/// Decode a base64 `data:` URI into an image payload.
pub fn decode_data_uri(uri: &str) -> Option<(ImageFormat, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;
    let format = ImageFormat::from_mime(mime)?;
    let data = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .ok()?;
    Some((format, data))
}

fn base_style(font: &str, size_pt: f64, color: &str, bold: bool) -> TextStyle {
    TextStyle {
        font: font.to_string(),
        size_pt,
        color: color.to_string(),
        bold,
        italic: false,
        align: Align::Left,
        anchor: Anchor::Top,
        bullets: false,
    }
}

// Apply `color`, `size`, `align` and `weight` overrides.
fn styled(el: &ExtractedElement, mut style: TextStyle) -> TextStyle {
    if let Some(color) = el.attr("color").and_then(parse_hex_color) {
        style.color = color;
    }
    if let Some(size) = el.attr("size").and_then(|s| s.trim().trim_end_matches("pt").parse::<f64>().ok()) {
        if size.is_finite() && size > 0.0 {
            style.size_pt = size.clamp(MIN_FONT_PT, MAX_FONT_PT);
        }
    }
    if let Some(align) = el.attr("align").and_then(Align::parse) {
        style.align = align;
    }
    match el.attr("weight").map(|w| w.trim().to_ascii_lowercase()).as_deref() {
        Some("bold") | Some("600") | Some("700") | Some("800") | Some("900") => style.bold = true,
        Some("normal") | Some("400") => style.bold = false,
        _ => {}
    }
    style
}

fn fill_override(el: &ExtractedElement) -> Option<String> {
    el.attr("fill").and_then(parse_hex_color)
}

fn paragraphs(el: &ExtractedElement) -> Vec<String> {
    el.lines().map(str::to_string).collect()
}

fn text_shape(frame: Frame, paragraphs: Vec<String>, style: TextStyle, fill: Option<String>) -> Shape {
    Shape::Text {
        frame,
        paragraphs,
        style,
        fill,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn element(kind: ElementKind, text: &str, attrs: &[(&str, &str)]) -> ExtractedElement {
        ExtractedElement {
            kind,
            text: text.to_string(),
            x: 10.0,
            y: 20.0,
            w: 50.0,
            h: 40.0,
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn theme() -> &'static Theme {
        Theme::lookup("slate").unwrap()
    }

    #[test]
    fn test_frames_scale_linearly() {
        let frame = frame_for(&element(ElementKind::Text, "", &[]));
        assert_eq!(frame, Frame { x: 914_400, y: 1_028_700, cx: 4_572_000, cy: 2_057_400 });
    }

    #[test]
    fn test_every_kind_emits_something() {
        for kind in ElementKind::ALL {
            assert!(!emit_element(&element(kind, "x", &[]), theme()).is_empty(), "{}", kind);
        }
    }

    #[test]
    fn test_stat_box_bands() {
        let shapes = emit_element(&element(ElementKind::StatBox, "42%\nYoY growth", &[]), theme());
        assert_eq!(shapes.len(), 3);
        let container = shapes[0].frame();
        let value = shapes[1].frame();
        let label = shapes[2].frame();
        assert_eq!(value.y, container.y + 308_610);
        assert_eq!(value.cy, 1_028_700);
        assert_eq!(label.y, container.y + 1_337_310);
        assert_eq!(label.cy, 514_350);
        match &shapes[1] {
            Shape::Text { paragraphs, .. } => assert_eq!(paragraphs, &vec!["42%".to_string()]),
            other => panic!("unexpected {:?}", other),
        }
        match &shapes[2] {
            Shape::Text { paragraphs, .. } => assert_eq!(paragraphs, &vec!["YoY growth".to_string()]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_quote_with_citation() {
        let shapes = emit_element(&element(ElementKind::Quote, "Ship it", &[("cite", "Ada")]), theme());
        assert_eq!(shapes.len(), 3);
        assert!(matches!(&shapes[0], Shape::Fill { color, .. } if color == "F59E0B"));
        assert!(matches!(&shapes[1], Shape::Text { style, .. } if style.italic));
    }

    #[test]
    fn test_data_uri_becomes_picture() {
        let shapes = emit_element(
            &element(ElementKind::Image, "", &[("src", "data:image/png;base64,iVBORw0KGgo="), ("alt", "logo")]),
            theme(),
        );
        match &shapes[0] {
            Shape::Picture { data, format, description, .. } => {
                assert_eq!(*format, ImageFormat::Png);
                assert_eq!(&data[..4], &[0x89, b'P', b'N', b'G']);
                assert_eq!(description, "logo");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_remote_image_becomes_placeholder() {
        let shapes = emit_element(&element(ElementKind::Image, "", &[("src", "https://x/y.png")]), theme());
        assert_eq!(shapes.len(), 2);
        assert!(matches!(&shapes[1], Shape::Text { paragraphs, .. } if paragraphs[0] == "Image"));
    }

    #[test]
    fn test_attribute_overrides() {
        let el = element(
            ElementKind::Text,
            "Hi",
            &[("color", "#f00"), ("size", "22"), ("align", "right"), ("weight", "bold"), ("fill", "00ff00")],
        );
        match &emit_element(&el, theme())[0] {
            Shape::Text { style, fill, .. } => {
                assert_eq!(style.color, "FF0000");
                assert_eq!(style.size_pt, 22.0);
                assert_eq!(style.align, Align::Right);
                assert!(style.bold);
                assert_eq!(fill.as_deref(), Some("00FF00"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_size_override_stays_in_range() {
        let huge = element(ElementKind::Text, "Hi", &[("size", "99999")]);
        let tiny = element(ElementKind::Text, "Hi", &[("size", "0.2pt")]);
        let sizes: Vec<f64> = [huge, tiny]
            .iter()
            .map(|el| match &emit_element(el, theme())[0] {
                Shape::Text { style, .. } => style.size_pt,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(sizes, vec![4000.0, 1.0]);
    }

    #[test]
    fn test_unknown_background_falls_back() {
        assert_eq!(slide_background("neon", theme()), "0F172A");
        assert_eq!(slide_background("accent", theme()), "F59E0B");
    }

    #[test]
    fn test_divider_orientation() {
        let shapes = emit_element(&element(ElementKind::Divider, "", &[]), theme());
        let frame = shapes[0].frame();
        assert_eq!(frame.cy, 0);
        assert_eq!(frame.y, 1_028_700 + 1_028_700);
    }
}
