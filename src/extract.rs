//! Export geometry extraction.
//!
//! A backend measures the rendered slide and returns a [`RawSlide`]: the
//! container box, its layout/background tags and every node carrying a
//! `data-export-type` attribute, in document order. [`extract_slide`] turns
//! that measurement into an [`ExtractedSlide`] whose boxes are percentages of
//! the container, so the export target can rescale to any canvas.

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Attribute prefix shared by every export annotation.
pub const ATTR_PREFIX: &str = "data-export-";

/// Type tags that only group other exportable nodes.
pub const STRUCTURAL_TAGS: &[&str] = &["layout", "group", "wrapper", "passthrough"];

/// Box used when the slide container cannot be found.
pub const DEFAULT_SLIDE_BOX: Rect = Rect {
    x: 0.0,
    y: 0.0,
    width: 1920.0,
    height: 1080.0,
};

/// In-page script returning the measurement as a JSON string.
///
/// Evaluated by browser backends; the shape of its output is [`RawSlide`].
pub const EXTRACTION_SCRIPT: &str = r#"(function() {
    const slide = document.querySelector('[data-export-slide]');
    const box = function(el) {
        const r = el.getBoundingClientRect();
        return { x: r.left, y: r.top, width: r.width, height: r.height };
    };
    const attrs = function(el) {
        const out = {};
        for (const a of el.attributes) {
            if (a.name.startsWith('data-export-') && a.name !== 'data-export-type') {
                out[a.name.slice(12)] = a.value;
            }
        }
        if (el.tagName === 'IMG') {
            out.src = el.currentSrc || el.src;
            if (el.alt) out.alt = el.alt;
        }
        return out;
    };
    const root = slide || document;
    const nodes = Array.from(root.querySelectorAll('[data-export-type]')).map(function(el) {
        return {
            type: el.getAttribute('data-export-type'),
            text: el.innerText || '',
            rect: box(el),
            attrs: attrs(el)
        };
    });
    return JSON.stringify({
        container: slide ? box(slide) : null,
        layout: slide ? slide.getAttribute('data-export-layout') : null,
        background: slide ? slide.getAttribute('data-export-background') : null,
        nodes: nodes
    });
})()"#;

/// Axis-aligned box in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One tagged node as measured by a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default)]
    pub text: String,
    pub rect: Rect,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
}

/// Measurement of one rendered slide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSlide {
    pub container: Option<Rect>,
    pub layout: Option<String>,
    pub background: Option<String>,
    #[serde(default)]
    pub nodes: Vec<RawNode>,
}

impl RawSlide {
    /// Decode the JSON produced by [`EXTRACTION_SCRIPT`].
    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| crate::Error::ExtractionError(format!("Malformed slide measurement: {}", e)))
    }
}

/// Every visual primitive the exporters know how to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    Heading,
    Subheading,
    Text,
    BulletList,
    StatBox,
    Quote,
    Image,
    Shape,
    Divider,
    Code,
}

impl ElementKind {
    pub const ALL: [ElementKind; 10] = [
        ElementKind::Heading,
        ElementKind::Subheading,
        ElementKind::Text,
        ElementKind::BulletList,
        ElementKind::StatBox,
        ElementKind::Quote,
        ElementKind::Image,
        ElementKind::Shape,
        ElementKind::Divider,
        ElementKind::Code,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Heading => "heading",
            ElementKind::Subheading => "subheading",
            ElementKind::Text => "text",
            ElementKind::BulletList => "bullet-list",
            ElementKind::StatBox => "stat-box",
            ElementKind::Quote => "quote",
            ElementKind::Image => "image",
            ElementKind::Shape => "shape",
            ElementKind::Divider => "divider",
            ElementKind::Code => "code",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        ElementKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == tag)
            .ok_or_else(|| format!("unknown element type '{}'", s))
    }
}

/// Whether a type tag marks a structural wrapper rather than a primitive.
pub fn is_structural(tag: &str) -> bool {
    let tag = tag.trim();
    STRUCTURAL_TAGS.iter().any(|s| s.eq_ignore_ascii_case(tag))
}

/// A visual primitive positioned in percent of the slide container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedElement {
    pub kind: ElementKind,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub attrs: BTreeMap<String, String>,
}

impl ExtractedElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(|s| s.as_str()).filter(|s| !s.is_empty())
    }

    /// Non-empty text lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines().filter(|l| !l.is_empty())
    }
}

/// Everything the exporters need from one slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSlide {
    pub layout: String,
    pub background: String,
    pub elements: Vec<ExtractedElement>,
    /// Type tags that matched no [`ElementKind`]
    pub unmapped: Vec<String>,
}

/// Normalise a measured slide into container-relative elements.
///
/// Structural wrappers are skipped (their tagged descendants were measured on
/// their own). Unknown tags are reported in `unmapped`. A missing or
/// zero-sized container falls back to [`DEFAULT_SLIDE_BOX`].
pub fn extract_slide(raw: &RawSlide) -> ExtractedSlide {
    let container = match raw.container {
        Some(c) if c.width > 0.0 && c.height > 0.0 => c,
        Some(_) => {
            warn!("Slide container has zero size; using default {}x{} box", DEFAULT_SLIDE_BOX.width, DEFAULT_SLIDE_BOX.height);
            DEFAULT_SLIDE_BOX
        }
        None => {
            warn!("Slide container not found; using default {}x{} box", DEFAULT_SLIDE_BOX.width, DEFAULT_SLIDE_BOX.height);
            DEFAULT_SLIDE_BOX
        }
    };

    let mut elements = Vec::with_capacity(raw.nodes.len());
    let mut unmapped = Vec::new();

    for node in &raw.nodes {
        if is_structural(&node.type_tag) {
            continue;
        }
        let kind = match node.type_tag.parse::<ElementKind>() {
            Ok(k) => k,
            Err(e) => {
                warn!("Skipping exportable node: {}", e);
                unmapped.push(node.type_tag.clone());
                continue;
            }
        };

        let (x, w) = to_percent(node.rect.x - container.x, node.rect.width, container.width);
        let (y, h) = to_percent(node.rect.y - container.y, node.rect.height, container.height);

        elements.push(ExtractedElement {
            kind,
            text: normalize_text(&node.text),
            x,
            y,
            w,
            h,
            attrs: node.attrs.clone(),
        });
    }

    ExtractedSlide {
        layout: tag_or_default(raw.layout.as_deref()),
        background: tag_or_default(raw.background.as_deref()),
        elements,
        unmapped,
    }
}

fn tag_or_default(tag: Option<&str>) -> String {
    match tag.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => "default".to_string(),
    }
}

// Map an offset/extent pair onto [0,100], clipped to the container.
fn to_percent(offset: f64, extent: f64, total: f64) -> (f64, f64) {
    let start = (offset / total * 100.0).clamp(0.0, 100.0);
    let end = ((offset + extent.max(0.0)) / total * 100.0).clamp(0.0, 100.0);
    (start, end - start)
}

/// Trim lines, drop blank ones and collapse runs of inner whitespace.
pub fn normalize_text(text: &str) -> String {
    text.lines()
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
