//! Inline-style box layout for pre-rendered slide HTML.
//!
//! Static exports position every node absolutely with pixel `left`, `top`,
//! `width` and `height` declarations in its `style` attribute. Offsets nest:
//! a node's box is its own offset plus the offsets of all its ancestors.

use crate::extract::{RawNode, RawSlide, Rect, ATTR_PREFIX};
use crate::Viewport;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

/// Geometry declared in one `style` attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineBox {
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

/// Parse `left/top/width/height` pixel lengths out of a style declaration.
/// Non-pixel units are ignored.
pub fn parse_inline_box(style: &str) -> InlineBox {
    let mut b = InlineBox::default();
    for decl in style.split(';') {
        let Some((prop, value)) = decl.split_once(':') else { continue };
        let px = parse_px(value);
        match prop.trim().to_ascii_lowercase().as_str() {
            "left" => b.left = px,
            "top" => b.top = px,
            "width" => b.width = px,
            "height" => b.height = px,
            _ => {}
        }
    }
    b
}

fn parse_px(value: &str) -> Option<f64> {
    let v = value.trim().trim_end_matches("!important").trim();
    let num = v.strip_suffix("px").unwrap_or(v).trim();
    num.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn inline_box(el: &ElementRef) -> InlineBox {
    el.value().attr("style").map(parse_inline_box).unwrap_or_default()
}

/// Absolute box of an element, accumulating ancestor offsets.
pub fn absolute_rect(el: &ElementRef) -> Rect {
    let own = inline_box(el);
    let mut x = own.left.unwrap_or(0.0);
    let mut y = own.top.unwrap_or(0.0);
    for ancestor in el.ancestors().filter_map(ElementRef::wrap) {
        let b = inline_box(&ancestor);
        x += b.left.unwrap_or(0.0);
        y += b.top.unwrap_or(0.0);
    }
    Rect {
        x,
        y,
        width: own.width.unwrap_or(0.0),
        height: own.height.unwrap_or(0.0),
    }
}

// List items become one line each; everything else is concatenated text.
fn node_text(el: &ElementRef) -> String {
    let li = Selector::parse("li").expect("static selector");
    let items: Vec<String> = el.select(&li).map(|i| i.text().collect::<String>()).collect();
    if items.is_empty() {
        el.text().collect::<String>()
    } else {
        items.join("\n")
    }
}

fn node_attrs(el: &ElementRef) -> BTreeMap<String, String> {
    let mut attrs: BTreeMap<String, String> = el
        .value()
        .attrs()
        .filter(|(name, _)| name.starts_with(ATTR_PREFIX) && *name != "data-export-type")
        .map(|(name, value)| (name[ATTR_PREFIX.len()..].to_string(), value.to_string()))
        .collect();
    if el.value().name() == "img" {
        if let Some(src) = el.value().attr("src") {
            attrs.insert("src".to_string(), src.to_string());
        }
        if let Some(alt) = el.value().attr("alt") {
            attrs.insert("alt".to_string(), alt.to_string());
        }
    }
    attrs
}

/// Measure slide `index` of a pre-rendered deck.
///
/// Slides are the `[data-export-slide]` containers in document order. A page
/// with a single container is a per-slide render and that container is used
/// for any index. When the requested container does not exist every tagged
/// node of the document is measured and the container is reported missing.
pub fn measure_slide(document: &Html, index: usize, viewport: Viewport) -> RawSlide {
    let slide_sel = Selector::parse("[data-export-slide]").expect("static selector");
    let node_sel = Selector::parse("[data-export-type]").expect("static selector");

    let containers: Vec<ElementRef> = document.select(&slide_sel).collect();
    let container = match containers.as_slice() {
        [only] => Some(*only),
        all => all.get(index).copied(),
    };

    let nodes: Vec<RawNode> = match &container {
        Some(c) => c.select(&node_sel).map(|el| measure_node(&el)).collect(),
        None => document.select(&node_sel).map(|el| measure_node(&el)).collect(),
    };

    let container_rect = container.as_ref().map(|c| {
        let mut r = absolute_rect(c);
        let declared = inline_box(c);
        if declared.width.is_none() {
            r.width = viewport.width as f64;
        }
        if declared.height.is_none() {
            r.height = viewport.height as f64;
        }
        r
    });

    RawSlide {
        container: container_rect,
        layout: container.as_ref().and_then(|c| c.value().attr("data-export-layout")).map(str::to_string),
        background: container
            .as_ref()
            .and_then(|c| c.value().attr("data-export-background"))
            .map(str::to_string),
        nodes,
    }
}

fn measure_node(el: &ElementRef) -> RawNode {
    RawNode {
        type_tag: el.value().attr("data-export-type").unwrap_or_default().to_string(),
        text: node_text(el),
        rect: absolute_rect(el),
        attrs: node_attrs(el),
    }
}

/// Number of slide containers in a pre-rendered deck.
pub fn count_slides(document: &Html) -> usize {
    let slide_sel = Selector::parse("[data-export-slide]").expect("static selector");
    document.select(&slide_sel).count()
}
