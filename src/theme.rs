//! Named color and typography sets applied uniformly across an export.

use crate::{Error, Result};

/// A deck theme. Colors are `RRGGBB` hex without the leading `#`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub name: &'static str,
    pub background: &'static str,
    pub surface: &'static str,
    pub primary: &'static str,
    pub accent: &'static str,
    pub text: &'static str,
    pub muted: &'static str,
    pub heading_font: &'static str,
    pub body_font: &'static str,
    pub mono_font: &'static str,
}

pub const THEMES: &[Theme] = &[
    Theme {
        name: "slate",
        background: "0F172A",
        surface: "1E293B",
        primary: "38BDF8",
        accent: "F59E0B",
        text: "F8FAFC",
        muted: "94A3B8",
        heading_font: "Inter",
        body_font: "Inter",
        mono_font: "JetBrains Mono",
    },
    Theme {
        name: "paper",
        background: "FFFFFF",
        surface: "F4F4F5",
        primary: "1D4ED8",
        accent: "DC2626",
        text: "18181B",
        muted: "71717A",
        heading_font: "Georgia",
        body_font: "Helvetica",
        mono_font: "Courier New",
    },
    Theme {
        name: "midnight",
        background: "000000",
        surface: "111827",
        primary: "A78BFA",
        accent: "34D399",
        text: "F9FAFB",
        muted: "9CA3AF",
        heading_font: "Inter",
        body_font: "Inter",
        mono_font: "Fira Code",
    },
    Theme {
        name: "ember",
        background: "1C1917",
        surface: "292524",
        primary: "FB923C",
        accent: "FACC15",
        text: "FAFAF9",
        muted: "A8A29E",
        heading_font: "Montserrat",
        body_font: "Open Sans",
        mono_font: "Source Code Pro",
    },
    Theme {
        name: "forest",
        background: "F0FDF4",
        surface: "DCFCE7",
        primary: "15803D",
        accent: "B45309",
        text: "14532D",
        muted: "4D7C0F",
        heading_font: "Merriweather",
        body_font: "Lato",
        mono_font: "Consolas",
    },
];

impl Theme {
    /// Resolve a theme by name (case-insensitive).
    pub fn lookup(name: &str) -> Result<&'static Theme> {
        let wanted = name.trim();
        THEMES
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::UnknownTheme {
                name: name.to_string(),
                known: names().map(str::to_string).collect(),
            })
    }

    /// Palette color for a slide background tag.
    pub fn background_for(&self, tag: &str) -> Option<&'static str> {
        match tag {
            "default" | "background" => Some(self.background),
            "surface" => Some(self.surface),
            "primary" => Some(self.primary),
            "accent" => Some(self.accent),
            "dark" => Some(if is_dark(self.background) { self.background } else { self.text }),
            "light" => Some(if is_dark(self.background) { self.text } else { self.background }),
            _ => None,
        }
    }
}

/// Names of all built-in themes.
pub fn names() -> impl Iterator<Item = &'static str> {
    THEMES.iter().map(|t| t.name)
}

/// Whether an `RRGGBB` color has low perceived luminance.
pub fn is_dark(hex: &str) -> bool {
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2).unwrap_or("ff"), 16).unwrap_or(255) as f64;
    let luminance = 0.299 * channel(0) + 0.587 * channel(2) + 0.114 * channel(4);
    luminance < 128.0
}

/// Normalise `#rgb`, `#rrggbb` or `rrggbb` into upper-case `RRGGBB`.
pub fn parse_hex_color(value: &str) -> Option<String> {
    let v = value.trim().trim_start_matches('#');
    let expanded = match v.len() {
        3 => v.chars().flat_map(|c| [c, c]).collect::<String>(),
        6 => v.to_string(),
        _ => return None,
    };
    if expanded.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(expanded.to_ascii_uppercase())
    } else {
        None
    }
}
