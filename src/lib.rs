//! Slidewright
//!
//! Local-first slide deck tooling: a navigation controller with best-effort
//! session persistence, a geometry extractor that turns rendered slide DOM
//! into container-relative boxes, and exporters that re-emit those boxes as
//! native PPTX shapes or print each slide into a merged PDF.
//!
//! # Features
//!
//! - **CDP Backend** (default): renders slides in headless Chrome
//! - **Static Backend**: lays out pre-rendered HTML with absolute inline
//!   geometry, no browser required
//! - **Exhaustive export mapping**: every element kind has an emitter, unknown
//!   tags are reported instead of silently dropped
//!
//! # Example
//!
//! ```no_run
//! use slidewright::{deck::Deck, theme::Theme, EngineConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let deck = Deck::new("quarterly-review", "http://localhost:5173/", 12);
//! let theme = Theme::lookup("slate")?;
//! let bytes = slidewright::pptx::export_pptx_with::<slidewright::simple::SimpleEngine>(
//!     EngineConfig::default(),
//!     &deck,
//!     theme,
//! )?;
//! std::fs::write("deck.pptx", bytes)?;
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

#[cfg(feature = "cdp")]
pub mod cdp;

// Browser-less backend over pre-rendered HTML
pub mod simple;

// Inline-style box layout used by the static backend
pub mod rendering;

pub mod config;
pub mod deck;
pub mod devapi;
pub mod edit;
pub mod extract;
pub mod navigation;
pub mod pdf;
pub mod pptx;
pub mod project;
pub mod schema;
pub mod theme;

pub use extract::{ElementKind, ExtractedElement, ExtractedSlide, RawSlide};

/// Configuration for a rendering backend
///
/// The defaults match the canvas the deck is authored for (1920×1080) and
/// give slow dev servers a generous load timeout.
///
/// # Examples
///
/// ```
/// let cfg = slidewright::EngineConfig::default();
/// assert_eq!(cfg.viewport.width, 1920);
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// User agent string to send with requests
    pub user_agent: String,
    /// Viewport dimensions
    pub viewport: Viewport,
    /// Timeout for page loads in milliseconds
    pub timeout_ms: u64,
    /// Extra wait after navigation so fonts and transitions settle
    pub settle_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("slidewright/", env!("CARGO_PKG_VERSION")).to_string(),
            viewport: Viewport::default(),
            timeout_ms: 30000,
            settle_ms: 500,
        }
    }
}

/// Viewport dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Page size in inches for a print at 96 CSS pixels per inch.
    pub fn page_size_inches(&self) -> (f64, f64) {
        (self.width as f64 / 96.0, self.height as f64 / 96.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Core trait for rendering backends
///
/// A backend owns one page. Export drives it strictly sequentially: load a
/// slide URL, measure or print it, move on to the next slide.
pub trait Engine {
    /// Create a new engine instance with the given configuration
    fn new(config: EngineConfig) -> Result<Self>
    where
        Self: Sized;

    /// Load a URL and wait for the slide container to be ready
    fn load_url(&mut self, url: &str) -> Result<()>;

    /// Measure the current slide: container box, tags and every tagged node
    fn capture_slide(&mut self) -> Result<RawSlide>;

    /// Print the current slide as a single-page PDF sized to the viewport
    fn render_pdf(&mut self) -> Result<Vec<u8>>;

    /// Close the engine and clean up resources
    fn close(self) -> Result<()>;
}

/// Create a new engine instance with the default backend
///
/// This prefers the CDP backend when the `cdp` feature is enabled (default)
/// and falls back to the static `SimpleEngine` otherwise.
#[cfg(feature = "cdp")]
pub fn new_engine(config: EngineConfig) -> Result<impl Engine> {
    cdp::CdpEngine::new(config)
}

#[cfg(not(feature = "cdp"))]
pub fn new_engine(config: EngineConfig) -> Result<impl Engine> {
    simple::SimpleEngine::new(config)
}

/// Run `f` against a freshly created engine, closing it on every exit path.
///
/// The engine is closed before an error from `f` is returned. A close failure
/// after `f` already failed is logged and the original error wins.
pub fn with_engine<E, T, F>(config: EngineConfig, f: F) -> Result<T>
where
    E: Engine,
    F: FnOnce(&mut E) -> Result<T>,
{
    let mut engine = E::new(config)?;
    let result = f(&mut engine);
    let closed = engine.close();
    match (result, closed) {
        (Ok(value), closed) => closed.map(|_| value),
        (Err(e), Err(close_err)) => {
            log::warn!("Failed to close engine after error: {}", close_err);
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
    }
}
