//! A lightweight, browser-less engine over pre-rendered slide HTML.
//!
//! This engine fetches a document (over HTTP or from a `file://` URL), picks
//! the slide named by the `slide` query parameter and measures it from
//! absolute inline geometry. It runs no JavaScript and cannot print PDFs;
//! use the CDP backend for live dev servers.

use crate::navigation::slide_from_query;
use crate::rendering::layout;
use crate::{Engine, EngineConfig, Error, RawSlide, Result};
use log::debug;
use reqwest::blocking::Client;
use scraper::Html;
use std::time::Duration;
use url::Url;

/// A simple, dependency-light engine that does not run JavaScript.
pub struct SimpleEngine {
    client: Client,
    config: EngineConfig,
    last_html: Option<String>,
    slide_index: usize,
}

impl SimpleEngine {
    /// Load markup directly, as if it had been fetched from `url`.
    pub fn load_html(&mut self, html: impl Into<String>, url: &str) {
        self.slide_index = slide_from_query(url).unwrap_or(0);
        self.last_html = Some(html.into());
    }

    /// Number of `[data-export-slide]` containers in the loaded document.
    pub fn slide_count(&self) -> Result<usize> {
        let html = self
            .last_html
            .as_ref()
            .ok_or_else(|| Error::RenderError("No document loaded".into()))?;
        Ok(layout::count_slides(&Html::parse_document(html)))
    }

    fn fetch(&self, url: &Url) -> Result<String> {
        if url.scheme() == "file" {
            let path = url
                .to_file_path()
                .map_err(|_| Error::LoadError(format!("Invalid file URL: {}", url)))?;
            return std::fs::read_to_string(&path)
                .map_err(|e| Error::LoadError(format!("Failed to read {}: {}", path.display(), e)));
        }

        let res = self
            .client
            .get(url.as_str())
            .header("User-Agent", self.config.user_agent.clone())
            .send()
            .map_err(|e| Error::LoadError(format!("HTTP GET failed: {}", e)))?;

        if !res.status().is_success() {
            return Err(Error::LoadError(format!("HTTP GET {} returned {}", url, res.status())));
        }

        res.text()
            .map_err(|e| Error::LoadError(format!("Failed to read response body: {}", e)))
    }
}

impl Engine for SimpleEngine {
    fn new(config: EngineConfig) -> Result<Self>
    where
        Self: Sized,
    {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            last_html: None,
            slide_index: 0,
        })
    }

    fn load_url(&mut self, url: &str) -> Result<()> {
        let parsed = Url::parse(url).map_err(|e| Error::LoadError(format!("Invalid URL {}: {}", url, e)))?;
        let body = self.fetch(&parsed)?;
        debug!("Loaded {} ({} bytes)", url, body.len());
        self.load_html(body, url);
        Ok(())
    }

    fn capture_slide(&mut self) -> Result<RawSlide> {
        let html = self
            .last_html
            .as_ref()
            .ok_or_else(|| Error::RenderError("No document loaded".into()))?;
        let document = Html::parse_document(html);
        Ok(layout::measure_slide(&document, self.slide_index, self.config.viewport))
    }

    fn render_pdf(&mut self) -> Result<Vec<u8>> {
        Err(Error::RenderError(
            "PDF printing is not supported by SimpleEngine; enable the `cdp` backend".into(),
        ))
    }

    fn close(self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECK: &str = r#"<html><body>
        <section data-export-slide style="width:1920px;height:1080px"><h1 data-export-type="heading" style="width:960px;height:108px">First</h1></section>
        <section data-export-slide style="width:1920px;height:1080px"><h1 data-export-type="heading" style="width:960px;height:108px">Second</h1></section>
    </body></html>"#;

    #[test]
    fn test_slide_query_selects_container() {
        let mut engine = SimpleEngine::new(EngineConfig::default()).expect("engine");
        engine.load_html(DECK, "http://localhost/deck?slide=1&export=1");
        assert_eq!(engine.slide_count().unwrap(), 2);
        let raw = engine.capture_slide().unwrap();
        assert_eq!(raw.nodes[0].text, "Second");
    }

    #[test]
    fn test_per_slide_page_keeps_its_container() {
        let page = r#"<html><body><section data-export-slide style="width:1920px;height:1080px">
            <h1 data-export-type="heading" style="left:192px;top:108px;width:960px;height:108px">Slide two</h1>
        </section></body></html>"#;
        let mut engine = SimpleEngine::new(EngineConfig::default()).expect("engine");
        engine.load_html(page, "http://localhost/deck?slide=1&export=1");
        let raw = engine.capture_slide().unwrap();
        let container = raw.container.expect("container for a single-container page");
        assert_eq!((container.width, container.height), (1920.0, 1080.0));
        assert_eq!(raw.nodes.len(), 1);
        assert_eq!(raw.nodes[0].rect.y, 108.0);
    }

    #[test]
    fn test_simple_engine_reads_file_urls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.html");
        std::fs::write(&path, DECK).unwrap();
        let url = Url::from_file_path(&path).unwrap();

        let mut engine = SimpleEngine::new(EngineConfig::default()).expect("engine");
        engine.load_url(url.as_str()).expect("load file url");
        let raw = engine.capture_slide().unwrap();
        assert_eq!(raw.nodes[0].text, "First");
        assert!(engine.render_pdf().is_err());
    }

    #[test]
    fn test_simple_engine_fetches_over_http() {
        // Skip on CI where network may not be available
        if std::env::var("CI").is_ok() {
            return;
        }

        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr();

        std::thread::spawn(move || {
            if let Ok(request) = server.recv() {
                let _ = request.respond(tiny_http::Response::from_string(DECK));
            }
        });

        let url = format!("http://{}/?slide=1", addr);
        let mut engine = SimpleEngine::new(EngineConfig::default()).expect("engine");
        engine.load_url(&url).expect("Failed to load URL");
        assert_eq!(engine.capture_slide().unwrap().nodes[0].text, "Second");
    }

    #[test]
    fn test_capture_without_document_fails() {
        let mut engine = SimpleEngine::new(EngineConfig::default()).expect("engine");
        assert!(engine.capture_slide().is_err());
    }
}
