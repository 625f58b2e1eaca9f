//! End-to-end export tests against a local HTTP deck

use slidewright::deck::Deck;
use slidewright::pptx::{build_pptx, capture_deck, emit_slide, SLIDE_HEIGHT_EMU};
use slidewright::simple::SimpleEngine;
use slidewright::theme::Theme;
use slidewright::{EngineConfig, Error};
use std::io::Read;
use tiny_http::{Response, Server};

const DECK_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Deck</title></head>
<body>
<section data-export-slide data-export-layout="title" style="width:1920px;height:1080px">
  <h1 data-export-type="heading" style="position:absolute;left:192px;top:108px;width:960px;height:108px">Hello</h1>
  <p data-export-type="text" style="position:absolute;left:192px;top:216px;width:960px;height:108px">World</p>
</section>
<section data-export-slide data-export-background="dark" style="width:1920px;height:1080px">
  <div data-export-type="group" style="position:absolute;left:96px;top:540px">
    <ul data-export-type="bullet-list" style="width:960px;height:216px"><li>First point</li><li>Second   point</li></ul>
  </div>
  <div data-export-type="stat-box" data-export-value="42%" data-export-label="Adoption" style="position:absolute;left:1200px;top:540px;width:480px;height:270px"></div>
</section>
</body>
</html>"#;

/// Serve the deck for every path on an ephemeral port.
fn start_deck_server() -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr();
    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            let response = Response::from_string(DECK_HTML).with_header(
                "Content-Type: text/html; charset=utf-8"
                    .parse::<tiny_http::Header>()
                    .unwrap(),
            );
            let _ = request.respond(response);
        }
    });
    format!("http://{}/", addr)
}

#[test]
fn test_heading_and_text_positions() {
    let base_url = start_deck_server();
    let deck = Deck::new("hello-world", base_url, 2);

    let slides = capture_deck::<SimpleEngine>(EngineConfig::default(), &deck).expect("capture");
    assert_eq!(slides.len(), 2);

    let first = &slides[0];
    assert_eq!(first.layout, "title");
    assert_eq!(first.elements.len(), 2);
    assert_eq!(first.elements[0].text, "Hello");
    assert!((first.elements[0].y - 10.0).abs() < 1e-9);
    assert!((first.elements[0].h - 10.0).abs() < 1e-9);

    let theme = Theme::lookup("slate").unwrap();
    let part = emit_slide(first, theme, 0);
    let heading = part.shapes[0].frame();
    let text = part.shapes[1].frame();
    assert_eq!(heading.y, 514350);
    assert_eq!(heading.cy, 514350);
    assert_eq!(heading.x, 914400);
    assert_eq!(heading.cx, 4572000);
    assert_eq!(text.y, 1028700);
    assert!(heading.y + heading.cy <= text.y, "heading overlaps text");
    assert!(text.y + text.cy <= SLIDE_HEIGHT_EMU);

    let second = &slides[1];
    assert_eq!(second.background, "dark");
    assert_eq!(second.elements[0].text, "First point\nSecond point");
    assert!((second.elements[0].y - 50.0).abs() < 1e-9);
    assert_eq!(second.elements[1].attr("value"), Some("42%"));
}

#[test]
fn test_pptx_package_contains_slides() {
    let base_url = start_deck_server();
    let deck = Deck::new("package", base_url, 2);
    let theme = Theme::lookup("slate").unwrap();

    let slides = capture_deck::<SimpleEngine>(EngineConfig::default(), &deck).unwrap();
    let bytes = build_pptx(&slides, theme, "package").unwrap();

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    let mut slide1 = String::new();
    archive
        .by_name("ppt/slides/slide1.xml")
        .unwrap()
        .read_to_string(&mut slide1)
        .unwrap();
    assert!(slide1.contains("Hello"));
    assert!(slide1.contains(r#"<a:off x="914400" y="514350"/>"#));

    let mut slide2 = String::new();
    archive
        .by_name("ppt/slides/slide2.xml")
        .unwrap()
        .read_to_string(&mut slide2)
        .unwrap();
    assert!(slide2.contains("42%"));
    assert!(slide2.contains("Adoption"));
    assert!(archive.by_name("ppt/slides/slide3.xml").is_err());
}

#[test]
fn test_unreachable_deck_reports_load_error() {
    // Port 9 (discard) is closed on loopback in test environments
    let deck = Deck::new("offline", "http://127.0.0.1:9/", 1);
    let result = capture_deck::<SimpleEngine>(EngineConfig::default(), &deck);
    assert!(matches!(result, Err(Error::LoadError(_))), "got {:?}", result.map(|s| s.len()));
}

#[test]
fn test_simple_engine_cannot_print() {
    let base_url = start_deck_server();
    let deck = Deck::new("print", base_url, 1);
    let result = slidewright::pdf::export_pdf_with::<SimpleEngine>(EngineConfig::default(), &deck);
    assert!(matches!(result, Err(Error::RenderError(_))));
}

#[cfg(feature = "cdp")]
#[test]
#[ignore] // Requires Chrome to be installed
fn test_cdp_pdf_export() {
    use slidewright::Engine;

    let base_url = start_deck_server();
    let deck = Deck::new("cdp", base_url, 2);
    let config = EngineConfig {
        settle_ms: 100,
        ..EngineConfig::default()
    };

    let bytes = slidewright::pdf::export_pdf(config.clone(), &deck).expect("pdf export");
    let doc = lopdf::Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 2);

    let pptx = slidewright::pptx::export_pptx(config.clone(), &deck, Theme::lookup("slate").unwrap()).unwrap();
    assert_eq!(&pptx[..2], b"PK");

    let mut engine = slidewright::new_engine(config).expect("Failed to create engine");
    engine.load_url(&deck.slide_url(0).unwrap()).unwrap();
    let raw = engine.capture_slide().unwrap();
    assert_eq!(raw.nodes.len(), 2);
    engine.close().unwrap();
}
