//! Export a two-slide deck to PPTX with the static backend (no browser needed)
//! Run with: cargo run --example export_deck -- [output.pptx] [theme]

use slidewright::deck::Deck;
use slidewright::pptx;
use slidewright::simple::SimpleEngine;
use slidewright::theme::Theme;
use slidewright::EngineConfig;

const DECK_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Demo deck</title></head>
<body>
<section data-export-slide data-export-layout="title" style="width:1920px;height:1080px">
  <h1 data-export-type="heading" style="position:absolute;left:192px;top:324px;width:1536px;height:216px">Quarterly review</h1>
  <p data-export-type="text" style="position:absolute;left:192px;top:594px;width:1536px;height:108px">Exported without a browser</p>
</section>
<section data-export-slide data-export-background="dark" style="width:1920px;height:1080px">
  <ul data-export-type="bullet-list" style="position:absolute;left:192px;top:216px;width:960px;height:432px"><li>Revenue up</li><li>Churn down</li></ul>
  <div data-export-type="stat-box" data-export-value="42%" data-export-label="Adoption" style="position:absolute;left:1248px;top:216px;width:480px;height:270px"></div>
</section>
</body>
</html>"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let output = args.next().unwrap_or_else(|| "deck.pptx".to_string());
    let theme = Theme::lookup(&args.next().unwrap_or_else(|| "slate".to_string()))?;

    // Serve the same page for every slide URL; the extractor picks the section by index
    let server = tiny_http::Server::http("127.0.0.1:0").map_err(|e| -> Box<dyn std::error::Error> { e })?;
    let addr = server.server_addr();
    std::thread::spawn(move || {
        for req in server.incoming_requests() {
            let _ = req.respond(tiny_http::Response::from_string(DECK_HTML));
        }
    });

    let deck = Deck::new("demo", format!("http://{}/", addr), 2);
    println!("Exporting {} slides from {}", deck.slide_count, deck.base_url);

    let bytes = pptx::export_pptx_with::<SimpleEngine>(EngineConfig::default(), &deck, theme)?;
    std::fs::write(&output, &bytes)?;
    println!("Wrote {} ({} bytes, theme {})", output, bytes.len(), theme.name);

    Ok(())
}
