//! PPTX export.
//!
//! Each slide is loaded in export mode, measured, normalised by
//! [`extract_slide`](crate::extract::extract_slide) and re-emitted as native
//! shapes on a 16:9 canvas.

pub mod emit;
pub mod writer;

pub use emit::{emit_element, emit_slide, frame_for};
pub use writer::{PackageWriter, Shape, SlidePart, EMU_PER_INCH, SLIDE_HEIGHT_EMU, SLIDE_WIDTH_EMU};

use crate::deck::Deck;
use crate::extract::{extract_slide, ExtractedSlide};
use crate::theme::Theme;
use crate::{with_engine, Engine, EngineConfig, Result};
use log::{info, warn};

/// Capture and extract every slide of `deck`, one at a time.
pub fn capture_deck<E: Engine>(config: EngineConfig, deck: &Deck) -> Result<Vec<ExtractedSlide>> {
    deck.ensure_not_empty()?;
    with_engine::<E, _, _>(config, |engine| {
        let mut slides = Vec::with_capacity(deck.slide_count);
        for index in 0..deck.slide_count {
            let url = deck.slide_url(index)?;
            info!("Extracting slide {}/{}", index + 1, deck.slide_count);
            engine.load_url(&url)?;
            let slide = extract_slide(&engine.capture_slide()?);
            if !slide.unmapped.is_empty() {
                warn!(
                    "Slide {} has elements with no PPTX mapping: {}",
                    index + 1,
                    slide.unmapped.join(", ")
                );
            }
            slides.push(slide);
        }
        Ok(slides)
    })
}

/// Write extracted slides into a PPTX package.
pub fn build_pptx(slides: &[ExtractedSlide], theme: &Theme, title: &str) -> Result<Vec<u8>> {
    let mut writer = PackageWriter::new(theme, title);
    for (index, slide) in slides.iter().enumerate() {
        writer.add_slide(emit_slide(slide, theme, index));
    }
    writer.to_bytes()
}

/// Export `deck` as a PPTX buffer using backend `E`.
pub fn export_pptx_with<E: Engine>(config: EngineConfig, deck: &Deck, theme: &Theme) -> Result<Vec<u8>> {
    let slides = capture_deck::<E>(config, deck)?;
    let bytes = build_pptx(&slides, theme, &deck.id)?;
    info!("Wrote {} slides ({} bytes)", slides.len(), bytes.len());
    Ok(bytes)
}

/// Export `deck` with the default backend.
#[cfg(feature = "cdp")]
pub fn export_pptx(config: EngineConfig, deck: &Deck, theme: &Theme) -> Result<Vec<u8>> {
    export_pptx_with::<crate::cdp::CdpEngine>(config, deck, theme)
}

#[cfg(not(feature = "cdp"))]
pub fn export_pptx(config: EngineConfig, deck: &Deck, theme: &Theme) -> Result<Vec<u8>> {
    export_pptx_with::<crate::simple::SimpleEngine>(config, deck, theme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simple::SimpleEngine;
    use crate::Error;

    #[test]
    fn test_empty_deck_fails_before_engine() {
        let deck = Deck::new("empty", "http://127.0.0.1:9/", 0);
        let theme = Theme::lookup("paper").unwrap();
        assert!(matches!(
            export_pptx_with::<SimpleEngine>(EngineConfig::default(), &deck, theme),
            Err(Error::EmptyDeck)
        ));
    }

    #[test]
    fn test_export_from_file_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        std::fs::write(
            &path,
            r#"<section data-export-slide style="width:1920px;height:1080px">
                 <h1 data-export-type="heading" style="position:absolute;left:192px;top:108px;width:960px;height:108px">One</h1>
               </section>
               <section data-export-slide data-export-background="accent" style="width:1920px;height:1080px">
                 <p data-export-type="sparkline" style="width:10px;height:10px">?</p>
               </section>"#,
        )
        .unwrap();
        let url = url::Url::from_file_path(&path).unwrap();
        let deck = Deck::new("file-deck", url.as_str(), 2);

        let slides = capture_deck::<SimpleEngine>(EngineConfig::default(), &deck).unwrap();
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].elements[0].text, "One");
        assert_eq!(slides[1].background, "accent");
        assert_eq!(slides[1].unmapped, vec!["sparkline".to_string()]);

        let bytes = build_pptx(&slides, Theme::lookup("paper").unwrap(), "file-deck").unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
