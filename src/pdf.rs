//! PDF export: print one page per slide, then merge in slide order.

use crate::deck::Deck;
use crate::{with_engine, Engine, EngineConfig, Error, Result};
use log::{debug, info};
use lopdf::{Document, Object, ObjectId};
use std::collections::BTreeMap;

/// Export `deck` as a single PDF using backend `E`.
///
/// Fails with [`Error::EmptyDeck`] before the backend is created when the deck
/// has no slides. The backend is closed before any render error propagates.
pub fn export_pdf_with<E: Engine>(config: EngineConfig, deck: &Deck) -> Result<Vec<u8>> {
    deck.ensure_not_empty()?;
    let pages = with_engine::<E, _, _>(config, |engine| {
        let mut pages = Vec::with_capacity(deck.slide_count);
        for index in 0..deck.slide_count {
            let url = deck.slide_url(index)?;
            info!("Printing slide {}/{}", index + 1, deck.slide_count);
            engine.load_url(&url)?;
            pages.push(engine.render_pdf()?);
        }
        Ok(pages)
    })?;
    let merged = merge_pdfs(pages)?;
    info!("Wrote {} pages ({} bytes)", deck.slide_count, merged.len());
    Ok(merged)
}

/// Export `deck` with the default backend.
#[cfg(feature = "cdp")]
pub fn export_pdf(config: EngineConfig, deck: &Deck) -> Result<Vec<u8>> {
    export_pdf_with::<crate::cdp::CdpEngine>(config, deck)
}

#[cfg(not(feature = "cdp"))]
pub fn export_pdf(config: EngineConfig, deck: &Deck) -> Result<Vec<u8>> {
    export_pdf_with::<crate::simple::SimpleEngine>(config, deck)
}

/// Merge PDF documents into one, keeping every page in input order.
pub fn merge_pdfs(documents: Vec<Vec<u8>>) -> Result<Vec<u8>> {
    if documents.is_empty() {
        return Err(Error::PdfError("No documents to merge".into()));
    }

    let mut max_id = 1;
    let mut pages: Vec<(ObjectId, Object)> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for (i, bytes) in documents.iter().enumerate() {
        let mut doc = Document::load_mem(bytes)
            .map_err(|e| Error::PdfError(format!("Document {} is not a valid PDF: {}", i + 1, e)))?;
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for (_, page_id) in doc.get_pages() {
            pages.push((page_id, doc.get_object(page_id)?.to_owned()));
        }
        objects.extend(doc.objects);
    }

    let mut merged = Document::with_version("1.5");
    let mut catalog: Option<(ObjectId, Object)> = None;
    let mut page_tree: Option<(ObjectId, lopdf::Dictionary)> = None;

    for (id, object) in objects {
        let type_name = object
            .as_dict()
            .and_then(|d| d.get(b"Type"))
            .and_then(Object::as_name)
            .map(<[u8]>::to_vec)
            .unwrap_or_default();
        match type_name.as_slice() {
            b"Catalog" => {
                if catalog.is_none() {
                    catalog = Some((id, object));
                }
            }
            b"Pages" => {
                let Ok(dict) = object.as_dict() else { continue };
                match page_tree.as_mut() {
                    Some((_, tree)) => tree.extend(dict),
                    None => page_tree = Some((id, dict.clone())),
                }
            }
            // Pages are re-parented below; outlines are dropped.
            b"Page" | b"Outlines" | b"Outline" => {}
            _ => {
                merged.objects.insert(id, object);
            }
        }
    }

    let (tree_id, mut tree) = page_tree.ok_or_else(|| Error::PdfError("No page tree found".into()))?;
    let (catalog_id, catalog) = catalog.ok_or_else(|| Error::PdfError("No document catalog found".into()))?;

    for (id, object) in &pages {
        let mut dict = object.as_dict()?.clone();
        dict.set("Parent", tree_id);
        merged.objects.insert(*id, Object::Dictionary(dict));
    }

    tree.set("Count", pages.len() as i64);
    tree.set(
        "Kids",
        pages.iter().map(|(id, _)| Object::Reference(*id)).collect::<Vec<_>>(),
    );
    merged.objects.insert(tree_id, Object::Dictionary(tree));

    let mut catalog = catalog.as_dict()?.clone();
    catalog.set("Pages", tree_id);
    catalog.remove(b"Outlines");
    merged.objects.insert(catalog_id, Object::Dictionary(catalog));

    merged.trailer.set("Root", catalog_id);
    merged.max_id = merged.objects.len() as u32;
    merged.renumber_objects();
    merged.compress();
    debug!("Merged {} documents into {} pages", documents.len(), pages.len());

    let mut out = Vec::new();
    merged.save_to(&mut out)?;
    Ok(out)
}
