//! Deck identity and slide addressing.

use crate::{Error, Result};
use sha2::{Digest, Sha256};
use url::Url;

/// Prefix of every session key written by the navigation controller.
pub const SESSION_KEY_PREFIX: &str = "slidewright:slide:";

/// An ordered collection of slides served at `base_url`.
#[derive(Debug, Clone, PartialEq)]
pub struct Deck {
    pub id: String,
    pub base_url: String,
    pub slide_count: usize,
}

impl Deck {
    pub fn new(id: impl Into<String>, base_url: impl Into<String>, slide_count: usize) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.into(),
            slide_count,
        }
    }

    /// Short stable hash of the deck id.
    pub fn hash(&self) -> String {
        deck_hash(&self.id)
    }

    /// Key under which the current slide of this deck is persisted.
    pub fn session_key(&self) -> String {
        format!("{}{}", SESSION_KEY_PREFIX, self.hash())
    }

    /// URL that renders slide `index` alone, in export mode.
    pub fn slide_url(&self, index: usize) -> Result<String> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| Error::ConfigError(format!("Invalid deck URL '{}': {}", self.base_url, e)))?;
        let retained: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != "slide" && k != "export")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            for (k, v) in &retained {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("slide", &index.to_string());
            pairs.append_pair("export", "1");
        }
        Ok(url.into())
    }

    /// Fail unless the deck has at least one slide.
    pub fn ensure_not_empty(&self) -> Result<()> {
        if self.slide_count == 0 {
            return Err(Error::EmptyDeck);
        }
        Ok(())
    }
}

/// First 12 hex digits of the SHA-256 of `id`.
pub fn deck_hash(id: &str) -> String {
    let digest = Sha256::digest(id.as_bytes());
    hex::encode(&digest[..6])
}
