//! Slide navigation state.
//!
//! [`NavigationController`] owns the single authoritative current-slide index
//! of a deck session. Every change is written to a [`SessionStore`] under a
//! deck-scoped key so a reload resumes where the presenter left off.
//! Persistence is best-effort, not a durability guarantee: store failures are
//! logged at debug level and otherwise ignored.

use crate::deck::Deck;
use crate::{Error, Result};
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

/// Direction of the most recent move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn sign(&self) -> i8 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

/// Key-value storage scoped to one presenting session.
pub trait SessionStore {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Session storage kept in memory for the lifetime of the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Session storage backed by a JSON object on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let data = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

impl SessionStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        let mut all = self.read_all().unwrap_or_default();
        all.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&all)?)?;
        Ok(())
    }
}

/// Keys the controller reacts to, named as DOM `KeyboardEvent.key` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowRight,
    ArrowLeft,
    ArrowDown,
    ArrowUp,
    PageDown,
    PageUp,
    Space,
    Home,
    End,
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ArrowRight" => Ok(Key::ArrowRight),
            "ArrowLeft" => Ok(Key::ArrowLeft),
            "ArrowDown" => Ok(Key::ArrowDown),
            "ArrowUp" => Ok(Key::ArrowUp),
            "PageDown" => Ok(Key::PageDown),
            "PageUp" => Ok(Key::PageUp),
            " " | "Space" | "Spacebar" => Ok(Key::Space),
            "Home" => Ok(Key::Home),
            "End" => Ok(Key::End),
            other => Err(format!("unhandled key '{}'", other)),
        }
    }
}

/// Where keyboard focus was when a key arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    Document,
    Editable,
    FormControl,
}

impl FocusTarget {
    /// Classify a focused element by tag name and `contentEditable` state.
    pub fn classify(tag: &str, content_editable: bool) -> Self {
        if content_editable {
            return FocusTarget::Editable;
        }
        match tag.to_ascii_lowercase().as_str() {
            "input" | "textarea" | "select" => FocusTarget::FormControl,
            _ => FocusTarget::Document,
        }
    }
}

/// Read the `slide` query parameter from a URL, if present and numeric.
pub fn slide_from_query(url: &str) -> Option<usize> {
    let parsed = Url::parse(url).ok()?;
    let value = parsed
        .query_pairs()
        .find(|(k, _)| k == "slide")
        .map(|(_, v)| v.into_owned())?;
    // Negative indices clamp to the first slide; the upper bound is the controller's.
    value.trim().parse::<i64>().ok().map(|n| n.max(0) as usize)
}

/// Current-slide state for one deck session.
pub struct NavigationController<S: SessionStore> {
    current: usize,
    direction: Direction,
    slide_count: usize,
    key: String,
    store: S,
}

impl<S: SessionStore> NavigationController<S> {
    /// Resolve the initial slide: query override, then the persisted value
    /// for this deck, then 0.
    pub fn new(deck: &Deck, store: S, query_slide: Option<usize>) -> Result<Self> {
        if deck.slide_count == 0 {
            return Err(Error::EmptyDeck);
        }

        let key = deck.session_key();
        let persisted = match store.load(&key) {
            Ok(value) => value.and_then(|v| v.trim().parse::<usize>().ok()),
            Err(e) => {
                debug!("Ignoring unreadable session state for {}: {}", key, e);
                None
            }
        };

        let initial = query_slide.or(persisted).unwrap_or(0);
        let mut controller = Self {
            current: 0,
            direction: Direction::Forward,
            slide_count: deck.slide_count,
            key,
            store,
        };
        controller.current = controller.clamp(initial);
        controller.persist();
        Ok(controller)
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn slide_count(&self) -> usize {
        self.slide_count
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 == self.slide_count
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Jump to `index`, clamped into the deck. Never fails.
    pub fn go_to(&mut self, index: usize) {
        let target = self.clamp(index);
        if target == self.current {
            return;
        }
        self.direction = if target > self.current {
            Direction::Forward
        } else {
            Direction::Backward
        };
        self.current = target;
        self.persist();
    }

    pub fn next(&mut self) {
        self.go_to(self.current.saturating_add(1));
    }

    pub fn prev(&mut self) {
        if self.current > 0 {
            self.go_to(self.current - 1);
        }
    }

    /// Dispatch a key press. Returns whether the key moved (or tried to move)
    /// the deck; keys arriving while text is being edited are left alone.
    pub fn handle_key(&mut self, key: Key, focus: FocusTarget) -> bool {
        if focus != FocusTarget::Document {
            return false;
        }
        match key {
            Key::ArrowRight | Key::ArrowDown | Key::PageDown | Key::Space => self.next(),
            Key::ArrowLeft | Key::ArrowUp | Key::PageUp => self.prev(),
            Key::Home => self.go_to(0),
            Key::End => self.go_to(self.slide_count - 1),
        }
        true
    }

    fn clamp(&self, index: usize) -> usize {
        index.min(self.slide_count - 1)
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.key, &self.current.to_string()) {
            debug!("Ignoring session write failure for {}: {}", self.key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStore;

    impl SessionStore for BrokenStore {
        fn load(&self, _key: &str) -> Result<Option<String>> {
            Err(Error::Other("storage disabled".into()))
        }
        fn save(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::Other("storage disabled".into()))
        }
    }

    fn deck(count: usize) -> Deck {
        Deck::new("demo", "http://localhost:5173/", count)
    }

    #[test]
    fn go_to_clamps_and_tracks_direction() {
        let mut nav = NavigationController::new(&deck(5), MemoryStore::new(), None).unwrap();
        assert_eq!(nav.current(), 0);
        nav.go_to(99);
        assert_eq!(nav.current(), 4);
        assert_eq!(nav.direction(), Direction::Forward);
        nav.go_to(1);
        assert_eq!(nav.current(), 1);
        assert_eq!(nav.direction(), Direction::Backward);
        assert_eq!(nav.direction().sign(), -1);
    }

    #[test]
    fn next_and_prev_stop_at_the_edges() {
        let mut nav = NavigationController::new(&deck(2), MemoryStore::new(), None).unwrap();
        nav.prev();
        assert!(nav.is_first());
        nav.next();
        nav.next();
        assert!(nav.is_last());
        assert_eq!(nav.current(), 1);
    }

    #[test]
    fn query_beats_persisted_value() {
        let d = deck(10);
        let mut store = MemoryStore::new();
        store.save(&d.session_key(), "7").unwrap();

        let nav = NavigationController::new(&d, store.clone(), Some(3)).unwrap();
        assert_eq!(nav.current(), 3);

        let nav = NavigationController::new(&d, store, None).unwrap();
        assert_eq!(nav.current(), 7);
    }

    #[test]
    fn garbage_and_out_of_range_state_is_tolerated() {
        let d = deck(3);
        let mut store = MemoryStore::new();
        store.save(&d.session_key(), "not-a-number").unwrap();
        assert_eq!(NavigationController::new(&d, store.clone(), None).unwrap().current(), 0);

        store.save(&d.session_key(), "42").unwrap();
        assert_eq!(NavigationController::new(&d, store, None).unwrap().current(), 2);
    }

    #[test]
    fn storage_failures_are_not_fatal() {
        let mut nav = NavigationController::new(&deck(3), BrokenStore, None).unwrap();
        nav.next();
        assert_eq!(nav.current(), 1);
    }

    #[test]
    fn keys_are_ignored_while_editing() {
        let mut nav = NavigationController::new(&deck(4), MemoryStore::new(), None).unwrap();
        assert!(!nav.handle_key(Key::ArrowRight, FocusTarget::classify("textarea", false)));
        assert!(!nav.handle_key(Key::Space, FocusTarget::classify("div", true)));
        assert_eq!(nav.current(), 0);

        assert!(nav.handle_key(Key::Space, FocusTarget::classify("body", false)));
        assert!(nav.handle_key(Key::End, FocusTarget::Document));
        assert_eq!(nav.current(), 3);
        assert!(nav.handle_key(" ".parse().unwrap(), FocusTarget::Document));
        assert_eq!(nav.current(), 3);
        assert!("Tab".parse::<Key>().is_err());
    }

    #[test]
    fn empty_deck_is_rejected() {
        assert!(matches!(
            NavigationController::new(&deck(0), MemoryStore::new(), None),
            Err(Error::EmptyDeck)
        ));
    }

    #[test]
    fn file_store_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session").join("state.json");
        let d = deck(6);

        let mut nav = NavigationController::new(&d, FileStore::new(&path), None).unwrap();
        nav.go_to(4);

        let reloaded = NavigationController::new(&d, FileStore::new(&path), None).unwrap();
        assert_eq!(reloaded.current(), 4);
    }

    #[test]
    fn reads_slide_query_parameter() {
        assert_eq!(slide_from_query("http://localhost:5173/?slide=3&export=1"), Some(3));
        assert_eq!(slide_from_query("http://localhost:5173/?slide=abc"), None);
        assert_eq!(slide_from_query("http://localhost:5173/"), None);
        assert_eq!(slide_from_query("not a url"), None);
    }

    #[test]
    fn negative_slide_query_clamps_to_first() {
        assert_eq!(slide_from_query("http://localhost:5173/?slide=-2"), Some(0));
        assert_eq!(slide_from_query("http://localhost:5173/?slide=%20-1%20"), Some(0));
        assert_eq!(slide_from_query("http://localhost:5173/?slide=0"), Some(0));

        let d = Deck::new("demo", "http://localhost:5173/?slide=-2", 10);
        let mut store = MemoryStore::new();
        store.save(&d.session_key(), "7").unwrap();
        let nav = NavigationController::new(&d, store, slide_from_query(&d.base_url)).unwrap();
        assert_eq!(nav.current(), 0);
    }
}
