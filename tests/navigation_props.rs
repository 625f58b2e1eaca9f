//! Property tests for the navigation controller

use proptest::prelude::*;
use slidewright::deck::Deck;
use slidewright::navigation::{FocusTarget, Key, MemoryStore, NavigationController, SessionStore};

#[derive(Debug, Clone)]
enum Step {
    Next,
    Prev,
    GoTo(usize),
    Key(Key),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        Just(Step::Next),
        Just(Step::Prev),
        (0usize..64).prop_map(Step::GoTo),
        prop_oneof![
            Just(Key::ArrowRight),
            Just(Key::ArrowLeft),
            Just(Key::PageDown),
            Just(Key::PageUp),
            Just(Key::Space),
            Just(Key::Home),
            Just(Key::End),
        ]
        .prop_map(Step::Key),
    ]
}

proptest! {
    #[test]
    fn current_stays_in_range(count in 1usize..20, steps in prop::collection::vec(step(), 0..50)) {
        let deck = Deck::new("props", "http://localhost/", count);
        let mut nav = NavigationController::new(&deck, MemoryStore::new(), None).unwrap();
        for s in steps {
            match s {
                Step::Next => nav.next(),
                Step::Prev => nav.prev(),
                Step::GoTo(i) => nav.go_to(i),
                Step::Key(k) => {
                    nav.handle_key(k, FocusTarget::Document);
                }
            }
            prop_assert!(nav.current() < count);
            let saved = nav.store().load(&deck.session_key()).unwrap();
            prop_assert_eq!(saved, Some(nav.current().to_string()));
        }
    }

    #[test]
    fn go_to_clamps(count in 1usize..20, target in 0usize..1000) {
        let deck = Deck::new("clamp", "http://localhost/", count);
        let mut nav = NavigationController::new(&deck, MemoryStore::new(), None).unwrap();
        nav.go_to(target);
        prop_assert_eq!(nav.current(), target.min(count - 1));
    }

    #[test]
    fn editable_focus_never_moves(count in 2usize..20, start in 0usize..20, key in prop_oneof![Just(Key::ArrowRight), Just(Key::End), Just(Key::Space)]) {
        let deck = Deck::new("focus", "http://localhost/", count);
        let mut nav = NavigationController::new(&deck, MemoryStore::new(), Some(start)).unwrap();
        let before = nav.current();
        prop_assert!(!nav.handle_key(key, FocusTarget::Editable));
        prop_assert!(!nav.handle_key(key, FocusTarget::FormControl));
        prop_assert_eq!(nav.current(), before);
    }
}

#[test]
fn test_session_resumes_per_deck() {
    let deck = Deck::new("resume", "http://localhost/", 8);
    let mut nav = NavigationController::new(&deck, MemoryStore::new(), None).unwrap();
    nav.go_to(5);
    let store = nav.store().clone();

    let resumed = NavigationController::new(&deck, store.clone(), None).unwrap();
    assert_eq!(resumed.current(), 5);

    let other = Deck::new("another", "http://localhost/", 8);
    assert_eq!(NavigationController::new(&other, store, None).unwrap().current(), 0);
}
