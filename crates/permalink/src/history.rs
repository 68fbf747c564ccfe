use foundation::MapView;
use serde::{Deserialize, Serialize};

use crate::error::PermalinkError;
use crate::sync::Notification;

/// Structured twin of a pushed fragment: `{zoom, center: [x, y]}`.
///
/// Read back verbatim on back/forward. Unlike the fragment it keeps the
/// unrounded zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryState {
    pub zoom: f64,
    pub center: [f64; 2],
}

impl HistoryState {
    pub fn from_view(view: MapView) -> Self {
        Self {
            zoom: view.zoom,
            center: view.center,
        }
    }

    pub fn view(&self) -> MapView {
        MapView::new(self.center, self.zoom)
    }

    pub fn to_json(&self) -> Result<String, PermalinkError> {
        serde_json::to_string(self).map_err(|e| PermalinkError::Environment(e.to_string()))
    }

    /// Parses a state object read back from the browser.
    ///
    /// Anything that is not one of ours (`null`, a foreign app's state) yields
    /// `None`.
    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str::<HistoryState>(raw).ok()
    }
}

/// A non-reloading history entry: fragment plus structured state.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub hash: String,
    pub state: HistoryState,
}

/// Browser-style session history.
pub trait SessionHistory {
    /// Fragment of the current entry, including the leading `#`.
    fn current_fragment(&self) -> Option<String>;
    /// Appends `entry` after the current one (never replaces).
    fn push(&mut self, entry: &HistoryEntry) -> Result<(), PermalinkError>;
}

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    fragment: Option<String>,
    state: Option<HistoryState>,
}

/// In-process session history with browser semantics.
///
/// The page-load entry has no state. Pushing drops every entry after the
/// cursor. `back`/`forward` return the navigation notification the browser
/// would deliver.
#[derive(Debug, Clone)]
pub struct InMemoryHistory {
    slots: Vec<Slot>,
    cursor: usize,
    pushed: Vec<HistoryEntry>,
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                fragment: None,
                state: None,
            }],
            cursor: 0,
            pushed: Vec::new(),
        }
    }

    /// History of a page loaded with `fragment` in its URL.
    pub fn with_fragment(fragment: impl Into<String>) -> Self {
        let mut h = Self::new();
        h.slots[0].fragment = Some(fragment.into());
        h
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Every entry pushed so far, including ones later cut off by a push
    /// after going back.
    pub fn pushed(&self) -> &[HistoryEntry] {
        &self.pushed
    }

    pub fn fragments(&self) -> Vec<Option<&str>> {
        self.slots.iter().map(|s| s.fragment.as_deref()).collect()
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.slots.len()
    }

    pub fn back(&mut self) -> Option<Notification> {
        if !self.can_go_back() {
            return None;
        }
        self.cursor -= 1;
        Some(self.navigated())
    }

    pub fn forward(&mut self) -> Option<Notification> {
        if !self.can_go_forward() {
            return None;
        }
        self.cursor += 1;
        Some(self.navigated())
    }

    /// The user edits the fragment by hand: a new entry without state.
    pub fn navigate_to_fragment(&mut self, fragment: impl Into<String>) -> Notification {
        self.slots.truncate(self.cursor + 1);
        self.slots.push(Slot {
            fragment: Some(fragment.into()),
            state: None,
        });
        self.cursor = self.slots.len() - 1;
        self.navigated()
    }

    fn navigated(&self) -> Notification {
        Notification::HistoryNavigated(self.slots[self.cursor].state)
    }
}

impl SessionHistory for InMemoryHistory {
    fn current_fragment(&self) -> Option<String> {
        self.slots[self.cursor].fragment.clone()
    }

    fn push(&mut self, entry: &HistoryEntry) -> Result<(), PermalinkError> {
        self.slots.truncate(self.cursor + 1);
        self.slots.push(Slot {
            fragment: Some(entry.hash.clone()),
            state: Some(entry.state),
        });
        self.cursor = self.slots.len() - 1;
        self.pushed.push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{HistoryEntry, HistoryState, InMemoryHistory, SessionHistory};
    use crate::sync::Notification;
    use pretty_assertions::assert_eq;

    fn entry(hash: &str, zoom: f64) -> HistoryEntry {
        HistoryEntry {
            hash: hash.to_string(),
            state: HistoryState {
                zoom,
                center: [1.0, 2.0],
            },
        }
    }

    #[test]
    fn state_json_matches_browser_shape() {
        let s = HistoryState {
            zoom: 9.5,
            center: [675000.0, 625000.0],
        };
        assert_eq!(
            s.to_json().unwrap(),
            r#"{"zoom":9.5,"center":[675000.0,625000.0]}"#
        );
        assert_eq!(HistoryState::from_json(r#"{"zoom":5,"center":[0,0]}"#), Some(HistoryState {
            zoom: 5.0,
            center: [0.0, 0.0],
        }));
    }

    #[test]
    fn foreign_state_is_not_ours() {
        assert_eq!(HistoryState::from_json("null"), None);
        assert_eq!(HistoryState::from_json(r#"{"page":3}"#), None);
    }

    #[test]
    fn page_load_entry_has_fragment_and_no_state() {
        let h = InMemoryHistory::with_fragment("#map=12/680000/630000/1");
        assert_eq!(
            h.current_fragment().as_deref(),
            Some("#map=12/680000/630000/1")
        );
        assert_eq!(h.len(), 1);
        assert!(!h.can_go_back());
    }

    #[test]
    fn back_and_forward_deliver_entry_state() {
        let mut h = InMemoryHistory::new();
        h.push(&entry("#a", 1.0)).unwrap();
        h.push(&entry("#b", 2.0)).unwrap();

        match h.back() {
            Some(Notification::HistoryNavigated(Some(s))) => assert_eq!(s.zoom, 1.0),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(h.back(), Some(Notification::HistoryNavigated(None)));
        assert_eq!(h.back(), None);
        assert_eq!(h.current_fragment(), None);

        h.forward();
        match h.forward() {
            Some(Notification::HistoryNavigated(Some(s))) => assert_eq!(s.zoom, 2.0),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(h.forward(), None);
    }

    #[test]
    fn push_after_back_truncates_forward_entries() {
        let mut h = InMemoryHistory::new();
        h.push(&entry("#a", 1.0)).unwrap();
        h.push(&entry("#b", 2.0)).unwrap();
        h.back();
        h.push(&entry("#c", 3.0)).unwrap();
        assert_eq!(h.fragments(), vec![None, Some("#a"), Some("#c")]);
        assert!(!h.can_go_forward());
        assert_eq!(h.pushed().len(), 3);
    }

    #[test]
    fn typed_fragment_creates_stateless_entry() {
        let mut h = InMemoryHistory::new();
        let n = h.navigate_to_fragment("#map=3/0/0/0");
        assert_eq!(n, Notification::HistoryNavigated(None));
        assert_eq!(h.current_fragment().as_deref(), Some("#map=3/0/0/0"));
        assert_eq!(h.cursor(), 1);
    }
}
