use permalink::{HistoryEntry, HistoryState, PermalinkError, SessionHistory};
use wasm_bindgen::JsValue;

use crate::host::js_error;

/// Title passed to `pushState`; browsers ignore it.
const ENTRY_TITLE: &str = "map";

/// `window.history` plus `window.location.hash`.
#[derive(Debug)]
pub struct BrowserHistory {
    window: web_sys::Window,
}

impl BrowserHistory {
    pub fn from_window() -> Result<Self, PermalinkError> {
        web_sys::window()
            .map(|window| Self { window })
            .ok_or_else(|| PermalinkError::Environment("no window".to_string()))
    }
}

impl SessionHistory for BrowserHistory {
    fn current_fragment(&self) -> Option<String> {
        let hash = self.window.location().hash().ok()?;
        fragment_of(&hash)
    }

    fn push(&mut self, entry: &HistoryEntry) -> Result<(), PermalinkError> {
        let state = js_sys::JSON::parse(&entry.state.to_json()?).map_err(js_error)?;
        let history = self.window.history().map_err(js_error)?;
        history
            .push_state_with_url(&state, ENTRY_TITLE, Some(&entry.hash))
            .map_err(js_error)
    }
}

/// `location.hash` reports `""` for no fragment and may report a bare `#`.
pub fn fragment_of(hash: &str) -> Option<String> {
    match hash {
        "" | "#" => None,
        h => Some(h.to_string()),
    }
}

/// State object of a `popstate` event, if it is one we pushed.
pub fn popstate_state(state: &JsValue) -> Option<HistoryState> {
    if state.is_null() || state.is_undefined() {
        return None;
    }
    let raw = js_sys::JSON::stringify(state).ok()?.as_string()?;
    HistoryState::from_json(&raw)
}
