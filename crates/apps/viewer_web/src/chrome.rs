use formats::ControlLabel;
use tracing::debug;
use web_sys::{Document, Element};

/// Applies tooltip overrides to the map's toolbar controls.
///
/// Controls that are not on the page yet are skipped. Returns how many labels
/// were applied.
pub fn relabel_controls(labels: &[ControlLabel]) -> usize {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return 0;
    };

    let mut applied = 0;
    for label in labels {
        let Some(el) = locate(&document, label) else {
            debug!(selector = %label.selector, "control not found, label skipped");
            continue;
        };
        if el.set_attribute("title", &label.title).is_err() {
            continue;
        }
        if let Some(html) = &label.inner_html {
            el.set_inner_html(html);
        }
        applied += 1;
    }
    applied
}

fn locate(document: &Document, label: &ControlLabel) -> Option<Element> {
    let el = document.query_selector(&label.selector).ok().flatten()?;
    if label.on_first_child {
        el.first_element_child()
    } else {
        Some(el)
    }
}
