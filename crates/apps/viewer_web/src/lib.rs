use console_error_panic_hook::set_once;
use std::cell::RefCell;
use tracing::debug;
use wasm_bindgen::prelude::*;

use formats::{ManifestError, ViewerManifest};
use permalink::{
    HistorySync, Notification, Startup, StartupSource, Transition, encode,
};

mod chrome;
mod history;
mod host;
mod logging;

pub use chrome::relabel_controls;
pub use history::{BrowserHistory, fragment_of, popstate_state};
pub use host::{JsMapHost, notify, pending};

struct Viewer {
    manifest: ViewerManifest,
    sync: HistorySync<JsMapHost, BrowserHistory>,
    // Kept alive for as long as the listener is registered.
    _popstate: Closure<dyn FnMut(web_sys::PopStateEvent)>,
}

thread_local! {
    static VIEWER: RefCell<Option<Viewer>> = const { RefCell::new(None) };
}

fn log(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

fn log_error(msg: &str) {
    web_sys::console::error_1(&JsValue::from_str(msg));
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Manifest supplied by the page, or the built-in one when it is absent or
/// unusable. The error, if any, is returned for reporting.
pub fn manifest_or_builtin(raw: Option<&str>) -> (ViewerManifest, Option<ManifestError>) {
    match raw.filter(|r| !r.trim().is_empty()) {
        None => (ViewerManifest::ngi_belgium(), None),
        Some(raw) => match ViewerManifest::from_json(raw) {
            Ok(m) => (m, None),
            Err(e) => (ViewerManifest::ngi_belgium(), Some(e)),
        },
    }
}

/// What the page needs to construct its map.
pub fn initial_view_json(startup: &Startup) -> Result<String, serde_json::Error> {
    let source = match &startup.source {
        StartupSource::Fragment => "fragment",
        StartupSource::NoFragment => "default",
        StartupSource::Rejected(_) => "rejected",
    };
    serde_json::to_string(&serde_json::json!({
        "zoom": startup.state.zoom,
        "center": startup.state.center,
        "basemap": startup.state.basemap,
        "fragment": encode(&startup.state),
        "source": source,
    }))
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    logging::init();
    Ok(())
}

/// Resolves the initial view from `location.hash` and starts keeping the URL
/// in step with the map.
///
/// Returns JSON `{zoom, center, basemap, fragment, source}`. The page builds
/// its map from it, registers it as `window.atlasMap`, and then forwards the
/// map's `moveend` and layer-switcher events.
///
/// Wiring: call `on_map_moveend` from the map's `moveend` and
/// `on_basemap_change` from the layer switcher. The viewer calls
/// `atlasMap.setBasemapVisible` only for a selection it has not seen yet, and
/// a switcher handler fired synchronously from inside that call is ignored:
/// the selection it reports is the one being applied.
#[wasm_bindgen]
pub fn init_viewer(manifest_json: Option<String>) -> Result<String, JsValue> {
    if VIEWER.with(|v| v.borrow().is_some()) {
        return Err(JsValue::from_str("viewer already initialized"));
    }

    let (manifest, manifest_err) = manifest_or_builtin(manifest_json.as_deref());
    if let Some(e) = manifest_err {
        log_error(&format!("{e}; using the built-in manifest"));
    }

    let basemaps = manifest.build_basemaps().map_err(to_js)?;
    let host = JsMapHost::new(basemaps, manifest.zoom_range(), manifest.max_resolution);
    let history = BrowserHistory::from_window().map_err(to_js)?;
    let (sync, startup) =
        HistorySync::start(host, history, manifest.default_view_state()).map_err(to_js)?;
    if let StartupSource::Rejected(e) = &startup.source {
        log(&format!("view fragment ignored: {e}"));
    }

    let popstate = install_popstate_listener()?;
    let out = initial_view_json(&startup).map_err(to_js)?;

    VIEWER.with(|v| {
        *v.borrow_mut() = Some(Viewer {
            manifest,
            sync,
            _popstate: popstate,
        });
    });
    Ok(out)
}

/// Call from the map's `moveend` handler.
#[wasm_bindgen]
pub fn on_map_moveend() {
    notify(Notification::ViewSettled);
    flush();
}

/// Call from the layer switcher after basemap `index` was made visible.
#[wasm_bindgen]
pub fn on_basemap_change(index: usize) -> Result<(), JsValue> {
    let selected = VIEWER.with(|v| match v.try_borrow_mut() {
        Ok(mut guard) => match guard.as_mut() {
            Some(viewer) => viewer.sync.host_mut().select_basemap(index).map_err(to_js),
            None => Err(JsValue::from_str("viewer not initialized")),
        },
        Err(_) => {
            debug!(index, "basemap change while a selection is applied, ignored");
            Ok(false)
        }
    });
    selected?;
    flush();
    Ok(())
}

/// Effective manifest as JSON.
#[wasm_bindgen]
pub fn viewer_manifest() -> Result<String, JsValue> {
    let json = VIEWER.with(|v| {
        let guard = v.try_borrow().ok()?;
        guard.as_ref().map(|viewer| viewer.manifest.to_json_pretty())
    });
    match json {
        Some(res) => res.map_err(to_js),
        None => ViewerManifest::ngi_belgium().to_json_pretty().map_err(to_js),
    }
}

fn install_popstate_listener() -> Result<Closure<dyn FnMut(web_sys::PopStateEvent)>, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let closure = Closure::wrap(Box::new(move |event: web_sys::PopStateEvent| {
        notify(Notification::HistoryNavigated(popstate_state(&event.state())));
        flush();
    }) as Box<dyn FnMut(web_sys::PopStateEvent)>);
    window.add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref())?;
    Ok(closure)
}

/// Delivers queued notifications. A callback arriving while a delivery is in
/// progress only queues; the running delivery picks it up before returning.
fn flush() {
    VIEWER.with(|v| {
        let Ok(mut guard) = v.try_borrow_mut() else {
            return;
        };
        let Some(viewer) = guard.as_mut() else {
            log("map event before init_viewer, ignored");
            host::take_all();
            return;
        };

        let mut settled = false;
        while pending() > 0 {
            for t in viewer.sync.pump() {
                settled |= matches!(t, Transition::Pushed(_) | Transition::Swallowed);
            }
        }
        if settled {
            relabel_controls(&viewer.manifest.control_labels);
        }
    });
}
