use std::cell::{Cell, RefCell};

use foundation::{Aabb2, MapView, ZoomRange};
use layers::BasemapSet;
use permalink::{MapHost, Notification, PermalinkError, ViewWrite};
use runtime::{EventBus, Stamped};
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;

// The page registers its map object as `window.atlasMap` once it has been
// constructed from the view returned by `init_viewer`.
#[wasm_bindgen(inline_js = "
function __atlas_map() {
    const map = window.atlasMap;
    if (!map) throw new Error('window.atlasMap is not registered');
    return map;
}

export function atlas_map_get_view() {
    const map = __atlas_map();
    const c = map.getCenter();
    return Float64Array.of(c[0], c[1], map.getZoom());
}

export function atlas_map_get_extent() {
    return Float64Array.from(__atlas_map().getExtent());
}

export function atlas_map_set_view(x, y, zoom) {
    __atlas_map().setView([x, y], zoom);
}

export function atlas_map_set_basemap_visible(index) {
    __atlas_map().setBasemapVisible(index);
}
")]
extern "C" {
    #[wasm_bindgen(catch)]
    fn atlas_map_get_view() -> Result<Vec<f64>, JsValue>;
    #[wasm_bindgen(catch)]
    fn atlas_map_get_extent() -> Result<Vec<f64>, JsValue>;
    #[wasm_bindgen(catch)]
    fn atlas_map_set_view(x: f64, y: f64, zoom: f64) -> Result<(), JsValue>;
    #[wasm_bindgen(catch)]
    fn atlas_map_set_basemap_visible(index: u32) -> Result<(), JsValue>;
}

thread_local! {
    // Filled by the exported callbacks, drained by `HistorySync::pump`.
    static QUEUE: RefCell<EventBus<Notification>> = RefCell::new(EventBus::new());
}

/// Queues a notification for the next pump. Never delivers.
pub fn notify(notification: Notification) {
    QUEUE.with(|q| {
        q.borrow_mut().emit(notification);
    });
}

pub fn pending() -> usize {
    QUEUE.with(|q| q.borrow().len())
}

pub(crate) fn take_all() -> Vec<Stamped<Notification>> {
    QUEUE.with(|q| q.borrow_mut().drain())
}

pub(crate) fn js_error(e: JsValue) -> PermalinkError {
    PermalinkError::Environment(e.as_string().unwrap_or_else(|| format!("{e:?}")))
}

const FALLBACK_VIEWPORT_PX: [u32; 2] = [1024, 768];

/// The page's JavaScript map, driven through `window.atlasMap`.
///
/// Until the page registers its map, reads return the seeded view.
#[derive(Debug)]
pub struct JsMapHost {
    zoom_range: ZoomRange,
    basemaps: BasemapSet,
    max_resolution: f64,
    last_view: Cell<MapView>,
}

impl JsMapHost {
    pub fn new(basemaps: BasemapSet, zoom_range: ZoomRange, max_resolution: f64) -> Self {
        Self {
            zoom_range,
            basemaps,
            max_resolution,
            last_view: Cell::new(MapView::new([0.0, 0.0], zoom_range.min)),
        }
    }

    /// Mirrors a layer-switcher click. Queues `BasemapChanged` if the visible
    /// basemap actually changed.
    ///
    /// The page is only called back when the selection changed, so a
    /// `setBasemapVisible` that re-enters `on_basemap_change` with the same
    /// index finds nothing to do.
    pub fn select_basemap(&mut self, index: usize) -> Result<bool, PermalinkError> {
        let changed = self.basemaps.set_visible(index)?;
        if !changed {
            return Ok(false);
        }
        // Keeps the page's layers at exactly one visible basemap.
        if let Err(e) = atlas_map_set_basemap_visible(index as u32) {
            warn!(error = %js_error(e), index, "basemap visibility not forwarded");
        }
        notify(Notification::BasemapChanged);
        Ok(true)
    }

    fn read_view(&self) -> Result<MapView, PermalinkError> {
        let raw = atlas_map_get_view().map_err(js_error)?;
        match raw.as_slice() {
            [x, y, zoom] if x.is_finite() && y.is_finite() && zoom.is_finite() => {
                Ok(MapView::new([*x, *y], *zoom))
            }
            other => Err(PermalinkError::Environment(format!(
                "map reported an unusable view {other:?}"
            ))),
        }
    }
}

impl MapHost for JsMapHost {
    fn view(&self) -> MapView {
        match self.read_view() {
            Ok(view) => {
                self.last_view.set(view);
                view
            }
            Err(e) => {
                debug!(error = %e, "using last known view");
                self.last_view.get()
            }
        }
    }

    fn zoom_range(&self) -> ZoomRange {
        self.zoom_range
    }

    fn extent(&self) -> Aabb2 {
        match atlas_map_get_extent() {
            Ok(e) if e.len() == 4 => Aabb2::from_array([e[0], e[1], e[2], e[3]]),
            _ => self
                .view()
                .extent(FALLBACK_VIEWPORT_PX, self.max_resolution),
        }
    }

    fn basemaps(&self) -> &BasemapSet {
        &self.basemaps
    }

    fn seed(&mut self, view: MapView, basemap: usize) -> Result<(), PermalinkError> {
        self.basemaps.set_visible(basemap)?;
        self.last_view
            .set(MapView::new(view.center, self.zoom_range.clamp(view.zoom)));
        Ok(())
    }

    fn write_view(&mut self, view: MapView) -> Result<ViewWrite, PermalinkError> {
        let view = MapView::new(view.center, self.zoom_range.clamp(view.zoom));
        if self.view() == view {
            return Ok(ViewWrite::Unchanged);
        }
        // The map answers with `moveend` on a later task, which reaches us
        // through `on_map_moveend`.
        atlas_map_set_view(view.center[0], view.center[1], view.zoom).map_err(js_error)?;
        self.last_view.set(view);
        Ok(ViewWrite::Pending)
    }

    fn take_notifications(&mut self) -> Vec<Stamped<Notification>> {
        take_all()
    }
}

#[cfg(test)]
mod tests {
    use super::{JsMapHost, pending};
    use foundation::ZoomRange;
    use layers::{BasemapError, BasemapSet, TileLayer, WmtsSource};
    use permalink::PermalinkError;

    fn host() -> JsMapHost {
        let layers = (0..3)
            .map(|i| {
                TileLayer::new(
                    i,
                    format!("layer {i}"),
                    WmtsSource {
                        url_template: String::new(),
                        layer: "topo".to_string(),
                        matrix_set: "EPSG:3857".to_string(),
                        format: "image/png".to_string(),
                        style: "default".to_string(),
                        attribution: String::new(),
                    },
                )
            })
            .collect();
        let basemaps = BasemapSet::new("Basiskaarten", layers, 2).unwrap();
        JsMapHost::new(basemaps, ZoomRange::new(1.0, 28.0), 1024.0)
    }

    // Neither case may reach the page: the bridge only exists in a browser.
    #[test]
    fn reselecting_the_visible_basemap_stays_off_the_page() {
        let mut h = host();
        assert_eq!(h.select_basemap(2), Ok(false));
        assert_eq!(pending(), 0);
    }

    #[test]
    fn invalid_basemap_is_rejected_before_the_page() {
        let mut h = host();
        assert_eq!(
            h.select_basemap(5),
            Err(PermalinkError::Basemap(BasemapError::OutOfRange { index: 5, len: 3 }))
        );
        assert_eq!(pending(), 0);
    }
}
