use foundation::{Aabb2, MapView, ZoomRange};
use layers::BasemapSet;
use runtime::{EventBus, Stamped};
use tracing::debug;

use crate::error::PermalinkError;
use crate::sync::Notification;

/// Outcome of a programmatic view write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewWrite {
    /// The view moved; one settle notification will follow, after the write
    /// call has returned.
    Pending,
    /// The view already showed the requested state; nothing will be emitted.
    Unchanged,
}

/// The rendering map, seen from the synchronization protocol.
///
/// Implementations must never deliver a notification from inside
/// [`MapHost::write_view`] or [`MapHost::seed`].
pub trait MapHost {
    fn view(&self) -> MapView;
    fn zoom_range(&self) -> ZoomRange;
    /// Extent currently shown.
    fn extent(&self) -> Aabb2;
    fn basemaps(&self) -> &BasemapSet;

    /// Sets the initial view and basemap before the first render.
    /// Emits nothing.
    fn seed(&mut self, view: MapView, basemap: usize) -> Result<(), PermalinkError>;

    fn write_view(&mut self, view: MapView) -> Result<ViewWrite, PermalinkError>;

    /// Notifications that settled since the last call, oldest first.
    ///
    /// Hosts that deliver notifications through their own callbacks keep
    /// the default.
    fn take_notifications(&mut self) -> Vec<Stamped<Notification>> {
        Vec::new()
    }
}

const DEFAULT_VIEWPORT_PX: [u32; 2] = [1024, 768];

/// Deterministic in-process map.
///
/// User gestures (`pan_to`, `zoom_to`, `select_basemap`, `zoom_to_home`)
/// queue a settle notification when they change something. Back-to-back
/// view changes coalesce into one pending `ViewSettled`, the way a renderer
/// reports one move end per settled frame.
#[derive(Debug)]
pub struct SimulatedMap {
    view: MapView,
    zoom_range: ZoomRange,
    basemaps: BasemapSet,
    max_resolution: f64,
    viewport_px: [u32; 2],
    home: Aabb2,
    bus: EventBus<Notification>,
}

impl SimulatedMap {
    pub fn new(
        basemaps: BasemapSet,
        zoom_range: ZoomRange,
        max_resolution: f64,
        home: Aabb2,
    ) -> Self {
        Self {
            view: MapView::new(home.center(), zoom_range.min),
            zoom_range,
            basemaps,
            max_resolution,
            viewport_px: DEFAULT_VIEWPORT_PX,
            home,
            bus: EventBus::new(),
        }
    }

    pub fn with_viewport(mut self, viewport_px: [u32; 2]) -> Self {
        self.viewport_px = viewport_px;
        self
    }

    pub fn pending(&self) -> usize {
        self.bus.len()
    }

    pub fn pan_to(&mut self, center: [f64; 2]) {
        self.move_to(MapView::new(center, self.view.zoom));
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let c = self.view.center;
        self.pan_to([c[0] + dx, c[1] + dy]);
    }

    pub fn zoom_to(&mut self, zoom: f64) {
        self.move_to(MapView::new(self.view.center, zoom));
    }

    /// Zoom-to-extent control: fit the home extent.
    pub fn zoom_to_home(&mut self) {
        let view = MapView::fit(
            self.home,
            self.viewport_px,
            self.max_resolution,
            self.zoom_range,
        );
        self.move_to(view);
    }

    /// A click in the layer switcher.
    pub fn select_basemap(&mut self, index: usize) -> Result<bool, PermalinkError> {
        let changed = self.basemaps.set_visible(index)?;
        if changed {
            self.bus.emit(Notification::BasemapChanged);
        }
        Ok(changed)
    }

    fn move_to(&mut self, view: MapView) -> bool {
        let view = MapView::new(view.center, self.zoom_range.clamp(view.zoom));
        if view == self.view {
            return false;
        }
        self.view = view;
        self.settle();
        true
    }

    fn settle(&mut self) {
        let already_pending = self
            .bus
            .iter()
            .any(|s| s.event == Notification::ViewSettled);
        if !already_pending {
            self.bus.emit(Notification::ViewSettled);
        }
    }
}

impl MapHost for SimulatedMap {
    fn view(&self) -> MapView {
        self.view
    }

    fn zoom_range(&self) -> ZoomRange {
        self.zoom_range
    }

    fn extent(&self) -> Aabb2 {
        self.view.extent(self.viewport_px, self.max_resolution)
    }

    fn basemaps(&self) -> &BasemapSet {
        &self.basemaps
    }

    fn seed(&mut self, view: MapView, basemap: usize) -> Result<(), PermalinkError> {
        self.basemaps.set_visible(basemap)?;
        self.view = MapView::new(view.center, self.zoom_range.clamp(view.zoom));
        debug!(view = ?self.view, basemap, "seeded initial view");
        Ok(())
    }

    fn write_view(&mut self, view: MapView) -> Result<ViewWrite, PermalinkError> {
        if self.move_to(view) {
            Ok(ViewWrite::Pending)
        } else {
            Ok(ViewWrite::Unchanged)
        }
    }

    fn take_notifications(&mut self) -> Vec<Stamped<Notification>> {
        self.bus.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::{MapHost, SimulatedMap, ViewWrite};
    use crate::sync::Notification;
    use foundation::{Aabb2, MapView, ZoomRange};
    use layers::{BasemapSet, TileLayer, WmtsSource};

    fn map() -> SimulatedMap {
        let layers = (0..3)
            .map(|i| {
                TileLayer::new(
                    i,
                    format!("layer {i}"),
                    WmtsSource {
                        url_template: String::new(),
                        layer: String::new(),
                        matrix_set: String::new(),
                        format: "image/png".to_string(),
                        style: "default".to_string(),
                        attribution: String::new(),
                    },
                )
            })
            .collect();
        let basemaps = BasemapSet::new("Base", layers, 2).unwrap();
        SimulatedMap::new(
            basemaps,
            ZoomRange::new(1.0, 28.0),
            1024.0,
            Aabb2::from_array([0.0, 0.0, 1000.0, 500.0]),
        )
        .with_viewport([100, 100])
    }

    fn events(m: &mut SimulatedMap) -> Vec<Notification> {
        m.take_notifications().into_iter().map(|s| s.event).collect()
    }

    #[test]
    fn seed_emits_nothing() {
        let mut m = map();
        m.seed(MapView::new([10.0, 20.0], 12.0), 1).unwrap();
        assert_eq!(m.view(), MapView::new([10.0, 20.0], 12.0));
        assert_eq!(m.basemaps().current_visible_index(), Ok(1));
        assert!(events(&mut m).is_empty());
    }

    #[test]
    fn seed_rejects_bad_basemap() {
        let mut m = map();
        assert!(m.seed(MapView::new([0.0, 0.0], 5.0), 9).is_err());
    }

    #[test]
    fn gestures_queue_settle_notifications() {
        let mut m = map();
        m.pan_to([5.0, 5.0]);
        assert_eq!(events(&mut m), vec![Notification::ViewSettled]);
        m.select_basemap(0).unwrap();
        assert_eq!(events(&mut m), vec![Notification::BasemapChanged]);
    }

    #[test]
    fn no_op_gestures_are_silent() {
        let mut m = map();
        let before = m.view();
        m.pan_to(before.center);
        assert!(!m.select_basemap(2).unwrap());
        m.zoom_to(0.0);
        m.zoom_to(0.5);
        assert_eq!(m.view(), before);
        assert!(events(&mut m).is_empty());
    }

    #[test]
    fn view_changes_coalesce_until_delivered() {
        let mut m = map();
        m.pan_by(1.0, 0.0);
        m.zoom_to(7.0);
        assert_eq!(m.pending(), 1);
        assert_eq!(events(&mut m), vec![Notification::ViewSettled]);
        m.zoom_to(8.0);
        assert_eq!(m.pending(), 1);
    }

    #[test]
    fn write_view_reports_unchanged() {
        let mut m = map();
        let v = MapView::new([3.0, 4.0], 6.0);
        assert_eq!(m.write_view(v), Ok(ViewWrite::Pending));
        assert_eq!(m.write_view(v), Ok(ViewWrite::Unchanged));
        assert_eq!(events(&mut m), vec![Notification::ViewSettled]);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut m = map();
        m.zoom_to(99.0);
        assert_eq!(m.view().zoom, 28.0);
    }

    #[test]
    fn home_fits_extent() {
        let mut m = map();
        m.zoom_to_home();
        let v = m.view();
        assert_eq!(v.center, [500.0, 250.0]);
        // 1000 units across 100 px => 10 units/px => log2(1024 / 10).
        assert!((v.zoom - (102.4f64).log2()).abs() < 1e-9);
        let e = m.extent();
        assert!((e.width() - 1000.0).abs() < 1e-6);
    }
}
