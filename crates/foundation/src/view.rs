use crate::bounds::Aabb2;

/// Inclusive zoom bounds of a map view.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ZoomRange {
    pub min: f64,
    pub max: f64,
}

impl ZoomRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, zoom: f64) -> bool {
        zoom >= self.min && zoom <= self.max
    }

    pub fn clamp(&self, zoom: f64) -> f64 {
        zoom.max(self.min).min(self.max)
    }
}

/// Center and zoom of a 2D map view, as reported by the map host.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MapView {
    pub center: [f64; 2],
    /// Fractional zoom levels are allowed.
    pub zoom: f64,
}

impl MapView {
    pub fn new(center: [f64; 2], zoom: f64) -> Self {
        Self { center, zoom }
    }

    /// Map units per pixel at this zoom, given the resolution at zoom 0.
    pub fn resolution(&self, max_resolution: f64) -> f64 {
        max_resolution / 2f64.powf(self.zoom)
    }

    /// Extent covered by a viewport of `viewport_px` pixels.
    pub fn extent(&self, viewport_px: [u32; 2], max_resolution: f64) -> Aabb2 {
        let res = self.resolution(max_resolution);
        let half_w = 0.5 * viewport_px[0] as f64 * res;
        let half_h = 0.5 * viewport_px[1] as f64 * res;
        Aabb2::new(
            [self.center[0] - half_w, self.center[1] - half_h],
            [self.center[0] + half_w, self.center[1] + half_h],
        )
    }

    /// View that fits `extent` inside the viewport, zoom clamped to `range`.
    ///
    /// The resulting zoom is usually fractional.
    pub fn fit(
        extent: Aabb2,
        viewport_px: [u32; 2],
        max_resolution: f64,
        range: ZoomRange,
    ) -> Self {
        let vw = viewport_px[0].max(1) as f64;
        let vh = viewport_px[1].max(1) as f64;
        let res = (extent.width() / vw).max(extent.height() / vh);
        let zoom = if res <= 0.0 {
            range.max
        } else {
            range.clamp((max_resolution / res).log2())
        };
        Self {
            center: extent.center(),
            zoom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MapView, ZoomRange};
    use crate::bounds::Aabb2;

    #[test]
    fn zoom_range_clamps() {
        let r = ZoomRange::new(1.0, 28.0);
        assert_eq!(r.clamp(0.0), 1.0);
        assert_eq!(r.clamp(30.0), 28.0);
        assert_eq!(r.clamp(9.5), 9.5);
        assert!(r.contains(28.0));
        assert!(!r.contains(0.5));
    }

    #[test]
    fn resolution_halves_per_zoom_level() {
        let v0 = MapView::new([0.0, 0.0], 0.0);
        let v1 = MapView::new([0.0, 0.0], 1.0);
        assert_eq!(v0.resolution(1024.0), 1024.0);
        assert_eq!(v1.resolution(1024.0), 512.0);
    }

    #[test]
    fn extent_is_centered_on_view() {
        let v = MapView::new([100.0, 200.0], 0.0);
        let e = v.extent([10, 4], 1.0);
        assert_eq!(e.to_array(), [95.0, 198.0, 105.0, 202.0]);
    }

    #[test]
    fn fit_recovers_extent() {
        let extent = Aabb2::from_array([0.0, 0.0, 1024.0, 512.0]);
        let v = MapView::fit(extent, [256, 256], 1024.0, ZoomRange::new(0.0, 20.0));
        assert_eq!(v.center, [512.0, 256.0]);
        // 1024 units over 256 px => 4 units/px => zoom log2(1024 / 4) = 8.
        assert!((v.zoom - 8.0).abs() < 1e-9);
    }

    #[test]
    fn fit_clamps_zoom() {
        let extent = Aabb2::from_array([0.0, 0.0, 1.0, 1.0]);
        let v = MapView::fit(extent, [256, 256], 1.0e6, ZoomRange::new(1.0, 5.0));
        assert_eq!(v.zoom, 5.0);
    }
}
