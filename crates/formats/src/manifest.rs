use foundation::{Aabb2, ZoomRange};
use layers::{BasemapError, BasemapSet, TileLayer, WmtsSource};
use permalink::ViewState;
use serde::{Deserialize, Serialize};

pub const MANIFEST_VERSION: &str = "1.0";

/// Viewer configuration: zoom bounds, start view, basemap catalogue and UI
/// labels. Serialized as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewerManifest {
    pub version: String,
    pub title: String,
    /// Display projection code, e.g. `EPSG:3812`.
    pub projection: String,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Map units per pixel at zoom 0.
    #[serde(default = "default_max_resolution")]
    pub max_resolution: f64,
    pub default_view: DefaultView,
    /// `[minx, miny, maxx, maxy]` used by the zoom-to-extent control.
    pub home_extent: [f64; 4],
    pub basemap_group: String,
    pub basemaps: Vec<BasemapEntry>,
    pub tile_grid: TileGridEntry,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub control_labels: Vec<ControlLabel>,
}

/// View applied when the URL carries no usable state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DefaultView {
    pub zoom: f64,
    pub center: [f64; 2],
    pub basemap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BasemapEntry {
    pub title: String,
    pub url: String,
    pub layer: String,
    pub matrix_set: String,
    pub format: String,
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default)]
    pub attribution: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TileGridEntry {
    pub resolutions: Vec<f64>,
    pub matrix_ids: Vec<u32>,
}

/// Tooltip override for a toolbar control located by CSS selector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControlLabel {
    pub selector: String,
    pub title: String,
    /// Apply to the element's first child (the button inside a control div).
    #[serde(default)]
    pub on_first_child: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_html: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ManifestError {
    Json(String),
    Invalid(String),
    Basemaps(BasemapError),
}

impl std::fmt::Display for ManifestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManifestError::Json(msg) => write!(f, "manifest json: {msg}"),
            ManifestError::Invalid(msg) => write!(f, "invalid manifest: {msg}"),
            ManifestError::Basemaps(e) => write!(f, "manifest basemaps: {e}"),
        }
    }
}

impl std::error::Error for ManifestError {}

impl From<BasemapError> for ManifestError {
    fn from(e: BasemapError) -> Self {
        ManifestError::Basemaps(e)
    }
}

fn default_max_resolution() -> f64 {
    156_543.033_928_040_97
}

fn default_style() -> String {
    "default".to_string()
}

impl ViewerManifest {
    /// Parses and validates a manifest.
    pub fn from_json(raw: &str) -> Result<Self, ManifestError> {
        let manifest: ViewerManifest =
            serde_json::from_str(raw).map_err(|e| ManifestError::Json(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn to_json_pretty(&self) -> Result<String, ManifestError> {
        serde_json::to_string_pretty(self).map_err(|e| ManifestError::Json(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ManifestError> {
        if !(self.min_zoom.is_finite() && self.max_zoom.is_finite()) {
            return Err(ManifestError::Invalid("zoom bounds must be finite".into()));
        }
        if self.min_zoom > self.max_zoom {
            return Err(ManifestError::Invalid(format!(
                "min_zoom {} exceeds max_zoom {}",
                self.min_zoom, self.max_zoom
            )));
        }
        if !(self.max_resolution.is_finite() && self.max_resolution > 0.0) {
            return Err(ManifestError::Invalid(
                "max_resolution must be positive".into(),
            ));
        }
        if self.basemaps.is_empty() {
            return Err(ManifestError::Invalid("no basemaps configured".into()));
        }
        let dv = &self.default_view;
        if dv.basemap >= self.basemaps.len() {
            return Err(ManifestError::Invalid(format!(
                "default basemap {} out of range (0..{})",
                dv.basemap,
                self.basemaps.len()
            )));
        }
        if !self.zoom_range().contains(dv.zoom) {
            return Err(ManifestError::Invalid(format!(
                "default zoom {} outside [{}, {}]",
                dv.zoom, self.min_zoom, self.max_zoom
            )));
        }
        if self.tile_grid.resolutions.len() != self.tile_grid.matrix_ids.len() {
            return Err(ManifestError::Invalid(format!(
                "tile grid has {} resolutions but {} matrix ids",
                self.tile_grid.resolutions.len(),
                self.tile_grid.matrix_ids.len()
            )));
        }
        Ok(())
    }

    /// View applied when the URL carries no usable state.
    pub fn default_view_state(&self) -> ViewState {
        let dv = self.default_view;
        ViewState::new(dv.zoom, dv.center, dv.basemap)
    }

    pub fn zoom_range(&self) -> ZoomRange {
        ZoomRange::new(self.min_zoom, self.max_zoom)
    }

    pub fn home_extent(&self) -> Aabb2 {
        Aabb2::from_array(self.home_extent)
    }

    /// Builds the basemap set with the default basemap visible.
    pub fn build_basemaps(&self) -> Result<BasemapSet, ManifestError> {
        let layers = self
            .basemaps
            .iter()
            .enumerate()
            .map(|(i, b)| {
                TileLayer::new(
                    i as u64,
                    b.title.clone(),
                    WmtsSource {
                        url_template: b.url.clone(),
                        layer: b.layer.clone(),
                        matrix_set: b.matrix_set.clone(),
                        format: b.format.clone(),
                        style: b.style.clone(),
                        attribution: b.attribution.clone(),
                    },
                )
            })
            .collect();
        Ok(BasemapSet::new(
            self.basemap_group.clone(),
            layers,
            self.default_view.basemap,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::{ManifestError, ViewerManifest};
    use permalink::ViewState;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_manifest_survives_json() {
        let m = ViewerManifest::ngi_belgium();
        let raw = m.to_json_pretty().unwrap();
        let back = ViewerManifest::from_json(&raw).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn optional_fields_default() {
        let raw = r#"{
            "version": "1.0",
            "title": "t",
            "projection": "EPSG:3857",
            "min_zoom": 0,
            "max_zoom": 20,
            "default_view": {"zoom": 3, "center": [0, 0], "basemap": 0},
            "home_extent": [0, 0, 10, 10],
            "basemap_group": "Base",
            "basemaps": [{"title": "osm", "url": "u", "layer": "l", "matrix_set": "m", "format": "image/png"}],
            "tile_grid": {"resolutions": [], "matrix_ids": []}
        }"#;
        let m = ViewerManifest::from_json(raw).unwrap();
        assert_eq!(m.basemaps[0].style, "default");
        assert_eq!(m.basemaps[0].attribution, "");
        assert!(m.control_labels.is_empty());
        assert!(m.max_resolution > 150_000.0);
    }

    #[test]
    fn rejects_out_of_range_default_basemap() {
        let mut m = ViewerManifest::ngi_belgium();
        m.default_view.basemap = 3;
        assert!(matches!(m.validate(), Err(ManifestError::Invalid(_))));
    }

    #[test]
    fn rejects_inverted_zoom_bounds() {
        let mut m = ViewerManifest::ngi_belgium();
        m.min_zoom = 30.0;
        assert!(matches!(m.validate(), Err(ManifestError::Invalid(_))));
    }

    #[test]
    fn rejects_mismatched_tile_grid() {
        let mut m = ViewerManifest::ngi_belgium();
        m.tile_grid.matrix_ids.pop();
        assert!(m.validate().is_err());
    }

    #[test]
    fn reports_malformed_json() {
        assert!(matches!(
            ViewerManifest::from_json("{"),
            Err(ManifestError::Json(_))
        ));
    }

    #[test]
    fn default_view_state_follows_manifest() {
        let mut m = ViewerManifest::ngi_belgium();
        assert_eq!(
            m.default_view_state(),
            ViewState::new(9.0, [675000.0, 625000.0], 2)
        );
        m.default_view.zoom = 11.5;
        m.default_view.basemap = 0;
        assert_eq!(
            m.default_view_state(),
            ViewState::new(11.5, [675000.0, 625000.0], 0)
        );
    }

    #[test]
    fn builds_basemaps_with_default_visible() {
        let m = ViewerManifest::ngi_belgium();
        let set = m.build_basemaps().unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.current_visible_index(), Ok(2));
        assert_eq!(set.title(), "Basiskaarten");
    }
}
