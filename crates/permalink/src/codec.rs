//! `#map=<zoom>/<x>/<y>/<basemap>` view fragments.
//!
//! Every field is written rounded to an integer, so a fractional zoom does not
//! survive a trip through the URL: `9.6` and `10` encode to the same fragment.
//! The exact zoom travels in the history state object instead.

use foundation::{MapView, ZoomRange};

use crate::error::PermalinkError;

pub const FRAGMENT_MARKER: &str = "#map=";

/// Zoom, center and active basemap of the map, as carried in a URL.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub zoom: f64,
    pub center: [f64; 2],
    pub basemap: usize,
}

impl ViewState {
    pub fn new(zoom: f64, center: [f64; 2], basemap: usize) -> Self {
        Self {
            zoom,
            center,
            basemap,
        }
    }

    pub fn view(&self) -> MapView {
        MapView::new(self.center, self.zoom)
    }

    /// Checks the decoded state against the map it will be applied to.
    pub fn validate(&self, zoom_range: ZoomRange, basemap_count: usize) -> Result<(), PermalinkError> {
        if self.basemap >= basemap_count {
            return Err(PermalinkError::OutOfRange(format!(
                "basemap {} not in 0..{basemap_count}",
                self.basemap
            )));
        }
        if let Some(c) = self.center.iter().find(|c| c.abs() >= MAX_COORDINATE) {
            return Err(PermalinkError::OutOfRange(format!(
                "center coordinate {c} cannot be written to a fragment"
            )));
        }
        if !zoom_range.contains(self.zoom) {
            return Err(PermalinkError::OutOfRange(format!(
                "zoom {} not in [{}, {}]",
                self.zoom, zoom_range.min, zoom_range.max
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FragmentError {
    Empty,
    FieldCount(usize),
    NotANumber { field: &'static str, raw: String },
    /// Basemap is a number but not a non-negative integer.
    InvalidBasemap(String),
}

impl std::fmt::Display for FragmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FragmentError::Empty => write!(f, "empty fragment"),
            FragmentError::FieldCount(n) => write!(f, "expected 4 fields, found {n}"),
            FragmentError::NotANumber { field, raw } => {
                write!(f, "{field} is not a number: {raw:?}")
            }
            FragmentError::InvalidBasemap(raw) => {
                write!(f, "basemap must be a non-negative integer: {raw:?}")
            }
        }
    }
}

impl std::error::Error for FragmentError {}

/// Largest center magnitude whose rounded value fits the fragment's integer
/// fields. [`ViewState::validate`] rejects anything beyond it.
const MAX_COORDINATE: f64 = 9.0e18;

/// Rounds half up, matching the browser's `Math.round` (`-2.5` -> `-2`).
/// Values outside the `i64` range saturate.
fn round_half_up(v: f64) -> i64 {
    let floor = v.floor();
    let r = if v - floor >= 0.5 { floor + 1.0 } else { floor };
    r as i64
}

pub fn encode(state: &ViewState) -> String {
    format!(
        "{FRAGMENT_MARKER}{}/{}/{}/{}",
        round_half_up(state.zoom),
        round_half_up(state.center[0]),
        round_half_up(state.center[1]),
        state.basemap
    )
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64, FragmentError> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(FragmentError::NotANumber {
            field,
            raw: raw.to_string(),
        }),
    }
}

/// Parses a fragment with or without the leading `#` and `map=` marker.
///
/// Only the shape is checked; bounds are left to [`ViewState::validate`].
pub fn decode(fragment: &str) -> Result<ViewState, FragmentError> {
    let body = fragment.strip_prefix('#').unwrap_or(fragment);
    let body = body.strip_prefix("map=").unwrap_or(body);
    if body.trim().is_empty() {
        return Err(FragmentError::Empty);
    }

    let parts: Vec<&str> = body.split('/').collect();
    let [zoom, x, y, basemap] = parts.as_slice() else {
        return Err(FragmentError::FieldCount(parts.len()));
    };

    let zoom = parse_number("zoom", zoom)?;
    let x = parse_number("x", x)?;
    let y = parse_number("y", y)?;
    let raw_basemap = *basemap;
    let basemap = parse_number("basemap", raw_basemap)?;
    if basemap < 0.0 || basemap.fract() != 0.0 {
        return Err(FragmentError::InvalidBasemap(raw_basemap.to_string()));
    }

    Ok(ViewState::new(zoom, [x, y], basemap as usize))
}
