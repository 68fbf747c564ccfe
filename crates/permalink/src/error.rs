use layers::BasemapError;

use crate::codec::FragmentError;

#[derive(Debug, Clone, PartialEq)]
pub enum PermalinkError {
    /// Malformed URL fragment.
    Parse(FragmentError),
    /// Well-formed state that does not fit the map (zoom bounds, basemap count).
    OutOfRange(String),
    Basemap(BasemapError),
    /// A browser object or page element the operation needs is absent.
    Environment(String),
}

impl std::fmt::Display for PermalinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermalinkError::Parse(e) => write!(f, "malformed view fragment: {e}"),
            PermalinkError::OutOfRange(msg) => write!(f, "view state out of range: {msg}"),
            PermalinkError::Basemap(e) => write!(f, "basemap error: {e}"),
            PermalinkError::Environment(msg) => write!(f, "environment unavailable: {msg}"),
        }
    }
}

impl std::error::Error for PermalinkError {}

impl From<FragmentError> for PermalinkError {
    fn from(e: FragmentError) -> Self {
        PermalinkError::Parse(e)
    }
}

impl From<BasemapError> for PermalinkError {
    fn from(e: BasemapError) -> Self {
        PermalinkError::Basemap(e)
    }
}
