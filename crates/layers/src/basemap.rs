use tracing::debug;

use crate::layer::Layer;
use crate::raster::TileLayer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BasemapError {
    Empty,
    OutOfRange { index: usize, len: usize },
    /// Number of visible members found where exactly one was expected.
    InvariantViolation { visible: usize },
}

impl std::fmt::Display for BasemapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BasemapError::Empty => write!(f, "basemap set has no layers"),
            BasemapError::OutOfRange { index, len } => {
                write!(f, "basemap index {index} out of range (0..{len})")
            }
            BasemapError::InvariantViolation { visible } => {
                write!(f, "expected exactly one visible basemap, found {visible}")
            }
        }
    }
}

impl std::error::Error for BasemapError {}

/// Ordered set of mutually-exclusive background layers.
///
/// Exactly one member is visible at any time. The layers are only reachable
/// through shared references, so visibility can change only through
/// [`BasemapSet::set_visible`], which flips the whole set in a single call.
#[derive(Debug, Clone, PartialEq)]
pub struct BasemapSet {
    title: String,
    layers: Vec<TileLayer>,
}

impl BasemapSet {
    /// Builds a set with `initially_visible` shown and every other layer
    /// hidden, whatever visibility the layers arrived with.
    pub fn new(
        title: impl Into<String>,
        layers: Vec<TileLayer>,
        initially_visible: usize,
    ) -> Result<Self, BasemapError> {
        if layers.is_empty() {
            return Err(BasemapError::Empty);
        }
        let mut set = Self {
            title: title.into(),
            layers,
        };
        set.set_visible(initially_visible)?;
        Ok(set)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TileLayer> {
        self.layers.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileLayer> {
        self.layers.iter()
    }

    pub fn titles(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.title()).collect()
    }

    /// Shows the layer at `index` and hides all others.
    ///
    /// Returns `true` if any layer's visibility changed.
    pub fn set_visible(&mut self, index: usize) -> Result<bool, BasemapError> {
        let len = self.layers.len();
        if index >= len {
            return Err(BasemapError::OutOfRange { index, len });
        }
        let mut changed = false;
        for (i, layer) in self.layers.iter_mut().enumerate() {
            let want = i == index;
            if layer.visible != want {
                layer.visible = want;
                changed = true;
            }
        }
        if changed {
            debug!(index, title = self.layers[index].title(), "basemap switched");
        }
        Ok(changed)
    }

    /// Index of the unique visible layer.
    pub fn current_visible_index(&self) -> Result<usize, BasemapError> {
        let mut found = None;
        let mut visible = 0usize;
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.visible {
                visible += 1;
                found.get_or_insert(i);
            }
        }
        match (visible, found) {
            (1, Some(i)) => Ok(i),
            _ => Err(BasemapError::InvariantViolation { visible }),
        }
    }

    pub fn current(&self) -> Result<&TileLayer, BasemapError> {
        let i = self.current_visible_index()?;
        Ok(&self.layers[i])
    }

    pub fn check_invariant(&self) -> Result<(), BasemapError> {
        self.current_visible_index().map(|_| ())
    }
}
