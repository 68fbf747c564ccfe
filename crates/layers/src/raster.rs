use crate::layer::{Layer, LayerId};

/// REST-encoded WMTS source. The URL template uses the
/// `{TileMatrix}`, `{TileRow}` and `{TileCol}` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct WmtsSource {
    pub url_template: String,
    pub layer: String,
    pub matrix_set: String,
    /// MIME type, e.g. `image/png`.
    pub format: String,
    pub style: String,
    /// HTML attribution shown by the map host.
    pub attribution: String,
}

/// Background tile layer.
///
/// Visibility is owned by the [`crate::BasemapSet`] holding the layer; a
/// standalone layer only records what it was built with.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    id: LayerId,
    title: String,
    pub(crate) visible: bool,
    pub source: WmtsSource,
}

impl TileLayer {
    pub fn new(id: u64, title: impl Into<String>, source: WmtsSource) -> Self {
        Self {
            id: LayerId(id),
            title: title.into(),
            visible: false,
            source,
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }
}

impl Layer for TileLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }
}
