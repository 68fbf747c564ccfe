//! Built-in configuration for the Belgian NGI basemap viewer.
//!
//! Three WMTS basemaps (orthophoto, grey topo, colour topo) shown in the
//! ETRS89 / Belgian Lambert 2008 projection.

use crate::manifest::{
    BasemapEntry, ControlLabel, DefaultView, MANIFEST_VERSION, TileGridEntry, ViewerManifest,
};

const NGI_CARTOWEB_PAGE: &str = "https://www.ngi.be/website/aanbod/digitale-geodata/cartoweb-be/";
const NGI_ORTHO_PAGE: &str =
    "https://www.geo.be/catalog/details/29238f19-ac79-4a4a-a797-5490226381ec?l=nl";

const RESOLUTIONS: [f64; 12] = [
    2445.98490512564,
    1222.99245256282,
    611.49622628141,
    305.748113140705,
    152.8740565703525,
    76.43702828517625,
    38.21851414258813,
    19.109257071294063,
    9.554628535647032,
    4.777314267823516,
    2.388657133911758,
    1.194328566955879,
];

fn attribution(page: &str, title: &str) -> String {
    format!(
        "NGI - België: <a href=\"{page}\" target=\"_blank\" title=\"Nationaal Geografisch Instituut\">{title}</a>"
    )
}

fn ngi_basemap(title: &str, url: &str, format: &str, page: &str) -> BasemapEntry {
    BasemapEntry {
        title: title.to_string(),
        url: url.to_string(),
        layer: "topo".to_string(),
        matrix_set: "EPSG:3857".to_string(),
        format: format.to_string(),
        style: "default".to_string(),
        attribution: attribution(page, title),
    }
}

fn label(selector: &str, title: &str) -> ControlLabel {
    ControlLabel {
        selector: selector.to_string(),
        title: title.to_string(),
        on_first_child: false,
        inner_html: None,
    }
}

impl ViewerManifest {
    pub fn ngi_belgium() -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            title: "Basiskaarten België".to_string(),
            projection: "EPSG:3812".to_string(),
            min_zoom: 1.0,
            max_zoom: 28.0,
            max_resolution: 156_543.033_928_040_97,
            default_view: DefaultView {
                zoom: 9.0,
                center: [675_000.0, 625_000.0],
                basemap: 2,
            },
            home_extent: [466_560.0, 487_720.0, 883_439.0, 762_279.0],
            basemap_group: "Basiskaarten".to_string(),
            basemaps: vec![
                ngi_basemap(
                    "Orthofoto",
                    "https://www.ngi.be/tiles/wmts/orthos/1.0.0/ortho/default/3857/latest/{TileMatrix}/{TileRow}/{TileCol}.jpg",
                    "image/jpg",
                    NGI_ORTHO_PAGE,
                ),
                ngi_basemap(
                    "Cartoweb-topo grey",
                    "http://www.ngi.be/tiles/wmts/cartoweb/1.0.0/topo/default_bw/3857/latest/{TileMatrix}/{TileRow}/{TileCol}.png",
                    "image/png",
                    NGI_CARTOWEB_PAGE,
                ),
                ngi_basemap(
                    "Cartoweb-topo",
                    "http://www.ngi.be/tiles/wmts/cartoweb/1.0.0/topo/default/3857/latest/{TileMatrix}/{TileRow}/{TileCol}.png",
                    "image/png",
                    NGI_CARTOWEB_PAGE,
                ),
            ],
            tile_grid: TileGridEntry {
                resolutions: RESOLUTIONS.to_vec(),
                matrix_ids: (6..=17).collect(),
            },
            control_labels: vec![
                label(".ol-zoom-out", "Zoom uit"),
                label(".ol-rotate-reset", "Draai de kaart weer naar het noorden"),
                ControlLabel {
                    selector: ".ol-zoom-extent".to_string(),
                    title: "Zoom uit naar heel België".to_string(),
                    on_first_child: true,
                    inner_html: Some("&#8962".to_string()),
                },
                label(".ol-full-screen-false", "Volledig scherm openen"),
                label(".ol-full-screen-true", "Volledig scherm sluiten"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::manifest::ViewerManifest;

    #[test]
    fn builtin_is_valid() {
        let m = ViewerManifest::ngi_belgium();
        assert!(m.validate().is_ok());
        assert_eq!(m.tile_grid.matrix_ids.first(), Some(&6));
        assert_eq!(m.tile_grid.matrix_ids.last(), Some(&17));
    }

    #[test]
    fn default_view_matches_belgium() {
        let m = ViewerManifest::ngi_belgium();
        assert_eq!(m.default_view.zoom, 9.0);
        assert_eq!(m.default_view.center, [675_000.0, 625_000.0]);
        assert_eq!(m.basemaps[m.default_view.basemap].title, "Cartoweb-topo");
        assert!(m.home_extent().contains(m.default_view.center));
    }

    #[test]
    fn attribution_names_layer() {
        let m = ViewerManifest::ngi_belgium();
        assert!(m.basemaps[0].attribution.contains(">Orthofoto</a>"));
    }
}
