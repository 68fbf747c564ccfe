pub mod basemap;
pub mod layer;
pub mod raster;

pub use basemap::*;
pub use layer::*;
pub use raster::*;
