pub mod manifest;
pub mod ngi;

pub use manifest::*;
