pub mod bounds;
pub mod view;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use view::*;
