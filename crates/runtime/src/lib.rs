pub mod event_bus;
pub mod tick;

pub use event_bus::*;
pub use tick::*;
