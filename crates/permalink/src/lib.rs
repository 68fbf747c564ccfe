pub mod codec;
pub mod error;
pub mod history;
pub mod host;
pub mod sync;

pub use codec::*;
pub use error::*;
pub use history::*;
pub use host::*;
pub use sync::*;
