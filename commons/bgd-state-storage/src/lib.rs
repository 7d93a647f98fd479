pub mod error;
pub mod model;
pub mod traits;

#[cfg(feature = "file")]
pub mod file;

#[cfg(feature = "memory")]
pub mod memory;

pub use error::*;
pub use model::*;
pub use traits::*;
