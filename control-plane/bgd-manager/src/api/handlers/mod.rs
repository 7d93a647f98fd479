pub mod admin;
pub mod dashboard;
pub mod data_plane;
pub mod session;

pub use admin::*;
pub use dashboard::*;
pub use data_plane::*;
pub use session::*;
