//! Two independent credentials: admin sessions (cookie) gate the control
//! endpoints, bearer tokens gate data-plane forwarding. Each is signed with
//! its own secret and carries its own scope, so neither is accepted in place
//! of the other.

pub mod session;
pub mod tokens;

pub use session::SessionManager;
pub use tokens::{Claims, IssuedToken, TokenAuthority, bearer_token, parse_algorithm};
