pub mod auth;

pub use auth::{require_actor, AuthError, Claims};
