//! warden-server - HTTP state store for warden agents
//!
//! Thin axum surface over the flat-file client registry:
//! - Reads auto-register unknown clients with locked defaults
//! - Writes stamp `last_updated` and persist
//! - Errors follow the `{"detail": ...}` body convention

mod error;
mod routes;
mod state;

pub use error::*;
pub use routes::*;
pub use state::*;
