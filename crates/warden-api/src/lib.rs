//! Shared types for the warden HTTP API
//!
//! This crate defines the contract between warden-server and its consumers:
//! - Per-client configuration as persisted by the state store
//! - Wire types for status reads and mutation acknowledgements
//! - The blocked-domain list agents enforce

mod config;
mod name;
mod wire;

pub use config::*;
pub use name::*;
pub use wire::*;

/// Fallback pacing for the domain-block pass when no usable per-client
/// timer value is available.
pub const DEFAULT_TIMER_SECONDS: i64 = 300;

/// Hostnames the agent maps to loopback during a block pass.
pub const BLOCKED_DOMAINS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "youtu.be",
];
