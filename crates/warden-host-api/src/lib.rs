//! Host adapter trait interfaces for warden agents
//!
//! This crate defines the capability-based interface between the agent's
//! control loops and platform-specific enforcement code. It contains no
//! platform code itself.

mod capabilities;
mod mock;
mod traits;

pub use capabilities::*;
pub use mock::*;
pub use traits::*;
