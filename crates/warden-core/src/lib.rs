//! Agent control loops for warden
//!
//! Provides:
//! - State store access for agents (`StateStore`, `HttpStateStore`)
//! - The lock reconciliation loop
//! - The DNS block timer
//! - The supervisor that owns both

mod dns_timer;
mod reconcile;
mod shutdown;
mod store;
mod supervisor;

pub use dns_timer::*;
pub use reconcile::*;
pub use shutdown::*;
pub use store::*;
pub use supervisor::*;
