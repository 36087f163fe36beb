//! Linux host adapter for warden agents
//!
//! Locks sessions through `loginctl`, flushes DNS through `resolvectl`, and
//! blocks domains through the hosts file.

mod adapter;
mod hosts;

pub use adapter::LinuxHost;
