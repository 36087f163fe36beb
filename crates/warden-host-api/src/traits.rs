//! Host adapter traits

use async_trait::async_trait;
use thiserror::Error;

use crate::HostCapabilities;

/// Errors from host adapter operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Unsupported on this host: {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type HostResult<T> = Result<T, HostError>;

/// Result of applying a domain block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockOutcome {
    /// Entries appended by this call
    pub added: usize,

    /// Entries that were already in place
    pub already_present: usize,
}

impl BlockOutcome {
    /// True when the call changed nothing
    pub fn unchanged(&self) -> bool {
        self.added == 0
    }
}

/// Host adapter trait - implemented by platform-specific adapters
///
/// Every operation is idempotent: repeating it against an already-enforced
/// state succeeds without side effects.
#[async_trait]
pub trait HostAdapter: Send + Sync {
    /// Get the capabilities of this host adapter
    fn capabilities(&self) -> &HostCapabilities;

    /// Lock the interactive session. Locking a locked session succeeds.
    async fn lock_session(&self) -> HostResult<()>;

    /// Whether the interactive session is currently locked
    async fn session_locked(&self) -> HostResult<bool>;

    /// Drop cached DNS resolutions
    async fn flush_dns_cache(&self) -> HostResult<()>;

    /// Ensure each domain resolves to loopback via the hosts file
    async fn apply_domain_block(&self, domains: &[&str]) -> HostResult<BlockOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_outcome_unchanged() {
        let outcome = BlockOutcome {
            added: 0,
            already_present: 4,
        };
        assert!(outcome.unchanged());

        let outcome = BlockOutcome {
            added: 2,
            already_present: 2,
        };
        assert!(!outcome.unchanged());
    }
}
