//! Mock host adapter for testing

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::{BlockOutcome, HostAdapter, HostCapabilities, HostError, HostResult};

/// Mock host adapter for unit/integration testing
///
/// Call counters record every attempt, including failed ones.
pub struct MockHost {
    capabilities: HostCapabilities,
    locked: Arc<Mutex<bool>>,
    blocked: Arc<Mutex<BTreeSet<String>>>,
    lock_calls: AtomicU32,
    flush_calls: AtomicU32,
    block_calls: AtomicU32,

    /// Configure lock_session to fail
    pub fail_lock: Arc<Mutex<bool>>,

    /// Configure session_locked to fail
    pub fail_observe: Arc<Mutex<bool>>,

    /// Configure flush_dns_cache to fail
    pub fail_flush: Arc<Mutex<bool>>,

    /// Configure apply_domain_block to fail
    pub fail_block: Arc<Mutex<bool>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            capabilities: HostCapabilities::full(),
            locked: Arc::new(Mutex::new(false)),
            blocked: Arc::new(Mutex::new(BTreeSet::new())),
            lock_calls: AtomicU32::new(0),
            flush_calls: AtomicU32::new(0),
            block_calls: AtomicU32::new(0),
            fail_lock: Arc::new(Mutex::new(false)),
            fail_observe: Arc::new(Mutex::new(false)),
            fail_flush: Arc::new(Mutex::new(false)),
            fail_block: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_capabilities(mut self, caps: HostCapabilities) -> Self {
        self.capabilities = caps;
        self
    }

    /// Set the simulated session lock state
    pub fn set_locked(&self, locked: bool) {
        *self.locked.lock().unwrap() = locked;
    }

    pub fn is_locked(&self) -> bool {
        *self.locked.lock().unwrap()
    }

    pub fn lock_calls(&self) -> u32 {
        self.lock_calls.load(Ordering::SeqCst)
    }

    pub fn flush_calls(&self) -> u32 {
        self.flush_calls.load(Ordering::SeqCst)
    }

    pub fn block_calls(&self) -> u32 {
        self.block_calls.load(Ordering::SeqCst)
    }

    /// Domains currently mapped to loopback
    pub fn blocked_domains(&self) -> Vec<String> {
        self.blocked.lock().unwrap().iter().cloned().collect()
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostAdapter for MockHost {
    fn capabilities(&self) -> &HostCapabilities {
        &self.capabilities
    }

    async fn lock_session(&self) -> HostResult<()> {
        self.lock_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_lock.lock().unwrap() {
            return Err(HostError::CommandFailed("mock lock failure".into()));
        }
        *self.locked.lock().unwrap() = true;
        Ok(())
    }

    async fn session_locked(&self) -> HostResult<bool> {
        if *self.fail_observe.lock().unwrap() {
            return Err(HostError::CommandFailed("mock observe failure".into()));
        }
        Ok(*self.locked.lock().unwrap())
    }

    async fn flush_dns_cache(&self) -> HostResult<()> {
        self.flush_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_flush.lock().unwrap() {
            return Err(HostError::CommandFailed("mock flush failure".into()));
        }
        Ok(())
    }

    async fn apply_domain_block(&self, domains: &[&str]) -> HostResult<BlockOutcome> {
        self.block_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_block.lock().unwrap() {
            return Err(HostError::PermissionDenied("mock block failure".into()));
        }

        let mut blocked = self.blocked.lock().unwrap();
        let mut outcome = BlockOutcome {
            added: 0,
            already_present: 0,
        };
        for domain in domains {
            if blocked.insert(domain.to_string()) {
                outcome.added += 1;
            } else {
                outcome.already_present += 1;
            }
        }
        Ok(outcome)
    }
}
