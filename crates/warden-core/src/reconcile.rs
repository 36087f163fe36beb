//! Lock reconciliation
//!
//! Every cycle compares the store's desired state with the observed session
//! and issues at most one corrective action. The loop fail-safes toward
//! locked: an unreachable store reads as "stay locked", and a prolonged
//! outage escalates to a forced lock.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use warden_host_api::HostAdapter;

use crate::shutdown::wait_or_shutdown;
use crate::store::StateStore;

/// What the session state ought to be, as last decided by the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockIntent {
    Locked,
    Unlocked,
}

/// Corrective action for one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    /// Session already matches the desired state
    None,
    /// Lock the session
    Lock,
}

/// Decision for one (desired, observed) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub action: ReconcileAction,
    pub intent: LockIntent,
}

/// Decide the corrective action for one cycle.
///
/// | `should_unlock` | `locked` | action | intent   |
/// |-----------------|----------|--------|----------|
/// | true            | true     | none   | Unlocked |
/// | true            | false    | none   | Unlocked |
/// | false           | true     | none   | Locked   |
/// | false           | false    | lock   | Locked   |
///
/// Unlocking is never an action: a session the store would allow open stays
/// locked until a human unlocks it.
pub fn reconcile(should_unlock: bool, locked: bool) -> Reconciliation {
    match (should_unlock, locked) {
        (true, _) => Reconciliation {
            action: ReconcileAction::None,
            intent: LockIntent::Unlocked,
        },
        (false, true) => Reconciliation {
            action: ReconcileAction::None,
            intent: LockIntent::Locked,
        },
        (false, false) => Reconciliation {
            action: ReconcileAction::Lock,
            intent: LockIntent::Locked,
        },
    }
}

/// Tuning for the lock reconciliation loop
#[derive(Debug, Clone)]
pub struct ReconcilePolicy {
    /// Pause after a clean cycle
    pub poll_interval: Duration,

    /// Pause after a cycle with a fetch failure or safety lock
    pub error_backoff: Duration,

    /// Fetch attempts per cycle
    pub fetch_attempts: u32,

    /// Pause between fetch attempts within a cycle
    pub retry_delay: Duration,

    /// Consecutive failed cycles before the safety lock fires
    pub failure_threshold: u32,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            error_backoff: Duration::from_secs(10),
            fetch_attempts: 3,
            retry_delay: Duration::from_secs(2),
            failure_threshold: 5,
        }
    }
}

/// What one reconciliation cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Desired state fetched and reconciled
    Reconciled { action: ReconcileAction },

    /// Every fetch attempt failed; reconciled against the locked fail-safe
    FetchFailed { action: ReconcileAction },

    /// Failure threshold reached; a forced lock replaced the normal action
    SafetyLocked,
}

impl CycleOutcome {
    /// Errored cycles take the longer inter-cycle pause
    pub fn errored(&self) -> bool {
        !matches!(self, CycleOutcome::Reconciled { .. })
    }
}

/// Drives reconciliation cycles against a state store and a host adapter
pub struct LockReconciler {
    store: Arc<dyn StateStore>,
    host: Arc<dyn HostAdapter>,
    policy: ReconcilePolicy,
    consecutive_failures: u32,
    intent: LockIntent,
}

impl LockReconciler {
    pub fn new(
        store: Arc<dyn StateStore>,
        host: Arc<dyn HostAdapter>,
        policy: ReconcilePolicy,
    ) -> Self {
        Self {
            store,
            host,
            policy,
            consecutive_failures: 0,
            // fail-safe posture until the first cycle says otherwise
            intent: LockIntent::Locked,
        }
    }

    /// The agent's current record of what the session state ought to be
    pub fn intent(&self) -> LockIntent {
        self.intent
    }

    /// Consecutive cycles whose desired-state fetch failed entirely
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Fetch the desired state within this cycle's retry budget.
    ///
    /// `None` means every attempt failed.
    async fn fetch_desired(&self) -> Option<bool> {
        for attempt in 1..=self.policy.fetch_attempts {
            match self.store.unlock_allowed().await {
                Ok(should_unlock) => {
                    debug!(should_unlock, attempt, "Fetched desired state");
                    return Some(should_unlock);
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        attempt,
                        attempts = self.policy.fetch_attempts,
                        "Desired-state fetch attempt failed"
                    );
                    if attempt < self.policy.fetch_attempts {
                        tokio::time::sleep(self.policy.retry_delay).await;
                    }
                }
            }
        }
        None
    }

    /// Run one cycle: fetch, escalate if the outage threshold is hit,
    /// observe, reconcile, act.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let (should_unlock, fetch_ok) = match self.fetch_desired().await {
            Some(value) => {
                self.consecutive_failures = 0;
                (value, true)
            }
            None => {
                self.consecutive_failures += 1;
                warn!(
                    consecutive_failures = self.consecutive_failures,
                    "Desired state unavailable, treating as locked"
                );
                (false, false)
            }
        };

        if self.consecutive_failures >= self.policy.failure_threshold {
            warn!(
                consecutive_failures = self.consecutive_failures,
                "State store unreachable for too long, forcing session lock"
            );
            match self.host.lock_session().await {
                Ok(()) => {
                    info!("Safety lock applied");
                    self.intent = LockIntent::Locked;
                }
                Err(e) => error!(error = %e, "Safety lock failed"),
            }
            self.consecutive_failures = 0;
            return CycleOutcome::SafetyLocked;
        }

        let locked = match self.host.session_locked().await {
            Ok(locked) => locked,
            Err(e) => {
                warn!(error = %e, "Could not observe session state, assuming unlocked");
                false
            }
        };

        match (should_unlock, locked) {
            (true, true) => info!("Store allows unlock, waiting for manual unlock"),
            (true, false) => debug!("Session unlocked as allowed"),
            (false, true) => debug!("Session locked as required"),
            (false, false) => info!("Store requires lock and session is open, locking"),
        }

        let decision = reconcile(should_unlock, locked);
        let mut intent = decision.intent;

        if decision.action == ReconcileAction::Lock {
            match self.host.lock_session().await {
                Ok(()) => info!("Session locked"),
                Err(e) => {
                    error!(error = %e, "Failed to lock session");
                    // belief unchanged until the lock lands
                    intent = self.intent;
                }
            }
        }

        if intent != self.intent {
            debug!(?intent, "Lock intent changed");
            self.intent = intent;
        }

        if fetch_ok {
            CycleOutcome::Reconciled {
                action: decision.action,
            }
        } else {
            CycleOutcome::FetchFailed {
                action: decision.action,
            }
        }
    }

    /// Drive cycles until shutdown is signalled.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            poll_interval_secs = self.policy.poll_interval.as_secs(),
            fetch_attempts = self.policy.fetch_attempts,
            failure_threshold = self.policy.failure_threshold,
            "Lock reconciliation loop started"
        );

        while !*shutdown.borrow() {
            let outcome = self.run_cycle().await;
            let pause = if outcome.errored() {
                self.policy.error_backoff
            } else {
                self.policy.poll_interval
            };
            if !wait_or_shutdown(pause, &mut shutdown).await {
                break;
            }
        }

        info!("Lock reconciliation loop stopped");
    }
}
