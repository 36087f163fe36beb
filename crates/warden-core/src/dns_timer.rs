//! DNS block timer
//!
//! Paces recurring block passes from the per-client timer value: wait the
//! fetched number of seconds, then flush the DNS cache and re-apply the
//! domain block. Timer fetches are single attempts; anything unusable falls
//! back to a fixed default wait with no pass.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use warden_api::{BLOCKED_DOMAINS, DEFAULT_TIMER_SECONDS};
use warden_host_api::HostAdapter;

use crate::shutdown::wait_or_shutdown;
use crate::store::StateStore;

/// Tuning for the DNS timer loop
#[derive(Debug, Clone)]
pub struct DnsTimerPolicy {
    /// Wait when the store has no usable timer value
    pub default_wait: Duration,

    /// Extra pause after a block pass with failures
    pub error_backoff: Duration,
}

impl Default for DnsTimerPolicy {
    fn default() -> Self {
        Self {
            default_wait: Duration::from_secs(DEFAULT_TIMER_SECONDS as u64),
            error_backoff: Duration::from_secs(60),
        }
    }
}

/// Recurring DNS flush + domain block, paced by the store's timer value
#[derive(Clone)]
pub struct DnsTimer {
    store: Arc<dyn StateStore>,
    host: Arc<dyn HostAdapter>,
    policy: DnsTimerPolicy,
    domains: &'static [&'static str],
}

impl DnsTimer {
    pub fn new(
        store: Arc<dyn StateStore>,
        host: Arc<dyn HostAdapter>,
        policy: DnsTimerPolicy,
    ) -> Self {
        Self {
            store,
            host,
            policy,
            domains: BLOCKED_DOMAINS,
        }
    }

    /// Run until shutdown is signalled.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            domains = self.domains.len(),
            default_wait_secs = self.policy.default_wait.as_secs(),
            "DNS block timer started"
        );

        while !*shutdown.borrow() {
            match self.store.timer_seconds().await {
                Ok(Some(seconds)) if seconds > 0 => {
                    debug!(seconds, "Waiting until the next block pass");
                    if !wait_or_shutdown(Duration::from_secs(seconds as u64), &mut shutdown).await
                    {
                        break;
                    }
                    if !self.run_block_pass().await
                        && !wait_or_shutdown(self.policy.error_backoff, &mut shutdown).await
                    {
                        break;
                    }
                }
                Ok(value) => {
                    warn!(?value, "No usable timer value, taking the default wait");
                    if !wait_or_shutdown(self.policy.default_wait, &mut shutdown).await {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Timer fetch failed, taking the default wait");
                    if !wait_or_shutdown(self.policy.default_wait, &mut shutdown).await {
                        break;
                    }
                }
            }
        }

        info!("DNS block timer stopped");
    }

    /// One flush + block pass. Returns false when any action failed.
    ///
    /// The flush result never gates the block: a stale cache is no reason to
    /// leave the hosts file unenforced.
    pub async fn run_block_pass(&self) -> bool {
        let mut clean = true;

        if let Err(e) = self.host.flush_dns_cache().await {
            error!(error = %e, "DNS cache flush failed");
            clean = false;
        }

        match self.host.apply_domain_block(self.domains).await {
            Ok(outcome) if outcome.unchanged() => {
                debug!(
                    present = outcome.already_present,
                    "Domain block already in place"
                );
            }
            Ok(outcome) => {
                info!(
                    added = outcome.added,
                    present = outcome.already_present,
                    "Domain block applied"
                );
            }
            Err(e) => {
                error!(error = %e, "Domain block failed");
                clean = false;
            }
        }

        clean
    }
}
