//! Agent supervisor
//!
//! Owns both loop lifetimes: runs the lock reconciler in the foreground,
//! the DNS timer as a spawned task, and fans one shutdown signal out to
//! both on SIGINT or SIGTERM.

use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::dns_timer::DnsTimer;
use crate::reconcile::LockReconciler;

/// How long `stop` waits for the DNS task before giving up on the join
pub const STOP_GRACE: Duration = Duration::from_secs(5);

pub struct Supervisor {
    reconciler: LockReconciler,
    dns_timer: DnsTimer,
    dns_task: Option<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
    stop_grace: Duration,
}

impl Supervisor {
    pub fn new(reconciler: LockReconciler, dns_timer: DnsTimer) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            reconciler,
            dns_timer,
            dns_task: None,
            shutdown_tx,
            stop_grace: STOP_GRACE,
        }
    }

    #[cfg(test)]
    fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    /// Spawn the DNS timer task. Safe to call more than once: a live task
    /// makes later calls no-ops; a finished task is replaced by a fresh one.
    pub fn start_dns_timer(&mut self) {
        if let Some(task) = &self.dns_task
            && !task.is_finished()
        {
            debug!("DNS timer already running, start ignored");
            return;
        }

        let shutdown = self.shutdown_tx.subscribe();
        self.dns_task = Some(tokio::spawn(self.dns_timer.clone().run(shutdown)));
        info!("DNS timer task started");
    }

    /// Signal shutdown and join the DNS task within the grace period.
    pub async fn stop(&mut self) {
        // The signal is write-once: it only ever flips false -> true.
        if !*self.shutdown_tx.borrow() {
            let _ = self.shutdown_tx.send(true);
            debug!("Shutdown signalled");
        }

        if let Some(task) = self.dns_task.take() {
            match timeout(self.stop_grace, task).await {
                Ok(Ok(())) => info!("DNS timer task stopped"),
                Ok(Err(e)) => warn!(error = %e, "DNS timer task panicked"),
                Err(_) => {
                    warn!("DNS timer task did not stop in time, leaving it to exit with the process")
                }
            }
        }
    }

    /// Run both loops until SIGINT or SIGTERM, then stop them.
    pub async fn run(mut self) -> std::io::Result<()> {
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        self.start_dns_timer();
        let shutdown = self.shutdown_tx.subscribe();

        tokio::select! {
            _ = self.reconciler.run(shutdown) => {
                warn!("Reconciliation loop exited on its own");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down");
            }
        }

        self.stop().await;
        Ok(())
    }
}
