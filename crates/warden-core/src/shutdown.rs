//! Cooperative shutdown signalling
//!
//! Loops receive a watch channel that flips to `true` exactly once per
//! process shutdown. Waits select against it, so cancellation lands without
//! polling.

use std::time::Duration;
use tokio::sync::watch;

/// Sleep for `duration` unless shutdown is signalled first.
///
/// Returns `true` when the full duration elapsed, `false` on shutdown. A
/// dropped sender counts as shutdown.
pub async fn wait_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if *shutdown.borrow() {
        return false;
    }

    let sleep = tokio::time::sleep(duration);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return false;
                }
            }
        }
    }
}
