//! Linux host adapter

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

use warden_host_api::{BlockOutcome, HostAdapter, HostCapabilities, HostError, HostResult};

use crate::hosts;

const HOSTS_PATH: &str = "/etc/hosts";

/// Host adapter for systemd-based Linux workstations
///
/// Assumes the agent runs inside the interactive session it polices, so
/// `loginctl` resolves the caller's session.
pub struct LinuxHost {
    capabilities: HostCapabilities,
    hosts_path: PathBuf,
}

impl LinuxHost {
    /// Probe the host and build an adapter for it
    pub fn new() -> Self {
        Self::with_hosts_path(PathBuf::from(HOSTS_PATH))
    }

    /// Adapter with an alternate hosts file, for tests and containers
    pub fn with_hosts_path(hosts_path: PathBuf) -> Self {
        let writable = std::fs::OpenOptions::new()
            .append(true)
            .open(&hosts_path)
            .is_ok();
        let capabilities = HostCapabilities {
            can_lock_session: true,
            can_observe_lock_state: true,
            can_flush_dns: true,
            hosts_file_writable: writable,
        };
        debug!(
            hosts_path = %hosts_path.display(),
            hosts_file_writable = writable,
            "Probed Linux host"
        );

        Self {
            capabilities,
            hosts_path,
        }
    }

    /// Whether the process runs with root privileges
    pub fn is_privileged() -> bool {
        nix::unistd::geteuid().is_root()
    }
}

impl Default for LinuxHost {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a short-lived command and return its stdout, failing on non-zero exit
async fn run_command(program: &str, args: &[&str]) -> HostResult<String> {
    debug!(program, ?args, "Running host command");

    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| HostError::CommandFailed(format!("failed to run {}: {}", program, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(HostError::CommandFailed(format!(
            "{} {} exited with {}: {}",
            program,
            args.join(" "),
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[async_trait]
impl HostAdapter for LinuxHost {
    fn capabilities(&self) -> &HostCapabilities {
        &self.capabilities
    }

    async fn lock_session(&self) -> HostResult<()> {
        run_command("loginctl", &["lock-session"]).await?;
        debug!("Requested session lock");
        Ok(())
    }

    async fn session_locked(&self) -> HostResult<bool> {
        let stdout = run_command(
            "loginctl",
            &["show-session", "self", "--property=LockedHint", "--value"],
        )
        .await?;
        Ok(stdout.trim() == "yes")
    }

    async fn flush_dns_cache(&self) -> HostResult<()> {
        run_command("resolvectl", &["flush-caches"]).await?;
        debug!("Flushed DNS caches");
        Ok(())
    }

    async fn apply_domain_block(&self, domains: &[&str]) -> HostResult<BlockOutcome> {
        let outcome = hosts::ensure_blocked(&self.hosts_path, domains)?;
        if outcome.added > 0 {
            debug!(added = outcome.added, "Extended hosts file");
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn block_through_adapter_is_idempotent() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"127.0.0.1 localhost\n").unwrap();

        let host = LinuxHost::with_hosts_path(file.path().to_path_buf());
        assert!(host.capabilities().hosts_file_writable);

        let first = host
            .apply_domain_block(&["youtube.com", "www.youtube.com"])
            .await
            .unwrap();
        assert_eq!(first.added, 2);

        let second = host
            .apply_domain_block(&["youtube.com", "www.youtube.com"])
            .await
            .unwrap();
        assert!(second.unchanged());
    }

    #[tokio::test]
    async fn full_domain_list_applies_cleanly() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"127.0.0.1 localhost\n").unwrap();

        let host = LinuxHost::with_hosts_path(file.path().to_path_buf());
        let outcome = host
            .apply_domain_block(warden_api::BLOCKED_DOMAINS)
            .await
            .unwrap();
        assert_eq!(outcome.added, warden_api::BLOCKED_DOMAINS.len());

        let content = std::fs::read_to_string(file.path()).unwrap();
        for domain in warden_api::BLOCKED_DOMAINS {
            assert!(content.contains(&format!("127.0.0.1 {domain}")));
        }
    }

    #[test]
    fn probe_flags_unwritable_hosts_file() {
        let host = LinuxHost::with_hosts_path(PathBuf::from("/nonexistent/hosts"));
        assert!(!host.capabilities().hosts_file_writable);
        assert!(!host.capabilities().can_block_domains());
    }
}
