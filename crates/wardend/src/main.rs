//! wardend - The warden workstation agent
//!
//! Polls the state store for this machine's desired lock state and enforces
//! it: the session stays locked unless the store says otherwise, and the
//! YouTube DNS block is re-applied on the store's timer.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use warden_api::ClientName;
use warden_core::{
    DnsTimer, DnsTimerPolicy, HttpStateStore, LockReconciler, ReconcilePolicy, Supervisor,
};
use warden_host_api::HostAdapter;
use warden_host_linux::LinuxHost;

/// wardend - Lock-state enforcement agent
#[derive(Parser, Debug)]
#[command(name = "wardend")]
#[command(about = "Lock-state enforcement agent for warden workstations", long_about = None)]
struct Args {
    /// Client name this machine reports as (default: hostname)
    #[arg(env = "WARDEN_CLIENT")]
    client: Option<String>,

    /// State store base URL
    #[arg(
        short,
        long,
        env = "WARDEN_SERVER",
        default_value = "http://localhost:8000"
    )]
    server: String,

    /// Hosts file the domain block writes to
    #[arg(long, env = "WARDEN_HOSTS_FILE", default_value = "/etc/hosts")]
    hosts_file: PathBuf,

    /// Log level
    #[arg(short, long, env = "WARDEN_LOG", default_value = "info")]
    log_level: String,
}

fn client_name(args: &Args) -> Result<ClientName> {
    if let Some(name) = &args.client {
        return Ok(ClientName::from(name.as_str()));
    }

    let hostname = nix::unistd::gethostname()
        .context("Failed to read hostname")?
        .into_string()
        .map_err(|raw| anyhow::anyhow!("Hostname is not valid UTF-8: {:?}", raw))?;
    Ok(ClientName::from(hostname.as_str()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "wardend starting");

    let client = client_name(&args)?;
    let store = Arc::new(HttpStateStore::new(&args.server, &client));
    debug!(
        unlock_url = store.unlock_url(),
        timer_url = store.timer_url(),
        "Store endpoints derived"
    );
    let host = Arc::new(LinuxHost::with_hosts_path(args.hosts_file.clone()));

    if !LinuxHost::is_privileged() {
        warn!("Not running as root, enforcement may be incomplete");
    }
    if !host.capabilities().hosts_file_writable {
        warn!(
            hosts_file = %args.hosts_file.display(),
            "Hosts file is not writable, domain blocking will fail"
        );
    }

    info!(client = %client, server = %args.server, "Agent configured");

    let reconciler = LockReconciler::new(store.clone(), host.clone(), ReconcilePolicy::default());
    let dns_timer = DnsTimer::new(store, host, DnsTimerPolicy::default());

    Supervisor::new(reconciler, dns_timer)
        .run()
        .await
        .context("Supervisor failed")?;

    info!("wardend stopped");
    Ok(())
}
