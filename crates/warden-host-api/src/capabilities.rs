//! Host capabilities model

/// Describes what a host adapter can do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCapabilities {
    /// Can lock the interactive session
    pub can_lock_session: bool,

    /// Can report whether the session is locked
    pub can_observe_lock_state: bool,

    /// Can flush the system DNS cache
    pub can_flush_dns: bool,

    /// Hosts file is writable by this process
    pub hosts_file_writable: bool,
}

impl HostCapabilities {
    /// Everything available - what a privileged agent expects
    pub fn full() -> Self {
        Self {
            can_lock_session: true,
            can_observe_lock_state: true,
            can_flush_dns: true,
            hosts_file_writable: true,
        }
    }

    /// Session control only; the DNS side is unavailable
    pub fn session_only() -> Self {
        Self {
            can_lock_session: true,
            can_observe_lock_state: true,
            can_flush_dns: false,
            hosts_file_writable: false,
        }
    }

    /// Check if a domain-block pass can fully succeed on this host
    pub fn can_block_domains(&self) -> bool {
        self.can_flush_dns && self.hosts_file_writable
    }
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self::full()
    }
}
