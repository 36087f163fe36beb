//! Persisted per-client configuration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::DEFAULT_TIMER_SECONDS;

/// Desired state the store holds for one client.
///
/// Defaults are the fail-safe posture: session locked, domain-block pass on
/// the standard timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Whether the interactive session may stay unlocked
    #[serde(default)]
    pub unlock_allowed: bool,
    /// Seconds between domain-block passes on the client
    #[serde(default = "default_timer")]
    pub youtube_timer_seconds: i64,
    /// Stamped on every mutation, never advanced by plain reads
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

fn default_timer() -> i64 {
    DEFAULT_TIMER_SECONDS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            unlock_allowed: false,
            youtube_timer_seconds: DEFAULT_TIMER_SECONDS,
            last_updated: None,
        }
    }
}

impl ClientConfig {
    /// Stamp the config as modified now.
    pub fn touch(&mut self) {
        self.last_updated = Some(Utc::now());
    }
}
