//! Wire types for the warden HTTP surface

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Service banner returned by `GET /api`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiBanner {
    pub message: String,
}

/// Unlock status for one client, `GET /client/{name}/unlock-status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockStatus {
    pub client_name: String,
    /// Absent on the wire means locked
    #[serde(default)]
    pub unlock: bool,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Acknowledgement for `POST /client/{name}/unlock-status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockAck {
    pub client_name: String,
    pub unlock: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Timer status for one client, `GET /client/{name}/youtube-timer`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerStatus {
    pub client_name: String,
    #[serde(default)]
    pub timer_seconds: Option<i64>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Acknowledgement for `POST /client/{name}/youtube-timer`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerAck {
    pub client_name: String,
    pub timer_seconds: i64,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// One row of the `GET /clients` listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSummary {
    pub name: String,
    pub unlock_allowed: bool,
    pub youtube_timer_seconds: i64,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Full `GET /clients` listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientList {
    pub clients: Vec<ClientSummary>,
    pub total_clients: usize,
}

/// Acknowledgement for `POST /clients/{name}/configure`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigureAck {
    pub client_name: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Acknowledgement for `DELETE /client/{name}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteAck {
    pub message: String,
}

/// Error body carried by every non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_unlock_field_means_locked() {
        let status: UnlockStatus =
            serde_json::from_str(r#"{"client_name": "desk-01", "last_updated": null}"#).unwrap();
        assert!(!status.unlock);
    }

    #[test]
    fn unlock_status_round_trip() {
        let status = UnlockStatus {
            client_name: "desk-01".to_string(),
            unlock: true,
            last_updated: Some(Utc::now()),
        };
        let json = serde_json::to_string(&status).unwrap();
        let parsed: UnlockStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.client_name, status.client_name);
        assert!(parsed.unlock);
        assert_eq!(parsed.last_updated, status.last_updated);
    }

    #[test]
    fn timer_status_tolerates_missing_value() {
        let status: TimerStatus =
            serde_json::from_str(r#"{"client_name": "desk-01", "timer_seconds": null}"#).unwrap();
        assert_eq!(status.timer_seconds, None);
    }
}
