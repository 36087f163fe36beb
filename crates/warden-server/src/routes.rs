//! HTTP surface of the state store
//!
//! Reads auto-register unknown clients so an agent appears in the registry
//! the moment it first polls. The two single-field setters take their value
//! as a query parameter; `configure` takes a whole JSON config.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use warden_api::{
    ApiBanner, ClientConfig, ClientList, ClientName, ClientSummary, ConfigureAck, DeleteAck,
    TimerAck, TimerStatus, UnlockAck, UnlockStatus,
};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api", get(api_banner))
        .route("/clients", get(list_clients))
        .route(
            "/client/{client_name}/unlock-status",
            get(unlock_status).post(set_unlock_status),
        )
        .route(
            "/client/{client_name}/youtube-timer",
            get(youtube_timer).post(set_youtube_timer),
        )
        .route("/client/{client_name}", delete(delete_client))
        .route("/clients/{client_name}/configure", post(configure_client))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct UnlockParams {
    unlock_allowed: bool,
}

#[derive(Debug, Deserialize)]
struct TimerParams {
    timer_seconds: i64,
}

async fn api_banner() -> Json<ApiBanner> {
    Json(ApiBanner {
        message: "Warden state store is running".to_string(),
    })
}

async fn list_clients(State(state): State<Arc<AppState>>) -> Json<ClientList> {
    let clients: Vec<ClientSummary> = state
        .registry
        .list()
        .into_iter()
        .map(|(name, config)| ClientSummary {
            name,
            unlock_allowed: config.unlock_allowed,
            youtube_timer_seconds: config.youtube_timer_seconds,
            last_updated: config.last_updated,
        })
        .collect();
    let total_clients = clients.len();
    Json(ClientList {
        clients,
        total_clients,
    })
}

async fn unlock_status(
    State(state): State<Arc<AppState>>,
    Path(client_name): Path<String>,
) -> Json<UnlockStatus> {
    let config = state
        .registry
        .fetch_or_register(&ClientName::from(client_name.as_str()));
    Json(UnlockStatus {
        client_name,
        unlock: config.unlock_allowed,
        last_updated: config.last_updated,
    })
}

async fn set_unlock_status(
    State(state): State<Arc<AppState>>,
    Path(client_name): Path<String>,
    Query(params): Query<UnlockParams>,
) -> Json<UnlockAck> {
    let config = state.registry.set_unlock(
        &ClientName::from(client_name.as_str()),
        params.unlock_allowed,
    );
    info!(
        client = %client_name,
        unlock = config.unlock_allowed,
        "Unlock status updated"
    );
    let message = format!("Unlock status updated for {client_name}");
    Json(UnlockAck {
        client_name,
        unlock: config.unlock_allowed,
        message,
        timestamp: Utc::now(),
    })
}

async fn youtube_timer(
    State(state): State<Arc<AppState>>,
    Path(client_name): Path<String>,
) -> Json<TimerStatus> {
    let config = state
        .registry
        .fetch_or_register(&ClientName::from(client_name.as_str()));
    Json(TimerStatus {
        client_name,
        timer_seconds: Some(config.youtube_timer_seconds),
        last_updated: config.last_updated,
    })
}

async fn set_youtube_timer(
    State(state): State<Arc<AppState>>,
    Path(client_name): Path<String>,
    Query(params): Query<TimerParams>,
) -> Result<Json<TimerAck>, ApiError> {
    // Rejected before the client would be auto-registered.
    if params.timer_seconds < 0 {
        return Err(ApiError::NegativeTimer);
    }

    let config = state.registry.set_timer(
        &ClientName::from(client_name.as_str()),
        params.timer_seconds,
    );
    info!(
        client = %client_name,
        timer_seconds = config.youtube_timer_seconds,
        "YouTube timer updated"
    );
    let message = format!("YouTube timer updated for {client_name}");
    Ok(Json(TimerAck {
        client_name,
        timer_seconds: config.youtube_timer_seconds,
        message,
        timestamp: Utc::now(),
    }))
}

async fn delete_client(
    State(state): State<Arc<AppState>>,
    Path(client_name): Path<String>,
) -> Result<Json<DeleteAck>, ApiError> {
    state
        .registry
        .remove(&ClientName::from(client_name.as_str()))?;
    info!(client = %client_name, "Client deleted");
    Ok(Json(DeleteAck {
        message: format!("Client {client_name} deleted successfully"),
    }))
}

async fn configure_client(
    State(state): State<Arc<AppState>>,
    Path(client_name): Path<String>,
    Json(config): Json<ClientConfig>,
) -> Json<ConfigureAck> {
    let config = state
        .registry
        .upsert(&ClientName::from(client_name.as_str()), config);
    info!(
        client = %client_name,
        unlock = config.unlock_allowed,
        timer_seconds = config.youtube_timer_seconds,
        "Client configured"
    );
    Json(ConfigureAck {
        client_name,
        message: "Client configured successfully".to_string(),
        timestamp: Utc::now(),
    })
}
