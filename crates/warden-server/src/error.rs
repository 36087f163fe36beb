//! HTTP error mapping

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use warden_api::ErrorBody;
use warden_store::StoreError;

/// Errors a handler surfaces to the wire
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Timer seconds must be positive")]
    NegativeTimer,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::NegativeTimer => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Store(StoreError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "Client not found".to_string())
            }
            ApiError::Store(e) => {
                error!(error = %e, "Registry operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Client registry unavailable".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}
