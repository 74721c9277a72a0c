//! API error type and its HTTP rendering

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use schema_orchestrator_service::OrchestratorError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Error body returned for non-2xx responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Errors surfaced by API handlers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    UnresolvedConnection(String),
    #[error("{0}")]
    GlobalConfigUnavailable(String),
    #[error("{0}")]
    Registry(String),
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::UnresolvedConnection(_) => StatusCode::BAD_REQUEST,
            Self::GlobalConfigUnavailable(_) | Self::Registry(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::UnresolvedConnection(_) => "UNRESOLVED_CONNECTION",
            Self::GlobalConfigUnavailable(_) => "GLOBAL_CONFIG_UNAVAILABLE",
            Self::Registry(_) => "REGISTRY_FAILURE",
        }
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::InvalidSubject(e) => Self::BadRequest(e.to_string()),
            OrchestratorError::Connection(e) => Self::UnresolvedConnection(e.to_string()),
            e @ OrchestratorError::GlobalConfig { .. } => {
                Self::GlobalConfigUnavailable(e.to_string())
            }
            e => Self::Registry(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        warn!(status = status.as_u16(), code = self.code(), error = %self, "Request failed");

        let body = ErrorResponse {
            status: status.as_u16(),
            error: self.to_string(),
            code: Some(self.code().to_string()),
            timestamp: Utc::now(),
        };
        (status, Json(body)).into_response()
    }
}
