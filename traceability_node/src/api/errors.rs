//! API error envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chain::ChainError;
use crate::ipfs::IpfsError;

/// JSON error body returned by every failing route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub timestamp: u64,
}

impl ApiError {
    pub fn new(code: u16, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            timestamp: chrono::Utc::now().timestamp() as u64,
        }
    }

    pub fn with_details(code: u16, message: String, details: serde_json::Value) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new(400, message.to_string())
    }

    pub fn not_found(message: &str) -> Self {
        Self::new(404, message.to_string())
    }

    pub fn conflict(message: &str) -> Self {
        Self::new(409, message.to_string())
    }

    pub fn unprocessable_entity(message: &str) -> Self {
        Self::new(422, message.to_string())
    }

    pub fn internal_server_error(message: &str) -> Self {
        Self::new(500, message.to_string())
    }

    pub fn bad_gateway(message: &str) -> Self {
        Self::new(502, message.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API Error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        match &err {
            ChainError::BatchNotFound(_) => Self::not_found(&err.to_string()),
            ChainError::BatchExists(_) | ChainError::DuplicateEvent(_) => {
                Self::conflict(&err.to_string())
            }
            ChainError::ParentNotFound(_) => Self::unprocessable_entity(&err.to_string()),
            ChainError::InvalidEventKind(_) => Self::bad_request(&err.to_string()),
            ChainError::Transport(_) | ChainError::Gateway(_) | ChainError::InvalidResponse(_) => {
                Self::bad_gateway(&err.to_string())
            }
        }
    }
}

impl From<IpfsError> for ApiError {
    fn from(err: IpfsError) -> Self {
        match &err {
            IpfsError::NotFound(_) => Self::not_found(&err.to_string()),
            _ => Self::bad_gateway(&err.to_string()),
        }
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
