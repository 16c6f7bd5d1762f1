//! Error types for the back-office API client.
//!
//! # Design
//! `Validation` never reaches the network. `Http` carries everything the
//! admin UI shows for a failed call (resolved message, status, raw payload,
//! endpoint, method). `Network` is kept apart from `Http` so callers can show
//! a connectivity message instead of a server message. `SessionExpired` makes
//! the 401 eviction path explicit and catchable.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::http::HttpMethod;

/// Generic message for failures where no response was obtained.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Unable to connect to server. Please check your internet connection and try again.";

/// Result alias used throughout the crate.
pub type ApiResult<T> = Result<T, ApiError>;

/// Non-2xx response from the admin API.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpError {
    pub message: String,
    pub status: u16,
    pub status_text: String,
    pub payload: Value,
    pub endpoint: String,
    pub method: HttpMethod,
}

/// Errors returned by the client, resource modules and state containers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required field was missing before any request was issued.
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    /// The server answered with a non-2xx status.
    #[error("{}", .0.message)]
    Http(HttpError),

    /// No response was obtained.
    #[error("{message}")]
    Network { message: String, cause: String },

    /// The server rejected the session token. The token has been evicted.
    #[error("Session expired while calling {endpoint}")]
    SessionExpired { endpoint: String },

    /// The request payload could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A successful payload did not have the expected shape.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// Token persistence failed.
    #[error("token storage failed: {0}")]
    Storage(String),
}

impl ApiError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn network(cause: impl Into<String>) -> Self {
        ApiError::Network {
            message: NETWORK_ERROR_MESSAGE.to_string(),
            cause: cause.into(),
        }
    }

    pub fn is_network_error(&self) -> bool {
        matches!(self, ApiError::Network { .. })
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired { .. })
    }

    /// HTTP status, if the error came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http(err) => Some(err.status),
            ApiError::SessionExpired { .. } => Some(401),
            _ => None,
        }
    }

    /// Raw response payload, if the error came from a response.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            ApiError::Http(err) => Some(&err.payload),
            _ => None,
        }
    }
}

/// Category of a `StoreError`, used by views to pick a banner style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Validation,
    Http,
    Network,
    SessionExpired,
    Internal,
}

/// Cloneable error snapshot held in a state container's error slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreError {
    pub message: String,
    pub status: Option<u16>,
    pub details: Option<Value>,
    pub kind: ErrorKind,
}

impl StoreError {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            details: None,
            kind: ErrorKind::Internal,
        }
    }
}

impl From<&ApiError> for StoreError {
    fn from(err: &ApiError) -> Self {
        let kind = match err {
            ApiError::Validation { .. } => ErrorKind::Validation,
            ApiError::Http(_) => ErrorKind::Http,
            ApiError::Network { .. } => ErrorKind::Network,
            ApiError::SessionExpired { .. } => ErrorKind::SessionExpired,
            ApiError::Serialization(_) | ApiError::Deserialization(_) | ApiError::Storage(_) => ErrorKind::Internal,
        };
        Self {
            message: err.to_string(),
            status: err.status(),
            details: err.payload().cloned(),
            kind,
        }
    }
}
