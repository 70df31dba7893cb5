//! Error taxonomy
//!
//! Two layers: `StoreError` is what a content store backend reports for a single
//! read or write, `SyncError` is what a submission reports to its caller. Every
//! store failure keeps its kind on the way up so a transient failure is never
//! mistaken for a missing file.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Failure of one remote read or write
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{path} does not exist")]
    NotFound { path: String },

    #[error("{path} was modified concurrently (stale revision marker)")]
    Conflict { path: String },

    #[error("not authorized to access {path} (HTTP {status})")]
    Unauthorized { path: String, status: u16 },

    #[error("rate limited while accessing {path}")]
    RateLimited { path: String },

    #[error("network error while accessing {path}: {message}")]
    Network { path: String, message: String },

    #[error("unexpected response for {path} (HTTP {status}): {message}")]
    Unexpected { path: String, status: u16, message: String },

    #[error("invalid response for {path}: {message}")]
    InvalidResponse { path: String, message: String },
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::Conflict { .. } => ErrorKind::Conflict,
            StoreError::Unauthorized { .. }
            | StoreError::RateLimited { .. }
            | StoreError::Network { .. }
            | StoreError::Unexpected { .. }
            | StoreError::InvalidResponse { .. } => ErrorKind::TransientRemote,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Path of the destination the failure belongs to
    pub fn path(&self) -> &str {
        match self {
            StoreError::NotFound { path }
            | StoreError::Conflict { path }
            | StoreError::Unauthorized { path, .. }
            | StoreError::RateLimited { path }
            | StoreError::Network { path, .. }
            | StoreError::Unexpected { path, .. }
            | StoreError::InvalidResponse { path, .. } => path,
        }
    }
}

/// Coarse classification shared by both layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    TransientRemote,
    Validation,
    Internal,
}

/// Step of a destination sync that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Resolve,
    Write,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Resolve => write!(f, "resolving revision"),
            Phase::Write => write!(f, "writing"),
        }
    }
}

/// Failure of a submission
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid submission: {0}")]
    Validation(String),

    #[error("{phase} {destination} failed: {source}")]
    Store {
        destination: String,
        phase: Phase,
        #[source]
        source: StoreError,
    },

    #[error("failed to serialize metadata document: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl SyncError {
    pub fn store(destination: impl Into<String>, phase: Phase, source: StoreError) -> Self {
        SyncError::Store {
            destination: destination.into(),
            phase,
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Validation(_) => ErrorKind::Validation,
            SyncError::Store { source, .. } => source.kind(),
            SyncError::Serialize(_) | SyncError::Config(_) => ErrorKind::Internal,
        }
    }

    /// Destination the submission stopped at, if it got that far
    pub fn destination(&self) -> Option<&str> {
        match self {
            SyncError::Store { destination, .. } => Some(destination),
            _ => None,
        }
    }
}

impl ResponseError for SyncError {
    fn status_code(&self) -> StatusCode {
        match self {
            SyncError::Validation(_) => StatusCode::BAD_REQUEST,
            SyncError::Store { source, .. } => match source {
                StoreError::Conflict { .. } => StatusCode::CONFLICT,
                StoreError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                _ => StatusCode::BAD_GATEWAY,
            },
            SyncError::Serialize(_) | SyncError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}
