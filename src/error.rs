//! Error taxonomy shared by every component.
//!
//! Maps onto HTTP status codes at the router edge: unavailable targets are
//! 404s, rejected input is a 400, daemon failures are 502s.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::cluster::validate::ValidationError;

#[derive(Debug, Error)]
pub enum Error {
    /// No container matches the reference, or it is not running.
    #[error("Container {0} not found or not running")]
    TargetUnavailable(String),

    /// Docker socket or API failure. Never retried.
    #[error("Docker daemon error: {0}")]
    Transport(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),

    /// An external command (docker compose) exited unsuccessfully.
    #[error("{0}")]
    Command(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<bollard::errors::Error> for Error {
    fn from(err: bollard::errors::Error) -> Self {
        match err {
            bollard::errors::Error::DockerResponseServerError { status_code: 404, message }
            | bollard::errors::Error::DockerResponseServerError { status_code: 409, message } => {
                Error::TargetUnavailable(message)
            }
            other => Error::Transport(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::TargetUnavailable(_) => StatusCode::NOT_FOUND,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Transport(_) => StatusCode::BAD_GATEWAY,
            Error::Io(_) | Error::Json(_) | Error::Storage(_) | Error::Command(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            Error::Validation(e) => tracing::warn!(validation_error = %e, "Validation failed"),
            Error::TargetUnavailable(target) => tracing::debug!(%target, "Target unavailable"),
            other => tracing::error!(error = %other, "Request failed"),
        }
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}
