// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

//! Error taxonomy shared by the monitor, delivery and server sides

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unknown session id. Recoverable on the client by opening a new session.
    #[error("Session not found: {0}")]
    NotFound(String),

    /// Network failure or timeout. Recoverable by requeue-and-retry.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Event candidate missing required fields
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Inference model failed to initialise; the modality runs degraded
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Single-frame inference failure
    #[error("Inference error: {0}")]
    Inference(String),

    /// Report rendering failure
    #[error("Report error: {0}")]
    Report(String),

    /// Config error
    #[error("Config error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the failure means the server no longer knows the session
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.status() == Some(reqwest::StatusCode::NOT_FOUND) {
            Error::NotFound(e.to_string())
        } else {
            Error::Transport(e.to_string())
        }
    }
}

impl Error {
    fn status(&self) -> (StatusCode, &'static str) {
        match self {
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Error::MalformedInput(_) => (StatusCode::BAD_REQUEST, "MALFORMED_INPUT"),
            Error::Transport(_) => (StatusCode::BAD_GATEWAY, "TRANSPORT_ERROR"),
            Error::ModelUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "MODEL_UNAVAILABLE"),
            Error::Inference(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INFERENCE_ERROR"),
            Error::Report(_) => (StatusCode::INTERNAL_SERVER_ERROR, "REPORT_ERROR"),
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            Error::Serialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SERIALIZATION_ERROR"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }

    /// Message shown to HTTP clients
    fn public_message(&self) -> String {
        match self {
            Error::NotFound(_) => "Session not found".to_string(),
            other => other.to_string(),
        }
    }

    /// Plain-text response, used by the report downloads
    pub fn into_text_response(self) -> Response {
        let (status, _) = self.status();
        (status, self.public_message()).into_response()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status();
        let message = self.public_message();

        if status.is_server_error() {
            tracing::error!(status = %status, error_code = %error_code, "Request error: {}", self);
        } else {
            tracing::debug!(status = %status, error_code = %error_code, "Request error: {}", self);
        }

        let body = Json(json!({
            "error": message,
            "error_code": error_code,
        }));

        (status, body).into_response()
    }
}
