use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("unauthorized (HTTP {status}): {body}")]
    Unauthorized { status: u16, body: String },

    #[error("not found (HTTP {status}): {body}")]
    NotFound { status: u16, body: String },

    #[error("remote API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl MigrationError {
    /// Classifies a non-success response from the remote API.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => MigrationError::Unauthorized { status, body },
            404 => MigrationError::NotFound { status, body },
            _ => MigrationError::Api { status, body },
        }
    }

    /// Authorization failures abort the whole run; everything else is per-step.
    pub fn is_fatal(&self) -> bool {
        matches!(self, MigrationError::Unauthorized { .. })
    }
}

impl IntoResponse for MigrationError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            MigrationError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            MigrationError::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, self.to_string()),
            MigrationError::NotFound { .. } => (StatusCode::NOT_FOUND, self.to_string()),
            MigrationError::Api { .. } | MigrationError::Transport(_) => {
                tracing::warn!(error = %self, "Remote API call failed");
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            MigrationError::Io(err) => {
                tracing::error!("IO error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
            MigrationError::Serialization(err) => {
                tracing::error!("Serialization error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
            MigrationError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
