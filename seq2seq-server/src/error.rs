//! Error types for the seq2seq server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Error types for serving operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Rejected request payload. The message is shown to the client as-is.
    #[error("{0}")]
    InvalidInput(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Model not ready: {0}")]
    ModelNotReady(String),

    #[error("Tokenization failed: {0}")]
    Tokenization(String),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Load failed: {0}")]
    LoadFailed(String),

    #[error("Engine communication error: {0}")]
    Communication(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for the generic malformed-payload rejection.
    pub fn invalid_payload() -> Self {
        Error::InvalidInput("invalid payload".to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            Error::ModelNotFound(_) => (StatusCode::NOT_FOUND, "model_not_found"),
            Error::ModelNotReady(_) => (StatusCode::SERVICE_UNAVAILABLE, "model_not_ready"),
            Error::Tokenization(_) => (StatusCode::INTERNAL_SERVER_ERROR, "tokenization_failed"),
            Error::InferenceFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "inference_failed"),
            Error::LoadFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "load_failed"),
            Error::Communication(_) => (StatusCode::BAD_GATEWAY, "communication_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string()
            }
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_message_is_verbatim() {
        assert_eq!(Error::invalid_payload().to_string(), "invalid payload");
        assert_eq!(
            Error::InvalidInput("Unavailable Task.".to_string()).to_string(),
            "Unavailable Task."
        );
    }

    #[test]
    fn test_status_codes() {
        let response = Error::invalid_payload().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = Error::ModelNotFound("x".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = Error::ModelNotReady("x".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
