use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ApiError {
    #[error("Paste not found or expired")]
    NotFound,
    #[error("request body must be a JSON object")]
    InvalidBody,
    #[error("request body is too large")]
    PayloadTooLarge,
    #[error("content is required and must be a non-empty string")]
    InvalidContent,
    #[error("ttl_seconds must be an integer >= 1")]
    InvalidTtl,
    #[error("max_views must be an integer >= 1")]
    InvalidMaxViews,
    #[error("could not find a free paste key")]
    KeyExhausted,
    #[error("template error")]
    Template {
        #[from]
        source: minijinja::Error,
    },
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidBody => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::InvalidContent => StatusCode::BAD_REQUEST,
            ApiError::InvalidTtl => StatusCode::BAD_REQUEST,
            ApiError::InvalidMaxViews => StatusCode::BAD_REQUEST,
            ApiError::KeyExhausted => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Template { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        // server-side details go to the log, not to the client
        let message = if status_code.is_server_error() {
            error!(error = ?self, "request failed");
            "Internal server error".to_owned()
        } else {
            self.to_string()
        };

        (status_code, Json(json!({ "error": message }))).into_response()
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge,
            _ => ApiError::InvalidBody,
        }
    }
}
