//! HTTP mapping of blog errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::BlogError;

impl BlogError {
    /// Status code the HTTP layer answers with
    pub fn status(&self) -> StatusCode {
        match self {
            BlogError::NotFound(_) => StatusCode::NOT_FOUND,
            BlogError::InvalidSlug(_) | BlogError::MissingField(_) => StatusCode::BAD_REQUEST,
            BlogError::Conflict(_) => StatusCode::CONFLICT,
            BlogError::Unauthorized => StatusCode::UNAUTHORIZED,
            BlogError::Malformed { .. }
            | BlogError::Render(_)
            | BlogError::Session(_)
            | BlogError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for BlogError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
