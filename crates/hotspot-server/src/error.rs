use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use hotspot_core::Error;

pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            Error::ProjectNotFound(_) | Error::CommitNotFound(_) | Error::JobNotFound(_) => {
                (StatusCode::NOT_FOUND, self.0.to_string())
            }
            Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            Error::Conflict(_) => (StatusCode::CONFLICT, self.0.to_string()),
            Error::Repository(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.0.to_string()),
            Error::Database(_) | Error::Migration(_) | Error::Io(_) | Error::Internal(_) => {
                tracing::error!(error = %self.0, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            Error::Cancelled => (StatusCode::OK, self.0.to_string()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
