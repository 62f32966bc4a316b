use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::core::ToDoError;

#[cfg(feature = "tracing")]
use tracing::error;

pub const NO_CHANGES_DETECTED: &str = "No changes detected";

/// Everything a handler can answer with besides success.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found")]
    NotFound,
    #[error("{0}")]
    BadRequest(String),
    #[error("Internal server error")]
    Internal(anyhow::Error),
}

impl From<ToDoError> for ApiError {
    fn from(err: ToDoError) -> Self {
        match err {
            ToDoError::Validation(reason) => ApiError::BadRequest(reason.to_string()),
            ToDoError::Storage(cause) => ApiError::Internal(cause),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(cause) = &self {
            #[cfg(feature = "tracing")]
            error!(error = %cause, "Request failed in storage");
            #[cfg(not(feature = "tracing"))]
            let _ = cause;
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
