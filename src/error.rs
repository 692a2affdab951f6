//! Typed errors and HTTP mapping.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The addressed resource id does not exist.
    #[error("{0}")]
    NotFound(String),
    /// One or more referential or value violations, already joined into one message.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    BadRequest(String),
    /// Request the body extractors or limits refused (400, 413 or 415).
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("internal: {0}")]
    Internal(String),
}

/// Wire shape of every error response.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub error: String,
    pub message: String,
}

const GENERIC_MESSAGE: &str = "Something went wrong, please try again later.";

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Rejected { status, .. } => *status,
            AppError::Config(_) | AppError::Db(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to hand to the caller; internal failures never leak detail.
    fn public_message(&self) -> String {
        match self {
            AppError::NotFound(m)
            | AppError::Validation(m)
            | AppError::BadRequest(m)
            | AppError::Rejected { message: m, .. } => m.clone(),
            AppError::Config(_) | AppError::Db(_) | AppError::Internal(_) => {
                GENERIC_MESSAGE.to_string()
            }
        }
    }

    pub fn body(&self) -> ErrorBody {
        let status = self.status();
        ErrorBody {
            status_code: status.as_u16(),
            error: status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string(),
            message: self.public_message(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_unprocessable_entity() {
        let body = AppError::Validation("City with ID 4 not found.".into()).body();
        assert_eq!(body.status_code, 422);
        assert_eq!(body.error, "Unprocessable Entity");
        assert_eq!(body.message, "City with ID 4 not found.");
    }

    #[test]
    fn not_found_keeps_message() {
        let body = AppError::NotFound("Student with ID 9 was not found.".into()).body();
        assert_eq!(body.status_code, 404);
        assert_eq!(body.error, "Not Found");
        assert!(body.message.contains("ID 9"));
    }

    #[test]
    fn rejection_keeps_its_status() {
        let body = AppError::Rejected {
            status: StatusCode::UNSUPPORTED_MEDIA_TYPE,
            message: "Expected request with `Content-Type: application/json`".into(),
        }
        .body();
        assert_eq!(body.status_code, 415);
        assert_eq!(body.error, "Unsupported Media Type");
        assert!(body.message.contains("Content-Type"));
    }

    #[test]
    fn internal_detail_is_not_exposed() {
        let body = AppError::Internal("pool exhausted at 10.0.0.3".into()).body();
        assert_eq!(body.status_code, 500);
        assert_eq!(body.message, GENERIC_MESSAGE);
        let body = AppError::Db(sqlx::Error::PoolTimedOut).body();
        assert_eq!(body.status_code, 500);
        assert!(!body.message.contains("pool"));
    }
}
