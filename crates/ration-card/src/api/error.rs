use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use super::auth::AuthError;
use crate::access::AccessError;
use crate::cards::CardError;
use crate::tokens::{DistributionError, LedgerError};
use crate::users::DirectoryError;

/// Failure of a single API request, rendered as `{"error": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Card(#[from] CardError),
    #[error(transparent)]
    Distribution(#[from] DistributionError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Payload(#[from] JsonRejection),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(AuthError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Access(_) => StatusCode::FORBIDDEN,
            ApiError::Card(err) => match err {
                CardError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CardError::Conflict | CardError::InvalidState(_) => StatusCode::CONFLICT,
                CardError::NotFound => StatusCode::NOT_FOUND,
                CardError::Numbering(_) => StatusCode::INTERNAL_SERVER_ERROR,
                CardError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            ApiError::Distribution(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Directory(_) | ApiError::Ledger(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Payload(rejection) => rejection.status(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        }

        let message = match &self {
            ApiError::Payload(rejection) => rejection.body_text(),
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
