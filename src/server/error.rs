//! Mapping of engine failures onto HTTP responses.
//!
//! Every error body has the shape `{"error": <kind>, "message": <text>}`.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::error::{EngineError, ValidationError};
use crate::store::StoreErrorKind;

/// Errors returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The request body or query string could not be decoded.
    #[error("{0}")]
    BadRequest(String),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Engine(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Engine(EngineError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, "validation_error")
            }
            ApiError::Engine(EngineError::ClaimInFlight { .. }) => {
                (StatusCode::CONFLICT, "request_in_progress")
            }
            ApiError::Engine(EngineError::Store(e)) => match e.kind {
                StoreErrorKind::Timeout => (StatusCode::GATEWAY_TIMEOUT, "outcome_unknown"),
                StoreErrorKind::Unavailable => {
                    (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
                }
                StoreErrorKind::WrongType | StoreErrorKind::InvalidValue => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "store_error")
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        if status.is_server_error() {
            error!(error = %self, kind, "Request failed");
        } else {
            warn!(error = %self, kind, "Request rejected");
        }

        let body = Json(ErrorResponse {
            error: kind,
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    fn status(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn maps_engine_errors_to_statuses() {
        assert_eq!(status(ValidationError::NoScopes), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(EngineError::ClaimInFlight {
                key: "k".to_string()
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(EngineError::from(StoreError::new(
                "INCREMENT_ONCE",
                "k",
                StoreErrorKind::Timeout
            ))),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status(EngineError::from(StoreError::new(
                "REV_RANGE",
                "k",
                StoreErrorKind::Unavailable
            ))),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status(EngineError::from(StoreError::new(
                "REV_RANGE",
                "k",
                StoreErrorKind::WrongType
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(ApiError::BadRequest("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
    }
}
