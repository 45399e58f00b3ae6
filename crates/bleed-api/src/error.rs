//! Error types for the echo API.
//!
//! [`ApiError`] wraps the core [`EchoError`] taxonomy plus the failure
//! modes that only exist at the HTTP boundary (malformed requests, missing
//! credentials). Its [`IntoResponse`] implementation fixes the status code
//! mapping and the JSON error body shape.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bleed_core::EchoError;
use tracing::error;
use validator::ValidationErrors;

/// Client message used for every persistence failure.
const PERSISTENCE_MESSAGE: &str = "the echo store could not complete the request";

/// Errors returned by API handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A failure raised by the propagation engine.
    #[error(transparent)]
    Echo(#[from] EchoError),

    /// The request could not be decoded or failed validation.
    #[error("invalid request: {0}")]
    BadRequest(String),

    /// A mutating route was called without the configured bearer token.
    #[error("missing or invalid bearer token")]
    Unauthorized,
}

impl ApiError {
    /// Status code and machine-readable kind for this error.
    pub const fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Echo(EchoError::NotFound { .. }) => (StatusCode::NOT_FOUND, "not_found"),
            Self::Echo(EchoError::InvalidStateTransition { .. }) => {
                (StatusCode::CONFLICT, "invalid_state_transition")
            }
            Self::Echo(EchoError::Validation(_)) | Self::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, "validation_failure")
            }
            Self::Echo(EchoError::Persistence(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "persistence_failure")
            }
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.classify();
        let message = match &self {
            Self::Echo(EchoError::Persistence(detail)) => {
                error!(error = %detail, "Echo store failure");
                String::from(PERSISTENCE_MESSAGE)
            }
            other => other.to_string(),
        };

        let body = serde_json::json!({
            "error": {
                "kind": kind,
                "message": message,
            },
            "status": status.as_u16(),
        });

        let mut response = (status, axum::Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::BadRequest(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use bleed_types::{EchoId, EchoStatus};
    use uuid::Uuid;

    use super::*;

    #[test]
    fn core_errors_map_to_status_codes() {
        let conflict = ApiError::from(EchoError::InvalidStateTransition {
            id: EchoId::new(),
            current: EchoStatus::Rejected,
            attempted: EchoStatus::Generating,
        });
        assert_eq!(conflict.classify().0, StatusCode::CONFLICT);

        let missing = ApiError::from(EchoError::not_found("echo", Uuid::now_v7()));
        assert_eq!(missing.classify(), (StatusCode::NOT_FOUND, "not_found"));

        let invalid = ApiError::from(EchoError::Validation(String::from("strength")));
        assert_eq!(invalid.classify().0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn persistence_detail_stays_out_of_the_body() {
        let response =
            ApiError::from(EchoError::Persistence(String::from("relation missing"))).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unauthorized_carries_challenge_header() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(WWW_AUTHENTICATE),
            Some(&HeaderValue::from_static("Bearer"))
        );
    }
}
