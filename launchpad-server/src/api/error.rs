//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use launchpad_engine::{ProvisionError, RunFailure};

use crate::service::provision_service::ProvisionServiceError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    RunFailed(Box<RunFailure>),
    InternalError(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::RunFailed(failure) => status_for(&failure.error),
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the caller
    pub fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::RunFailed(failure) => failure.error.to_string(),
            ApiError::InternalError(msg) => msg.clone(),
        }
    }
}

/// HTTP status for a failed run
pub fn status_for(error: &ProvisionError) -> StatusCode {
    match error {
        ProvisionError::NameConflict { .. } => StatusCode::CONFLICT,
        ProvisionError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        ProvisionError::Cancelled { .. } => StatusCode::SERVICE_UNAVAILABLE,
        ProvisionError::VersionControlFailed(e) if e.is_local() => StatusCode::INTERNAL_SERVER_ERROR,
        ProvisionError::ConfigurationMissing(_)
        | ProvisionError::WorkspaceFailed(_)
        | ProvisionError::InvalidTransition(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ProvisionError::UpstreamRequestFailed(_)
        | ProvisionError::RepositoryCreationFailed(_)
        | ProvisionError::VersionControlFailed(_)
        | ProvisionError::SecretRegistrationFailed(_)
        | ProvisionError::DispatchFailed(_)
        | ProvisionError::ResolutionFailed(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::BadRequest(msg) | ApiError::InternalError(msg) => {
                serde_json::json!({ "error": msg })
            }
            ApiError::RunFailed(failure) => serde_json::json!({
                "error": failure.error.to_string(),
                "kind": failure.error.kind(),
                "last_state": failure.last_state,
                "failed_at": failure.failed_at,
                "slug": failure.run.slug,
            }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<ProvisionServiceError> for ApiError {
    fn from(err: ProvisionServiceError) -> Self {
        match err {
            ProvisionServiceError::ValidationError(msg) => ApiError::BadRequest(msg),
            ProvisionServiceError::RunFailed(failure) => ApiError::RunFailed(failure),
            ProvisionServiceError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use launchpad_core::domain::run::{RunState, TransitionError};

    #[test]
    fn test_illegal_transition_is_a_server_error() {
        let err = ProvisionError::from(TransitionError { from: RunState::Done });
        assert_eq!(status_for(&err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_internal_error_maps_to_500() {
        let err = ApiError::from(ProvisionServiceError::Internal("task panicked".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "task panicked");
    }
}
