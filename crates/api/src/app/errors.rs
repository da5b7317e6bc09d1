use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use storefront_core::DomainError;
use storefront_infra::store::StoreError;

use crate::app::services::ServiceError;

/// Map a service failure to its HTTP response.
///
/// Validation messages go to the client verbatim; backend messages do not.
pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(DomainError::Validation(msg)) => {
            json_error(StatusCode::BAD_REQUEST, msg)
        }
        ServiceError::Domain(DomainError::InvalidId(msg)) => {
            json_error(StatusCode::BAD_REQUEST, msg)
        }
        ServiceError::Domain(DomainError::NotFound) | ServiceError::Store(StoreError::NotFound) => {
            json_error(StatusCode::NOT_FOUND, "not found")
        }
        ServiceError::Domain(DomainError::InvariantViolation(msg)) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, msg)
        }
        ServiceError::Domain(DomainError::Conflict(msg)) => {
            json_error(StatusCode::CONFLICT, msg)
        }
        ServiceError::Store(StoreError::Backend(msg)) => {
            tracing::error!(error = %msg, "store backend failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage failure")
        }
        ServiceError::Gateway(e) => {
            tracing::warn!(error = %e, "gateway failure");
            json_error(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": message.into(),
        })),
    )
        .into_response()
}
