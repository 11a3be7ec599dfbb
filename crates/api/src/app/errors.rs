use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use thiserror::Error;

use carkeeper_auth::{PasswordError, TokenError};
use carkeeper_configurator::ConfiguratorError;
use carkeeper_core::DomainError;
use carkeeper_infra::StoreError;
use carkeeper_orders::OrderError;
use carkeeper_servicing::BookingError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Every way a request can be rejected by the service layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidStatus(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// The entity exists but its state does not allow the operation.
    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) | ServiceError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::InvalidState(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation_error",
            ServiceError::InvalidStatus(_) => "invalid_status",
            ServiceError::Unauthenticated(_) => "unauthorized",
            ServiceError::Forbidden(_) => "forbidden",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::InvalidState(_) => "invalid_state",
            ServiceError::Internal(_) => "internal_error",
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => ServiceError::Validation(msg),
        }
    }
}

impl From<ConfiguratorError> for ServiceError {
    fn from(e: ConfiguratorError) -> Self {
        match e {
            ConfiguratorError::InvalidStatus(_) => ServiceError::InvalidStatus(e.to_string()),
            ConfiguratorError::InvalidState { .. } => ServiceError::InvalidState(e.to_string()),
        }
    }
}

impl From<OrderError> for ServiceError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::InvalidStatus(_) => ServiceError::InvalidStatus(e.to_string()),
            OrderError::NotOrderable(_) => ServiceError::InvalidState(e.to_string()),
        }
    }
}

impl From<BookingError> for ServiceError {
    fn from(e: BookingError) -> Self {
        match e {
            BookingError::NotCarOwner => ServiceError::Forbidden(e.to_string()),
            BookingError::BranchInactive
            | BookingError::NoServiceTypes
            | BookingError::ServiceTypeUnavailable(_) => ServiceError::Validation(e.to_string()),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(msg) => ServiceError::Conflict(msg),
            StoreError::Reference(msg) => ServiceError::Validation(msg),
            StoreError::Corrupt(_) | StoreError::Backend(_) => {
                tracing::error!(error = %e, "storage failure");
                ServiceError::Internal("internal server error".to_string())
            }
        }
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(e: JsonRejection) -> Self {
        ServiceError::Validation(format!("invalid request body: {}", e.body_text()))
    }
}

impl From<PasswordError> for ServiceError {
    fn from(e: PasswordError) -> Self {
        tracing::error!(error = %e, "password hashing failed");
        ServiceError::Internal("internal server error".to_string())
    }
}

impl From<TokenError> for ServiceError {
    fn from(e: TokenError) -> Self {
        tracing::error!(error = %e, "token issuing failed");
        ServiceError::Internal("internal server error".to_string())
    }
}

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    json_error(err.status(), err.code(), err.to_string())
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        service_error_to_response(self)
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "success": false,
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use carkeeper_configurator::ConfigurationStatus;

    #[test]
    fn lifecycle_errors_map_to_distinct_statuses() {
        let invalid_status: ServiceError = ConfiguratorError::InvalidStatus("unknown".into()).into();
        assert_eq!(invalid_status.status(), StatusCode::BAD_REQUEST);
        assert_eq!(invalid_status.code(), "invalid_status");

        let invalid_state: ServiceError = ConfiguratorError::InvalidState {
            action: "delete",
            status: ConfigurationStatus::Confirmed,
        }
        .into();
        assert_eq!(invalid_state.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(invalid_state.code(), "invalid_state");
    }

    #[test]
    fn backend_details_are_not_leaked() {
        let err: ServiceError = StoreError::Backend("connection refused to 10.0.0.3".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.to_string().contains("10.0.0.3"));
    }

    #[test]
    fn car_ownership_is_forbidden_not_invalid() {
        let err: ServiceError = BookingError::NotCarOwner.into();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }
}
