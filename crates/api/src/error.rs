//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use gateway::GatewayError;
use reconciliation::ReconciliationError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Reconciliation failure or gateway error.
    Reconciliation(ReconciliationError),
    /// Domain error outside a reconciliation run.
    Domain(DomainError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Reconciliation(err) => reconciliation_error_to_response(err),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn reconciliation_error_to_response(err: ReconciliationError) -> (StatusCode, String) {
    match &err {
        ReconciliationError::Payment(_) | ReconciliationError::Aggregate(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
        }
        ReconciliationError::Gateway(gateway_err) => match gateway_err {
            GatewayError::Client { .. } | GatewayError::InvalidResponse(_) => {
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
            GatewayError::Server { .. } | GatewayError::Transport(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
        },
        ReconciliationError::Domain(DomainError::OrderNotFound(_)) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        _ => {
            tracing::error!(error = %err, "reconciliation error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::OrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::UnmappedState(_) | DomainError::DuplicateStateId { .. } => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl From<ReconciliationError> for ApiError {
    fn from(err: ReconciliationError) -> Self {
        ApiError::Reconciliation(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

#[cfg(test)]
mod tests {
    use common::OrderId;
    use reconciliation::PaymentFailure;

    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(ReconciliationError::from(PaymentFailure::FraudBlocked).into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(
                ReconciliationError::from(GatewayError::Client {
                    status: 400,
                    message: "INVALID_REQUEST: bad".to_string()
                })
                .into()
            ),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(ReconciliationError::from(GatewayError::Transport("reset".to_string())).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(ReconciliationError::from(DomainError::OrderNotFound(OrderId::new(9))).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(DomainError::Notification("smtp down".to_string()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
