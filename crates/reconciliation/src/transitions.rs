//! Gateway outcome to order state tables.

use domain::OrderState;

/// Order state a gateway lifecycle status leads to.
///
/// Returns None for statuses outside the table; the terminal status handler
/// treats those as an inconsistency and moves the order to `ERROR`.
pub fn status_target(status: &str) -> Option<OrderState> {
    match status {
        "AUTHORIZED" => Some(OrderState::Authorized),
        "CAPTURED" => Some(OrderState::PaymentAccepted),
        "VOID_AUTHORIZATION" | "CANCELLED" => Some(OrderState::Canceled),
        "REFUNDED" => Some(OrderState::Refunded),
        "PARTIALLY_REFUNDED" => Some(OrderState::PartiallyRefunded),
        _ => None,
    }
}

/// Order state a risk assessment leads to, if any.
pub fn risk_target(gateway_code: Option<&str>, decision: Option<&str>) -> Option<OrderState> {
    match gateway_code? {
        "REVIEW_REQUIRED" => match decision? {
            "PENDING" => Some(OrderState::ReviewRequired),
            "ACCEPTED" => Some(OrderState::AwaitingPayment),
            "REJECTED" => Some(OrderState::Fraud),
            _ => None,
        },
        "REJECTED" => Some(OrderState::Fraud),
        _ => None,
    }
}
