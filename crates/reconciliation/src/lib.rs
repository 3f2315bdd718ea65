//! Reconciliation of gateway responses against host orders.
//!
//! Every gateway interaction ends with a response document that has to be
//! turned into bookkeeping:
//! - [`ResponseHandler`]s each interpret one aspect of a response
//! - [`ResponseProcessor`] runs a chain of handlers and aggregates failures
//! - [`RefundService`] refunds an order and processes the result
//! - [`PaymentActions`] drives void, capture and refunds from the back office
//! - [`CheckoutService`] opens hosted checkout sessions and books the return
//!
//! The flows are:
//! 1. Customer return: Risk, then OrderPayment, then OrderStatus
//! 2. Void: TransactionStatus, then Void, then ActionStatus
//! 3. Capture: Capture, then TransactionStatus, then ActionStatus
//! 4. Refund: TransactionStatus, then Refund, then ActionStatus

pub mod actions;
pub mod checkout;
pub mod error;
pub mod handlers;
pub mod processor;
pub mod refund;
pub mod transitions;

pub use actions::{ActionOutcome, AvailableActions, CreditNote, PaymentActions};
pub use checkout::{
    Cart, CartLine, CheckoutService, CheckoutSettings, MerchantDetails, build_session_request,
    line_items,
};
pub use error::{HandlerChainResult, HandlerError, PaymentFailure, ReconciliationError, Result};
pub use handlers::{
    CAPTURE_CHAIN, CHECKOUT_CHAIN, CREDIT_NOTE_CHAIN, HandlerContext, REFUND_CHAIN, ResponseHandler,
    VOID_CHAIN, payment_details,
};
pub use processor::ResponseProcessor;
pub use refund::RefundService;
pub use transitions::{risk_target, status_target};
