//! Response handlers.
//!
//! A handler interprets one aspect of a gateway response against an order:
//! it checks a precondition, books a record or moves the order to a new
//! state. Handlers are combined into chains and run by the
//! [`ResponseProcessor`](crate::ResponseProcessor) strictly in order.

mod payment;
mod refund;
mod risk;
mod status;
mod void;

use domain::{CustomerNotifier, Order, OrderRepository, OrderService};
use gateway::GatewayResponse;
use ledger::Ledger;
use serde::{Deserialize, Serialize};

use crate::HandlerError;

pub use payment::{BROWSER_PAYMENT_BRANDS, brand_label, payer_name, payment_details};
pub(crate) use status::check_transaction_status;

/// What a handler sees besides the order and the response.
pub struct HandlerContext<'a, R, L, N> {
    orders: &'a OrderService<R, L, N>,
    prior_failures: usize,
}

impl<'a, R, L, N> HandlerContext<'a, R, L, N>
where
    R: OrderRepository,
    L: Ledger,
    N: CustomerNotifier,
{
    pub fn new(orders: &'a OrderService<R, L, N>, prior_failures: usize) -> Self {
        Self {
            orders,
            prior_failures,
        }
    }

    pub fn orders(&self) -> &'a OrderService<R, L, N> {
        self.orders
    }

    pub fn ledger(&self) -> &'a L {
        self.orders.ledger()
    }

    /// True iff an earlier handler of the same run failed.
    pub fn has_prior_failures(&self) -> bool {
        self.prior_failures > 0
    }
}

/// The closed set of response handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseHandler {
    /// Fails unless the order may be acted on and the gateway approved.
    TransactionStatus,
    /// Books the customer's payment from a retrieved order.
    OrderPayment,
    /// Books a captured payment.
    Capture,
    /// Drops the voided authorization and records the void.
    Void,
    /// Records a refund; a failed status check only skips the record.
    Refund,
    /// Moves the order to the state the response status leads to, or to
    /// `ERROR` when something failed before.
    OrderStatus,
    /// Moves the order according to the risk assessment.
    Risk,
    /// Moves the order after an admin action unless something failed.
    ActionStatus,
}

impl ResponseHandler {
    pub fn name(&self) -> &'static str {
        match self {
            ResponseHandler::TransactionStatus => "transaction_status",
            ResponseHandler::OrderPayment => "order_payment",
            ResponseHandler::Capture => "capture",
            ResponseHandler::Void => "void",
            ResponseHandler::Refund => "refund",
            ResponseHandler::OrderStatus => "order_status",
            ResponseHandler::Risk => "risk",
            ResponseHandler::ActionStatus => "action_status",
        }
    }

    /// Applies the handler to an order.
    pub async fn handle<R, L, N>(
        &self,
        ctx: &HandlerContext<'_, R, L, N>,
        order: &mut Order,
        response: &GatewayResponse,
    ) -> Result<(), HandlerError>
    where
        R: OrderRepository,
        L: Ledger,
        N: CustomerNotifier,
    {
        match self {
            ResponseHandler::TransactionStatus => {
                check_transaction_status(ctx, order, response)?;
                Ok(())
            }
            ResponseHandler::OrderPayment => payment::order_payment(ctx, order, response).await,
            ResponseHandler::Capture => payment::capture(ctx, order, response).await,
            ResponseHandler::Void => void::void(ctx, order, response).await,
            ResponseHandler::Refund => refund::refund(ctx, order, response).await,
            ResponseHandler::OrderStatus => status::order_status(ctx, order, response).await,
            ResponseHandler::Risk => risk::risk(ctx, order, response).await,
            ResponseHandler::ActionStatus => status::action_status(ctx, order, response).await,
        }
    }
}

impl std::fmt::Display for ResponseHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Chain run on the customer's return from the hosted checkout.
pub const CHECKOUT_CHAIN: &[ResponseHandler] = &[
    ResponseHandler::Risk,
    ResponseHandler::OrderPayment,
    ResponseHandler::OrderStatus,
];

/// Chain run after voiding an authorization.
pub const VOID_CHAIN: &[ResponseHandler] = &[
    ResponseHandler::TransactionStatus,
    ResponseHandler::Void,
    ResponseHandler::ActionStatus,
];

/// Chain run after capturing an authorization.
pub const CAPTURE_CHAIN: &[ResponseHandler] = &[
    ResponseHandler::Capture,
    ResponseHandler::TransactionStatus,
    ResponseHandler::ActionStatus,
];

/// Chain run after a full refund.
pub const REFUND_CHAIN: &[ResponseHandler] = &[
    ResponseHandler::TransactionStatus,
    ResponseHandler::Refund,
    ResponseHandler::ActionStatus,
];

/// Chain run after a credit-note refund; the caller books the record.
pub const CREDIT_NOTE_CHAIN: &[ResponseHandler] = &[
    ResponseHandler::TransactionStatus,
    ResponseHandler::ActionStatus,
];

/// Gateway code of a response for failure messages.
pub(crate) fn code_of(response: &GatewayResponse) -> String {
    response.gateway_code().unwrap_or("UNKNOWN").to_string()
}
