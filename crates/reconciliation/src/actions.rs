//! Back-office payment actions on authorized orders.

use std::sync::Arc;

use common::{Money, OrderId};
use domain::{CustomerNotifier, Order, OrderRepository, OrderService, OrderState};
use gateway::{GatewayClient, GatewayResponse};
use ledger::{Ledger, LedgerExt, PaymentRecord, RefundRecord, VoidRecord};
use serde::{Deserialize, Serialize};

use crate::handlers::{CAPTURE_CHAIN, CREDIT_NOTE_CHAIN, REFUND_CHAIN, VOID_CHAIN};
use crate::{PaymentFailure, RefundService, ResponseProcessor, Result};

/// A credit note issued by the merchant, as far as refunds care.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditNote {
    pub id: i64,
    pub order_id: OrderId,
    /// Products total, tax included.
    pub products_total: Money,
    /// Shipping total, tax included.
    pub shipping_total: Money,
}

impl CreditNote {
    /// Amount to give back to the customer.
    pub fn amount(&self) -> Money {
        self.products_total + self.shipping_total
    }
}

/// Result of an admin action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    /// The order after the response was processed.
    pub order: Order,
    pub response: GatewayResponse,
}

/// Which actions the back office may offer for an order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AvailableActions {
    pub can_void: bool,
    pub can_capture: bool,
    pub can_refund: bool,
    pub can_partial_refund: bool,
    pub can_review: bool,
    pub refunds: Vec<RefundRecord>,
    pub voids: Vec<VoidRecord>,
}

impl AvailableActions {
    /// True if any payment action can be taken.
    pub fn any(&self) -> bool {
        self.can_void || self.can_capture || self.can_refund || self.can_partial_refund
    }
}

/// Void, capture and refund of gateway payments.
pub struct PaymentActions<G, R, L, N> {
    gateway: Arc<G>,
    orders: Arc<OrderService<R, L, N>>,
    processor: ResponseProcessor<R, L, N>,
    refunds: RefundService<G, R, L, N>,
    order_prefix: String,
}

impl<G, R, L, N> PaymentActions<G, R, L, N>
where
    G: GatewayClient,
    R: OrderRepository,
    L: Ledger,
    N: CustomerNotifier,
{
    /// Creates the actions for orders referenced as `order_prefix + cart id`.
    pub fn new(
        gateway: Arc<G>,
        orders: Arc<OrderService<R, L, N>>,
        order_prefix: impl Into<String>,
    ) -> Self {
        let order_prefix = order_prefix.into();
        let processor = ResponseProcessor::new(Arc::clone(&orders));
        let refunds = RefundService::new(Arc::clone(&gateway), processor.clone(), &order_prefix);
        Self {
            gateway,
            orders,
            processor,
            refunds,
            order_prefix,
        }
    }

    pub fn refunds(&self) -> &RefundService<G, R, L, N> {
        &self.refunds
    }

    async fn load(&self, order_id: OrderId) -> Result<Order> {
        let order = self.orders.require_order(order_id).await?;
        if !order.is_paid_through_gateway() {
            return Err(PaymentFailure::NotPaidThroughGateway.into());
        }
        Ok(order)
    }

    /// The local record of the gateway's authorization for an order.
    async fn authorization(&self, order: &Order, order_ref: &str) -> Result<PaymentRecord> {
        let authorization = self
            .gateway
            .retrieve_authorization_transaction(order_ref)
            .await?
            .ok_or(PaymentFailure::AuthorizationNotFound)?;

        let payment = self
            .orders
            .ledger()
            .find_payment(order.id, &authorization.id)
            .await?
            .ok_or(PaymentFailure::AuthorizationNotFound)?;

        Ok(payment)
    }

    /// Voids the authorization of an order.
    #[tracing::instrument(skip(self))]
    pub async fn void(&self, order_id: OrderId) -> Result<ActionOutcome> {
        let mut order = self.load(order_id).await?;
        let order_ref = order.gateway_reference(&self.order_prefix);
        let payment = self.authorization(&order, &order_ref).await?;

        let response = self
            .gateway
            .void(&order_ref, &payment.transaction_id)
            .await?;
        self.processor
            .process(&mut order, &response, VOID_CHAIN)
            .await?;

        tracing::info!(order_id = %order.id, "Order voided");
        Ok(ActionOutcome { order, response })
    }

    /// Captures the authorized amount of an order.
    ///
    /// The authorization record is removed once the capture is booked.
    #[tracing::instrument(skip(self))]
    pub async fn capture(&self, order_id: OrderId) -> Result<ActionOutcome> {
        let mut order = self.load(order_id).await?;
        let order_ref = order.gateway_reference(&self.order_prefix);
        let payment = self.authorization(&order, &order_ref).await?;

        let response = self
            .gateway
            .capture(&order_ref, payment.amount, &payment.currency)
            .await?;
        self.processor
            .process(&mut order, &response, CAPTURE_CHAIN)
            .await?;

        self.orders.ledger().delete_payment(payment.id).await?;

        tracing::info!(order_id = %order.id, amount = %payment.amount, "Order captured");
        Ok(ActionOutcome { order, response })
    }

    /// Refunds the whole authorized amount of an order.
    #[tracing::instrument(skip(self))]
    pub async fn refund(&self, order_id: OrderId) -> Result<ActionOutcome> {
        let mut order = self.load(order_id).await?;
        let response = self.refunds.execute(&mut order, REFUND_CHAIN, None).await?;

        tracing::info!(order_id = %order.id, "Order refunded");
        Ok(ActionOutcome { order, response })
    }

    /// Refunds the amount of a credit note.
    ///
    /// Does nothing (and returns None) for orders paid with another module or
    /// when the merchant did not ask to give the money back. On success the
    /// refund is recorded with a link to the credit note; on failure nothing
    /// is recorded and the error is returned so the host can discard the
    /// credit note.
    #[tracing::instrument(skip(self, note), fields(order_id = %note.order_id, credit_note_id = note.id))]
    pub async fn refund_credit_note(
        &self,
        note: &CreditNote,
        withdraw_to_customer: bool,
    ) -> Result<Option<RefundRecord>> {
        let mut order = self.orders.require_order(note.order_id).await?;

        if !order.is_paid_through_gateway() || !withdraw_to_customer {
            return Ok(None);
        }

        let amount = note.amount();
        let response = self
            .refunds
            .execute(&mut order, CREDIT_NOTE_CHAIN, Some(amount))
            .await?;

        let transaction_id = response
            .transaction()
            .and_then(|t| t.id.clone())
            .ok_or(PaymentFailure::IncompleteResponse("transaction.id"))?;

        let record = RefundRecord::new(order.id, transaction_id, amount).with_credit_note(note.id);
        self.orders.ledger().append_refund(record.clone()).await?;

        tracing::info!(amount = %amount, "Credit note refunded");
        Ok(Some(record))
    }

    /// Works out which actions apply to an order in its current state.
    pub async fn available_actions(&self, order_id: OrderId) -> Result<AvailableActions> {
        let order = self.orders.require_order(order_id).await?;
        if !order.is_paid_through_gateway() {
            return Ok(AvailableActions::default());
        }

        let ledger = self.orders.ledger();
        let refunds = ledger.refunds_for_order(order.id).await?;
        let voids = ledger.voids_for_order(order.id).await?;
        let has_full_refund = ledger.has_full_refund(order.id).await?;

        let authorized = self.orders.is_in(&order, OrderState::Authorized);
        let paid = self.orders.is_in(&order, OrderState::PaymentAccepted);
        let partially_refunded = self.orders.is_in(&order, OrderState::PartiallyRefunded);

        Ok(AvailableActions {
            can_void: authorized,
            can_capture: authorized,
            can_refund: paid && refunds.is_empty(),
            can_partial_refund: (paid || partially_refunded) && !has_full_refund,
            can_review: self.orders.is_in(&order, OrderState::ReviewRequired),
            refunds,
            voids,
        })
    }
}
