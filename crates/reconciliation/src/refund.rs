//! Refund orchestration.

use std::sync::Arc;

use common::Money;
use domain::{CustomerNotifier, Order, OrderRepository};
use gateway::{GatewayClient, GatewayResponse};
use ledger::Ledger;

use crate::handlers::ResponseHandler;
use crate::{PaymentFailure, ResponseProcessor, Result};

/// Refunds an order's authorized funds and runs the response through a
/// handler chain.
///
/// The service does not book refund records itself: callers choose a chain
/// that does, or book the record from the returned response when they need
/// to link it to something the chain can't see, such as a credit note.
pub struct RefundService<G, R, L, N> {
    gateway: Arc<G>,
    processor: ResponseProcessor<R, L, N>,
    order_prefix: String,
}

impl<G, R, L, N> Clone for RefundService<G, R, L, N> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            processor: self.processor.clone(),
            order_prefix: self.order_prefix.clone(),
        }
    }
}

impl<G, R, L, N> RefundService<G, R, L, N>
where
    G: GatewayClient,
    R: OrderRepository,
    L: Ledger,
    N: CustomerNotifier,
{
    pub fn new(
        gateway: Arc<G>,
        processor: ResponseProcessor<R, L, N>,
        order_prefix: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            processor,
            order_prefix: order_prefix.into(),
        }
    }

    /// Refunds `amount`, or the whole authorized amount when None.
    ///
    /// Fails with "Authorization transaction not found." when the gateway
    /// has no authorization for the order. Gateway errors propagate as they
    /// are; handler failures come back as one aggregate failure.
    #[tracing::instrument(skip(self, order, handlers), fields(order_id = %order.id))]
    pub async fn execute(
        &self,
        order: &mut Order,
        handlers: &[ResponseHandler],
        amount: Option<Money>,
    ) -> Result<GatewayResponse> {
        let order_ref = order.gateway_reference(&self.order_prefix);

        let authorization = self
            .gateway
            .retrieve_authorization_transaction(&order_ref)
            .await?
            .ok_or(PaymentFailure::AuthorizationNotFound)?;

        let amount = amount.unwrap_or(authorization.amount);
        tracing::info!(%order_ref, amount = %amount, currency = %authorization.currency, "Refunding order");

        let response = match self
            .gateway
            .refund(&order_ref, amount, &authorization.currency)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                metrics::counter!("refunds_total", "outcome" => "gateway_error").increment(1);
                return Err(e.into());
            }
        };

        let result = self.processor.process(order, &response, handlers).await;
        let outcome = if result.is_ok() { "ok" } else { "failed" };
        metrics::counter!("refunds_total", "outcome" => outcome).increment(1);
        result?;

        Ok(response)
    }
}
