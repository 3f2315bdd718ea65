use async_trait::async_trait;
use common::{Currency, Money};
use serde::{Deserialize, Serialize};

use crate::{CheckoutSession, CheckoutSessionRequest, GatewayResponse, Result};

/// The authorization placed on an order's funds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationTransaction {
    /// Gateway transaction id.
    pub id: String,
    pub amount: Money,
    pub currency: Currency,
    /// Gateway code the authorization was answered with.
    pub gateway_code: Option<String>,
}

impl AuthorizationTransaction {
    /// Extracts the authorization from a retrieved order.
    ///
    /// Transaction amount and currency fall back to the order's when the
    /// transaction entry leaves them out.
    pub fn from_order(order: &GatewayResponse) -> Option<Self> {
        let txn = order.authorization_transaction()?;
        let detail = txn.transaction()?;

        Some(Self {
            id: detail.id.clone()?,
            amount: detail.amount.or(order.amount)?,
            currency: detail
                .currency
                .clone()
                .or_else(|| order.currency.clone())?,
            gateway_code: txn.gateway_code().map(str::to_string),
        })
    }
}

/// Operations the reconciliation pipeline needs from the payment gateway.
///
/// All operations address orders by their gateway reference.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Retrieves an order with all of its transactions.
    async fn retrieve_order(&self, order_ref: &str) -> Result<GatewayResponse>;

    /// Voids an authorization.
    async fn void(&self, order_ref: &str, transaction_id: &str) -> Result<GatewayResponse>;

    /// Captures funds held by an authorization.
    async fn capture(
        &self,
        order_ref: &str,
        amount: Money,
        currency: &Currency,
    ) -> Result<GatewayResponse>;

    /// Refunds captured funds.
    async fn refund(
        &self,
        order_ref: &str,
        amount: Money,
        currency: &Currency,
    ) -> Result<GatewayResponse>;

    /// Creates a hosted checkout session.
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession>;

    /// Looks up the authorization transaction of an order.
    ///
    /// Returns None when the order has no authorization.
    async fn retrieve_authorization_transaction(
        &self,
        order_ref: &str,
    ) -> Result<Option<AuthorizationTransaction>> {
        let order = self.retrieve_order(order_ref).await?;
        Ok(AuthorizationTransaction::from_order(&order))
    }
}
