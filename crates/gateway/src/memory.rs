use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use common::{Currency, Money};
use tokio::sync::RwLock;

use crate::{
    CheckoutSession, CheckoutSessionRequest, GatewayClient, GatewayError, GatewayResponse,
    OrderSummary, ResponseCode, Result, SessionInfo, SourceOfFunds, TransactionDetail,
    Transactions,
};

/// Gateway operations, used to script responses and inspect calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    RetrieveOrder,
    Void,
    Capture,
    Refund,
    CreateSession,
}

/// A call received by the in-memory gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    RetrieveOrder {
        order_ref: String,
    },
    Void {
        order_ref: String,
        transaction_id: String,
    },
    Capture {
        order_ref: String,
        amount: Money,
        currency: Currency,
    },
    Refund {
        order_ref: String,
        amount: Money,
        currency: Currency,
    },
    CreateSession {
        request: Box<CheckoutSessionRequest>,
    },
}

#[derive(Default)]
struct GatewayState {
    orders: HashMap<String, GatewayResponse>,
    scripted: HashMap<Operation, VecDeque<Result<GatewayResponse>>>,
    calls: Vec<GatewayCall>,
    sequence: u64,
}

impl GatewayState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.sequence += 1;
        format!("{}-{}", prefix, self.sequence)
    }

    fn scripted(&mut self, operation: Operation) -> Option<Result<GatewayResponse>> {
        self.scripted.get_mut(&operation)?.pop_front()
    }

    /// Instrument of the registered order, card when unknown.
    fn source_of_funds(&self, order_ref: &str) -> SourceOfFunds {
        self.orders
            .get(order_ref)
            .and_then(|order| {
                order
                    .transactions()
                    .iter()
                    .rev()
                    .find_map(|txn| txn.source_of_funds.clone())
                    .or_else(|| order.source_of_funds.clone())
            })
            .unwrap_or_else(|| SourceOfFunds {
                kind: Some("CARD".to_string()),
                ..Default::default()
            })
    }
}

/// In-memory gateway for testing.
///
/// Orders are registered up front with [`with_order`](Self::with_order).
/// Transaction operations answer with an approved response unless a
/// response (or error) was scripted for that operation; scripted outcomes
/// are consumed in order.
#[derive(Clone, Default)]
pub struct InMemoryGateway {
    state: Arc<RwLock<GatewayState>>,
}

impl InMemoryGateway {
    /// Creates a new in-memory gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the document returned when an order is retrieved.
    pub async fn with_order(self, order_ref: impl Into<String>, order: GatewayResponse) -> Self {
        self.state.write().await.orders.insert(order_ref.into(), order);
        self
    }

    /// Queues the outcome of the next call to `operation`.
    pub async fn script(&self, operation: Operation, outcome: Result<GatewayResponse>) {
        self.state
            .write()
            .await
            .scripted
            .entry(operation)
            .or_default()
            .push_back(outcome);
    }

    /// Returns every call received so far.
    pub async fn calls(&self) -> Vec<GatewayCall> {
        self.state.read().await.calls.clone()
    }

    /// Returns how many calls were made to one operation.
    pub async fn call_count(&self, operation: Operation) -> usize {
        self.state
            .read()
            .await
            .calls
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    fn approved(
        id: String,
        kind: &str,
        amount: Money,
        currency: Option<Currency>,
        target: Option<&str>,
        status: &str,
        source_of_funds: SourceOfFunds,
    ) -> GatewayResponse {
        GatewayResponse {
            result: Some("SUCCESS".to_string()),
            response: Some(ResponseCode {
                gateway_code: Some("APPROVED".to_string()),
            }),
            order: Some(OrderSummary {
                status: Some(status.to_string()),
                ..Default::default()
            }),
            transaction: Some(Transactions::Single(TransactionDetail {
                id: Some(id),
                amount: Some(amount),
                currency,
                kind: Some(kind.to_string()),
                target_transaction_id: target.map(str::to_string),
            })),
            source_of_funds: Some(source_of_funds),
            ..Default::default()
        }
    }
}

impl GatewayCall {
    pub fn operation(&self) -> Operation {
        match self {
            GatewayCall::RetrieveOrder { .. } => Operation::RetrieveOrder,
            GatewayCall::Void { .. } => Operation::Void,
            GatewayCall::Capture { .. } => Operation::Capture,
            GatewayCall::Refund { .. } => Operation::Refund,
            GatewayCall::CreateSession { .. } => Operation::CreateSession,
        }
    }
}

#[async_trait]
impl GatewayClient for InMemoryGateway {
    async fn retrieve_order(&self, order_ref: &str) -> Result<GatewayResponse> {
        let mut state = self.state.write().await;
        state.calls.push(GatewayCall::RetrieveOrder {
            order_ref: order_ref.to_string(),
        });

        if let Some(outcome) = state.scripted(Operation::RetrieveOrder) {
            return outcome;
        }

        state
            .orders
            .get(order_ref)
            .cloned()
            .ok_or_else(|| GatewayError::Client {
                status: 400,
                message: format!("INVALID_REQUEST: Unable to find order {}", order_ref),
            })
    }

    async fn void(&self, order_ref: &str, transaction_id: &str) -> Result<GatewayResponse> {
        let mut state = self.state.write().await;
        state.calls.push(GatewayCall::Void {
            order_ref: order_ref.to_string(),
            transaction_id: transaction_id.to_string(),
        });

        if let Some(outcome) = state.scripted(Operation::Void) {
            return outcome;
        }

        let order = state.orders.get(order_ref);
        let amount = order.and_then(|o| o.amount).unwrap_or_default();
        let currency = order.and_then(|o| o.currency.clone());
        let source = state.source_of_funds(order_ref);
        let id = state.next_id("void");

        Ok(Self::approved(
            id,
            "VOID_AUTHORIZATION",
            amount,
            currency,
            Some(transaction_id),
            "CANCELLED",
            source,
        ))
    }

    async fn capture(
        &self,
        order_ref: &str,
        amount: Money,
        currency: &Currency,
    ) -> Result<GatewayResponse> {
        let mut state = self.state.write().await;
        state.calls.push(GatewayCall::Capture {
            order_ref: order_ref.to_string(),
            amount,
            currency: currency.clone(),
        });

        if let Some(outcome) = state.scripted(Operation::Capture) {
            return outcome;
        }

        let source = state.source_of_funds(order_ref);
        let id = state.next_id("capture");
        Ok(Self::approved(
            id,
            "CAPTURE",
            amount,
            Some(currency.clone()),
            None,
            "CAPTURED",
            source,
        ))
    }

    async fn refund(
        &self,
        order_ref: &str,
        amount: Money,
        currency: &Currency,
    ) -> Result<GatewayResponse> {
        let mut state = self.state.write().await;
        state.calls.push(GatewayCall::Refund {
            order_ref: order_ref.to_string(),
            amount,
            currency: currency.clone(),
        });

        if let Some(outcome) = state.scripted(Operation::Refund) {
            return outcome;
        }

        let partial = state
            .orders
            .get(order_ref)
            .and_then(|o| o.amount)
            .is_some_and(|total| amount < total);
        let status = if partial {
            "PARTIALLY_REFUNDED"
        } else {
            "REFUNDED"
        };
        let source = state.source_of_funds(order_ref);
        let id = state.next_id("refund");

        Ok(Self::approved(
            id,
            "REFUND",
            amount,
            Some(currency.clone()),
            None,
            status,
            source,
        ))
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession> {
        let mut state = self.state.write().await;
        state.calls.push(GatewayCall::CreateSession {
            request: Box::new(request.clone()),
        });

        if let Some(outcome) = state.scripted(Operation::CreateSession) {
            outcome?;
        }

        let id = state.next_id("SESSION");
        let indicator = state.next_id("indicator");
        Ok(CheckoutSession {
            session: SessionInfo {
                id,
                version: "1".to_string(),
            },
            success_indicator: indicator,
        })
    }
}
