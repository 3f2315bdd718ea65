//! Order and back-office payment action endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{CartId, Currency, Money, OrderId};
use domain::{Order, OrderRepository, OrderState};
use gateway::{GatewayClient, GatewayResponse};
use ledger::{Ledger, RefundRecord, StateHistoryEntry};
use reconciliation::{ActionOutcome, AvailableActions, CreditNote};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::{AppState, Orders};

// -- Request types --

/// An order as the host storefront knows it.
#[derive(Deserialize)]
pub struct UpsertOrderRequest {
    pub id: i64,
    pub cart_id: i64,
    #[serde(default)]
    pub reference: String,
    /// Logical state name, e.g. `AWAITING_PAYMENT`.
    pub state: String,
    pub currency: String,
    pub total_paid: Money,
    #[serde(default)]
    pub total_paid_real: Option<Money>,
    #[serde(default)]
    pub payment_module: Option<String>,
}

#[derive(Deserialize)]
pub struct CreditNoteRequest {
    pub id: i64,
    pub products_total: Money,
    #[serde(default)]
    pub shipping_total: Money,
    #[serde(default = "withdraw_by_default")]
    pub withdraw_to_customer: bool,
}

fn withdraw_by_default() -> bool {
    true
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: i64,
    pub cart_id: i64,
    pub reference: String,
    pub state: Option<&'static str>,
    pub state_id: i64,
    pub currency: String,
    pub total_paid: Money,
    pub total_paid_real: Money,
    pub payment_module: String,
}

#[derive(Serialize)]
pub struct ActionResponse {
    pub order: OrderResponse,
    pub result: Option<String>,
    pub gateway_code: Option<String>,
    pub status: Option<String>,
    pub transaction_id: Option<String>,
}

#[derive(Serialize)]
pub struct CreditNoteResponse {
    pub refund: Option<RefundRecord>,
}

pub(crate) fn order_response<L: Ledger>(orders: &Orders<L>, order: &Order) -> OrderResponse {
    OrderResponse {
        id: order.id.as_i64(),
        cart_id: order.cart_id.as_i64(),
        reference: order.reference.clone(),
        state: orders.state_of(order).map(|s| s.as_str()),
        state_id: order.current_state.as_i64(),
        currency: order.currency.to_string(),
        total_paid: order.total_paid,
        total_paid_real: order.total_paid_real,
        payment_module: order.payment_module.clone(),
    }
}

pub(crate) fn action_response<L: Ledger>(orders: &Orders<L>, outcome: &ActionOutcome) -> ActionResponse {
    let response: &GatewayResponse = &outcome.response;
    ActionResponse {
        order: order_response(orders, &outcome.order),
        result: response.result.clone(),
        gateway_code: response.gateway_code().map(str::to_string),
        status: response.status().map(str::to_string),
        transaction_id: response.transaction().and_then(|t| t.id.clone()),
    }
}

// -- Handlers --

/// POST /orders: Create or replace the local copy of a host order.
#[tracing::instrument(skip(state, req), fields(order_id = req.id))]
pub async fn upsert<G: GatewayClient + 'static, L: Ledger + 'static>(
    State(state): State<Arc<AppState<G, L>>>,
    Json(req): Json<UpsertOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let logical = OrderState::parse(&req.state)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown order state: {}", req.state)))?;
    let currency = Currency::parse(&req.currency)
        .map_err(|e| ApiError::BadRequest(format!("Invalid currency: {e}")))?;

    let mut order = Order::new(
        OrderId::new(req.id),
        CartId::new(req.cart_id),
        state.orders.mapping().id(logical),
        currency,
        req.total_paid,
    )
    .with_reference(req.reference);
    if let Some(paid) = req.total_paid_real {
        order.total_paid_real = paid;
    }
    if let Some(module) = req.payment_module {
        order = order.with_payment_module(module);
    }

    state.orders.orders().save(&order).await?;

    Ok((
        StatusCode::CREATED,
        Json(order_response(&state.orders, &order)),
    ))
}

/// GET /orders/:id
#[tracing::instrument(skip(state))]
pub async fn get<G: GatewayClient + 'static, L: Ledger + 'static>(
    State(state): State<Arc<AppState<G, L>>>,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state
        .orders
        .get_order(OrderId::new(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;

    Ok(Json(order_response(&state.orders, &order)))
}

/// GET /orders/:id/history: State changes, oldest first.
#[tracing::instrument(skip(state))]
pub async fn history<G: GatewayClient + 'static, L: Ledger + 'static>(
    State(state): State<Arc<AppState<G, L>>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<StateHistoryEntry>>, ApiError> {
    let entries = state
        .orders
        .ledger()
        .history_for_order(OrderId::new(id))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(entries))
}

/// GET /orders/:id/actions: Which payment actions apply.
#[tracing::instrument(skip(state))]
pub async fn actions<G: GatewayClient + 'static, L: Ledger + 'static>(
    State(state): State<Arc<AppState<G, L>>>,
    Path(id): Path<i64>,
) -> Result<Json<AvailableActions>, ApiError> {
    let available = state.actions.available_actions(OrderId::new(id)).await?;
    Ok(Json(available))
}

/// POST /orders/:id/void
#[tracing::instrument(skip(state))]
pub async fn void<G: GatewayClient + 'static, L: Ledger + 'static>(
    State(state): State<Arc<AppState<G, L>>>,
    Path(id): Path<i64>,
) -> Result<Json<ActionResponse>, ApiError> {
    let outcome = state.actions.void(OrderId::new(id)).await?;
    Ok(Json(action_response(&state.orders, &outcome)))
}

/// POST /orders/:id/capture
#[tracing::instrument(skip(state))]
pub async fn capture<G: GatewayClient + 'static, L: Ledger + 'static>(
    State(state): State<Arc<AppState<G, L>>>,
    Path(id): Path<i64>,
) -> Result<Json<ActionResponse>, ApiError> {
    let outcome = state.actions.capture(OrderId::new(id)).await?;
    Ok(Json(action_response(&state.orders, &outcome)))
}

/// POST /orders/:id/refund: Refunds the whole authorized amount.
#[tracing::instrument(skip(state))]
pub async fn refund<G: GatewayClient + 'static, L: Ledger + 'static>(
    State(state): State<Arc<AppState<G, L>>>,
    Path(id): Path<i64>,
) -> Result<Json<ActionResponse>, ApiError> {
    let outcome = state.actions.refund(OrderId::new(id)).await?;
    Ok(Json(action_response(&state.orders, &outcome)))
}

/// POST /orders/:id/credit-notes: Refunds a credit note to the customer.
#[tracing::instrument(skip(state, req), fields(credit_note_id = req.id))]
pub async fn credit_note<G: GatewayClient + 'static, L: Ledger + 'static>(
    State(state): State<Arc<AppState<G, L>>>,
    Path(id): Path<i64>,
    Json(req): Json<CreditNoteRequest>,
) -> Result<(StatusCode, Json<CreditNoteResponse>), ApiError> {
    let note = CreditNote {
        id: req.id,
        order_id: OrderId::new(id),
        products_total: req.products_total,
        shipping_total: req.shipping_total,
    };

    let refund = state
        .actions
        .refund_credit_note(&note, req.withdraw_to_customer)
        .await?;
    let status = if refund.is_some() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(CreditNoteResponse { refund })))
}
