//! Hosted checkout endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use common::CartId;
use domain::OrderRepository;
use gateway::{CheckoutSession, GatewayClient};
use ledger::Ledger;
use reconciliation::Cart;
use serde::Deserialize;

use crate::error::ApiError;
use crate::routes::orders::{ActionResponse, action_response};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReturnQuery {
    /// Gateway order reference sent back by the payment page.
    pub order_ref: String,
}

/// POST /checkout/sessions: Opens a hosted payment page for a cart.
#[tracing::instrument(skip(state, cart), fields(cart_id = %cart.id))]
pub async fn create_session<G: GatewayClient + 'static, L: Ledger + 'static>(
    State(state): State<Arc<AppState<G, L>>>,
    Json(cart): Json<Cart>,
) -> Result<(StatusCode, Json<CheckoutSession>), ApiError> {
    let session = state.checkout.create_session(&cart).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /checkout/return: Books the payment once the customer is back.
#[tracing::instrument(skip(state))]
pub async fn complete<G: GatewayClient + 'static, L: Ledger + 'static>(
    State(state): State<Arc<AppState<G, L>>>,
    Query(query): Query<ReturnQuery>,
) -> Result<Json<ActionResponse>, ApiError> {
    let prefix = state.checkout.settings().order_prefix.as_str();
    let cart_id = query
        .order_ref
        .strip_prefix(prefix)
        .and_then(|id| id.parse::<i64>().ok())
        .map(CartId::new)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid data (order): {}", query.order_ref)))?;

    let order = state
        .orders
        .orders()
        .find_by_cart(cart_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No order for cart {cart_id}")))?;

    let outcome = state.checkout.complete(order.id, &query.order_ref).await?;
    Ok(Json(action_response(&state.orders, &outcome)))
}
