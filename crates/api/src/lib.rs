//! HTTP API server for the payment reconciliation pipeline.
//!
//! Exposes the back-office payment actions (void, capture, refund, credit
//! notes), the hosted checkout flow and the local copy of host orders, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use gateway::GatewayClient;
use ledger::Ledger;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<G, L>(state: Arc<AppState<G, L>>, metrics_handle: PrometheusHandle) -> Router
where
    G: GatewayClient + 'static,
    L: Ledger + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/orders", post(routes::orders::upsert::<G, L>))
        .route("/orders/{id}", get(routes::orders::get::<G, L>))
        .route("/orders/{id}/history", get(routes::orders::history::<G, L>))
        .route("/orders/{id}/actions", get(routes::orders::actions::<G, L>))
        .route("/orders/{id}/void", post(routes::orders::void::<G, L>))
        .route("/orders/{id}/capture", post(routes::orders::capture::<G, L>))
        .route("/orders/{id}/refund", post(routes::orders::refund::<G, L>))
        .route(
            "/orders/{id}/credit-notes",
            post(routes::orders::credit_note::<G, L>),
        )
        .route(
            "/checkout/sessions",
            post(routes::checkout::create_session::<G, L>),
        )
        .route("/checkout/return", get(routes::checkout::complete::<G, L>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
