//! API server entry point.

use std::sync::Arc;

use api::AppState;
use api::config::Config;
use domain::StateMapping;
use gateway::{GatewayClient, HttpGatewayClient};
use ledger::{InMemoryLedger, Ledger, PostgresLedger};
use metrics_exporter_prometheus::PrometheusHandle;
use reconciliation::CheckoutSettings;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

async fn serve<G, L>(
    addr: String,
    state: AppState<G, L>,
    metrics_handle: PrometheusHandle,
) where
    G: GatewayClient + 'static,
    L: Ledger + 'static,
{
    let app = api::create_app(Arc::new(state), metrics_handle);

    tracing::info!(%addr, "starting API server");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Gateway client, state mapping, exchange rates and checkout settings
    let gateway =
        HttpGatewayClient::new(config.gateway_config()).expect("failed to build gateway client");
    let mapping: StateMapping = config.state_mapping().expect("invalid order state mapping");
    let settings: CheckoutSettings = config.checkout_settings();
    let rates = config.exchange_rates();
    if rates.is_empty() {
        tracing::warn!(
            currency = %config.default_currency,
            "no exchange rates configured, foreign-currency payments will fail"
        );
    }
    tracing::info!(
        merchant_id = %config.gateway_merchant_id,
        payment_action = config.payment_action.as_str(),
        "gateway configured"
    );

    // 4. Ledger: Postgres when configured, in-memory otherwise
    match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .expect("failed to connect to database");
            let ledger = PostgresLedger::new(pool);
            ledger
                .run_migrations()
                .await
                .expect("failed to run migrations");

            tracing::info!("using postgres ledger");
            let state = AppState::new(gateway, ledger, mapping, rates, settings);
            serve(config.addr(), state, metrics_handle).await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, records are kept in memory");
            let state = AppState::new(gateway, InMemoryLedger::new(), mapping, rates, settings);
            serve(config.addr(), state, metrics_handle).await;
        }
    }
}
