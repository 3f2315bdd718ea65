//! Shared application state.

use std::sync::Arc;

use domain::{ExchangeRates, InMemoryOrderRepository, LogNotifier, OrderService, StateMapping};
use gateway::GatewayClient;
use ledger::Ledger;
use reconciliation::{CheckoutService, CheckoutSettings, PaymentActions};

/// Order service over the host order bridge.
pub type Orders<L> = OrderService<InMemoryOrderRepository, L, LogNotifier>;

/// Shared application state accessible from all handlers.
pub struct AppState<G, L> {
    pub orders: Arc<Orders<L>>,
    pub actions: PaymentActions<G, InMemoryOrderRepository, L, LogNotifier>,
    pub checkout: CheckoutService<G, InMemoryOrderRepository, L, LogNotifier>,
}

impl<G, L> AppState<G, L>
where
    G: GatewayClient,
    L: Ledger,
{
    /// Wires the services around one gateway client and one ledger.
    pub fn new(
        gateway: G,
        ledger: L,
        mapping: StateMapping,
        rates: ExchangeRates,
        settings: CheckoutSettings,
    ) -> Self {
        let gateway = Arc::new(gateway);
        let orders = Arc::new(
            OrderService::new(InMemoryOrderRepository::new(), ledger, LogNotifier, mapping)
                .with_exchange_rates(rates),
        );
        let actions = PaymentActions::new(
            Arc::clone(&gateway),
            Arc::clone(&orders),
            settings.order_prefix.as_str(),
        );
        let checkout = CheckoutService::new(gateway, Arc::clone(&orders), settings);

        Self {
            orders,
            actions,
            checkout,
        }
    }
}
