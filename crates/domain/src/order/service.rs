//! Order service applying payment outcomes to host orders.

use common::{Currency, Money, OrderId};
use ledger::{Ledger, PaymentRecord, StateHistoryEntry};

use super::{CustomerNotifier, Order, OrderRepository, OrderState, StateMapping};
use crate::{DomainError, ExchangeRates, Result};

/// Service for changing order state and booking payments.
///
/// Every state change writes a history entry to the ledger and, when the
/// target state asks for it, notifies the customer.
pub struct OrderService<R, L, N> {
    orders: R,
    ledger: L,
    notifier: N,
    mapping: StateMapping,
    rates: Option<ExchangeRates>,
}

impl<R, L, N> OrderService<R, L, N>
where
    R: OrderRepository,
    L: Ledger,
    N: CustomerNotifier,
{
    /// Creates a new order service.
    pub fn new(orders: R, ledger: L, notifier: N, mapping: StateMapping) -> Self {
        Self {
            orders,
            ledger,
            notifier,
            mapping,
            rates: None,
        }
    }

    /// Sets the rates used to convert foreign-currency payments.
    pub fn with_exchange_rates(mut self, rates: ExchangeRates) -> Self {
        self.rates = Some(rates);
        self
    }

    /// Returns the state mapping.
    pub fn mapping(&self) -> &StateMapping {
        &self.mapping
    }

    /// Returns the ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Returns the order repository.
    pub fn orders(&self) -> &R {
        &self.orders
    }

    /// Loads an order by ID.
    ///
    /// Returns None if the order doesn't exist.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        self.orders.get(order_id).await
    }

    /// Loads an order, failing if it doesn't exist.
    pub async fn require_order(&self, order_id: OrderId) -> Result<Order> {
        self.orders
            .get(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))
    }

    /// Returns the logical state of an order, if its host state is one of ours.
    pub fn state_of(&self, order: &Order) -> Option<OrderState> {
        self.mapping.state(order.current_state)
    }

    /// Returns true if the order currently is in `state`.
    pub fn is_in(&self, order: &Order, state: OrderState) -> bool {
        self.mapping.is(order.current_state, state)
    }

    /// Moves an order to a new state.
    ///
    /// The transition is applied even when the order already is in the target
    /// state; callers that want to skip no-op transitions check first.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id))]
    pub async fn change_state(&self, order: &mut Order, target: OrderState) -> Result<()> {
        let from = order.current_state;
        let to = self.mapping.id(target);
        let notify = self.mapping.notifies(target);

        self.ledger
            .append_history(StateHistoryEntry::new(order.id, from, to, notify))
            .await?;

        order.current_state = to;
        self.orders.save(order).await?;

        if notify {
            self.notifier.notify(order, target).await?;
        }

        metrics::counter!("order_state_transitions_total", "to" => target.as_str()).increment(1);
        tracing::info!(from = %from, to = %to, state = %target, "Order state changed");

        Ok(())
    }

    /// Books a payment against an order.
    ///
    /// The real-paid total grows by the payment amount converted into the
    /// order currency; the payment record keeps the original amount.
    #[tracing::instrument(skip(self, order, payment), fields(order_id = %order.id, transaction_id = %payment.transaction_id))]
    pub async fn add_payment(&self, order: &mut Order, payment: PaymentRecord) -> Result<()> {
        let received = self.to_order_currency(order, &payment)?;

        self.ledger.record_payment(payment).await?;

        order.total_paid_real += received;
        self.orders.save(order).await?;

        tracing::info!(amount = %received, currency = %order.currency, "Payment added to order");
        Ok(())
    }

    fn to_order_currency(&self, order: &Order, payment: &PaymentRecord) -> Result<Money> {
        if payment.currency == order.currency {
            return Ok(payment.amount);
        }
        match &self.rates {
            Some(rates) => rates.convert(payment.amount, &payment.currency, &order.currency),
            None => Err(missing_rate(&payment.currency, &order.currency)),
        }
    }
}

fn missing_rate(from: &Currency, to: &Currency) -> DomainError {
    DomainError::MissingExchangeRate {
        from: from.clone(),
        to: to.clone(),
    }
}
