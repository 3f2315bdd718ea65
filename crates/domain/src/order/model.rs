use common::{CartId, Currency, Money, OrderId, StateId};
use serde::{Deserialize, Serialize};

/// Payment module code of orders paid through the hosted gateway.
pub const PAYMENT_MODULE: &str = "MPGS";

/// The slice of a host order the reconciliation pipeline reads and writes.
///
/// Orders are created and owned by the host storefront; the pipeline only
/// moves `current_state` and adds to `total_paid_real`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub cart_id: CartId,
    /// Host-side order reference shown to the merchant.
    pub reference: String,
    pub current_state: StateId,
    pub currency: Currency,
    /// Amount the customer owes.
    pub total_paid: Money,
    /// Amount actually received, in the order currency.
    pub total_paid_real: Money,
    /// Code of the payment module the order was placed with.
    pub payment_module: String,
}

impl Order {
    /// Creates an order paid through the hosted gateway, nothing received yet.
    pub fn new(
        id: OrderId,
        cart_id: CartId,
        current_state: StateId,
        currency: Currency,
        total_paid: Money,
    ) -> Self {
        Self {
            id,
            cart_id,
            reference: String::new(),
            current_state,
            currency,
            total_paid,
            total_paid_real: Money::zero(),
            payment_module: PAYMENT_MODULE.to_string(),
        }
    }

    /// Sets the host order reference.
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    /// Sets the payment module code.
    pub fn with_payment_module(mut self, module: impl Into<String>) -> Self {
        self.payment_module = module.into();
        self
    }

    /// The reference the gateway knows this order by.
    pub fn gateway_reference(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.cart_id)
    }

    /// Returns true if the order was placed with the hosted gateway module.
    pub fn is_paid_through_gateway(&self) -> bool {
        self.payment_module == PAYMENT_MODULE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Order {
        Order::new(
            OrderId::new(5),
            CartId::new(77),
            StateId::new(20),
            Currency::parse("USD").unwrap(),
            Money::from_cents(4200),
        )
    }

    #[test]
    fn test_gateway_reference_is_prefix_and_cart() {
        assert_eq!(order().gateway_reference("shop-"), "shop-77");
        assert_eq!(order().gateway_reference(""), "77");
    }

    #[test]
    fn test_new_order_has_nothing_paid() {
        let order = order();
        assert!(order.total_paid_real.is_zero());
        assert!(order.is_paid_through_gateway());
        assert!(!order.with_payment_module("cheque").is_paid_through_gateway());
    }
}
