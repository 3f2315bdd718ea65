//! Hosted checkout sessions and the customer's return.

use std::sync::Arc;

use common::{CartId, Currency, Money, OrderId};
use domain::{CustomerNotifier, OrderRepository, OrderService};
use gateway::{
    Address, Billing, CheckoutOrder, CheckoutSession, CheckoutSessionRequest, Contact,
    DisplayControl, GatewayClient, Interaction, LineItem, Merchant,
    MerchantAddress, PaymentAction, Shipping, TEXT_LIMIT, safe,
};
use ledger::Ledger;
use serde::{Deserialize, Serialize};

use crate::handlers::CHECKOUT_CHAIN;
use crate::{ActionOutcome, PaymentFailure, ResponseProcessor, Result};

/// One product line of a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub name: String,
    /// Product reference.
    #[serde(default)]
    pub sku: Option<String>,
    pub quantity: u32,
    /// Unit price, tax included.
    pub unit_price: Money,
}

/// The cart being paid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub currency: Currency,
    /// Order total, tax and shipping included.
    pub total: Money,
    #[serde(default)]
    pub lines: Vec<CartLine>,
    #[serde(default)]
    pub customer: Option<Contact>,
    #[serde(default)]
    pub billing_address: Option<Address>,
    #[serde(default)]
    pub shipping_address: Option<Address>,
    #[serde(default)]
    pub shipping_contact: Option<Contact>,
}

impl Cart {
    /// Sum of the lines at their listed prices.
    pub fn items_total(&self) -> Money {
        self.lines
            .iter()
            .map(|line| line.unit_price.multiply(line.quantity))
            .sum()
    }

    /// How much the listed line prices exceed the order total.
    ///
    /// Positive when per-line rounding pushed the items above the total the
    /// customer is charged.
    pub fn delta(&self) -> Money {
        let delta = self.items_total() - self.total;
        if delta.is_positive() {
            delta
        } else {
            Money::zero()
        }
    }
}

/// Merchant details shown on the payment page when merchant interaction is on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MerchantDetails {
    /// Overrides the shop name.
    pub name: Option<String>,
    pub address: MerchantAddress,
    pub email: Option<String>,
    pub logo: Option<String>,
    pub phone: Option<String>,
}

/// Merchant-side settings of the hosted checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSettings {
    /// Prepended to the cart id to form the gateway order reference.
    pub order_prefix: String,
    pub shop_name: String,
    pub shop_url: Option<String>,
    /// Set when merchant interaction is active.
    pub merchant_details: Option<MerchantDetails>,
    pub return_url: Option<String>,
    pub payment_action: PaymentAction,
    pub line_items_enabled: bool,
}

impl CheckoutSettings {
    pub fn new(order_prefix: impl Into<String>, shop_name: impl Into<String>) -> Self {
        Self {
            order_prefix: order_prefix.into(),
            shop_name: shop_name.into(),
            shop_url: None,
            merchant_details: None,
            return_url: None,
            payment_action: PaymentAction::default(),
            line_items_enabled: false,
        }
    }

    /// The gateway order reference of a cart.
    pub fn order_reference(&self, cart_id: CartId) -> String {
        format!("{}{}", self.order_prefix, cart_id)
    }

    fn merchant(&self) -> Merchant {
        let shop_name = safe(&self.shop_name, TEXT_LIMIT).unwrap_or_default();
        let url = self.shop_url.as_deref().and_then(|u| safe(u, TEXT_LIMIT));

        let Some(details) = &self.merchant_details else {
            return Merchant {
                name: shop_name,
                url,
                ..Default::default()
            };
        };

        let name = details
            .name
            .as_deref()
            .and_then(|n| safe(&n.replace(['\'', '"'], ""), TEXT_LIMIT))
            .unwrap_or(shop_name);
        let line = |value: &Option<String>| value.as_deref().and_then(|v| safe(v, TEXT_LIMIT));

        Merchant {
            name,
            url,
            address: Some(MerchantAddress {
                line1: line(&details.address.line1),
                line2: line(&details.address.line2),
                line3: line(&details.address.line3),
                line4: line(&details.address.line4),
            }),
            email: line(&details.email),
            logo: line(&details.logo),
            phone: line(&details.phone),
        }
    }

    /// Builds the interaction block of a session request.
    pub fn interaction(&self) -> Interaction {
        Interaction {
            merchant: self.merchant(),
            return_url: self.return_url.clone(),
            display_control: DisplayControl::hidden(),
            operation: self.payment_action,
        }
    }
}

/// Line items of a cart, with the rounding delta taken off the first line.
///
/// Returns None when line items are disabled or the cart has none.
pub fn line_items(cart: &Cart, enabled: bool) -> Option<Vec<LineItem>> {
    if !enabled || cart.lines.is_empty() {
        return None;
    }

    let mut delta = cart.delta();
    let items = cart
        .lines
        .iter()
        .map(|line| {
            let mut unit_price = line.unit_price;
            if delta.is_positive() && line.quantity > 0 {
                unit_price -= delta.divide_up(line.quantity, &cart.currency);
                delta = Money::zero();
            }

            LineItem {
                name: safe(&line.name, TEXT_LIMIT),
                quantity: line.quantity,
                sku: line.sku.as_deref().and_then(|sku| safe(sku, TEXT_LIMIT)),
                unit_price,
            }
        })
        .collect();

    Some(items)
}

/// Builds the session request for a cart.
pub fn build_session_request(settings: &CheckoutSettings, cart: &Cart) -> CheckoutSessionRequest {
    let reference = settings.order_reference(cart.id);
    let item = line_items(cart, settings.line_items_enabled);
    let item_amount = item.as_ref().map(|items| {
        items
            .iter()
            .map(|i| i.unit_price.multiply(i.quantity))
            .sum::<Money>()
    });
    let shipping_and_handling_amount = item_amount
        .map(|amount| cart.total - amount)
        .filter(Money::is_positive);

    let order = CheckoutOrder {
        id: reference.clone(),
        reference,
        currency: cart.currency.clone(),
        amount: cart.total,
        item,
        item_amount,
        shipping_and_handling_amount,
    };

    let mut request = CheckoutSessionRequest::new(order, settings.interaction());
    request.customer = cart.customer.clone();
    request.billing = cart
        .billing_address
        .clone()
        .map(|address| Billing { address });
    request.shipping = cart.shipping_address.clone().map(|address| Shipping {
        address,
        contact: cart.shipping_contact.clone(),
    });
    request
}

/// Creates hosted checkout sessions and reconciles the customer's return.
pub struct CheckoutService<G, R, L, N> {
    gateway: Arc<G>,
    orders: Arc<OrderService<R, L, N>>,
    processor: ResponseProcessor<R, L, N>,
    settings: CheckoutSettings,
}

impl<G, R, L, N> CheckoutService<G, R, L, N>
where
    G: GatewayClient,
    R: OrderRepository,
    L: Ledger,
    N: CustomerNotifier,
{
    pub fn new(
        gateway: Arc<G>,
        orders: Arc<OrderService<R, L, N>>,
        settings: CheckoutSettings,
    ) -> Self {
        let processor = ResponseProcessor::new(Arc::clone(&orders));
        Self {
            gateway,
            orders,
            processor,
            settings,
        }
    }

    pub fn settings(&self) -> &CheckoutSettings {
        &self.settings
    }

    /// Opens a hosted checkout session for a cart.
    #[tracing::instrument(skip(self, cart), fields(cart_id = %cart.id))]
    pub async fn create_session(&self, cart: &Cart) -> Result<CheckoutSession> {
        let request = build_session_request(&self.settings, cart);
        let session = self.gateway.create_checkout_session(&request).await?;

        metrics::counter!("checkout_sessions_total").increment(1);
        tracing::info!(session_id = %session.session.id, order_ref = %request.order.id, "Checkout session created");
        Ok(session)
    }

    /// Reconciles the customer's return from the payment page.
    ///
    /// `returned_ref` is the order reference the payment page sent back; it
    /// must be the reference of the order being paid.
    #[tracing::instrument(skip(self))]
    pub async fn complete(&self, order_id: OrderId, returned_ref: &str) -> Result<ActionOutcome> {
        let mut order = self.orders.require_order(order_id).await?;
        let expected = order.gateway_reference(&self.settings.order_prefix);

        if returned_ref != expected {
            return Err(PaymentFailure::OrderReferenceMismatch {
                expected,
                actual: returned_ref.to_string(),
            }
            .into());
        }

        let response = self.gateway.retrieve_order(&expected).await?;
        self.processor
            .process(&mut order, &response, CHECKOUT_CHAIN)
            .await?;

        tracing::info!(order_id = %order.id, state = %order.current_state, "Checkout completed");
        Ok(ActionOutcome { order, response })
    }
}
