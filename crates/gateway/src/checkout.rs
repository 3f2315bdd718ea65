//! Hosted checkout session requests.

use common::{Currency, Money};
use serde::{Deserialize, Serialize, Serializer};

/// Maximum length of free-text fields such as item names.
pub const TEXT_LIMIT: usize = 127;

/// Truncates a value to the gateway's field limit.
///
/// Empty values are dropped entirely; the gateway rejects empty strings.
pub fn safe(value: &str, limit: usize) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Some(value.chars().take(limit).collect())
}

fn numeric<S: Serializer>(amount: &Money, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&amount.to_string())
}

fn numeric_opt<S: Serializer>(amount: &Option<Money>, serializer: S) -> Result<S::Ok, S::Error> {
    match amount {
        Some(amount) => numeric(amount, serializer),
        None => serializer.serialize_none(),
    }
}

/// What the hosted checkout does with the customer's funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentAction {
    /// Authorize and capture in one step.
    #[default]
    Purchase,
    /// Authorize only; capture later from the back office.
    Authorize,
}

impl PaymentAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentAction::Purchase => "PURCHASE",
            PaymentAction::Authorize => "AUTHORIZE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PURCHASE" => Some(PaymentAction::Purchase),
            "AUTHORIZE" => Some(PaymentAction::Authorize),
            _ => None,
        }
    }
}

/// Request body of `INITIATE_CHECKOUT`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionRequest {
    pub api_operation: &'static str,
    pub order: CheckoutOrder,
    pub interaction: Interaction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing: Option<Billing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping: Option<Shipping>,
}

impl CheckoutSessionRequest {
    pub const OPERATION: &'static str = "INITIATE_CHECKOUT";

    pub fn new(order: CheckoutOrder, interaction: Interaction) -> Self {
        Self {
            api_operation: Self::OPERATION,
            order,
            interaction,
            customer: None,
            billing: None,
            shipping: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOrder {
    pub id: String,
    pub reference: String,
    pub currency: Currency,
    #[serde(serialize_with = "numeric")]
    pub amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<Vec<LineItem>>,
    #[serde(
        serialize_with = "numeric_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub item_amount: Option<Money>,
    #[serde(
        serialize_with = "numeric_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub shipping_and_handling_amount: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(serialize_with = "numeric")]
    pub unit_price: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub merchant: Merchant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    pub display_control: DisplayControl,
    pub operation: PaymentAction,
}

/// Merchant details shown on the hosted payment page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Merchant {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<MerchantAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line3: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line4: Option<String>,
}

/// Which sections of the hosted page are shown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayControl {
    pub customer_email: &'static str,
    pub billing_address: &'static str,
    pub payment_terms: &'static str,
    pub shipping: &'static str,
}

impl DisplayControl {
    /// Hides every section; the storefront already collected the data.
    pub fn hidden() -> Self {
        Self {
            customer_email: "HIDE",
            billing_address: "HIDE",
            payment_terms: "HIDE",
            shipping: "HIDE",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postcode_zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_province: Option<String>,
    /// ISO 3166 alpha-3 country code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Billing {
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shipping {
    pub address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
}

/// A created checkout session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub session: SessionInfo,
    pub success_indicator: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: String,
    #[serde(default)]
    pub version: String,
}
