//! Gateway response documents.
//!
//! The gateway answers every call with a JSON document. Only the parts the
//! reconciliation pipeline reads are modelled; everything is optional and
//! unknown fields are ignored, so partial documents (and documents from
//! newer API versions) still parse.

use common::{Currency, Money};
use serde::{Deserialize, Deserializer, Serialize};

/// Gateway codes that mean the operation went through.
pub const APPROVED_CODES: [&str; 2] = ["APPROVED", "APPROVED_AUTO"];

/// Transaction type of an authorization.
pub const AUTHORIZATION: &str = "AUTHORIZATION";

/// Transaction type of a purchase (authorization and capture in one step).
pub const PAYMENT: &str = "PAYMENT";

/// A response returned by the gateway for one call.
///
/// For transaction operations (`void`, `capture`, `refund`) `transaction` is
/// a single [`TransactionDetail`]. For a retrieved order it is the list of
/// transaction responses recorded against that order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<Transactions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<Risk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_of_funds: Option<SourceOfFunds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
}

/// The `transaction` field: one transaction, or every transaction of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Transactions {
    List(Vec<GatewayResponse>),
    Single(TransactionDetail),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponseCode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_code: Option<String>,
}

/// Order block embedded in transaction responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_transaction_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Risk {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<RiskResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<RiskReview>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskReview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<String>,
}

/// Payment instrument the customer used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceOfFunds {
    /// Funding type such as `CARD` or `PAYPAL`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provided: Option<ProvidedFunds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_payment: Option<BrowserPayment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidedFunds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<Card>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paypal: Option<Paypal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Card {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_on_card: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<CardExpiry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardExpiry {
    #[serde(
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub month: Option<String>,
    #[serde(
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub year: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Paypal {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_holder: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserPayment {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Customer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl GatewayResponse {
    /// Parses a response document.
    pub fn from_json(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    /// Returns `response.gatewayCode`.
    pub fn gateway_code(&self) -> Option<&str> {
        self.response.as_ref()?.gateway_code.as_deref()
    }

    /// Returns true iff the gateway code is one of [`APPROVED_CODES`].
    pub fn is_approved(&self) -> bool {
        self.gateway_code()
            .is_some_and(|code| APPROVED_CODES.contains(&code))
    }

    /// Lifecycle status of the order.
    ///
    /// Retrieved orders carry it at the top level; transaction responses
    /// carry it in the embedded order block.
    pub fn status(&self) -> Option<&str> {
        self.status
            .as_deref()
            .or_else(|| self.order.as_ref()?.status.as_deref())
    }

    /// The single transaction of a transaction response.
    pub fn transaction(&self) -> Option<&TransactionDetail> {
        match &self.transaction {
            Some(Transactions::Single(detail)) => Some(detail),
            _ => None,
        }
    }

    /// The transactions of a retrieved order, oldest first.
    pub fn transactions(&self) -> &[GatewayResponse] {
        match &self.transaction {
            Some(Transactions::List(list)) => list,
            _ => &[],
        }
    }

    /// The most recent transaction of a retrieved order.
    pub fn latest_transaction(&self) -> Option<&GatewayResponse> {
        self.transactions().last()
    }

    /// The transaction that placed the funds of a retrieved order.
    ///
    /// This is the authorization, or the payment for orders paid with a
    /// single purchase.
    pub fn authorization_transaction(&self) -> Option<&GatewayResponse> {
        self.transactions().iter().rev().find(|txn| {
            txn.transaction()
                .and_then(|t| t.kind.as_deref())
                .is_some_and(|kind| kind == AUTHORIZATION || kind == PAYMENT)
        })
    }

    /// `risk.response`, if present.
    pub fn risk_response(&self) -> Option<&RiskResponse> {
        self.risk.as_ref()?.response.as_ref()
    }
}
