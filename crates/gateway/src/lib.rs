//! Client side of the hosted payment gateway.
//!
//! The gateway is a black box with a stable request/response contract:
//! - [`GatewayClient`] lists the operations the pipeline uses
//! - [`HttpGatewayClient`] speaks the REST API and classifies failures
//! - [`InMemoryGateway`] is a scriptable stand-in for tests
//!
//! Responses are parsed into [`GatewayResponse`] documents.

pub mod checkout;
pub mod client;
pub mod error;
pub mod http;
pub mod memory;
pub mod response;

pub use checkout::{
    Address, Billing, CheckoutOrder, CheckoutSession, CheckoutSessionRequest, Contact,
    DisplayControl, Interaction, LineItem, Merchant, MerchantAddress, PaymentAction, SessionInfo,
    Shipping, TEXT_LIMIT, safe,
};
pub use client::{AuthorizationTransaction, GatewayClient};
pub use error::{GatewayError, Result};
pub use http::{GatewayConfig, HttpGatewayClient};
pub use memory::{GatewayCall, InMemoryGateway, Operation};
pub use response::{
    APPROVED_CODES, AUTHORIZATION, BrowserPayment, Card, CardExpiry, Customer, GatewayResponse,
    OrderSummary, PAYMENT, Paypal, ProvidedFunds, ResponseCode, Risk, RiskResponse, RiskReview,
    SourceOfFunds, TransactionDetail, Transactions,
};
