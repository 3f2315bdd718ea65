//! HTTP client for the gateway's REST API.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::{Currency, Money};
use reqwest::{Client, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::{
    CheckoutSession, CheckoutSessionRequest, GatewayClient, GatewayError, GatewayResponse, Result,
};

/// Connection settings for the gateway REST API.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL, e.g. `https://eu-gateway.mastercard.com`.
    pub base_url: String,
    pub api_version: String,
    pub merchant_id: String,
    pub api_password: SecretString,
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new(
        base_url: impl Into<String>,
        merchant_id: impl Into<String>,
        api_password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_version: "100".to_string(),
            merchant_id: merchant_id.into(),
            api_password: SecretString::new(api_password.into().into_boxed_str()),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn merchant_url(&self) -> String {
        format!(
            "{}/api/rest/version/{}/merchant/{}",
            self.base_url.trim_end_matches('/'),
            self.api_version,
            self.merchant_id
        )
    }
}

/// Gateway client speaking the REST API over HTTPS with basic auth.
#[derive(Clone)]
pub struct HttpGatewayClient {
    client: Client,
    config: GatewayConfig,
}

impl HttpGatewayClient {
    /// Creates a client with its own connection pool.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn new_transaction_id() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    /// Sends one request, logging it and classifying the outcome.
    async fn send<R: DeserializeOwned>(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<R> {
        let url = format!("{}{}", self.config.merchant_url(), path);
        let start = Instant::now();

        tracing::info!(%method, %url, operation, "Emit request");
        if let Some(body) = &body {
            tracing::debug!(request = %body, "Request body");
        }

        let mut request = self
            .client
            .request(method.clone(), &url)
            .basic_auth(
                format!("merchant.{}", self.config.merchant_id),
                Some(self.config.api_password.expose_secret()),
            );
        if let Some(body) = &body {
            request = request.json(body);
        }

        let result = async {
            let response = request.send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;
            tracing::info!(%method, %url, status = status.as_u16(), "Receive response");
            tracing::debug!(response = %String::from_utf8_lossy(&bytes), "Response body");
            classify::<R>(status, &bytes)
        }
        .await;

        metrics::histogram!("gateway_request_duration_seconds", "operation" => operation)
            .record(start.elapsed().as_secs_f64());

        match &result {
            Ok(_) => {
                metrics::counter!("gateway_requests_total", "operation" => operation, "outcome" => "ok")
                    .increment(1);
            }
            Err(e) => {
                metrics::counter!("gateway_requests_total", "operation" => operation, "outcome" => "error")
                    .increment(1);
                metrics::counter!("gateway_errors_total", "kind" => e.kind()).increment(1);
                tracing::error!(%method, %url, error = %e, "Gateway request failed");
            }
        }

        result
    }

    async fn transaction(
        &self,
        operation: &'static str,
        order_ref: &str,
        body: Value,
    ) -> Result<GatewayResponse> {
        let path = format!(
            "/order/{}/transaction/{}",
            order_ref,
            Self::new_transaction_id()
        );
        self.send(operation, Method::PUT, &path, Some(body)).await
    }
}

/// Turns an HTTP status and body into a typed result.
///
/// - 4xx with a JSON body: client error `cause: explanation`
/// - 4xx without JSON: server error "Response not valid JSON"
/// - 5xx: server error with the reason phrase
/// - anything else must be JSON of the expected shape
pub fn classify<R: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<R> {
    if status.is_client_error() {
        let value: Value = serde_json::from_slice(body).map_err(|_| not_json(status))?;
        return Err(GatewayError::Client {
            status: status.as_u16(),
            message: error_message(&value),
        });
    }

    if status.is_server_error() {
        return Err(GatewayError::Server {
            status: Some(status.as_u16()),
            message: status.canonical_reason().unwrap_or("Server error").to_string(),
        });
    }

    let value: Value = serde_json::from_slice(body).map_err(|_| not_json(status))?;
    serde_json::from_value(value).map_err(|e| GatewayError::InvalidResponse(e.to_string()))
}

fn not_json(status: StatusCode) -> GatewayError {
    GatewayError::Server {
        status: Some(status.as_u16()),
        message: "Response not valid JSON".to_string(),
    }
}

fn error_message(value: &Value) -> String {
    let error = &value["error"];
    let mut message = String::new();
    if let Some(cause) = error["cause"].as_str() {
        message.push_str(cause);
        message.push_str(": ");
    }
    if let Some(explanation) = error["explanation"].as_str() {
        message.push_str(explanation);
    }
    message
}

#[async_trait]
impl GatewayClient for HttpGatewayClient {
    #[tracing::instrument(skip(self))]
    async fn retrieve_order(&self, order_ref: &str) -> Result<GatewayResponse> {
        let path = format!("/order/{}", order_ref);
        self.send("retrieve_order", Method::GET, &path, None).await
    }

    #[tracing::instrument(skip(self))]
    async fn void(&self, order_ref: &str, transaction_id: &str) -> Result<GatewayResponse> {
        let body = json!({
            "apiOperation": "VOID",
            "transaction": {"targetTransactionId": transaction_id},
        });
        self.transaction("void", order_ref, body).await
    }

    #[tracing::instrument(skip(self))]
    async fn capture(
        &self,
        order_ref: &str,
        amount: Money,
        currency: &Currency,
    ) -> Result<GatewayResponse> {
        let body = json!({
            "apiOperation": "CAPTURE",
            "transaction": {"amount": amount.format_in(currency), "currency": currency.code()},
        });
        self.transaction("capture", order_ref, body).await
    }

    #[tracing::instrument(skip(self))]
    async fn refund(
        &self,
        order_ref: &str,
        amount: Money,
        currency: &Currency,
    ) -> Result<GatewayResponse> {
        let body = json!({
            "apiOperation": "REFUND",
            "transaction": {"amount": amount.format_in(currency), "currency": currency.code()},
        });
        self.transaction("refund", order_ref, body).await
    }

    #[tracing::instrument(skip(self, request), fields(order_ref = %request.order.id))]
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession> {
        let body = serde_json::to_value(request)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        self.send("create_checkout_session", Method::POST, "/session", Some(body))
            .await
    }
}
