//! Application configuration loaded from environment variables.

use std::str::FromStr;

use common::{Currency, StateId};
use domain::{ExchangeRates, OrderState, StateMapping};
use gateway::{GatewayConfig, PaymentAction};
use reconciliation::CheckoutSettings;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `GATEWAY_URL`, `GATEWAY_API_VERSION` (default `100`),
///   `GATEWAY_MERCHANT_ID`, `GATEWAY_API_PASSWORD`: gateway access
/// - `ORDER_PREFIX`: prepended to cart ids to form gateway order references
/// - `MERCHANT_NAME`, `MERCHANT_URL`: shown on the payment page
/// - `CHECKOUT_RETURN_URL`: where the payment page sends the customer back
/// - `PAYMENT_ACTION`: `PURCHASE` (default) or `AUTHORIZE`
/// - `LINE_ITEMS_ENABLED`: send cart lines with the session (default: off)
/// - `DATABASE_URL`: Postgres ledger; in-memory when unset
/// - `ORDER_STATE_<NAME>`: host state id for a payment state, e.g.
///   `ORDER_STATE_PAYMENT_ACCEPTED=2`
/// - `DEFAULT_CURRENCY`: the shop currency rates are quoted against
///   (default: `USD`)
/// - `EXCHANGE_RATES`: units of each currency per unit of the default
///   currency, e.g. `EUR=0.92,GBP=0.79`
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub gateway_url: String,
    pub gateway_api_version: String,
    pub gateway_merchant_id: String,
    pub gateway_api_password: SecretString,
    pub order_prefix: String,
    pub merchant_name: String,
    pub merchant_url: Option<String>,
    pub return_url: Option<String>,
    pub payment_action: PaymentAction,
    pub line_items_enabled: bool,
    pub database_url: Option<String>,
    pub state_overrides: Vec<(OrderState, StateId)>,
    pub default_currency: Currency,
    pub exchange_rates: Vec<(Currency, Decimal)>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let state_overrides = OrderState::ALL
            .into_iter()
            .filter_map(|state| {
                let raw = var(&format!("ORDER_STATE_{}", state.as_str()))?;
                match raw.trim().parse::<i64>() {
                    Ok(id) => Some((state, StateId::new(id))),
                    Err(_) => {
                        tracing::warn!(state = %state, value = %raw, "Ignoring non-numeric order state id");
                        None
                    }
                }
            })
            .collect();

        let exchange_rates = var("EXCHANGE_RATES")
            .map(|raw| parse_rates(&raw))
            .unwrap_or_default();

        Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            gateway_url: var("GATEWAY_URL").unwrap_or(defaults.gateway_url),
            gateway_api_version: var("GATEWAY_API_VERSION")
                .unwrap_or(defaults.gateway_api_version),
            gateway_merchant_id: var("GATEWAY_MERCHANT_ID")
                .unwrap_or(defaults.gateway_merchant_id),
            gateway_api_password: var("GATEWAY_API_PASSWORD")
                .map(|p| SecretString::new(p.into_boxed_str()))
                .unwrap_or(defaults.gateway_api_password),
            order_prefix: var("ORDER_PREFIX").unwrap_or(defaults.order_prefix),
            merchant_name: var("MERCHANT_NAME").unwrap_or(defaults.merchant_name),
            merchant_url: var("MERCHANT_URL"),
            return_url: var("CHECKOUT_RETURN_URL"),
            payment_action: var("PAYMENT_ACTION")
                .and_then(|a| PaymentAction::parse(&a))
                .unwrap_or(defaults.payment_action),
            line_items_enabled: var("LINE_ITEMS_ENABLED")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.line_items_enabled),
            database_url: var("DATABASE_URL"),
            state_overrides,
            default_currency: var("DEFAULT_CURRENCY")
                .and_then(|c| Currency::parse(&c).ok())
                .unwrap_or(defaults.default_currency),
            exchange_rates,
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Gateway connection settings.
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig::new(
            self.gateway_url.as_str(),
            self.gateway_merchant_id.as_str(),
            self.gateway_api_password.expose_secret(),
        )
        .with_api_version(self.gateway_api_version.as_str())
    }

    /// Hosted checkout settings.
    pub fn checkout_settings(&self) -> CheckoutSettings {
        let mut settings = CheckoutSettings::new(self.order_prefix.as_str(), self.merchant_name.as_str());
        settings.shop_url = self.merchant_url.clone();
        settings.return_url = self.return_url.clone();
        settings.payment_action = self.payment_action;
        settings.line_items_enabled = self.line_items_enabled;
        settings
    }

    /// The default state mapping with the configured overrides applied.
    pub fn state_mapping(&self) -> domain::Result<StateMapping> {
        let defaults = StateMapping::default();
        let entries = OrderState::ALL.into_iter().map(|state| {
            let id = self
                .state_overrides
                .iter()
                .find(|(s, _)| *s == state)
                .map(|(_, id)| *id)
                .unwrap_or_else(|| defaults.id(state));
            (state, id)
        });
        StateMapping::new(entries)
    }

    /// Rates for converting foreign-currency payments.
    pub fn exchange_rates(&self) -> ExchangeRates {
        self.exchange_rates
            .iter()
            .fold(ExchangeRates::new(self.default_currency.clone()), |rates, (currency, rate)| {
                rates.with_rate(currency.clone(), *rate)
            })
    }
}

/// Parses `CODE=rate` pairs separated by commas. Bad entries are skipped.
fn parse_rates(raw: &str) -> Vec<(Currency, Decimal)> {
    raw.split(',')
        .filter(|entry| !entry.trim().is_empty())
        .filter_map(|entry| {
            let parsed = entry.split_once('=').and_then(|(code, rate)| {
                let currency = Currency::parse(code).ok()?;
                let rate = Decimal::from_str(rate.trim()).ok()?;
                (rate > Decimal::ZERO).then_some((currency, rate))
            });
            if parsed.is_none() {
                tracing::warn!(entry = %entry.trim(), "Ignoring invalid exchange rate");
            }
            parsed
        })
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            gateway_url: "https://test-gateway.mastercard.com".to_string(),
            gateway_api_version: "100".to_string(),
            gateway_merchant_id: String::new(),
            gateway_api_password: SecretString::new(String::new().into_boxed_str()),
            order_prefix: String::new(),
            merchant_name: "Shop".to_string(),
            merchant_url: None,
            return_url: None,
            payment_action: PaymentAction::Purchase,
            line_items_enabled: false,
            database_url: None,
            state_overrides: Vec::new(),
            default_currency: Currency::default(),
            exchange_rates: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use common::Money;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.payment_action, PaymentAction::Purchase);
        assert!(!config.line_items_enabled);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_reads_gateway_and_checkout_settings() {
        let config = from_pairs(&[
            ("PORT", "8081"),
            ("GATEWAY_URL", "https://eu-gateway.mastercard.com"),
            ("GATEWAY_MERCHANT_ID", "TESTMERCHANT"),
            ("GATEWAY_API_PASSWORD", "s3cret"),
            ("ORDER_PREFIX", "shop-"),
            ("PAYMENT_ACTION", "authorize"),
            ("LINE_ITEMS_ENABLED", "true"),
        ]);

        assert_eq!(config.port, 8081);
        assert_eq!(config.gateway_api_password.expose_secret(), "s3cret");
        assert!(!format!("{config:?}").contains("s3cret"));

        let gateway = config.gateway_config();
        assert_eq!(gateway.merchant_id, "TESTMERCHANT");
        assert_eq!(gateway.api_version, "100");

        let checkout = config.checkout_settings();
        assert_eq!(checkout.order_prefix, "shop-");
        assert_eq!(checkout.payment_action, PaymentAction::Authorize);
        assert!(checkout.line_items_enabled);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = from_pairs(&[("PORT", "http"), ("PAYMENT_ACTION", "SALE"), ("HOST", " ")]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.payment_action, PaymentAction::Purchase);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_state_overrides() {
        let config = from_pairs(&[
            ("ORDER_STATE_AUTHORIZED", "31"),
            ("ORDER_STATE_FRAUD", "not-a-number"),
        ]);
        let mapping = config.state_mapping().unwrap();

        assert_eq!(mapping.id(OrderState::Authorized), StateId::new(31));
        assert_eq!(
            mapping.id(OrderState::Fraud),
            StateMapping::default().id(OrderState::Fraud)
        );
    }

    #[test]
    fn test_exchange_rates() {
        let config = from_pairs(&[
            ("DEFAULT_CURRENCY", "eur"),
            ("EXCHANGE_RATES", "USD=1.08, GBP=0.85,XX=1,JPY=abc,CHF=0,"),
        ]);

        assert_eq!(config.default_currency.code(), "EUR");
        assert_eq!(config.exchange_rates.len(), 2);

        let rates = config.exchange_rates();
        let eur = Currency::parse("EUR").unwrap();
        let usd = Currency::parse("USD").unwrap();
        assert_eq!(
            rates.convert(Money::from_cents(1_000), &eur, &usd).unwrap(),
            Money::from_cents(1_080)
        );
        assert!(
            rates
                .convert(Money::from_cents(1_000), &eur, &Currency::parse("JPY").unwrap())
                .is_err()
        );
    }

    #[test]
    fn test_no_exchange_rates_by_default() {
        let config = from_pairs(&[]);
        assert_eq!(config.default_currency.code(), "USD");
        assert!(config.exchange_rates().is_empty());
    }

    #[test]
    fn test_conflicting_overrides_are_rejected() {
        let config = from_pairs(&[("ORDER_STATE_AUTHORIZED", "2")]);
        assert!(config.state_mapping().is_err());
    }
}
