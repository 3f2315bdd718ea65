//! Booking payments from gateway responses.

use domain::{CustomerNotifier, Order, OrderRepository};
use gateway::{AUTHORIZATION, Customer, GatewayResponse, SourceOfFunds};
use ledger::{CardDetails, Ledger, PaymentKind, PaymentRecord};

use super::{HandlerContext, code_of};
use crate::{HandlerError, PaymentFailure};

/// Browser-redirect payment methods shown under their own name.
pub const BROWSER_PAYMENT_BRANDS: [&str; 4] = ["KNET", "QPAY", "BENEFIT", "OMAN NET"];

/// First and last name of the payer.
///
/// Explicit customer names win; otherwise a PayPal account holder is split
/// on the first space. Missing parts are empty.
pub fn payer_name(
    customer: Option<&Customer>,
    source: Option<&SourceOfFunds>,
) -> (String, String) {
    if let Some(customer) = customer {
        let first = non_empty(&customer.first_name);
        let last = non_empty(&customer.last_name);
        if first.is_some() || last.is_some() {
            return (
                first.unwrap_or_default().to_string(),
                last.unwrap_or_default().to_string(),
            );
        }
    }

    let holder = source
        .and_then(|s| s.provided.as_ref())
        .and_then(|p| p.paypal.as_ref())
        .and_then(|paypal| non_empty(&paypal.account_holder));

    match holder {
        Some(holder) => match holder.split_once(' ') {
            Some((first, last)) => (first.to_string(), last.to_string()),
            None => (holder.to_string(), String::new()),
        },
        None => (String::new(), String::new()),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Label shown for non-card instruments; empty when there is none.
pub fn brand_label(source: Option<&SourceOfFunds>) -> String {
    let Some(source) = source else {
        return String::new();
    };

    let browser_payment = source
        .browser_payment
        .as_ref()
        .and_then(|b| b.kind.as_deref());
    if let Some(brand) = browser_payment.filter(|b| BROWSER_PAYMENT_BRANDS.contains(b)) {
        return brand.to_string();
    }

    let is_paypal = source
        .kind
        .as_deref()
        .is_some_and(|kind| kind.eq_ignore_ascii_case("PAYPAL"));
    if is_paypal {
        return "PAYPAL".to_string();
    }

    String::new()
}

/// Instrument details of a payment.
///
/// Card payments carry the masked number, `MM/YY` expiry, scheme and the
/// name on the card. Other funding types carry their label and the payer.
pub fn payment_details(
    source: Option<&SourceOfFunds>,
    customer: Option<&Customer>,
) -> Result<CardDetails, PaymentFailure> {
    let Some(source) = source else {
        return Err(PaymentFailure::UnknownTransactionType);
    };

    if let Some(card) = source.provided.as_ref().and_then(|p| p.card.as_ref()) {
        let expiration = card.expiry.as_ref().map(|expiry| {
            format!(
                "{}/{}",
                expiry.month.as_deref().unwrap_or_default(),
                expiry.year.as_deref().unwrap_or_default()
            )
        });

        return Ok(CardDetails {
            number: card.number.clone(),
            expiration,
            brand: card.brand.clone().or_else(|| source.kind.clone()),
            holder: card.name_on_card.clone(),
        });
    }

    if source.kind.is_some() {
        let (first, last) = payer_name(customer, Some(source));
        let holder = format!("{} {}", first, last).trim().to_string();
        let brand = brand_label(Some(source));

        return Ok(CardDetails {
            number: None,
            expiration: None,
            brand: Some(brand).filter(|b| !b.is_empty()),
            holder: Some(holder).filter(|h| !h.is_empty()),
        });
    }

    Err(PaymentFailure::UnknownTransactionType)
}

/// Builds the payment record for one approved transaction.
///
/// `txn` is the transaction response; `parent` is the document it came in,
/// which supplies amount, currency and customer when the transaction leaves
/// them out.
fn payment_record(
    order: &Order,
    txn: &GatewayResponse,
    parent: &GatewayResponse,
) -> Result<PaymentRecord, PaymentFailure> {
    let detail = txn
        .transaction()
        .ok_or(PaymentFailure::IncompleteResponse("transaction"))?;
    let transaction_id = detail
        .id
        .clone()
        .ok_or(PaymentFailure::IncompleteResponse("transaction.id"))?;
    let amount = detail
        .amount
        .or(parent.amount)
        .ok_or(PaymentFailure::IncompleteResponse("transaction.amount"))?;
    let currency = detail
        .currency
        .clone()
        .or_else(|| parent.currency.clone())
        .unwrap_or_else(|| order.currency.clone());

    let kind = match detail.kind.as_deref() {
        Some(AUTHORIZATION) => PaymentKind::Authorization,
        _ => PaymentKind::Capture,
    };

    let order_reference = parent
        .id
        .clone()
        .or_else(|| parent.order.as_ref().and_then(|o| o.id.clone()))
        .unwrap_or_else(|| order.reference.clone());

    let customer = txn.customer.as_ref().or(parent.customer.as_ref());
    let source = txn
        .source_of_funds
        .as_ref()
        .or(parent.source_of_funds.as_ref());
    let card = payment_details(source, customer)?;

    Ok(
        PaymentRecord::new(order.id, order_reference, transaction_id, kind, amount, currency)
            .with_payment_method(order.payment_module.clone())
            .with_card(card),
    )
}

pub(super) async fn order_payment<R, L, N>(
    ctx: &HandlerContext<'_, R, L, N>,
    order: &mut Order,
    response: &GatewayResponse,
) -> Result<(), HandlerError>
where
    R: OrderRepository,
    L: Ledger,
    N: CustomerNotifier,
{
    let Some(txn) = response.latest_transaction() else {
        return Err(PaymentFailure::PaymentDeclined(code_of(response)).into());
    };

    if !txn.is_approved() {
        return Err(PaymentFailure::PaymentDeclined(code_of(txn)).into());
    }

    let record = payment_record(order, txn, response)?;
    ctx.orders().add_payment(order, record).await?;
    Ok(())
}

pub(super) async fn capture<R, L, N>(
    ctx: &HandlerContext<'_, R, L, N>,
    order: &mut Order,
    response: &GatewayResponse,
) -> Result<(), HandlerError>
where
    R: OrderRepository,
    L: Ledger,
    N: CustomerNotifier,
{
    if !response.is_approved() {
        return Ok(());
    }

    let record = payment_record(order, response, response)?;
    ctx.orders().add_payment(order, record).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(value: serde_json::Value) -> GatewayResponse {
        GatewayResponse::from_json(value).unwrap()
    }

    #[test]
    fn payer_name_prefers_customer() {
        let txn = parse(json!({
            "customer": {"firstName": "Ada", "lastName": ""},
            "sourceOfFunds": {"provided": {"paypal": {"accountHolder": "Grace Hopper"}}}
        }));
        assert_eq!(
            payer_name(txn.customer.as_ref(), txn.source_of_funds.as_ref()),
            ("Ada".to_string(), String::new())
        );
    }

    #[test]
    fn payer_name_splits_paypal_holder_once() {
        let txn = parse(json!({
            "sourceOfFunds": {"type": "PAYPAL", "provided": {"paypal": {"accountHolder": "Mary Ann Smith"}}}
        }));
        assert_eq!(
            payer_name(txn.customer.as_ref(), txn.source_of_funds.as_ref()),
            ("Mary".to_string(), "Ann Smith".to_string())
        );
        assert_eq!(payer_name(None, None), (String::new(), String::new()));
    }

    #[test]
    fn brand_label_recognizes_browser_payments_and_paypal() {
        let knet = parse(json!({"sourceOfFunds": {"type": "BROWSER_PAYMENT", "browserPayment": {"type": "KNET"}}}));
        assert_eq!(brand_label(knet.source_of_funds.as_ref()), "KNET");

        let other = parse(json!({"sourceOfFunds": {"type": "BROWSER_PAYMENT", "browserPayment": {"type": "SOFORT"}}}));
        assert_eq!(brand_label(other.source_of_funds.as_ref()), "");

        let paypal = parse(json!({"sourceOfFunds": {"type": "paypal"}}));
        assert_eq!(brand_label(paypal.source_of_funds.as_ref()), "PAYPAL");

        assert_eq!(brand_label(None), "");
    }

    #[test]
    fn card_details() {
        let txn = parse(json!({
            "sourceOfFunds": {
                "type": "CARD",
                "provided": {"card": {
                    "number": "512345xxxxxx0008",
                    "nameOnCard": "A LOVELACE",
                    "expiry": {"month": "05", "year": "39"}
                }}
            }
        }));

        let card = payment_details(txn.source_of_funds.as_ref(), None).unwrap();
        assert_eq!(card.number.as_deref(), Some("512345xxxxxx0008"));
        assert_eq!(card.expiration.as_deref(), Some("05/39"));
        assert_eq!(card.brand.as_deref(), Some("CARD"));
        assert_eq!(card.holder.as_deref(), Some("A LOVELACE"));
    }

    #[test]
    fn non_card_details_use_label_and_payer() {
        let txn = parse(json!({
            "customer": {"firstName": "Grace", "lastName": "Hopper"},
            "sourceOfFunds": {"type": "PAYPAL"}
        }));

        let card = payment_details(txn.source_of_funds.as_ref(), txn.customer.as_ref()).unwrap();
        assert_eq!(card.number, None);
        assert_eq!(card.expiration, None);
        assert_eq!(card.brand.as_deref(), Some("PAYPAL"));
        assert_eq!(card.holder.as_deref(), Some("Grace Hopper"));
    }

    #[test]
    fn unknown_instrument_fails() {
        assert_eq!(
            payment_details(None, None),
            Err(PaymentFailure::UnknownTransactionType)
        );
        let txn = parse(json!({"sourceOfFunds": {"provided": {}}}));
        assert_eq!(
            payment_details(txn.source_of_funds.as_ref(), None),
            Err(PaymentFailure::UnknownTransactionType)
        );
    }
}
