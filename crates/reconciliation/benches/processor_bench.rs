use std::sync::Arc;

use common::{CartId, Currency, Money, OrderId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{InMemoryOrderRepository, LogNotifier, Order, OrderService, OrderState, StateMapping};
use gateway::GatewayResponse;
use ledger::InMemoryLedger;
use reconciliation::{
    CHECKOUT_CHAIN, Cart, CartLine, CheckoutSettings, REFUND_CHAIN, ResponseProcessor,
    build_session_request,
};
use serde_json::json;

type Processor = ResponseProcessor<InMemoryOrderRepository, InMemoryLedger, LogNotifier>;

fn setup() -> (Processor, StateMapping) {
    let mapping = StateMapping::default();
    let service = OrderService::new(
        InMemoryOrderRepository::new(),
        InMemoryLedger::new(),
        LogNotifier,
        mapping.clone(),
    );
    (ResponseProcessor::new(Arc::new(service)), mapping)
}

fn order(mapping: &StateMapping, state: OrderState) -> Order {
    Order::new(
        OrderId::new(1),
        CartId::new(10),
        mapping.id(state),
        Currency::parse("USD").unwrap(),
        Money::from_cents(2_500),
    )
}

fn retrieved_order() -> GatewayResponse {
    GatewayResponse::from_json(json!({
        "id": "10",
        "amount": 25.0,
        "currency": "USD",
        "status": "AUTHORIZED",
        "risk": {"response": {"gatewayCode": "ACCEPTED"}},
        "transaction": [{
            "response": {"gatewayCode": "APPROVED"},
            "transaction": {"id": "AUTH-1", "type": "AUTHORIZATION", "amount": 25.0},
            "sourceOfFunds": {"type": "CARD", "provided": {"card": {
                "number": "512345xxxxxx0008",
                "brand": "MASTERCARD",
                "expiry": {"month": "5", "year": "29"}
            }}}
        }]
    }))
    .unwrap()
}

fn bench_checkout_chain(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (processor, mapping) = setup();
    let response = retrieved_order();

    c.bench_function("reconciliation/checkout_chain", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut order = order(&mapping, OrderState::AwaitingPayment);
                processor
                    .process(&mut order, &response, CHECKOUT_CHAIN)
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_declined_refund_chain(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (processor, mapping) = setup();
    let response = GatewayResponse::from_json(json!({
        "response": {"gatewayCode": "DECLINED"},
        "order": {"status": "CAPTURED"}
    }))
    .unwrap();

    c.bench_function("reconciliation/declined_refund_chain", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut order = order(&mapping, OrderState::PaymentAccepted);
                let _ = processor.process(&mut order, &response, REFUND_CHAIN).await;
            });
        });
    });
}

fn bench_session_request(c: &mut Criterion) {
    let mut settings = CheckoutSettings::new("shop-", "Benchmark Shop");
    settings.line_items_enabled = true;
    let cart = Cart {
        id: CartId::new(10),
        currency: Currency::parse("USD").unwrap(),
        total: Money::from_cents(10_000),
        lines: (0..20)
            .map(|i| CartLine {
                name: format!("Product {i}"),
                sku: Some(format!("SKU-{i:03}")),
                quantity: 3,
                unit_price: Money::from_cents(167),
            })
            .collect(),
        customer: None,
        billing_address: None,
        shipping_address: None,
        shipping_contact: None,
    };

    c.bench_function("reconciliation/build_session_request", |b| {
        b.iter(|| build_session_request(&settings, &cart));
    });
}

criterion_group!(
    benches,
    bench_checkout_chain,
    bench_declined_refund_chain,
    bench_session_request
);
criterion_main!(benches);
