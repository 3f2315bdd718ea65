//! Integration tests for the reconciliation pipeline.
//!
//! These tests run full flows (checkout return, void, capture, refunds)
//! against the in-memory gateway, ledger and order repository.

use std::sync::Arc;

use common::{CartId, Currency, Money, OrderId};
use domain::{
    ExchangeRates, InMemoryOrderRepository, LogNotifier, Order, OrderRepository, OrderService,
    OrderState, StateMapping,
};
use gateway::{GatewayCall, GatewayError, GatewayResponse, InMemoryGateway, Operation};
use ledger::{InMemoryLedger, Ledger, LedgerExt, PaymentKind};
use reconciliation::{
    CHECKOUT_CHAIN, Cart, CartLine, CheckoutService, CheckoutSettings, CreditNote, PaymentActions,
    PaymentFailure, REFUND_CHAIN, ReconciliationError, ResponseHandler, ResponseProcessor,
};
use rust_decimal::Decimal;
use serde_json::{Value, json};

const PREFIX: &str = "shop-";

type Service = OrderService<InMemoryOrderRepository, InMemoryLedger, LogNotifier>;
type Actions = PaymentActions<InMemoryGateway, InMemoryOrderRepository, InMemoryLedger, LogNotifier>;
type Checkout = CheckoutService<InMemoryGateway, InMemoryOrderRepository, InMemoryLedger, LogNotifier>;

struct Harness {
    gateway: Arc<InMemoryGateway>,
    orders: Arc<Service>,
    actions: Actions,
    checkout: Checkout,
}

impl Harness {
    fn new(gateway: InMemoryGateway) -> Self {
        Self::with_rates(gateway, ExchangeRates::new(usd()))
    }

    fn with_rates(gateway: InMemoryGateway, rates: ExchangeRates) -> Self {
        let gateway = Arc::new(gateway);
        let orders = Arc::new(
            OrderService::new(
                InMemoryOrderRepository::new(),
                InMemoryLedger::new(),
                LogNotifier,
                StateMapping::default(),
            )
            .with_exchange_rates(rates),
        );
        let actions = PaymentActions::new(Arc::clone(&gateway), Arc::clone(&orders), PREFIX);
        let checkout = CheckoutService::new(
            Arc::clone(&gateway),
            Arc::clone(&orders),
            CheckoutSettings::new(PREFIX, "Test Shop"),
        );
        Self {
            gateway,
            orders,
            actions,
            checkout,
        }
    }

    fn processor(&self) -> ResponseProcessor<InMemoryOrderRepository, InMemoryLedger, LogNotifier> {
        ResponseProcessor::new(Arc::clone(&self.orders))
    }

    async fn place_order(&self, id: i64, state: OrderState) -> Order {
        let order = Order::new(
            OrderId::new(id),
            CartId::new(10),
            self.orders.mapping().id(state),
            usd(),
            Money::from_cents(2_500),
        )
        .with_reference("XKBKNABJK");
        self.orders.orders().save(&order).await.unwrap();
        order
    }

    async fn reload(&self, id: i64) -> Order {
        self.orders.require_order(OrderId::new(id)).await.unwrap()
    }

    async fn state_of(&self, id: i64) -> Option<OrderState> {
        let order = self.reload(id).await;
        self.orders.state_of(&order)
    }
}

fn usd() -> Currency {
    Currency::parse("USD").unwrap()
}

fn card() -> Value {
    json!({
        "type": "CARD",
        "provided": {"card": {
            "number": "512345xxxxxx0008",
            "brand": "MASTERCARD",
            "nameOnCard": "Jane Doe",
            "expiry": {"month": "5", "year": "29"}
        }}
    })
}

fn transaction(id: &str, kind: &str, code: &str) -> Value {
    json!({
        "result": "SUCCESS",
        "response": {"gatewayCode": code},
        "transaction": {"id": id, "type": kind, "amount": 25.0, "currency": "USD"},
        "sourceOfFunds": card()
    })
}

/// A retrieved order with one transaction.
fn gateway_order(status: &str, txn: Value) -> GatewayResponse {
    GatewayResponse::from_json(json!({
        "id": "shop-10",
        "amount": 25.0,
        "currency": "USD",
        "status": status,
        "transaction": [txn]
    }))
    .unwrap()
}

fn authorized_order() -> GatewayResponse {
    gateway_order("AUTHORIZED", transaction("AUTH-1", "AUTHORIZATION", "APPROVED"))
}

async fn authorized_harness() -> Harness {
    let gateway = InMemoryGateway::new()
        .with_order("shop-10", authorized_order())
        .await;
    let harness = Harness::new(gateway);
    harness.place_order(1, OrderState::AwaitingPayment).await;
    harness
        .checkout
        .complete(OrderId::new(1), "shop-10")
        .await
        .unwrap();
    harness
}

mod checkout_return {
    use super::*;

    #[tokio::test]
    async fn authorized_order_is_booked() {
        let gateway = InMemoryGateway::new()
            .with_order("shop-10", authorized_order())
            .await;
        let harness = Harness::new(gateway);
        harness.place_order(1, OrderState::AwaitingPayment).await;

        let outcome = harness
            .checkout
            .complete(OrderId::new(1), "shop-10")
            .await
            .unwrap();

        assert!(harness.orders.is_in(&outcome.order, OrderState::Authorized));
        assert_eq!(outcome.order.total_paid_real, Money::from_cents(2_500));

        let ledger = harness.orders.ledger();
        assert_eq!(ledger.history_for_order(OrderId::new(1)).await.unwrap().len(), 1);
        assert!(!ledger.has_refunds(OrderId::new(1)).await.unwrap());
        assert!(!ledger.has_voids(OrderId::new(1)).await.unwrap());

        let payments = ledger.payments_for_order(OrderId::new(1)).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].transaction_id, "AUTH-1");
        assert_eq!(payments[0].kind, PaymentKind::Authorization);
        assert_eq!(payments[0].order_reference, "shop-10");
        assert_eq!(payments[0].card.number.as_deref(), Some("512345xxxxxx0008"));
        assert_eq!(payments[0].card.expiration.as_deref(), Some("5/29"));
        assert_eq!(payments[0].card.brand.as_deref(), Some("MASTERCARD"));
        assert_eq!(payments[0].card.holder.as_deref(), Some("Jane Doe"));

        // Persisted, not only returned.
        assert_eq!(harness.reload(1).await, outcome.order);
    }

    #[tokio::test]
    async fn captured_purchase_is_accepted() {
        let gateway = InMemoryGateway::new()
            .with_order(
                "shop-10",
                gateway_order("CAPTURED", transaction("PAY-1", "PAYMENT", "APPROVED")),
            )
            .await;
        let harness = Harness::new(gateway);
        harness.place_order(1, OrderState::AwaitingPayment).await;

        harness
            .checkout
            .complete(OrderId::new(1), "shop-10")
            .await
            .unwrap();

        assert_eq!(harness.state_of(1).await, Some(OrderState::PaymentAccepted));
        let payments = harness
            .orders
            .ledger()
            .payments_for_order(OrderId::new(1))
            .await
            .unwrap();
        assert_eq!(payments[0].kind, PaymentKind::Capture);
    }

    #[tokio::test]
    async fn declined_payment_ends_in_error() {
        let gateway = InMemoryGateway::new()
            .with_order(
                "shop-10",
                gateway_order("FAILED", transaction("AUTH-1", "AUTHORIZATION", "DECLINED")),
            )
            .await;
        let harness = Harness::new(gateway);
        harness.place_order(1, OrderState::AwaitingPayment).await;

        let err = harness
            .checkout
            .complete(OrderId::new(1), "shop-10")
            .await
            .unwrap_err();

        assert!(err.is_declared_failure());
        assert_eq!(err.to_string(), "The payment was declined. (DECLINED)");
        assert_eq!(harness.state_of(1).await, Some(OrderState::Error));
        assert_eq!(
            harness
                .orders
                .ledger()
                .payments_for_order(OrderId::new(1))
                .await
                .unwrap()
                .len(),
            0
        );
    }

    fn euro_purchase() -> GatewayResponse {
        GatewayResponse::from_json(json!({
            "id": "shop-10",
            "amount": 20.0,
            "currency": "EUR",
            "status": "CAPTURED",
            "transaction": [{
                "result": "SUCCESS",
                "response": {"gatewayCode": "APPROVED"},
                "transaction": {"id": "PAY-1", "type": "PAYMENT", "amount": 20.0, "currency": "EUR"},
                "sourceOfFunds": card()
            }]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn foreign_currency_payment_is_converted() {
        let gateway = InMemoryGateway::new()
            .with_order("shop-10", euro_purchase())
            .await;
        let rates = ExchangeRates::new(usd())
            .with_rate(Currency::parse("EUR").unwrap(), Decimal::new(8, 1));
        let harness = Harness::with_rates(gateway, rates);
        harness.place_order(1, OrderState::AwaitingPayment).await;

        let outcome = harness
            .checkout
            .complete(OrderId::new(1), "shop-10")
            .await
            .unwrap();

        assert!(harness.orders.is_in(&outcome.order, OrderState::PaymentAccepted));
        assert_eq!(outcome.order.total_paid_real, Money::from_cents(2_500));

        let payments = harness
            .orders
            .ledger()
            .payments_for_order(OrderId::new(1))
            .await
            .unwrap();
        assert_eq!(payments[0].amount, Money::from_cents(2_000));
        assert_eq!(payments[0].currency.code(), "EUR");
    }

    #[tokio::test]
    async fn foreign_currency_without_rate_ends_in_error() {
        let gateway = InMemoryGateway::new()
            .with_order("shop-10", euro_purchase())
            .await;
        let harness = Harness::new(gateway);
        harness.place_order(1, OrderState::AwaitingPayment).await;

        let err = harness
            .checkout
            .complete(OrderId::new(1), "shop-10")
            .await
            .unwrap_err();

        assert!(err.is_declared_failure());
        assert_eq!(err.to_string(), "No exchange rate from EUR to USD");
        assert_eq!(harness.state_of(1).await, Some(OrderState::Error));
        assert!(harness.reload(1).await.total_paid_real.is_zero());
        assert!(
            harness
                .orders
                .ledger()
                .payments_for_order(OrderId::new(1))
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn pending_review_holds_the_order() {
        let mut document = authorized_order();
        document.risk = serde_json::from_value(json!({
            "response": {"gatewayCode": "REVIEW_REQUIRED", "review": {"decision": "PENDING"}}
        }))
        .unwrap();
        let gateway = InMemoryGateway::new().with_order("shop-10", document).await;
        let harness = Harness::new(gateway);
        harness.place_order(1, OrderState::AwaitingPayment).await;

        harness
            .checkout
            .complete(OrderId::new(1), "shop-10")
            .await
            .unwrap();

        // The status handler leaves orders under review alone.
        assert_eq!(harness.state_of(1).await, Some(OrderState::ReviewRequired));
        let ledger = harness.orders.ledger();
        assert_eq!(ledger.history_for_order(OrderId::new(1)).await.unwrap().len(), 1);
        assert_eq!(ledger.payments_for_order(OrderId::new(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejected_risk_marks_fraud() {
        let mut document = authorized_order();
        document.risk = serde_json::from_value(json!({"response": {"gatewayCode": "REJECTED"}}))
            .unwrap();
        let gateway = InMemoryGateway::new().with_order("shop-10", document).await;
        let harness = Harness::new(gateway);
        harness.place_order(1, OrderState::AwaitingPayment).await;

        harness
            .checkout
            .complete(OrderId::new(1), "shop-10")
            .await
            .unwrap();

        assert_eq!(harness.state_of(1).await, Some(OrderState::Fraud));
    }

    #[tokio::test]
    async fn mismatched_reference_is_rejected_before_the_gateway() {
        let gateway = InMemoryGateway::new()
            .with_order("shop-10", authorized_order())
            .await;
        let harness = Harness::new(gateway);
        harness.place_order(1, OrderState::AwaitingPayment).await;

        let err = harness
            .checkout
            .complete(OrderId::new(1), "shop-99")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReconciliationError::Payment(PaymentFailure::OrderReferenceMismatch { .. })
        ));
        assert_eq!(harness.gateway.call_count(Operation::RetrieveOrder).await, 0);
        assert_eq!(harness.state_of(1).await, Some(OrderState::AwaitingPayment));
    }

    #[tokio::test]
    async fn unknown_order_is_a_domain_error() {
        let harness = Harness::new(InMemoryGateway::new());

        let err = harness
            .checkout
            .complete(OrderId::new(404), "shop-10")
            .await
            .unwrap_err();

        assert!(matches!(err, ReconciliationError::Domain(_)));
        assert!(!err.is_declared_failure());
    }

    #[tokio::test]
    async fn session_request_carries_the_cart() {
        let harness = Harness::new(InMemoryGateway::new());
        let cart = Cart {
            id: CartId::new(10),
            currency: usd(),
            total: Money::from_cents(2_500),
            lines: vec![CartLine {
                name: "Mug".to_string(),
                sku: Some("MUG-1".to_string()),
                quantity: 2,
                unit_price: Money::from_cents(1_000),
            }],
            customer: None,
            billing_address: None,
            shipping_address: None,
            shipping_contact: None,
        };

        let session = harness.checkout.create_session(&cart).await.unwrap();
        assert_eq!(session.session.id, "SESSION-1");

        let calls = harness.gateway.calls().await;
        let GatewayCall::CreateSession { request } = &calls[0] else {
            panic!("expected a session call, got {:?}", calls[0]);
        };
        assert_eq!(request.order.id, "shop-10");
        assert_eq!(request.order.amount, Money::from_cents(2_500));
        // Line items are off by default.
        assert_eq!(request.order.item, None);
    }
}

mod admin_actions {
    use super::*;

    #[tokio::test]
    async fn void_cancels_and_drops_the_authorization() {
        let harness = authorized_harness().await;

        let outcome = harness.actions.void(OrderId::new(1)).await.unwrap();

        assert!(harness.orders.is_in(&outcome.order, OrderState::Canceled));
        let ledger = harness.orders.ledger();
        assert!(ledger.payments_for_order(OrderId::new(1)).await.unwrap().is_empty());

        let voids = ledger.voids_for_order(OrderId::new(1)).await.unwrap();
        assert_eq!(voids.len(), 1);
        assert_eq!(voids[0].total, Money::from_cents(2_500));

        let calls = harness.gateway.calls().await;
        assert!(calls.contains(&GatewayCall::Void {
            order_ref: "shop-10".to_string(),
            transaction_id: "AUTH-1".to_string(),
        }));
    }

    #[tokio::test]
    async fn capture_accepts_and_replaces_the_authorization() {
        let harness = authorized_harness().await;

        let outcome = harness.actions.capture(OrderId::new(1)).await.unwrap();

        assert!(harness.orders.is_in(&outcome.order, OrderState::PaymentAccepted));
        let payments = harness
            .orders
            .ledger()
            .payments_for_order(OrderId::new(1))
            .await
            .unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].kind, PaymentKind::Capture);
        assert_eq!(payments[0].amount, Money::from_cents(2_500));
    }

    #[tokio::test]
    async fn declined_capture_leaves_the_state() {
        let harness = authorized_harness().await;
        harness
            .gateway
            .script(
                Operation::Capture,
                Ok(GatewayResponse::from_json(json!({
                    "response": {"gatewayCode": "DECLINED"},
                    "order": {"status": "AUTHORIZED"}
                }))
                .unwrap()),
            )
            .await;

        let err = harness.actions.capture(OrderId::new(1)).await.unwrap_err();

        assert_eq!(err.to_string(), "The operation was declined. (DECLINED)");
        assert_eq!(harness.state_of(1).await, Some(OrderState::Authorized));
    }

    #[tokio::test]
    async fn full_refund_is_recorded() {
        let harness = authorized_harness().await;
        harness.actions.capture(OrderId::new(1)).await.unwrap();

        let outcome = harness.actions.refund(OrderId::new(1)).await.unwrap();

        assert!(harness.orders.is_in(&outcome.order, OrderState::Refunded));
        let ledger = harness.orders.ledger();
        let refunds = ledger.refunds_for_order(OrderId::new(1)).await.unwrap();
        assert_eq!(refunds.len(), 1);
        assert_eq!(refunds[0].total, Money::from_cents(2_500));
        assert!(ledger.has_full_refund(OrderId::new(1)).await.unwrap());
    }

    #[tokio::test]
    async fn declined_refund_records_nothing() {
        let harness = Harness::new(
            InMemoryGateway::new()
                .with_order("shop-10", authorized_order())
                .await,
        );
        harness.place_order(1, OrderState::PaymentAccepted).await;
        harness
            .gateway
            .script(
                Operation::Refund,
                Ok(GatewayResponse::from_json(json!({
                    "response": {"gatewayCode": "DECLINED"},
                    "order": {"status": "CAPTURED"}
                }))
                .unwrap()),
            )
            .await;

        let err = harness.actions.refund(OrderId::new(1)).await.unwrap_err();

        assert!(err.to_string().contains("declined"));
        assert!(!harness.orders.ledger().has_refunds(OrderId::new(1)).await.unwrap());
        assert_eq!(harness.state_of(1).await, Some(OrderState::PaymentAccepted));
    }

    #[tokio::test]
    async fn missing_authorization_fails_before_refunding() {
        let harness = Harness::new(
            InMemoryGateway::new()
                .with_order(
                    "shop-10",
                    gateway_order("CAPTURED", transaction("V-1", "VERIFICATION", "APPROVED")),
                )
                .await,
        );
        harness.place_order(1, OrderState::PaymentAccepted).await;

        let err = harness.actions.refund(OrderId::new(1)).await.unwrap_err();

        assert_eq!(err.to_string(), "Authorization transaction not found.");
        assert_eq!(harness.gateway.call_count(Operation::Refund).await, 0);
    }

    #[tokio::test]
    async fn void_without_local_authorization_fails() {
        let harness = Harness::new(
            InMemoryGateway::new()
                .with_order("shop-10", authorized_order())
                .await,
        );
        harness.place_order(1, OrderState::Authorized).await;

        let err = harness.actions.void(OrderId::new(1)).await.unwrap_err();

        assert!(matches!(
            err,
            ReconciliationError::Payment(PaymentFailure::AuthorizationNotFound)
        ));
        assert_eq!(harness.gateway.call_count(Operation::Void).await, 0);
    }

    #[tokio::test]
    async fn fraud_order_is_blocked() {
        let harness = Harness::new(
            InMemoryGateway::new()
                .with_order("shop-10", authorized_order())
                .await,
        );
        harness.place_order(1, OrderState::Fraud).await;

        let err = harness.actions.refund(OrderId::new(1)).await.unwrap_err();

        assert_eq!(err.to_string(), "Payment is marked as fraud, action is blocked.");
        assert!(!harness.orders.ledger().has_refunds(OrderId::new(1)).await.unwrap());
        assert_eq!(harness.state_of(1).await, Some(OrderState::Fraud));
    }

    #[tokio::test]
    async fn other_payment_modules_are_refused() {
        let harness = Harness::new(InMemoryGateway::new());
        let order = Order::new(
            OrderId::new(2),
            CartId::new(20),
            harness.orders.mapping().id(OrderState::Authorized),
            usd(),
            Money::from_cents(1_000),
        )
        .with_payment_module("cheque");
        harness.orders.orders().save(&order).await.unwrap();

        let err = harness.actions.void(OrderId::new(2)).await.unwrap_err();
        assert!(matches!(
            err,
            ReconciliationError::Payment(PaymentFailure::NotPaidThroughGateway)
        ));

        let available = harness.actions.available_actions(OrderId::new(2)).await.unwrap();
        assert!(!available.any());
        assert!(harness.gateway.calls().await.is_empty());
    }
}

mod credit_notes {
    use super::*;

    fn note(products: i64, shipping: i64) -> CreditNote {
        CreditNote {
            id: 77,
            order_id: OrderId::new(1),
            products_total: Money::from_cents(products),
            shipping_total: Money::from_cents(shipping),
        }
    }

    #[tokio::test]
    async fn refund_is_linked_to_the_note() {
        let harness = authorized_harness().await;
        harness.actions.capture(OrderId::new(1)).await.unwrap();

        let record = harness
            .actions
            .refund_credit_note(&note(1_000, 200), true)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.total, Money::from_cents(1_200));
        assert_eq!(record.credit_note_id, Some(77));

        let ledger = harness.orders.ledger();
        assert_eq!(ledger.refunds_for_order(OrderId::new(1)).await.unwrap(), vec![record]);
        assert!(!ledger.has_full_refund(OrderId::new(1)).await.unwrap());

        let calls = harness.gateway.calls().await;
        assert!(calls.contains(&GatewayCall::Refund {
            order_ref: "shop-10".to_string(),
            amount: Money::from_cents(1_200),
            currency: usd(),
        }));

        // Less than the order total.
        assert_eq!(harness.state_of(1).await, Some(OrderState::PartiallyRefunded));
    }

    #[tokio::test]
    async fn skipped_without_withdrawal() {
        let harness = authorized_harness().await;

        let record = harness
            .actions
            .refund_credit_note(&note(1_000, 0), false)
            .await
            .unwrap();

        assert_eq!(record, None);
        assert_eq!(harness.gateway.call_count(Operation::Refund).await, 0);
    }

    #[tokio::test]
    async fn transport_error_propagates_and_records_nothing() {
        let harness = authorized_harness().await;
        harness
            .gateway
            .script(
                Operation::Refund,
                Err(GatewayError::Transport("connection reset".to_string())),
            )
            .await;

        let err = harness
            .actions
            .refund_credit_note(&note(1_000, 0), true)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReconciliationError::Gateway(GatewayError::Transport(_))
        ));
        assert!(!err.is_declared_failure());
        assert!(!harness.orders.ledger().has_refunds(OrderId::new(1)).await.unwrap());
    }
}

mod available_actions {
    use super::*;

    #[tokio::test]
    async fn follow_the_payment_lifecycle() {
        let harness = authorized_harness().await;
        let id = OrderId::new(1);

        let authorized = harness.actions.available_actions(id).await.unwrap();
        assert!(authorized.can_void && authorized.can_capture);
        assert!(!authorized.can_refund && !authorized.can_partial_refund);

        harness.actions.capture(id).await.unwrap();
        let paid = harness.actions.available_actions(id).await.unwrap();
        assert!(!paid.can_void && !paid.can_capture);
        assert!(paid.can_refund && paid.can_partial_refund);

        harness
            .actions
            .refund_credit_note(
                &CreditNote {
                    id: 1,
                    order_id: id,
                    products_total: Money::from_cents(500),
                    shipping_total: Money::zero(),
                },
                true,
            )
            .await
            .unwrap();
        assert_eq!(harness.state_of(1).await, Some(OrderState::PartiallyRefunded));
        let partially = harness.actions.available_actions(id).await.unwrap();
        assert!(!partially.can_refund);
        assert!(partially.can_partial_refund);
        assert_eq!(partially.refunds.len(), 1);

        harness.actions.refund(id).await.unwrap();
        let refunded = harness.actions.available_actions(id).await.unwrap();
        assert!(!refunded.any());
        assert_eq!(refunded.refunds.len(), 2);
    }

    #[tokio::test]
    async fn no_partial_refund_after_a_full_refund() {
        let harness = Harness::new(InMemoryGateway::new());
        harness.place_order(1, OrderState::PartiallyRefunded).await;
        let id = OrderId::new(1);

        let before = harness.actions.available_actions(id).await.unwrap();
        assert!(before.can_partial_refund);
        assert!(!before.can_refund);

        harness
            .orders
            .ledger()
            .append_refund(ledger::RefundRecord::new(id, "R-1", Money::from_cents(2_500)))
            .await
            .unwrap();

        let after = harness.actions.available_actions(id).await.unwrap();
        assert!(!after.can_partial_refund);
    }

    #[tokio::test]
    async fn review_is_offered_for_orders_under_review() {
        let harness = Harness::new(InMemoryGateway::new());
        harness.place_order(1, OrderState::ReviewRequired).await;

        let available = harness.actions.available_actions(OrderId::new(1)).await.unwrap();
        assert!(available.can_review);
        assert!(!available.any());
    }
}

mod processing {
    use super::*;

    fn approved_refund() -> GatewayResponse {
        GatewayResponse::from_json(json!({
            "result": "SUCCESS",
            "response": {"gatewayCode": "APPROVED"},
            "order": {"status": "REFUNDED"},
            "transaction": {"id": "R-1", "type": "REFUND", "amount": 25.0, "currency": "USD"}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn review_blocks_every_action_chain() {
        let harness = Harness::new(InMemoryGateway::new());
        let mut order = harness.place_order(1, OrderState::ReviewRequired).await;

        let err = harness
            .processor()
            .process(&mut order, &approved_refund(), &[ResponseHandler::TransactionStatus])
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Risk decision needed, action is blocked.");
        assert!(err.is_declared_failure());
    }

    #[tokio::test]
    async fn replayed_refund_is_recorded_twice() {
        let harness = Harness::new(InMemoryGateway::new());
        let mut order = harness.place_order(1, OrderState::PaymentAccepted).await;
        let processor = harness.processor();
        let response = approved_refund();

        processor.process(&mut order, &response, REFUND_CHAIN).await.unwrap();
        processor.process(&mut order, &response, REFUND_CHAIN).await.unwrap();

        let ledger = harness.orders.ledger();
        let refunds = ledger.refunds_for_order(OrderId::new(1)).await.unwrap();
        assert_eq!(refunds.len(), 2);
        assert!(refunds.iter().all(|r| r.transaction_id == "R-1"));
        // The second run finds the order already refunded.
        assert_eq!(ledger.history_for_order(OrderId::new(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn three_decimal_refund_is_recorded_as_confirmed() {
        let harness = Harness::new(InMemoryGateway::new());
        let mut order = harness.place_order(1, OrderState::PaymentAccepted).await;
        let response = GatewayResponse::from_json(json!({
            "response": {"gatewayCode": "APPROVED"},
            "transaction": {"id": "R1", "amount": 10.125, "currency": "KWD"}
        }))
        .unwrap();

        harness
            .processor()
            .process(&mut order, &response, &[ResponseHandler::Refund])
            .await
            .unwrap();

        let refunds = harness
            .orders
            .ledger()
            .refunds_for_order(OrderId::new(1))
            .await
            .unwrap();
        assert_eq!(refunds.len(), 1);
        assert_eq!(refunds[0].total.to_string(), "10.125");
    }

    #[tokio::test]
    async fn failures_before_the_status_handler_move_to_error() {
        let harness = Harness::new(InMemoryGateway::new());
        let mut order = harness.place_order(1, OrderState::AwaitingPayment).await;
        let response = GatewayResponse::from_json(json!({
            "status": "CAPTURED",
            "transaction": []
        }))
        .unwrap();

        let err = harness
            .processor()
            .process(&mut order, &response, CHECKOUT_CHAIN)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "The payment was declined. (UNKNOWN)");
        assert!(harness.orders.is_in(&order, OrderState::Error));
    }
}
