//! Checkout end to end: cart to order to cleared cart.

use brightfold_commerce::{CartRepository, CheckoutService, CommerceError, OrderRepository};
use brightfold_core::{CurrencyCode, OrderStatus, PaymentStatus, StoreScope};
use brightfold_integration_tests::{cart_with, checkout_request, line};
use brightfold_store::MemoryStore;
use rust_decimal::Decimal;

fn scope() -> StoreScope {
    StoreScope::new("u-1", "s-1")
}

#[tokio::test]
async fn test_checkout_moves_cart_into_order() {
    brightfold_integration_tests::init_tracing();

    let store = MemoryStore::new();
    let carts = CartRepository::new(&store, CurrencyCode::USD);
    let cart = cart_with(vec![line("A", None, 2, 10), line("B", Some("red"), 1, 7)]);
    carts.save(&scope(), &cart).await.expect("save cart");

    let service = CheckoutService::new(&store, CurrencyCode::USD);
    let order = service
        .checkout(&scope(), &cart, checkout_request())
        .await
        .expect("checkout");

    // Order carries a snapshot of the cart plus the monetary breakdown.
    assert_eq!(order.items, cart.items);
    assert_eq!(order.amounts.subtotal, Decimal::from(27));
    assert_eq!(order.amounts.total, Decimal::from(32)); // + 5 shipping
    assert_eq!(order.status, OrderStatus::Pending);

    // The cart document is gone; a fresh load is empty.
    assert!(carts.load(&scope()).await.expect("reload").is_empty());
}

#[tokio::test]
async fn test_order_numbers_increase_by_one() {
    let store = MemoryStore::new();
    let service = CheckoutService::new(&store, CurrencyCode::USD);

    for expected in ["ORD-000001", "ORD-000002", "ORD-000003"] {
        let cart = cart_with(vec![line("A", None, 1, 10)]);
        let order = service
            .checkout(&scope(), &cart, checkout_request())
            .await
            .expect("checkout");
        assert_eq!(order.order_number.as_str(), expected);
    }
}

#[tokio::test]
async fn test_order_numbers_are_per_store() {
    let store = MemoryStore::new();
    let service = CheckoutService::new(&store, CurrencyCode::USD);
    let other_scope = StoreScope::new("u-1", "s-2");

    let cart = cart_with(vec![line("A", None, 1, 10)]);
    let first = service
        .checkout(&scope(), &cart.clone(), checkout_request())
        .await
        .expect("checkout");
    let other = service
        .checkout(&other_scope, &cart, checkout_request())
        .await
        .expect("checkout");

    // Each store runs its own sequence.
    assert_eq!(first.order_number.as_str(), "ORD-000001");
    assert_eq!(other.order_number.as_str(), "ORD-000001");
}

#[tokio::test]
async fn test_payment_confirmation_after_checkout() {
    let store = MemoryStore::new();
    let service = CheckoutService::new(&store, CurrencyCode::USD);
    let cart = cart_with(vec![line("A", None, 1, 10)]);
    let order = service
        .checkout(&scope(), &cart, checkout_request())
        .await
        .expect("checkout");

    let orders = OrderRepository::new(&store);
    orders
        .set_payment_status(&scope(), &order.id, PaymentStatus::Paid)
        .await
        .expect("mark paid");

    let reloaded = orders
        .get(&scope(), &order.id)
        .await
        .expect("get")
        .expect("order exists");
    assert_eq!(reloaded.status, OrderStatus::Paid);
    assert_eq!(reloaded.payment_status, PaymentStatus::Paid);
    assert!(reloaded.timestamps.paid_at.is_some());
}

#[tokio::test]
async fn test_checkout_empty_cart_is_rejected() {
    let store = MemoryStore::new();
    let service = CheckoutService::new(&store, CurrencyCode::USD);
    let cart = cart_with(vec![]);

    let result = service.checkout(&scope(), &cart, checkout_request()).await;
    assert!(matches!(result, Err(CommerceError::EmptyCart)));

    // Nothing was written.
    let orders = OrderRepository::new(&store);
    assert!(orders.list(&scope()).await.expect("list").is_empty());
}
