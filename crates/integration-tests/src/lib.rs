//! Integration tests for the Brightfold data layer.
//!
//! Every scenario runs against [`brightfold_store::MemoryStore`]; nothing
//! here needs a network or an emulator. This crate's library half holds the
//! shared fixtures and a write-failing store wrapper; the scenarios live in
//! `tests/`.
//!
//! # Test Categories
//!
//! - `checkout_flow` - Cart to order to cleared cart, order numbering
//! - `scope_isolation` - Sync controller rebinds across tenants
//! - `optimistic_writes` - Two-phase mutation against a failing store
//! - `expense_pipeline` - Extraction output to analytics to CSV

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rust_decimal::Decimal;
use serde_json::Value;

use brightfold_commerce::{
    Address, Cart, CartLine, CartOp, CheckoutRequest, CustomerInfo, PaymentMethod,
};
use brightfold_core::{CurrencyCode, Email, ProductId, VariantId};
use brightfold_store::{
    CollectionPath, CollectionWatch, DocPath, DocWatch, Document, DocumentStore, MemoryStore,
    Query, StoreError, WriteMode,
};

/// Install a fmt subscriber honoring `RUST_LOG`, once per process.
///
/// Call at the top of a test to see repository and sync tracing while
/// debugging; repeated calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// A cart line for the test catalog.
#[must_use]
pub fn line(product: &str, variant: Option<&str>, quantity: u32, unit_price: i64) -> CartLine {
    CartLine {
        product_id: ProductId::new(product),
        variant_id: variant.map(VariantId::new),
        title: format!("Product {product}"),
        unit_price: Decimal::from(unit_price),
        quantity,
        image_url: None,
    }
}

/// A cart holding the given lines.
#[must_use]
pub fn cart_with(lines: Vec<CartLine>) -> Cart {
    lines
        .into_iter()
        .fold(Cart::empty(CurrencyCode::USD), |cart, line| {
            cart.apply(CartOp::AddItem(line))
        })
}

/// A checkout request with fixed customer and address details.
///
/// # Panics
///
/// Never; the fixture email is valid.
#[must_use]
pub fn checkout_request() -> CheckoutRequest {
    CheckoutRequest {
        customer: CustomerInfo {
            customer_id: None,
            name: "Ada Lovelace".to_owned(),
            email: Email::parse("ada@example.com").expect("fixture email"),
            phone: None,
        },
        shipping_address: Address {
            line1: "1 Analytical Way".to_owned(),
            line2: None,
            city: "London".to_owned(),
            region: None,
            postal_code: "N1 9GU".to_owned(),
            country: "GB".to_owned(),
        },
        billing_address: None,
        payment_method: PaymentMethod::Card,
        shipping: Decimal::from(5),
        tax: Decimal::ZERO,
    }
}

/// Store wrapper whose writes can be switched to fail, for exercising the
/// revert half of optimistic mutation. Reads and subscriptions always pass
/// through.
#[derive(Debug, Clone, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_writes: Arc<AtomicBool>,
}

impl FlakyStore {
    /// A store that behaves normally until told otherwise.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch write failure on or off.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected write failure".to_owned()));
        }
        Ok(())
    }
}

impl DocumentStore for FlakyStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Value>, StoreError> {
        self.inner.get(path).await
    }

    async fn set(&self, path: &DocPath, value: Value, mode: WriteMode) -> Result<(), StoreError> {
        self.check_writable()?;
        self.inner.set(path, value, mode).await
    }

    async fn update<F>(&self, path: &DocPath, f: F) -> Result<Option<Value>, StoreError>
    where
        F: FnOnce(Option<Value>) -> Option<Value> + Send,
    {
        self.check_writable()?;
        self.inner.update(path, f).await
    }

    async fn delete(&self, path: &DocPath) -> Result<(), StoreError> {
        self.check_writable()?;
        self.inner.delete(path).await
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.inner.query(query).await
    }

    fn watch_doc(&self, path: &DocPath) -> Result<DocWatch, StoreError> {
        self.inner.watch_doc(path)
    }

    fn watch_collection(&self, path: &CollectionPath) -> Result<CollectionWatch, StoreError> {
        self.inner.watch_collection(path)
    }
}

/// Yield until `predicate` holds or the budget runs out.
///
/// # Panics
///
/// Panics if the condition is not reached within the yield budget.
pub async fn wait_until(mut predicate: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if predicate() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
