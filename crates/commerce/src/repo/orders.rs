//! Order repository and order-number sequencing.

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tracing::{instrument, warn};
use uuid::Uuid;

use brightfold_core::{FulfillmentStatus, OrderId, OrderStatus, PaymentStatus, StoreScope};
use brightfold_store::{
    CollectionPath, CollectionWatch, Direction, Document, DocumentStore, Query, WriteMode,
};

use crate::cart::Cart;
use crate::error::CommerceError;
use crate::numbering;
use crate::order::{
    Address, CustomerInfo, Order, OrderAmounts, OrderTimestamps, PaymentMethod, TrackingInfo,
};

use super::{order_counter_doc, orders_collection};

/// Decode a collection snapshot into orders, newest first.
///
/// Corrupt documents are skipped with a warning. Also the mapping half of
/// an orders subscription: pair with [`OrderRepository::watch`].
#[must_use]
pub fn decode_orders(docs: Vec<Document>) -> Vec<Order> {
    let mut orders: Vec<Order> = docs
        .into_iter()
        .filter_map(|doc| match serde_json::from_value(doc.value) {
            Ok(order) => Some(order),
            Err(e) => {
                warn!(path = %doc.path, error = %e, "skipping corrupt order document");
                None
            }
        })
        .collect();
    orders.sort_by(|a, b| {
        b.timestamps
            .created_at
            .cmp(&a.timestamps.created_at)
            .then_with(|| b.order_number.cmp(&a.order_number))
    });
    orders
}

/// Checkout-time order draft: everything not taken from the cart snapshot.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer: CustomerInfo,
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
    pub payment_method: PaymentMethod,
    pub shipping: Decimal,
    pub tax: Decimal,
}

/// Repository for the orders of a (user, store) scope.
pub struct OrderRepository<'a, S> {
    store: &'a S,
}

impl<'a, S: DocumentStore> OrderRepository<'a, S> {
    /// Create a repository over an explicitly constructed store handle.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Newest order's sequence value, from the legacy scan: most recent
    /// order by creation time, `ORD-` suffix parsed. A malformed suffix
    /// seeds 0 rather than failing - numbering continuity loses to
    /// availability.
    async fn latest_sequence(&self, scope: &StoreScope) -> Result<u64, CommerceError> {
        let query = Query::collection(orders_collection(scope)?)
            .order_by("timestamps.created_at", Direction::Descending)
            .limit(1);
        let docs = self.store.query(&query).await?;

        let Some(doc) = docs.first() else {
            return Ok(0);
        };
        let number = doc
            .value
            .get("order_number")
            .and_then(Value::as_str)
            .unwrap_or("");
        Ok(numbering::parse(number).unwrap_or_else(|| {
            warn!(order_number = number, "unparseable order number, restarting sequence");
            0
        }))
    }

    /// Claim the next order sequence value for this store.
    ///
    /// The sequence lives in a counter document advanced with the store's
    /// atomic single-document update, so concurrent checkouts cannot claim
    /// the same number. The counter seeds itself from the legacy
    /// newest-order scan the first time a store allocates a number.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Store`] if the counter read or update fails.
    pub async fn next_sequence(&self, scope: &StoreScope) -> Result<u64, CommerceError> {
        let counter_path = order_counter_doc(scope)?;

        // Seed is only consulted if the counter document is still absent at
        // update time; a concurrent first allocation wins harmlessly.
        let seed = if self.store.get(&counter_path).await?.is_none() {
            self.latest_sequence(scope).await?
        } else {
            0
        };

        let written = self
            .store
            .update(&counter_path, move |current| {
                let base = current
                    .as_ref()
                    .and_then(|value| value.get("sequence"))
                    .and_then(Value::as_u64)
                    .unwrap_or(seed);
                Some(json!({ "sequence": base + 1 }))
            })
            .await?;

        Ok(written
            .as_ref()
            .and_then(|value| value.get("sequence"))
            .and_then(Value::as_u64)
            .unwrap_or(seed + 1))
    }

    /// Create an order at checkout from a cart snapshot.
    ///
    /// Line items are copied out of the cart; the order holds no live
    /// reference to it. The new order starts `pending`/`unfulfilled` with
    /// payment `pending`.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Store`] if sequencing or the write fails.
    #[instrument(skip(self, cart, draft), fields(scope = %scope))]
    pub async fn create(
        &self,
        scope: &StoreScope,
        cart: &Cart,
        draft: NewOrder,
    ) -> Result<Order, CommerceError> {
        let sequence = self.next_sequence(scope).await?;
        let order = Order {
            id: OrderId::new(Uuid::new_v4().to_string()),
            order_number: numbering::format(sequence),
            customer: draft.customer,
            items: cart.items.clone(),
            amounts: OrderAmounts::from_cart(cart, draft.shipping, draft.tax),
            shipping_address: draft.shipping_address,
            billing_address: draft.billing_address,
            payment_method: draft.payment_method,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            fulfillment_status: FulfillmentStatus::Unfulfilled,
            timestamps: OrderTimestamps::new(Utc::now()),
            tracking: None,
            notes: Vec::new(),
        };

        self.persist_full(scope, &order).await?;
        Ok(order)
    }

    async fn persist_full(&self, scope: &StoreScope, order: &Order) -> Result<(), CommerceError> {
        let path = orders_collection(scope)?.doc(order.id.as_str())
            .map_err(brightfold_store::StoreError::from)?;
        let value = serde_json::to_value(order).map_err(brightfold_store::StoreError::from)?;
        self.store.set(&path, value, WriteMode::Replace).await?;
        Ok(())
    }

    /// Merge a partial patch into an order document. Status-only
    /// transitions go through here so unrelated fields written by other
    /// sessions are not clobbered.
    async fn persist_patch(
        &self,
        scope: &StoreScope,
        id: &OrderId,
        patch: Value,
    ) -> Result<(), CommerceError> {
        let path = orders_collection(scope)?.doc(id.as_str())
            .map_err(brightfold_store::StoreError::from)?;
        self.store.set(&path, patch, WriteMode::Merge).await?;
        Ok(())
    }

    /// Load one order.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Store`] if the read fails, or
    /// [`CommerceError::Decode`] if the stored document is corrupt.
    pub async fn get(&self, scope: &StoreScope, id: &OrderId) -> Result<Option<Order>, CommerceError> {
        let path = orders_collection(scope)?.doc(id.as_str())
            .map_err(brightfold_store::StoreError::from)?;
        match self.store.get(&path).await? {
            Some(value) => {
                let order = serde_json::from_value(value).map_err(|source| {
                    CommerceError::Decode {
                        path: path.to_string(),
                        source,
                    }
                })?;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    /// List orders, newest first. Corrupt documents are skipped with a
    /// warning instead of failing the whole listing.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Store`] if the query fails.
    pub async fn list(&self, scope: &StoreScope) -> Result<Vec<Order>, CommerceError> {
        let query = Query::collection(orders_collection(scope)?)
            .order_by("timestamps.created_at", Direction::Descending);
        let docs = self.store.query(&query).await?;
        Ok(decode_orders(docs))
    }

    /// The orders collection path for a scope, for binding a sync
    /// controller.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Store`] if a scope key is not a valid path
    /// segment.
    pub fn collection_path(&self, scope: &StoreScope) -> Result<CollectionPath, CommerceError> {
        Ok(orders_collection(scope)?)
    }

    /// Subscribe to the orders collection.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Store`] if the subscription cannot be
    /// established.
    pub fn watch(&self, scope: &StoreScope) -> Result<CollectionWatch, CommerceError> {
        Ok(self.store.watch_collection(&orders_collection(scope)?)?)
    }

    /// Transition an order's status and persist the change as a partial
    /// merge write.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::OrderNotFound`] if the order does not
    /// exist, [`CommerceError::Transition`] for an illegal move, or
    /// [`CommerceError::Store`] if persistence fails.
    #[instrument(skip(self), fields(scope = %scope))]
    pub async fn set_status(
        &self,
        scope: &StoreScope,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, CommerceError> {
        let mut order = self
            .get(scope, id)
            .await?
            .ok_or_else(|| CommerceError::OrderNotFound(id.clone()))?;
        order.set_status(status, Utc::now())?;

        let patch = json!({
            "status": order.status,
            "fulfillment_status": order.fulfillment_status,
            "timestamps": order.timestamps,
        });
        self.persist_patch(scope, id, patch).await?;
        Ok(order)
    }

    /// Update an order's payment status (marking it `paid` also advances
    /// the order status) and persist the change.
    ///
    /// # Errors
    ///
    /// Same as [`OrderRepository::set_status`].
    #[instrument(skip(self), fields(scope = %scope))]
    pub async fn set_payment_status(
        &self,
        scope: &StoreScope,
        id: &OrderId,
        status: PaymentStatus,
    ) -> Result<Order, CommerceError> {
        let mut order = self
            .get(scope, id)
            .await?
            .ok_or_else(|| CommerceError::OrderNotFound(id.clone()))?;
        order.set_payment_status(status, Utc::now())?;

        let patch = json!({
            "status": order.status,
            "payment_status": order.payment_status,
            "timestamps": order.timestamps,
        });
        self.persist_patch(scope, id, patch).await?;
        Ok(order)
    }

    /// Update an order's fulfillment status and persist the change.
    ///
    /// # Errors
    ///
    /// Same as [`OrderRepository::set_status`], minus transition errors.
    pub async fn set_fulfillment_status(
        &self,
        scope: &StoreScope,
        id: &OrderId,
        status: FulfillmentStatus,
    ) -> Result<Order, CommerceError> {
        let mut order = self
            .get(scope, id)
            .await?
            .ok_or_else(|| CommerceError::OrderNotFound(id.clone()))?;
        order.set_fulfillment_status(status);

        self.persist_patch(scope, id, json!({ "fulfillment_status": order.fulfillment_status }))
            .await?;
        Ok(order)
    }

    /// Attach tracking details and persist the change.
    ///
    /// # Errors
    ///
    /// Same as [`OrderRepository::set_fulfillment_status`].
    pub async fn attach_tracking(
        &self,
        scope: &StoreScope,
        id: &OrderId,
        tracking: TrackingInfo,
    ) -> Result<Order, CommerceError> {
        let mut order = self
            .get(scope, id)
            .await?
            .ok_or_else(|| CommerceError::OrderNotFound(id.clone()))?;
        order.attach_tracking(tracking);

        let patch = json!({ "tracking": order.tracking });
        self.persist_patch(scope, id, patch).await?;
        Ok(order)
    }

    /// Append a note and persist the change.
    ///
    /// # Errors
    ///
    /// Same as [`OrderRepository::set_fulfillment_status`].
    pub async fn add_note(
        &self,
        scope: &StoreScope,
        id: &OrderId,
        body: impl Into<String> + Send,
    ) -> Result<Order, CommerceError> {
        let mut order = self
            .get(scope, id)
            .await?
            .ok_or_else(|| CommerceError::OrderNotFound(id.clone()))?;
        order.add_note(body, Utc::now());

        let patch = json!({ "notes": order.notes });
        self.persist_patch(scope, id, patch).await?;
        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::{CartLine, CartOp};
    use brightfold_core::{CurrencyCode, Email, ProductId};
    use brightfold_store::MemoryStore;

    fn scope() -> StoreScope {
        StoreScope::new("u-1", "s-1")
    }

    fn sample_cart() -> Cart {
        Cart::empty(CurrencyCode::USD).apply(CartOp::AddItem(CartLine {
            product_id: ProductId::new("p-1"),
            variant_id: None,
            title: "Widget".to_owned(),
            unit_price: Decimal::from(10),
            quantity: 2,
            image_url: None,
        }))
    }

    fn draft() -> NewOrder {
        NewOrder {
            customer: CustomerInfo {
                customer_id: None,
                name: "Ada".to_owned(),
                email: Email::parse("ada@example.com").unwrap(),
                phone: None,
            },
            shipping_address: Address {
                line1: "1 Main St".to_owned(),
                line2: None,
                city: "Springfield".to_owned(),
                region: None,
                postal_code: "12345".to_owned(),
                country: "US".to_owned(),
            },
            billing_address: None,
            payment_method: PaymentMethod::Card,
            shipping: Decimal::from(5),
            tax: Decimal::ZERO,
        }
    }

    #[tokio::test]
    async fn test_sequential_order_numbers() {
        let store = MemoryStore::new();
        let repo = OrderRepository::new(&store);

        for expected in 1..=3u64 {
            let order = repo.create(&scope(), &sample_cart(), draft()).await.unwrap();
            assert_eq!(
                order.order_number.as_str(),
                numbering::format(expected).as_str()
            );
        }
    }

    #[tokio::test]
    async fn test_counter_seeds_from_existing_orders() {
        let store = MemoryStore::new();
        let repo = OrderRepository::new(&store);

        // An order written before the counter document existed.
        let order = repo.create(&scope(), &sample_cart(), draft()).await.unwrap();
        assert_eq!(order.order_number.as_str(), "ORD-000001");
        store.delete(&order_counter_doc(&scope()).unwrap()).await.unwrap();

        let next = repo.create(&scope(), &sample_cart(), draft()).await.unwrap();
        assert_eq!(next.order_number.as_str(), "ORD-000002");
    }

    #[tokio::test]
    async fn test_malformed_number_restarts_sequence() {
        let store = MemoryStore::new();
        let repo = OrderRepository::new(&store);

        // A foreign-format order document, no counter.
        let path = orders_collection(&scope()).unwrap().doc("legacy").unwrap();
        store
            .set(
                &path,
                json!({
                    "order_number": "LEGACY-9",
                    "timestamps": {"created_at": "2026-01-01T00:00:00Z"},
                }),
                WriteMode::Replace,
            )
            .await
            .unwrap();

        let sequence = repo.next_sequence(&scope()).await.unwrap();
        assert_eq!(sequence, 1);
    }

    #[tokio::test]
    async fn test_create_snapshots_cart_items() {
        let store = MemoryStore::new();
        let repo = OrderRepository::new(&store);
        let cart = sample_cart();

        let order = repo.create(&scope(), &cart, draft()).await.unwrap();
        assert_eq!(order.items, cart.items);
        assert_eq!(order.amounts.subtotal, Decimal::from(20));
        assert_eq!(order.amounts.total, Decimal::from(25));
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_set_status_persists_patch() {
        let store = MemoryStore::new();
        let repo = OrderRepository::new(&store);
        let order = repo.create(&scope(), &sample_cart(), draft()).await.unwrap();

        let updated = repo
            .set_status(&scope(), &order.id, OrderStatus::Paid)
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Paid);

        let reloaded = repo.get(&scope(), &order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, OrderStatus::Paid);
        assert!(reloaded.timestamps.paid_at.is_some());
        // Untouched fields survive the merge write.
        assert_eq!(reloaded.items, order.items);
    }

    #[tokio::test]
    async fn test_shipped_patch_updates_fulfillment() {
        let store = MemoryStore::new();
        let repo = OrderRepository::new(&store);
        let order = repo.create(&scope(), &sample_cart(), draft()).await.unwrap();
        repo.set_status(&scope(), &order.id, OrderStatus::Paid).await.unwrap();

        repo.set_status(&scope(), &order.id, OrderStatus::Shipped).await.unwrap();
        let reloaded = repo.get(&scope(), &order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.fulfillment_status, FulfillmentStatus::Fulfilled);
        assert!(reloaded.timestamps.shipped_at.is_some());
    }

    #[tokio::test]
    async fn test_payment_paid_advances_order_status() {
        let store = MemoryStore::new();
        let repo = OrderRepository::new(&store);
        let order = repo.create(&scope(), &sample_cart(), draft()).await.unwrap();

        repo.set_payment_status(&scope(), &order.id, PaymentStatus::Paid)
            .await
            .unwrap();
        let reloaded = repo.get(&scope(), &order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, OrderStatus::Paid);
        assert_eq!(reloaded.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_transition_error_does_not_write() {
        let store = MemoryStore::new();
        let repo = OrderRepository::new(&store);
        let order = repo.create(&scope(), &sample_cart(), draft()).await.unwrap();
        repo.set_status(&scope(), &order.id, OrderStatus::Cancelled).await.unwrap();

        let result = repo.set_status(&scope(), &order.id, OrderStatus::Paid).await;
        assert!(matches!(result, Err(CommerceError::Transition(_))));

        let reloaded = repo.get(&scope(), &order.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = MemoryStore::new();
        let repo = OrderRepository::new(&store);
        let first = repo.create(&scope(), &sample_cart(), draft()).await.unwrap();
        let second = repo.create(&scope(), &sample_cart(), draft()).await.unwrap();

        let orders = repo.list(&scope()).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders.first().unwrap().id, second.id);
        assert_eq!(orders.last().unwrap().id, first.id);
    }

    #[tokio::test]
    async fn test_missing_order_is_not_found() {
        let store = MemoryStore::new();
        let repo = OrderRepository::new(&store);
        let result = repo
            .set_status(&scope(), &OrderId::new("ghost"), OrderStatus::Paid)
            .await;
        assert!(matches!(result, Err(CommerceError::OrderNotFound(_))));
    }
}
