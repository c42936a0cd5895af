//! Repositories for commerce aggregates.
//!
//! Repositories own the path scheme and persistence of their aggregate.
//! They borrow an explicitly constructed store handle - there is no ambient
//! store - so every repository runs unchanged against the in-memory store
//! in tests.
//!
//! Path scheme under a (user, store) scope:
//!
//! - cart: `stores/{store}/carts/{user}`
//! - orders: `stores/{store}/orders/{order}`
//! - order counter: `stores/{store}/meta/order_counter`

pub mod cart;
pub mod orders;

use brightfold_core::StoreScope;
use brightfold_store::{CollectionPath, DocPath, StoreError};

pub(crate) fn store_doc(scope: &StoreScope) -> Result<DocPath, StoreError> {
    Ok(CollectionPath::root("stores")?.doc(scope.store_id.as_str())?)
}

pub(crate) fn cart_doc(scope: &StoreScope) -> Result<DocPath, StoreError> {
    Ok(store_doc(scope)?
        .collection("carts")?
        .doc(scope.user_id.as_str())?)
}

pub(crate) fn orders_collection(scope: &StoreScope) -> Result<CollectionPath, StoreError> {
    Ok(store_doc(scope)?.collection("orders")?)
}

pub(crate) fn order_counter_doc(scope: &StoreScope) -> Result<DocPath, StoreError> {
    Ok(store_doc(scope)?.collection("meta")?.doc("order_counter")?)
}
