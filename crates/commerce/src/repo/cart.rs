//! Cart repository.

use serde_json::Value;
use tracing::instrument;

use brightfold_core::{CurrencyCode, StoreScope};
use brightfold_store::{DocPath, DocWatch, DocumentStore, WriteMode};

use crate::cart::Cart;
use crate::error::CommerceError;

use super::cart_doc;

/// Repository for the cart document of a (user, store) scope.
pub struct CartRepository<'a, S> {
    store: &'a S,
    currency_code: CurrencyCode,
}

impl<'a, S: DocumentStore> CartRepository<'a, S> {
    /// Create a repository over an explicitly constructed store handle.
    #[must_use]
    pub const fn new(store: &'a S, currency_code: CurrencyCode) -> Self {
        Self {
            store,
            currency_code,
        }
    }

    /// Decode a document snapshot into a cart; see [`Cart::from_snapshot`].
    #[must_use]
    pub fn decode(&self, value: Option<Value>) -> Cart {
        Cart::from_snapshot(value, self.currency_code)
    }

    /// The cart document path for a scope, for binding a sync controller.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Store`] if a scope key is not a valid path
    /// segment.
    pub fn doc_path(&self, scope: &StoreScope) -> Result<DocPath, CommerceError> {
        Ok(cart_doc(scope)?)
    }

    /// Load the current cart, defaulting to empty if none exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Store`] if the read fails.
    #[instrument(skip(self))]
    pub async fn load(&self, scope: &StoreScope) -> Result<Cart, CommerceError> {
        let path = cart_doc(scope)?;
        let value = self.store.get(&path).await?;
        Ok(self.decode(value))
    }

    /// Persist the full cart document.
    ///
    /// The cart is small and every mutation recomputes its derived fields,
    /// so it is always written whole (replace, not merge).
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Store`] if the write fails.
    #[instrument(skip(self, cart))]
    pub async fn save(&self, scope: &StoreScope, cart: &Cart) -> Result<(), CommerceError> {
        let path = cart_doc(scope)?;
        let value = serde_json::to_value(cart).map_err(brightfold_store::StoreError::from)?;
        self.store.set(&path, value, WriteMode::Replace).await?;
        Ok(())
    }

    /// Delete the cart document (checkout completion or explicit clear).
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Store`] if the delete fails.
    #[instrument(skip(self))]
    pub async fn clear(&self, scope: &StoreScope) -> Result<(), CommerceError> {
        let path = cart_doc(scope)?;
        self.store.delete(&path).await?;
        Ok(())
    }

    /// Subscribe to the cart document.
    ///
    /// Pair with [`CartRepository::decode`] to map snapshots into carts.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::Store`] if the subscription cannot be
    /// established.
    pub fn watch(&self, scope: &StoreScope) -> Result<DocWatch, CommerceError> {
        let path = cart_doc(scope)?;
        Ok(self.store.watch_doc(&path)?)
    }
}
