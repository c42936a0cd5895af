//! Checkout sequencing.
//!
//! Checkout turns the current cart into an order and then clears the cart.
//! The two writes hit different documents and are sequenced client-side;
//! they are not transactional. If the session dies between them, the order
//! exists and the cart survives - the next checkout attempt would duplicate
//! the order, so callers should surface the created order before retrying.

use tracing::{info, instrument};

use brightfold_core::{CurrencyCode, StoreScope};
use brightfold_store::DocumentStore;

use crate::cart::Cart;
use crate::error::CommerceError;
use crate::order::Order;
use crate::repo::cart::CartRepository;
use crate::repo::orders::{NewOrder, OrderRepository};

/// Everything checkout needs beyond the cart itself.
pub type CheckoutRequest = NewOrder;

/// Sequences order creation and cart clearing over one store handle.
pub struct CheckoutService<'a, S> {
    store: &'a S,
    currency_code: CurrencyCode,
}

impl<'a, S: DocumentStore> CheckoutService<'a, S> {
    /// Create a checkout service over an explicitly constructed store handle.
    #[must_use]
    pub const fn new(store: &'a S, currency_code: CurrencyCode) -> Self {
        Self {
            store,
            currency_code,
        }
    }

    /// Check out the given cart snapshot: create the order, then clear the
    /// cart document.
    ///
    /// The cart passed in is the client's current snapshot; the order copies
    /// its line items. Payment confirmation happens against the payment
    /// collaborator before or after this call - checkout itself only touches
    /// the document store.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::EmptyCart`] for an empty cart, or
    /// [`CommerceError::Store`] if either write fails. If order creation
    /// succeeded but the cart clear failed, the error still surfaces; the
    /// order is already persisted.
    #[instrument(skip(self, cart, request), fields(scope = %scope))]
    pub async fn checkout(
        &self,
        scope: &StoreScope,
        cart: &Cart,
        request: CheckoutRequest,
    ) -> Result<Order, CommerceError> {
        if cart.is_empty() {
            return Err(CommerceError::EmptyCart);
        }

        let orders = OrderRepository::new(self.store);
        let order = orders.create(scope, cart, request).await?;
        info!(order_number = %order.order_number, "order created");

        let carts = CartRepository::new(self.store, self.currency_code);
        carts.clear(scope).await?;

        Ok(order)
    }
}
