//! Commerce error types.

use brightfold_core::OrderId;
use brightfold_store::StoreError;

use crate::order::TransitionError;

/// Errors that can occur in cart and order operations.
#[derive(Debug, thiserror::Error)]
pub enum CommerceError {
    /// Document store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A stored document could not be decoded into its aggregate type.
    #[error("corrupt document at {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The requested order does not exist.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// Illegal order status transition.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Checkout was attempted with an empty cart.
    #[error("cannot check out an empty cart")]
    EmptyCart,
}
