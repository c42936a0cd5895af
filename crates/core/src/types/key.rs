//! Newtype keys for type-safe document references.
//!
//! Use the `define_key!` macro to create type-safe key wrappers that prevent
//! accidentally mixing keys from different entity types. Keys are the string
//! identifiers documents are addressed by in the remote store.

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe document key wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>`, and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use brightfold_core::define_key;
/// define_key!(UserId);
/// define_key!(StoreId);
///
/// let user_id = UserId::new("u-100");
/// let store_id = StoreId::new("s-7");
///
/// // These are different types, so this won't compile:
/// // let _: UserId = store_id;
/// ```
#[macro_export]
macro_rules! define_key {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new key from anything string-like.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the key and return its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Define standard entity keys
define_key!(UserId);
define_key!(StoreId);
define_key!(ProjectId);
define_key!(ProductId);
define_key!(VariantId);
define_key!(OrderId);
define_key!(ExpenseId);
define_key!(CustomerId);

/// A human-readable order number (e.g., `ORD-000042`).
///
/// Distinct from [`OrderId`], which is the store-assigned document key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Create an order number from an already-formatted string.
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// The formatted number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_distinct_types() {
        let user = UserId::new("u-1");
        let store = StoreId::new("u-1");
        assert_eq!(user.as_str(), store.as_str());
    }

    #[test]
    fn test_serde_transparent() {
        let id = ProductId::new("prod-9");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"prod-9\"");

        let parsed: ProductId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_display() {
        let id = OrderId::new("ord-doc-3");
        assert_eq!(format!("{id}"), "ord-doc-3");
    }
}
