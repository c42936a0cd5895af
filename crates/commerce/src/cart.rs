//! Cart model and pure mutation.
//!
//! The cart is a single document per (user, store) scope. All mutation goes
//! through [`Cart::apply`], which recomputes every derived field (subtotal,
//! total, item count) in the same step - derived fields are never stale
//! relative to the line items they summarize.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use brightfold_core::{CurrencyCode, ProductId, VariantId};

/// Line-item identity: one row per distinct (product, variant) pair.
///
/// An absent variant is a distinct key from any present variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineKey {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
}

impl LineKey {
    /// Key for a product without variants.
    pub fn product(product_id: impl Into<ProductId>) -> Self {
        Self {
            product_id: product_id.into(),
            variant_id: None,
        }
    }

    /// Key for a specific variant of a product.
    pub fn variant(product_id: impl Into<ProductId>, variant_id: impl Into<VariantId>) -> Self {
        Self {
            product_id: product_id.into(),
            variant_id: Some(variant_id.into()),
        }
    }
}

/// One cart row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    pub title: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl CartLine {
    /// The identity this row is deduplicated by.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey {
            product_id: self.product_id.clone(),
            variant_id: self.variant_id.clone(),
        }
    }

    /// Price times quantity for this row.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// An applied discount. Applying a new one replaces the old; no stacking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    pub code: String,
    pub amount: Decimal,
}

/// Cart mutation operations.
#[derive(Debug, Clone)]
pub enum CartOp {
    /// Add a row; if the (product, variant) pair is already present, its
    /// quantity increases instead of duplicating the row.
    AddItem(CartLine),
    /// Remove a row. Removing an absent key is a no-op.
    RemoveItem(LineKey),
    /// Set a row's quantity. A quantity of zero or below removes the row;
    /// setting an absent key is a no-op.
    SetQuantity { key: LineKey, quantity: i64 },
    /// Apply a discount, replacing any existing one.
    ApplyDiscount(Discount),
    /// Remove the discount.
    ClearDiscount,
    /// Drop every row and the discount.
    Clear,
}

/// The cart aggregate.
///
/// `subtotal`, `total`, and `item_count` are derived and recomputed by
/// [`Cart::apply`]; they are persisted with the document so the remote copy
/// matches what the UI rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<Discount>,
    pub currency_code: CurrencyCode,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub item_count: u32,
}

impl Cart {
    /// Decode a document snapshot into a cart.
    ///
    /// An absent document is an empty cart, not a fault; a corrupt one also
    /// falls back to empty so a single bad write cannot wedge the UI. This
    /// is the mapping half of a cart subscription.
    #[must_use]
    pub fn from_snapshot(value: Option<serde_json::Value>, currency_code: CurrencyCode) -> Self {
        match value {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "corrupt cart document, falling back to empty");
                Self::empty(currency_code)
            }),
            None => Self::empty(currency_code),
        }
    }

    /// An empty cart in the given currency.
    #[must_use]
    pub fn empty(currency_code: CurrencyCode) -> Self {
        Self {
            items: Vec::new(),
            discount: None,
            currency_code,
            subtotal: Decimal::ZERO,
            total: Decimal::ZERO,
            item_count: 0,
        }
    }

    /// Whether the cart has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find a row by identity.
    #[must_use]
    pub fn line(&self, key: &LineKey) -> Option<&CartLine> {
        self.items.iter().find(|line| line.key() == *key)
    }

    /// Apply one operation, producing the next cart state.
    ///
    /// Pure: no I/O, no clock. Derived fields are recomputed before
    /// returning, whatever the operation was.
    #[must_use]
    pub fn apply(mut self, op: CartOp) -> Self {
        match op {
            CartOp::AddItem(line) => {
                if line.quantity > 0 {
                    let key = line.key();
                    match self.items.iter().position(|existing| existing.key() == key) {
                        Some(index) => {
                            if let Some(existing) = self.items.get_mut(index) {
                                existing.quantity += line.quantity;
                            }
                        }
                        None => self.items.push(line),
                    }
                }
            }
            CartOp::RemoveItem(key) => {
                self.items.retain(|line| line.key() != key);
            }
            CartOp::SetQuantity { key, quantity } => {
                if quantity <= 0 {
                    self.items.retain(|line| line.key() != key);
                } else if let Some(line) =
                    self.items.iter_mut().find(|line| line.key() == key)
                {
                    line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
                }
            }
            CartOp::ApplyDiscount(discount) => {
                self.discount = Some(discount);
            }
            CartOp::ClearDiscount => {
                self.discount = None;
            }
            CartOp::Clear => {
                self.items.clear();
                self.discount = None;
            }
        }
        self.recompute();
        self
    }

    fn recompute(&mut self) {
        self.subtotal = self.items.iter().map(CartLine::line_total).sum();
        self.item_count = self.items.iter().map(|line| line.quantity).sum();
        let discount_amount = self
            .discount
            .as_ref()
            .map_or(Decimal::ZERO, |discount| discount.amount);
        self.total = (self.subtotal - discount_amount).max(Decimal::ZERO);
    }
}
