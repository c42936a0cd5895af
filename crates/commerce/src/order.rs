//! Order model and status state machine.
//!
//! An order is created at checkout from a snapshot of the cart - its line
//! items are a copy, not a live reference. Orders are never deleted; they
//! only move through the status machine, and every transition stamps its
//! own timestamp field.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use brightfold_core::{
    CurrencyCode, CustomerId, Email, FulfillmentStatus, OrderId, OrderNumber, OrderStatus,
    PaymentStatus,
};

use crate::cart::{Cart, CartLine};

/// Error returned for an illegal status transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid order status transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// Customer identity and contact details attached to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    pub name: String,
    pub email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A shipping or billing address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub postal_code: String,
    pub country: String,
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    BankTransfer,
    CashOnDelivery,
}

/// Monetary breakdown of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAmounts {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub currency_code: CurrencyCode,
}

impl OrderAmounts {
    /// Build the breakdown from a cart snapshot plus shipping and tax.
    #[must_use]
    pub fn from_cart(cart: &Cart, shipping: Decimal, tax: Decimal) -> Self {
        let discount = cart
            .discount
            .as_ref()
            .map_or(Decimal::ZERO, |discount| discount.amount);
        let total = (cart.subtotal - discount + shipping + tax).max(Decimal::ZERO);
        Self {
            subtotal: cart.subtotal,
            discount,
            shipping,
            tax,
            total,
            currency_code: cart.currency_code,
        }
    }
}

/// One timestamp per status transition; unset until the transition happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderTimestamps {
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipped_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refunded_at: Option<DateTime<Utc>>,
}

impl OrderTimestamps {
    /// Fresh timestamps for an order created at `created_at`.
    #[must_use]
    pub const fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            created_at,
            paid_at: None,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
            refunded_at: None,
        }
    }
}

/// Shipment tracking details attached once the order ships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingInfo {
    pub carrier: String,
    pub tracking_number: String,
}

/// A free-form note on the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderNote {
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// The order aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub customer: CustomerInfo,
    pub items: Vec<CartLine>,
    pub amounts: OrderAmounts,
    pub shipping_address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<Address>,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub fulfillment_status: FulfillmentStatus,
    pub timestamps: OrderTimestamps,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking: Option<TrackingInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<OrderNote>,
}

/// Position along the happy path; side-branch statuses have no rank.
const fn chain_rank(status: OrderStatus) -> Option<u8> {
    match status {
        OrderStatus::Pending => Some(0),
        OrderStatus::Paid => Some(1),
        OrderStatus::Shipped => Some(2),
        OrderStatus::Delivered => Some(3),
        OrderStatus::Cancelled | OrderStatus::Refunded => None,
    }
}

impl Order {
    /// Transition the order status.
    ///
    /// Legal moves: forward along `pending -> paid -> shipped -> delivered`,
    /// or to `cancelled`/`refunded` from any non-terminal status. Setting
    /// the current status again is a no-op. `shipped` also forces
    /// `fulfillment_status` to fulfilled.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] for moves out of a terminal status or
    /// backwards along the chain.
    pub fn set_status(&mut self, to: OrderStatus, at: DateTime<Utc>) -> Result<(), TransitionError> {
        let from = self.status;
        if from == to {
            return Ok(());
        }

        let legal = !from.is_terminal()
            && match (chain_rank(from), chain_rank(to)) {
                // Forward along the happy path.
                (Some(from_rank), Some(to_rank)) => to_rank > from_rank,
                // Side-branch out of any non-terminal status.
                (Some(_), None) => true,
                (None, _) => false,
            };
        if !legal {
            return Err(TransitionError { from, to });
        }

        self.status = to;
        match to {
            OrderStatus::Paid => self.timestamps.paid_at = Some(at),
            OrderStatus::Shipped => {
                self.timestamps.shipped_at = Some(at);
                self.fulfillment_status = FulfillmentStatus::Fulfilled;
            }
            OrderStatus::Delivered => self.timestamps.delivered_at = Some(at),
            OrderStatus::Cancelled => self.timestamps.cancelled_at = Some(at),
            OrderStatus::Refunded => self.timestamps.refunded_at = Some(at),
            OrderStatus::Pending => {}
        }
        Ok(())
    }

    /// Update the payment status.
    ///
    /// Marking the payment `paid` while the order is still pending also
    /// advances the order status to `paid` (with the same timestamp).
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] if the forced order-status advance is
    /// illegal (cannot happen from `pending`; kept for symmetry).
    pub fn set_payment_status(
        &mut self,
        to: PaymentStatus,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.payment_status = to;
        if to == PaymentStatus::Paid && self.status == OrderStatus::Pending {
            self.set_status(OrderStatus::Paid, at)?;
        }
        Ok(())
    }

    /// Update the fulfillment status directly.
    pub const fn set_fulfillment_status(&mut self, to: FulfillmentStatus) {
        self.fulfillment_status = to;
    }

    /// Attach shipment tracking details.
    pub fn attach_tracking(&mut self, tracking: TrackingInfo) {
        self.tracking = Some(tracking);
    }

    /// Append a note.
    pub fn add_note(&mut self, body: impl Into<String>, at: DateTime<Utc>) {
        self.notes.push(OrderNote {
            body: body.into(),
            created_at: at,
        });
    }
}
