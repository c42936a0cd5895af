//! Expense record model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use brightfold_core::{CurrencyCode, ExpenseCategory, ExpenseId, ExpenseStatus};

/// One line item on a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseLine {
    pub description: String,
    pub amount: Decimal,
}

/// An expense record.
///
/// `confidence` is the receipt-extraction confidence score in `0.0..=1.0`;
/// manually created or fully edited records carry `1.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub date: NaiveDate,
    pub supplier: String,
    pub category: ExpenseCategory,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub currency_code: CurrencyCode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line_items: Vec<ExpenseLine>,
    pub confidence: f32,
    pub status: ExpenseStatus,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    /// Year-month bucket key for charting (`2026-03`).
    #[must_use]
    pub fn month_key(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }
}

/// Inline-edit payload; only set fields are written.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExpenseUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ExpenseCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ExpenseStatus>,
}

impl ExpenseUpdate {
    /// Whether the update would write anything.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.supplier.is_none()
            && self.category.is_none()
            && self.subtotal.is_none()
            && self.tax.is_none()
            && self.total.is_none()
            && self.status.is_none()
    }
}
