//! Derived aggregate calculators for expense analytics.
//!
//! Pure, referentially transparent functions over the full in-memory
//! expense list. Everything recomputes from scratch on each call; the input
//! is bounded by UI pagination, so the linear cost is irrelevant.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use brightfold_core::{ExpenseCategory, ExpenseId};

use crate::expense::Expense;

/// Spend in one category, with its share of the grand total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryBreakdown {
    pub category: ExpenseCategory,
    pub total: Decimal,
    /// Share of the grand total in percent, one decimal place.
    pub percent: Decimal,
}

/// Spend in one year-month bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyTotal {
    /// Bucket key, `YYYY-MM`.
    pub month: String,
    pub total: Decimal,
}

/// An expense flagged as unusually large.
#[derive(Debug, Clone, PartialEq)]
pub struct Anomaly {
    pub expense_id: ExpenseId,
    pub supplier: String,
    pub total: Decimal,
    /// Human-readable ratio against the mean, e.g. `3.1x the mean`.
    pub ratio: String,
}

fn grand_total(expenses: &[Expense]) -> Decimal {
    expenses.iter().map(|expense| expense.total).sum()
}

/// Sum totals per category, largest first.
///
/// Percentages are shares of the grand total rounded to one decimal place;
/// across all categories they sum to 100 within rounding tolerance. An
/// empty input yields an empty vector.
#[must_use]
pub fn totals_by_category(expenses: &[Expense]) -> Vec<CategoryBreakdown> {
    let grand = grand_total(expenses);
    let mut by_category: BTreeMap<ExpenseCategory, Decimal> = BTreeMap::new();
    for expense in expenses {
        *by_category.entry(expense.category).or_default() += expense.total;
    }

    let mut breakdown: Vec<CategoryBreakdown> = by_category
        .into_iter()
        .map(|(category, total)| CategoryBreakdown {
            category,
            total,
            percent: if grand.is_zero() {
                Decimal::ZERO
            } else {
                (total / grand * Decimal::ONE_HUNDRED).round_dp(1)
            },
        })
        .collect();
    breakdown.sort_by(|a, b| b.total.cmp(&a.total));
    breakdown
}

/// Sum totals per year-month, ascending by month for charting.
///
/// An empty input yields an empty vector.
#[must_use]
pub fn totals_by_month(expenses: &[Expense]) -> Vec<MonthlyTotal> {
    let mut by_month: BTreeMap<String, Decimal> = BTreeMap::new();
    for expense in expenses {
        *by_month.entry(expense.month_key()).or_default() += expense.total;
    }

    // BTreeMap iteration is ascending by key; YYYY-MM sorts chronologically.
    by_month
        .into_iter()
        .map(|(month, total)| MonthlyTotal { month, total })
        .collect()
}

/// Average spend per month with at least one expense. Zero for an empty
/// input.
#[must_use]
pub fn monthly_average(expenses: &[Expense]) -> Decimal {
    let months = totals_by_month(expenses);
    if months.is_empty() {
        return Decimal::ZERO;
    }
    (grand_total(expenses) / Decimal::from(months.len())).round_dp(2)
}

/// Flag expenses exceeding twice the mean expense total.
///
/// The mean is grand total over expense count; anything strictly above
/// `2 x mean` is flagged with a ratio string against the mean. An empty
/// input yields no anomalies and no division by zero.
#[must_use]
pub fn anomalies(expenses: &[Expense]) -> Vec<Anomaly> {
    if expenses.is_empty() {
        return Vec::new();
    }
    let mean = grand_total(expenses) / Decimal::from(expenses.len());
    if mean.is_zero() {
        return Vec::new();
    }
    let threshold = mean * Decimal::TWO;

    expenses
        .iter()
        .filter(|expense| expense.total > threshold)
        .map(|expense| Anomaly {
            expense_id: expense.id.clone(),
            supplier: expense.supplier.clone(),
            total: expense.total,
            ratio: format!("{}x the mean", (expense.total / mean).round_dp(1)),
        })
        .collect()
}
