//! Order number formatting and parsing.
//!
//! Order numbers are human-readable, per-store sequential identifiers:
//! `ORD-` followed by a zero-padded six-digit counter. Parsing is lenient
//! in one direction only - a malformed number yields `None`, and callers
//! fall back to restarting the sequence rather than aborting order
//! creation.

use brightfold_core::OrderNumber;

/// Prefix for every order number.
pub const PREFIX: &str = "ORD-";

/// Width of the zero-padded counter.
pub const DIGITS: usize = 6;

/// Format a sequence value as an order number (`1` -> `ORD-000001`).
#[must_use]
pub fn format(sequence: u64) -> OrderNumber {
    OrderNumber::new(format!("{PREFIX}{sequence:0DIGITS$}"))
}

/// Extract the sequence value from a formatted order number.
///
/// Returns `None` for anything that does not start with the prefix or whose
/// suffix is not numeric. Numbers wider than six digits (a sequence that
/// outgrew its padding) still parse.
#[must_use]
pub fn parse(number: &str) -> Option<u64> {
    number.strip_prefix(PREFIX)?.parse().ok()
}
