//! Brightfold Finance - Expense records and analytics.
//!
//! Expense records are owned by a (user, project) scope and live under
//! `users/{user}/projects/{project}/expenses/{id}`. Records are created
//! from asynchronous receipt extraction (an AI collaborator), edited
//! inline or recategorized, and deleted explicitly. Analytics are pure
//! functions recomputed from the full in-memory list on every call -
//! visible expense counts are bounded by UI pagination, so there is
//! nothing to memoize.
//!
//! # Modules
//!
//! - [`expense`] - Expense record model
//! - [`repo`] - Expense repository
//! - [`analytics`] - Derived aggregate calculators
//! - [`extraction`] - Receipt-extraction collaborator client
//! - [`export`] - CSV export

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod error;
pub mod expense;
pub mod export;
pub mod extraction;
pub mod repo;

pub use analytics::{Anomaly, CategoryBreakdown, MonthlyTotal};
pub use error::FinanceError;
pub use expense::{Expense, ExpenseLine, ExpenseUpdate};
pub use export::expenses_to_csv;
pub use extraction::{ExtractionClient, ExtractionConfig, ExtractionError, ReceiptFields};
pub use repo::{ExpenseRepository, decode_expenses};
