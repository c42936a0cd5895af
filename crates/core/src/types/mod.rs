//! Core types for Brightfold.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod category;
pub mod email;
pub mod key;
pub mod money;
pub mod scope;
pub mod status;

pub use category::{CategoryParseError, ExpenseCategory};
pub use email::{Email, EmailError};
pub use key::*;
pub use money::{CurrencyCode, Money};
pub use scope::{ProjectScope, StoreScope};
pub use status::*;
