//! Finance error types.

use brightfold_core::ExpenseId;
use brightfold_store::StoreError;

/// Errors that can occur in expense operations.
#[derive(Debug, thiserror::Error)]
pub enum FinanceError {
    /// Document store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A stored document could not be decoded into an expense.
    #[error("corrupt document at {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The requested expense does not exist.
    #[error("expense not found: {0}")]
    ExpenseNotFound(ExpenseId),
}
