//! Expense repository.
//!
//! Path scheme under a (user, project) scope:
//! `users/{user}/projects/{project}/expenses/{id}`.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{instrument, warn};
use uuid::Uuid;

use brightfold_core::{
    CurrencyCode, ExpenseCategory, ExpenseId, ExpenseStatus, ProjectScope,
};
use brightfold_store::{
    CollectionPath, CollectionWatch, Direction, DocPath, Document, DocumentStore, Query,
    StoreError, WriteMode,
};

use crate::error::FinanceError;
use crate::expense::{Expense, ExpenseUpdate};
use crate::extraction::ReceiptFields;

fn expenses_collection(scope: &ProjectScope) -> Result<CollectionPath, StoreError> {
    Ok(CollectionPath::root("users")?
        .doc(scope.user_id.as_str())?
        .collection("projects")?
        .doc(scope.project_id.as_str())?
        .collection("expenses")?)
}

fn expense_doc(scope: &ProjectScope, id: &ExpenseId) -> Result<DocPath, StoreError> {
    Ok(expenses_collection(scope)?.doc(id.as_str())?)
}

/// Decode a collection snapshot into expenses, newest date first.
///
/// Corrupt documents are skipped with a warning. Also the mapping half of
/// an expenses subscription: pair with [`ExpenseRepository::watch`].
#[must_use]
pub fn decode_expenses(docs: Vec<Document>) -> Vec<Expense> {
    let mut expenses: Vec<Expense> = docs
        .into_iter()
        .filter_map(|doc| match serde_json::from_value(doc.value) {
            Ok(expense) => Some(expense),
            Err(e) => {
                warn!(path = %doc.path, error = %e, "skipping corrupt expense document");
                None
            }
        })
        .collect();
    expenses.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    expenses
}

/// Repository for the expense records of a (user, project) scope.
pub struct ExpenseRepository<'a, S> {
    store: &'a S,
}

impl<'a, S: DocumentStore> ExpenseRepository<'a, S> {
    /// Create a repository over an explicitly constructed store handle.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Create an expense record from receipt-extraction output.
    ///
    /// Missing fields get conservative defaults: today's date, an
    /// `Unknown` supplier, the `Other` category (an unrecognized suggested
    /// category was already discarded during parsing), and a total derived
    /// from subtotal plus tax.
    ///
    /// # Errors
    ///
    /// Returns [`FinanceError::Store`] if the write fails.
    #[instrument(skip(self, fields), fields(scope = %scope))]
    pub async fn create_from_extraction(
        &self,
        scope: &ProjectScope,
        fields: ReceiptFields,
    ) -> Result<Expense, FinanceError> {
        let subtotal = fields.subtotal.unwrap_or(Decimal::ZERO);
        let tax = fields.tax.unwrap_or(Decimal::ZERO);
        let expense = Expense {
            id: ExpenseId::new(Uuid::new_v4().to_string()),
            date: fields.date.unwrap_or_else(|| Utc::now().date_naive()),
            supplier: fields.supplier.unwrap_or_else(|| "Unknown".to_owned()),
            category: fields.category.unwrap_or(ExpenseCategory::Other),
            subtotal,
            tax,
            total: fields.total.unwrap_or(subtotal + tax),
            currency_code: fields.currency.unwrap_or(CurrencyCode::USD),
            line_items: fields.line_items,
            confidence: fields.confidence,
            status: ExpenseStatus::Pending,
            created_at: Utc::now(),
        };

        let path = expense_doc(scope, &expense.id)?;
        let value = serde_json::to_value(&expense).map_err(StoreError::from)?;
        self.store.set(&path, value, WriteMode::Replace).await?;
        Ok(expense)
    }

    /// Load one expense.
    ///
    /// # Errors
    ///
    /// Returns [`FinanceError::Store`] if the read fails, or
    /// [`FinanceError::Decode`] if the stored document is corrupt.
    pub async fn get(
        &self,
        scope: &ProjectScope,
        id: &ExpenseId,
    ) -> Result<Option<Expense>, FinanceError> {
        let path = expense_doc(scope, id)?;
        match self.store.get(&path).await? {
            Some(value) => {
                let expense =
                    serde_json::from_value(value).map_err(|source| FinanceError::Decode {
                        path: path.to_string(),
                        source,
                    })?;
                Ok(Some(expense))
            }
            None => Ok(None),
        }
    }

    /// Apply an inline edit as a partial merge write. An empty update is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns [`FinanceError::ExpenseNotFound`] if the expense does not
    /// exist, or [`FinanceError::Store`] if the write fails.
    #[instrument(skip(self, update), fields(scope = %scope))]
    pub async fn update(
        &self,
        scope: &ProjectScope,
        id: &ExpenseId,
        update: ExpenseUpdate,
    ) -> Result<Expense, FinanceError> {
        if update.is_empty() {
            return self
                .get(scope, id)
                .await?
                .ok_or_else(|| FinanceError::ExpenseNotFound(id.clone()));
        }

        let path = expense_doc(scope, id)?;
        if self.store.get(&path).await?.is_none() {
            return Err(FinanceError::ExpenseNotFound(id.clone()));
        }

        let patch = serde_json::to_value(&update).map_err(StoreError::from)?;
        self.store.set(&path, patch, WriteMode::Merge).await?;

        self.get(scope, id)
            .await?
            .ok_or_else(|| FinanceError::ExpenseNotFound(id.clone()))
    }

    /// Apply an AI-suggested category.
    ///
    /// An unrecognized suggestion is discarded - the record keeps its
    /// current category and no write happens. Returns the (possibly
    /// unchanged) expense.
    ///
    /// # Errors
    ///
    /// Same as [`ExpenseRepository::update`].
    pub async fn recategorize(
        &self,
        scope: &ProjectScope,
        id: &ExpenseId,
        suggestion: &str,
    ) -> Result<Expense, FinanceError> {
        match ExpenseCategory::parse_suggestion(suggestion) {
            Some(category) => {
                self.update(
                    scope,
                    id,
                    ExpenseUpdate {
                        category: Some(category),
                        ..ExpenseUpdate::default()
                    },
                )
                .await
            }
            None => {
                warn!(suggestion, "discarding unrecognized category suggestion");
                self.get(scope, id)
                    .await?
                    .ok_or_else(|| FinanceError::ExpenseNotFound(id.clone()))
            }
        }
    }

    /// Mark an expense approved.
    ///
    /// # Errors
    ///
    /// Same as [`ExpenseRepository::update`].
    pub async fn approve(
        &self,
        scope: &ProjectScope,
        id: &ExpenseId,
    ) -> Result<Expense, FinanceError> {
        self.update(
            scope,
            id,
            ExpenseUpdate {
                status: Some(ExpenseStatus::Approved),
                ..ExpenseUpdate::default()
            },
        )
        .await
    }

    /// Delete an expense. Deleting an absent expense is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`FinanceError::Store`] if the delete fails.
    #[instrument(skip(self), fields(scope = %scope))]
    pub async fn delete(&self, scope: &ProjectScope, id: &ExpenseId) -> Result<(), FinanceError> {
        let path = expense_doc(scope, id)?;
        self.store.delete(&path).await?;
        Ok(())
    }

    /// List expenses, newest date first. Corrupt documents are skipped with
    /// a warning instead of failing the whole listing.
    ///
    /// # Errors
    ///
    /// Returns [`FinanceError::Store`] if the query fails.
    pub async fn list(&self, scope: &ProjectScope) -> Result<Vec<Expense>, FinanceError> {
        let query = Query::collection(expenses_collection(scope)?)
            .order_by("date", Direction::Descending);
        let docs = self.store.query(&query).await?;
        Ok(decode_expenses(docs))
    }

    /// The expenses collection path for a scope, for binding a sync
    /// controller.
    ///
    /// # Errors
    ///
    /// Returns [`FinanceError::Store`] if a scope key is not a valid path
    /// segment.
    pub fn collection_path(&self, scope: &ProjectScope) -> Result<CollectionPath, FinanceError> {
        Ok(expenses_collection(scope)?)
    }

    /// Subscribe to the expenses collection.
    ///
    /// # Errors
    ///
    /// Returns [`FinanceError::Store`] if the subscription cannot be
    /// established.
    pub fn watch(&self, scope: &ProjectScope) -> Result<CollectionWatch, FinanceError> {
        Ok(self.store.watch_collection(&expenses_collection(scope)?)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use brightfold_store::MemoryStore;
    use chrono::NaiveDate;

    fn scope() -> ProjectScope {
        ProjectScope::new("u-1", "proj-1")
    }

    fn receipt() -> ReceiptFields {
        ReceiptFields {
            date: NaiveDate::from_ymd_opt(2026, 3, 9),
            supplier: Some("Paper Co".to_owned()),
            category: Some(ExpenseCategory::OfficeSupplies),
            subtotal: Some(Decimal::from(40)),
            tax: Some(Decimal::from(2)),
            total: Some(Decimal::from(42)),
            currency: Some(CurrencyCode::USD),
            line_items: Vec::new(),
            confidence: 0.93,
        }
    }

    #[tokio::test]
    async fn test_create_from_extraction_roundtrip() {
        let store = MemoryStore::new();
        let repo = ExpenseRepository::new(&store);

        let created = repo.create_from_extraction(&scope(), receipt()).await.unwrap();
        assert_eq!(created.supplier, "Paper Co");
        assert_eq!(created.status, ExpenseStatus::Pending);

        let loaded = repo.get(&scope(), &created.id).await.unwrap().unwrap();
        assert_eq!(loaded, created);
    }

    #[tokio::test]
    async fn test_create_with_missing_fields_gets_defaults() {
        let store = MemoryStore::new();
        let repo = ExpenseRepository::new(&store);

        let fields = ReceiptFields {
            date: None,
            supplier: None,
            category: None,
            subtotal: Some(Decimal::from(10)),
            tax: Some(Decimal::from(1)),
            total: None,
            currency: None,
            line_items: Vec::new(),
            confidence: 0.4,
        };
        let created = repo.create_from_extraction(&scope(), fields).await.unwrap();
        assert_eq!(created.supplier, "Unknown");
        assert_eq!(created.category, ExpenseCategory::Other);
        assert_eq!(created.total, Decimal::from(11));
    }

    #[tokio::test]
    async fn test_update_merges_only_set_fields() {
        let store = MemoryStore::new();
        let repo = ExpenseRepository::new(&store);
        let created = repo.create_from_extraction(&scope(), receipt()).await.unwrap();

        let updated = repo
            .update(
                &scope(),
                &created.id,
                ExpenseUpdate {
                    supplier: Some("Paper Company Inc".to_owned()),
                    ..ExpenseUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.supplier, "Paper Company Inc");
        assert_eq!(updated.total, created.total);
        assert_eq!(updated.category, created.category);
    }

    #[tokio::test]
    async fn test_recategorize_with_known_suggestion() {
        let store = MemoryStore::new();
        let repo = ExpenseRepository::new(&store);
        let created = repo.create_from_extraction(&scope(), receipt()).await.unwrap();

        let updated = repo
            .recategorize(&scope(), &created.id, "Software")
            .await
            .unwrap();
        assert_eq!(updated.category, ExpenseCategory::Software);
    }

    #[tokio::test]
    async fn test_recategorize_discards_unknown_suggestion() {
        let store = MemoryStore::new();
        let repo = ExpenseRepository::new(&store);
        let created = repo.create_from_extraction(&scope(), receipt()).await.unwrap();

        let unchanged = repo
            .recategorize(&scope(), &created.id, "cryptocurrency")
            .await
            .unwrap();
        assert_eq!(unchanged.category, ExpenseCategory::OfficeSupplies);
    }

    #[tokio::test]
    async fn test_approve_sets_status() {
        let store = MemoryStore::new();
        let repo = ExpenseRepository::new(&store);
        let created = repo.create_from_extraction(&scope(), receipt()).await.unwrap();

        let approved = repo.approve(&scope(), &created.id).await.unwrap();
        assert_eq!(approved.status, ExpenseStatus::Approved);
    }

    #[tokio::test]
    async fn test_delete_then_get_is_none() {
        let store = MemoryStore::new();
        let repo = ExpenseRepository::new(&store);
        let created = repo.create_from_extraction(&scope(), receipt()).await.unwrap();

        repo.delete(&scope(), &created.id).await.unwrap();
        assert!(repo.get(&scope(), &created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_expense_is_not_found() {
        let store = MemoryStore::new();
        let repo = ExpenseRepository::new(&store);
        let result = repo
            .update(
                &scope(),
                &ExpenseId::new("ghost"),
                ExpenseUpdate {
                    supplier: Some("Nobody".to_owned()),
                    ..ExpenseUpdate::default()
                },
            )
            .await;
        assert!(matches!(result, Err(FinanceError::ExpenseNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_newest_date_first() {
        let store = MemoryStore::new();
        let repo = ExpenseRepository::new(&store);

        let mut older = receipt();
        older.date = NaiveDate::from_ymd_opt(2026, 1, 5);
        let mut newer = receipt();
        newer.date = NaiveDate::from_ymd_opt(2026, 4, 1);

        repo.create_from_extraction(&scope(), older).await.unwrap();
        let newest = repo.create_from_extraction(&scope(), newer).await.unwrap();

        let listed = repo.list(&scope()).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed.first().unwrap().id, newest.id);
    }
}
