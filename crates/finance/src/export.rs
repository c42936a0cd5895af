//! CSV export of expense records.
//!
//! The export is a terminal sink: the dashboard turns the current expense
//! list into a CSV blob and hands it to the browser as a download. Fields
//! go through a real CSV writer, so suppliers with commas or quotes in
//! their names survive the round trip.

use thiserror::Error;

use crate::expense::Expense;

/// Errors that can occur while building the CSV blob.
#[derive(Debug, Error)]
pub enum ExportError {
    /// A record failed to serialize.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The writer's buffer could not be recovered.
    #[error("CSV buffer error: {0}")]
    Buffer(String),
}

/// Render the expense list as a CSV document with a header row.
///
/// Rows are emitted in the order given; callers pass the already-sorted
/// list they are displaying.
///
/// # Errors
///
/// Returns [`ExportError`] if serialization fails.
pub fn expenses_to_csv(expenses: &[Expense]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record([
        "date",
        "supplier",
        "category",
        "subtotal",
        "tax",
        "total",
        "currency",
        "status",
        "confidence",
    ])?;

    for expense in expenses {
        writer.write_record([
            expense.date.format("%Y-%m-%d").to_string(),
            expense.supplier.clone(),
            expense.category.label().to_owned(),
            expense.subtotal.to_string(),
            expense.tax.to_string(),
            expense.total.to_string(),
            expense.currency_code.code().to_owned(),
            format!("{:?}", expense.status).to_lowercase(),
            format!("{:.2}", expense.confidence),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Buffer(e.to_string()))
}
