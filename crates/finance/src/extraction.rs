//! Receipt-extraction collaborator client.
//!
//! Receipt uploads are turned into structured expense fields by a proxied
//! content-generation endpoint: the client sends a prompt plus a model id
//! and gets text back, from which it digs out a JSON object. The model's
//! output is untrusted: unreadable fields fall back to `None`, and an
//! unrecognized category suggestion is discarded rather than written.

use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use brightfold_core::{CurrencyCode, ExpenseCategory};

use crate::expense::ExpenseLine;

/// Default model id used for extraction calls.
const DEFAULT_MODEL: &str = "extract-standard-2";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// Generation endpoint configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Base URL of the generation proxy.
    pub base_url: String,
    /// API key sent as a bearer token.
    pub api_key: SecretString,
    /// Model id for extraction calls.
    pub model: String,
}

impl ExtractionConfig {
    /// Load configuration from `AI_API_URL`, `AI_API_KEY`, and optionally
    /// `AI_MODEL`.
    ///
    /// A `.env` file is honored for local development.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] for an unset required
    /// variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let base_url = std::env::var("AI_API_URL")
            .map_err(|_| ConfigError::MissingEnvVar("AI_API_URL".to_owned()))?;
        let api_key = std::env::var("AI_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("AI_API_KEY".to_owned()))?;
        let model = std::env::var("AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_owned());

        Ok(Self {
            base_url,
            api_key: SecretString::from(api_key),
            model,
        })
    }
}

impl std::fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

/// Errors that can occur when calling the generation endpoint.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint returned an error response.
    #[error("generation error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The model's output contained no parseable JSON object.
    #[error("no JSON object in model output")]
    MalformedOutput,
}

/// Structured fields extracted from a receipt.
///
/// Every field is optional: the repository fills defaults for whatever the
/// model could not read.
#[derive(Debug, Clone, Default)]
pub struct ReceiptFields {
    pub date: Option<NaiveDate>,
    pub supplier: Option<String>,
    pub category: Option<ExpenseCategory>,
    pub subtotal: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub total: Option<Decimal>,
    pub currency: Option<CurrencyCode>,
    pub line_items: Vec<ExpenseLine>,
    pub confidence: f32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    text: String,
}

/// Client for the proxied content-generation endpoint.
#[derive(Debug, Clone)]
pub struct ExtractionClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl ExtractionClient {
    /// Create a new extraction client.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Http`] if the HTTP client fails to build.
    pub fn new(config: &ExtractionConfig) -> Result<Self, ExtractionError> {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        if let Ok(mut value) = HeaderValue::from_str(&auth_value) {
            value.set_sensitive(true);
            headers.insert("Authorization", value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            model: config.model.clone(),
        })
    }

    /// Run one generation call and return the raw text.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError`] if the request fails or the endpoint
    /// rejects it.
    pub async fn generate(&self, prompt: &str, model: &str) -> Result<String, ExtractionError> {
        let url = format!("{}/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest { prompt, model })
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = response.json().await?;
        Ok(body.text)
    }

    /// Extract structured expense fields from receipt text (OCR output or
    /// a pasted receipt).
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError`] if the generation call fails or its
    /// output contains no JSON object.
    #[instrument(skip(self, receipt_text))]
    pub async fn extract_receipt(&self, receipt_text: &str) -> Result<ReceiptFields, ExtractionError> {
        let prompt = format!(
            "Extract the following fields from this receipt as a single JSON \
             object: date (YYYY-MM-DD), supplier, category, subtotal, tax, \
             total, currency, line_items (description, amount), confidence \
             (0 to 1).\n\nReceipt:\n{receipt_text}"
        );
        let text = self.generate(&prompt, &self.model).await?;
        parse_receipt(&text)
    }

    /// Ask the model for a category suggestion. Unrecognized suggestions
    /// come back as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError`] if the generation call fails.
    pub async fn suggest_category(
        &self,
        supplier: &str,
        description: &str,
    ) -> Result<Option<ExpenseCategory>, ExtractionError> {
        let labels: Vec<&str> = ExpenseCategory::ALL.iter().map(|c| c.label()).collect();
        let prompt = format!(
            "Pick the best expense category for a purchase from \
             \"{supplier}\" described as \"{description}\". Answer with one \
             of: {}.",
            labels.join(", ")
        );
        let text = self.generate(&prompt, &self.model).await?;
        Ok(ExpenseCategory::parse_suggestion(text.trim()))
    }
}

/// Dig a JSON object out of model output and map it into receipt fields.
///
/// Tolerates prose and code fences around the object. Unreadable fields
/// become `None`; an unrecognized category is discarded.
///
/// # Errors
///
/// Returns [`ExtractionError::MalformedOutput`] if no JSON object can be
/// found at all.
pub fn parse_receipt(text: &str) -> Result<ReceiptFields, ExtractionError> {
    let start = text.find('{').ok_or(ExtractionError::MalformedOutput)?;
    let end = text.rfind('}').ok_or(ExtractionError::MalformedOutput)?;
    let json: Value = serde_json::from_str(text.get(start..=end).unwrap_or(""))
        .map_err(|_| ExtractionError::MalformedOutput)?;

    let category = json
        .get("category")
        .and_then(Value::as_str)
        .and_then(ExpenseCategory::parse_suggestion);
    if category.is_none() {
        debug!("no usable category in extraction output");
    }

    let line_items = json
        .get("line_items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    Some(ExpenseLine {
                        description: item.get("description")?.as_str()?.to_owned(),
                        amount: parse_amount(item.get("amount")?)?,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(ReceiptFields {
        date: json
            .get("date")
            .and_then(Value::as_str)
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()),
        supplier: json
            .get("supplier")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned),
        category,
        subtotal: json.get("subtotal").and_then(parse_amount),
        tax: json.get("tax").and_then(parse_amount),
        total: json.get("total").and_then(parse_amount),
        currency: json
            .get("currency")
            .and_then(Value::as_str)
            .and_then(parse_currency),
        line_items,
        confidence: json
            .get("confidence")
            .and_then(Value::as_f64)
            .map_or(0.0, |c| c.clamp(0.0, 1.0) as f32),
    })
}

/// Amounts come back as numbers or strings depending on the model's mood.
fn parse_amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(_) => Decimal::try_from(value.as_f64()?).ok(),
        Value::String(s) => s.trim().trim_start_matches('$').parse().ok(),
        _ => None,
    }
}

fn parse_currency(code: &str) -> Option<CurrencyCode> {
    match code.trim().to_ascii_uppercase().as_str() {
        "USD" => Some(CurrencyCode::USD),
        "EUR" => Some(CurrencyCode::EUR),
        "GBP" => Some(CurrencyCode::GBP),
        "CAD" => Some(CurrencyCode::CAD),
        "AUD" => Some(CurrencyCode::AUD),
        _ => None,
    }
}
