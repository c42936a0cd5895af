//! Payment collaborator client.
//!
//! Payments run through server-side callables exposed by the payment
//! backend (`createPaymentIntent`, `createCheckoutSession`, `createRefund`,
//! `getPaymentStatus`). This client owns the HTTP plumbing and the payload
//! types; card confirmation against the hosted payment SDK happens in the
//! UI and is out of scope here.
//!
//! Payment errors are surfaced verbatim: the collaborator's response body
//! becomes the error message, untouched.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use brightfold_core::{Money, OrderId};

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Payment backend configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct PaymentConfig {
    /// Base URL of the payment callables.
    pub base_url: String,
    /// API key sent as a bearer token.
    pub api_key: SecretString,
}

impl PaymentConfig {
    /// Load configuration from `PAYMENT_API_URL` and `PAYMENT_API_KEY`.
    ///
    /// A `.env` file is honored for local development.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] for an unset variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let base_url = std::env::var("PAYMENT_API_URL")
            .map_err(|_| ConfigError::MissingEnvVar("PAYMENT_API_URL".to_owned()))?;
        let api_key = std::env::var("PAYMENT_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("PAYMENT_API_KEY".to_owned()))?;

        Ok(Self {
            base_url,
            api_key: SecretString::from(api_key),
        })
    }
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Errors that can occur when calling the payment backend.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend returned an error response; the message is the response
    /// body, passed through verbatim.
    #[error("payment error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// A created payment intent, ready for client-side confirmation.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    pub status: String,
}

/// A hosted checkout session the UI redirects to.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// A created refund.
#[derive(Debug, Clone, Deserialize)]
pub struct Refund {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
struct PaymentIntentRequest<'a> {
    order_id: &'a str,
    amount: &'a Money,
}

#[derive(Debug, Serialize)]
struct CheckoutSessionRequest<'a> {
    order_id: &'a str,
    success_url: &'a str,
    cancel_url: &'a str,
}

#[derive(Debug, Serialize)]
struct RefundRequest<'a> {
    payment_intent_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    amount: Option<&'a Money>,
}

#[derive(Debug, Deserialize)]
struct PaymentStatusResponse {
    status: String,
}

/// Client for the payment backend callables.
#[derive(Debug, Clone)]
pub struct PaymentClient {
    client: reqwest::Client,
    base_url: String,
}

impl PaymentClient {
    /// Create a new payment client.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::Http`] if the HTTP client fails to build.
    pub fn new(config: &PaymentConfig) -> Result<Self, PaymentError> {
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
        })
    }

    async fn call<Req: Serialize + Sync, Resp: for<'de> Deserialize<'de>>(
        &self,
        callable: &str,
        body: &Req,
    ) -> Result<Resp, PaymentError> {
        let url = format!("{}/{callable}", self.base_url);
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    /// Create a payment intent for an order total.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError`] if the request fails or the backend rejects
    /// it.
    pub async fn create_payment_intent(
        &self,
        order_id: &OrderId,
        amount: &Money,
    ) -> Result<PaymentIntent, PaymentError> {
        self.call(
            "createPaymentIntent",
            &PaymentIntentRequest {
                order_id: order_id.as_str(),
                amount,
            },
        )
        .await
    }

    /// Create a hosted checkout session for an order.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError`] if the request fails or the backend rejects
    /// it.
    pub async fn create_checkout_session(
        &self,
        order_id: &OrderId,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, PaymentError> {
        self.call(
            "createCheckoutSession",
            &CheckoutSessionRequest {
                order_id: order_id.as_str(),
                success_url,
                cancel_url,
            },
        )
        .await
    }

    /// Refund a payment, in full (`amount: None`) or partially.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError`] if the request fails or the backend rejects
    /// it.
    pub async fn create_refund(
        &self,
        payment_intent_id: &str,
        amount: Option<&Money>,
    ) -> Result<Refund, PaymentError> {
        self.call(
            "createRefund",
            &RefundRequest {
                payment_intent_id,
                amount,
            },
        )
        .await
    }

    /// Fetch the current status of a payment intent.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError`] if the request fails or the backend rejects
    /// it.
    pub async fn payment_status(&self, payment_intent_id: &str) -> Result<String, PaymentError> {
        let response: PaymentStatusResponse = self
            .call(
                "getPaymentStatus",
                &serde_json::json!({ "payment_intent_id": payment_intent_id }),
            )
            .await?;
        Ok(response.status)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use brightfold_core::CurrencyCode;
    use rust_decimal::Decimal;

    #[test]
    fn test_config_debug_redacts_api_key() {
        let config = PaymentConfig {
            base_url: "https://pay.example.com".to_owned(),
            api_key: SecretString::from("sk_live_secret".to_owned()),
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("sk_live_secret"));
    }

    #[test]
    fn test_payment_intent_request_shape() {
        let amount = Money::new(Decimal::from(25), CurrencyCode::USD);
        let request = PaymentIntentRequest {
            order_id: "o-1",
            amount: &amount,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json.get("order_id").unwrap(), "o-1");
        assert!(json.get("amount").unwrap().get("currency_code").is_some());
    }

    #[test]
    fn test_api_error_passes_message_verbatim() {
        let error = PaymentError::Api {
            status: 402,
            message: "Your card was declined.".to_owned(),
        };
        assert_eq!(
            error.to_string(),
            "payment error: 402 - Your card was declined."
        );
    }
}
