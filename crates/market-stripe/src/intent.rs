//! # Stripe Payment Intents
//!
//! Implementation of the Stripe PaymentIntents API. The server only creates
//! the intent; the browser confirms it with the returned client secret.

use crate::config::StripeConfig;
use async_trait::async_trait;
use market_core::{Currency, MarketError, MarketResult, PaymentGateway, PaymentIntent};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

/// Stripe payment-intent gateway
pub struct StripeIntentGateway {
    config: StripeConfig,
    client: Client,
}

impl StripeIntentGateway {
    /// Create a new Stripe gateway
    pub fn new(config: StripeConfig) -> MarketResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| {
                MarketError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> MarketResult<Self> {
        let config = StripeConfig::from_env()?;
        Self::new(config)
    }

    /// Form body for `POST /v1/payment_intents`
    fn intent_form(amount: i64, currency: Currency) -> Vec<(&'static str, String)> {
        vec![
            ("amount", amount.to_string()),
            ("currency", currency.as_str().to_string()),
            ("payment_method_types[]", "card".to_string()),
        ]
    }
}

#[async_trait]
impl PaymentGateway for StripeIntentGateway {
    #[instrument(skip(self))]
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: Currency,
    ) -> MarketResult<PaymentIntent> {
        if amount < 1 {
            return Err(MarketError::validation(format!(
                "payment amount must be positive, got {}",
                amount
            )));
        }

        debug!("Creating Stripe payment intent: amount={}", amount);

        let url = format!("{}/v1/payment_intents", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .form(&Self::intent_form(amount, currency))
            .send()
            .await
            .map_err(|e| MarketError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MarketError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("Stripe API error: status={}, body={}", status, body);

            if let Ok(error_response) = serde_json::from_str::<StripeErrorResponse>(&body) {
                return Err(MarketError::ProviderError {
                    provider: "stripe".to_string(),
                    message: error_response.error.message,
                });
            }

            return Err(MarketError::ProviderError {
                provider: "stripe".to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let intent: StripePaymentIntentResponse = serde_json::from_str(&body).map_err(|e| {
            MarketError::Serialization(format!("Failed to parse Stripe response: {}", e))
        })?;

        let client_secret = intent.client_secret.ok_or_else(|| MarketError::ProviderError {
            provider: "stripe".to_string(),
            message: format!("payment intent {} has no client_secret", intent.id),
        })?;

        info!("Created Stripe payment intent: id={}", intent.id);

        Ok(PaymentIntent {
            id: intent.id,
            client_secret,
            amount: intent.amount,
            currency,
        })
    }

    fn provider_name(&self) -> &'static str {
        "stripe"
    }
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripePaymentIntentResponse {
    id: String,
    amount: i64,
    #[serde(default)]
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
}
