//! # Payment Gateway Trait
//!
//! The marketplace never charges cards itself. It asks a provider for a
//! payment intent and hands the client secret to the browser, which
//! confirms the charge directly with the provider.

use crate::error::MarketResult;
use crate::money::Currency;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Provider-side record of an in-progress charge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Provider's intent ID (pi_...)
    pub id: String,
    /// Secret the client uses to confirm the payment
    pub client_secret: String,
    /// Amount in smallest currency unit
    pub amount: i64,
    pub currency: Currency,
}

/// Core trait for payment provider implementations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a card-payable payment intent.
    ///
    /// # Arguments
    /// * `amount` - Amount in the currency's smallest unit
    /// * `currency` - Charge currency
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: Currency,
    ) -> MarketResult<PaymentIntent>;

    /// Get the provider name (for logging).
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared gateway handle (dynamic dispatch)
pub type SharedGateway = Arc<dyn PaymentGateway>;
