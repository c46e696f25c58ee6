//! # Stripe Configuration
//!
//! Configuration management for Stripe integration.
//! The secret key is loaded from environment variables.

use market_core::MarketError;
use std::env;

const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";
const DEFAULT_API_VERSION: &str = "2024-12-18.acacia";

/// Stripe API configuration
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Secret API key (sk_test_... or sk_live_...)
    pub secret_key: String,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// API version
    pub api_version: String,
}

impl StripeConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `STRIPE_SECRET_KEY`
    ///
    /// Optional:
    /// - `STRIPE_API_BASE_URL`
    pub fn from_env() -> Result<Self, MarketError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let secret_key = env::var("STRIPE_SECRET_KEY").map_err(|_| {
            MarketError::Configuration("STRIPE_SECRET_KEY not set".to_string())
        })?;

        let config = Self::new(secret_key);
        config.validate()?;

        match env::var("STRIPE_API_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => Ok(config.with_api_base_url(url)),
            _ => Ok(config),
        }
    }

    /// Create config with an explicit key (for testing)
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Check the key format
    pub fn validate(&self) -> Result<(), MarketError> {
        if !self.is_test_mode() && !self.is_live_mode() {
            return Err(MarketError::Configuration(
                "STRIPE_SECRET_KEY must start with sk_test_ or sk_live_".to_string(),
            ));
        }
        Ok(())
    }

    /// Check if using test keys
    pub fn is_test_mode(&self) -> bool {
        self.secret_key.starts_with("sk_test_")
    }

    /// Check if using live keys
    pub fn is_live_mode(&self) -> bool {
        self.secret_key.starts_with("sk_live_")
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.secret_key)
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_modes() {
        let config = StripeConfig::new("sk_test_abc123");
        assert!(config.is_test_mode());
        assert!(!config.is_live_mode());
        assert!(config.validate().is_ok());

        let config = StripeConfig::new("sk_live_abc123");
        assert!(config.is_live_mode());

        assert!(StripeConfig::new("pk_test_abc123").validate().is_err());
    }

    #[test]
    fn test_auth_header() {
        let config = StripeConfig::new("sk_test_abc123");
        assert_eq!(config.auth_header(), "Bearer sk_test_abc123");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let config = StripeConfig::new("sk_test_abc").with_api_base_url("http://127.0.0.1:9999/");
        assert_eq!(config.api_base_url, "http://127.0.0.1:9999");
    }
}
