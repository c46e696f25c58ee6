//! # Application State
//!
//! Shared state for the Axum application: the marketplace flows over the
//! selected store, the payment gateway, the token service and configuration.

use crate::auth::TokenService;
use anyhow::{bail, Context};
use market_core::{
    CategoryCatalog, Currency, Marketplace, MemoryStore, SharedGateway, SharedStore,
};
use market_mongo::MongoStore;
use market_stripe::StripeIntentGateway;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

const DEV_TOKEN_SECRET: &str = "resale-market-development-secret";

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// HS256 signing secret for bearer tokens
    pub token_secret: String,
    /// Bearer token lifetime
    pub token_ttl_hours: i64,
    /// Currency for payment intents
    pub currency: Currency,
    /// MongoDB connection string; the memory store is used when absent
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,
}

impl AppConfig {
    /// Load from environment variables (and `.env` when present)
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or empty keys fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let environment = var("ENVIRONMENT").unwrap_or(defaults.environment);
        let is_production = environment == "production";

        let port = match var("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT must be a port number, got {:?}", raw))?,
            None => defaults.port,
        };

        let token_secret = match var("ACCESS_TOKEN_SECRET") {
            Some(secret) => secret,
            None if is_production => bail!("ACCESS_TOKEN_SECRET is required in production"),
            None => {
                warn!("ACCESS_TOKEN_SECRET not set, using the development secret");
                defaults.token_secret
            }
        };

        let token_ttl_hours = match var("TOKEN_TTL_HOURS") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|hours| *hours > 0)
                .with_context(|| format!("TOKEN_TTL_HOURS must be a positive integer, got {:?}", raw))?,
            None => defaults.token_ttl_hours,
        };

        let currency = match var("PAYMENT_CURRENCY") {
            Some(raw) => raw.parse::<Currency>()?,
            None => defaults.currency,
        };

        Ok(Self {
            host: var("HOST").unwrap_or(defaults.host),
            port,
            environment,
            token_secret,
            token_ttl_hours,
            currency,
            mongodb_uri: var("MONGODB_URI"),
            mongodb_database: var("MONGODB_DATABASE").unwrap_or(defaults.mongodb_database),
        })
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            environment: "development".to_string(),
            token_secret: DEV_TOKEN_SECRET.to_string(),
            token_ttl_hours: 24,
            currency: Currency::USD,
            mongodb_uri: None,
            mongodb_database: "authoisCarsResale".to_string(),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Listing, ordering and payment flows over the store
    pub market: Marketplace,
    /// Payment-intent provider
    pub payments: SharedGateway,
    /// Bearer token signing and verification
    pub tokens: Arc<TokenService>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Assemble state from explicit parts
    pub fn new(config: AppConfig, store: SharedStore, payments: SharedGateway) -> Self {
        let tokens = TokenService::new(
            config.token_secret.as_bytes(),
            chrono::Duration::hours(config.token_ttl_hours),
        );

        Self {
            market: Marketplace::new(store),
            payments,
            tokens: Arc::new(tokens),
            config,
        }
    }

    /// Connect the configured store and Stripe gateway
    pub async fn from_env() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let store: SharedStore = match &config.mongodb_uri {
            Some(uri) => Arc::new(MongoStore::connect(uri, &config.mongodb_database).await?),
            None if config.is_production() => bail!("MONGODB_URI is required in production"),
            None => {
                warn!("MONGODB_URI not set, using the in-memory store");
                let catalog = load_category_catalog()?;
                Arc::new(MemoryStore::with_categories(catalog.categories))
            }
        };

        let stripe = StripeIntentGateway::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;

        Ok(Self::new(config, store, Arc::new(stripe)))
    }
}

/// Load the category seed list for the in-memory store
fn load_category_catalog() -> anyhow::Result<CategoryCatalog> {
    let config_paths = [
        "config/categories.toml",
        "../config/categories.toml",
        "../../config/categories.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let catalog = CategoryCatalog::from_toml(&content)
                .with_context(|| format!("Failed to parse {}", path))?;
            info!("Loaded {} categories from {}", catalog.categories.len(), path);
            return Ok(catalog);
        }
    }

    warn!("No category seed found, starting with no categories");
    Ok(CategoryCatalog::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert_eq!(config.token_ttl_hours, 24);
        assert_eq!(config.currency, Currency::USD);
        assert_eq!(config.mongodb_database, "authoisCarsResale");
        assert!(config.mongodb_uri.is_none());
        assert!(!config.is_production());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("PAYMENT_CURRENCY", "bdt"),
            ("TOKEN_TTL_HOURS", "2"),
            ("MONGODB_URI", "mongodb://localhost:27017"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.currency, Currency::BDT);
        assert_eq!(config.token_ttl_hours, 2);
        assert_eq!(config.mongodb_uri.as_deref(), Some("mongodb://localhost:27017"));
    }

    #[test]
    fn test_production_requires_secret() {
        let err = AppConfig::from_lookup(lookup(&[("ENVIRONMENT", "production")])).unwrap_err();
        assert!(err.to_string().contains("ACCESS_TOKEN_SECRET"));

        let config = AppConfig::from_lookup(lookup(&[
            ("ENVIRONMENT", "production"),
            ("ACCESS_TOKEN_SECRET", "s3cret"),
        ]))
        .unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(AppConfig::from_lookup(lookup(&[("PORT", "http")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("TOKEN_TTL_HOURS", "0")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("PAYMENT_CURRENCY", "xyz")])).is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            ..AppConfig::default()
        };
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:3000");
    }
}
