//! # Marketplace Error Types
//!
//! Typed error handling for the resale marketplace.
//! Every store, gateway and flow operation returns `Result<T, MarketError>`.

use thiserror::Error;

/// Core error type for all marketplace operations
#[derive(Debug, Error)]
pub enum MarketError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Request body or path parameter failed validation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Referenced document does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The document exists but is not in a state that allows the operation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database call failed or timed out
    #[error("Storage error: {0}")]
    Storage(String),

    /// Payment provider API error
    #[error("Provider error [{provider}]: {message}")]
    ProviderError { provider: String, message: String },

    /// Network/HTTP error communicating with provider
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MarketError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        MarketError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        MarketError::Validation(message.into())
    }

    /// Returns true if the failure came from an external collaborator
    /// rather than from the request itself
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            MarketError::Storage(_)
                | MarketError::NetworkError(_)
                | MarketError::ProviderError { .. }
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            MarketError::Configuration(_) => 500,
            MarketError::Validation(_) => 400,
            MarketError::NotFound { .. } => 404,
            MarketError::Conflict(_) => 409,
            MarketError::Storage(_) => 503,
            MarketError::ProviderError { .. } => 502,
            MarketError::NetworkError(_) => 503,
            MarketError::Serialization(_) => 500,
            MarketError::Internal(_) => 500,
        }
    }
}

/// Result type alias for marketplace operations
pub type MarketResult<T> = Result<T, MarketError>;
