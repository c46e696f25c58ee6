//! # market-stripe
//!
//! Stripe payment gateway for the resale marketplace.
//!
//! **StripeIntentGateway** creates card-payable PaymentIntents and returns
//! the client secret the browser needs to confirm the charge with Stripe
//! Elements.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use market_core::{Currency, PaymentGateway};
//! use market_stripe::StripeIntentGateway;
//!
//! // Create gateway from environment
//! let gateway = StripeIntentGateway::from_env()?;
//!
//! // $100.00 -> 10000 cents
//! let intent = gateway.create_payment_intent(10000, Currency::USD).await?;
//!
//! // Hand intent.client_secret to the browser
//! ```

pub mod config;
pub mod intent;

// Re-exports
pub use config::StripeConfig;
pub use intent::StripeIntentGateway;
