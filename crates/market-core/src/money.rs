//! # Money
//!
//! Currency handling for payment intents. Listing prices are stored as
//! decimal amounts; the payment provider is always given minor units.

use crate::error::{MarketError, MarketResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Supported currencies (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    USD,
    EUR,
    GBP,
    JPY,
    BDT,
    INR,
    CAD,
    AUD,
}

impl Currency {
    /// Returns the ISO 4217 currency code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::USD => "usd",
            Currency::EUR => "eur",
            Currency::GBP => "gbp",
            Currency::JPY => "jpy",
            Currency::BDT => "bdt",
            Currency::INR => "inr",
            Currency::CAD => "cad",
            Currency::AUD => "aud",
        }
    }

    /// Returns the number of decimal places for this currency
    /// (JPY has 0 decimals, the others have 2)
    pub fn decimal_places(&self) -> u8 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }

    /// Convert a decimal amount to the smallest currency unit (cents, etc.)
    pub fn to_smallest_unit(&self, amount: f64) -> i64 {
        let multiplier = 10_f64.powi(self.decimal_places() as i32);
        (amount * multiplier).round() as i64
    }

    /// Validate a caller-supplied price and convert it to minor units
    pub fn charge_amount(&self, price: f64) -> MarketResult<i64> {
        if !price.is_finite() || price <= 0.0 {
            return Err(MarketError::validation(format!(
                "price must be a positive amount, got {}",
                price
            )));
        }
        let amount = self.to_smallest_unit(price);
        if amount < 1 {
            return Err(MarketError::validation(format!(
                "price {} is below the smallest {} unit",
                price,
                self.as_str()
            )));
        }
        Ok(amount)
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::USD
    }
}

impl FromStr for Currency {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "usd" => Ok(Currency::USD),
            "eur" => Ok(Currency::EUR),
            "gbp" => Ok(Currency::GBP),
            "jpy" => Ok(Currency::JPY),
            "bdt" => Ok(Currency::BDT),
            "inr" => Ok(Currency::INR),
            "cad" => Ok(Currency::CAD),
            "aud" => Ok(Currency::AUD),
            other => Err(MarketError::Configuration(format!(
                "unsupported currency: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}
