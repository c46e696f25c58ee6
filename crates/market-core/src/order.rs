//! # Order and Payment Documents
//!
//! An order references exactly one product; a payment references exactly one
//! order. Neither reference is enforced by the store.

use crate::error::{MarketError, MarketResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// A purchase of one listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub product_id: String,

    /// Buyer email
    pub email: String,

    pub sellers_email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    #[serde(default)]
    pub paid: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Order {
    pub fn new(
        product_id: impl Into<String>,
        buyer_email: impl Into<String>,
        sellers_email: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            product_id: product_id.into(),
            email: buyer_email.into(),
            sellers_email: sellers_email.into(),
            price: None,
            paid: false,
            transaction_id: None,
            extra: Map::new(),
        }
    }

    pub fn validate(&self) -> MarketResult<()> {
        if self.product_id.trim().is_empty() {
            return Err(MarketError::validation("productId is required"));
        }
        if self.email.trim().is_empty() {
            return Err(MarketError::validation("buyer email is required"));
        }
        if self.sellers_email.trim().is_empty() {
            return Err(MarketError::validation("sellersEmail is required"));
        }
        Ok(())
    }
}

/// Completed payment for an order; immutable once stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub order_id: String,

    pub transaction_id: String,

    pub price: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Payment {
    pub fn new(order_id: impl Into<String>, transaction_id: impl Into<String>, price: f64) -> Self {
        Self {
            id: None,
            order_id: order_id.into(),
            transaction_id: transaction_id.into(),
            price,
            email: None,
            extra: Map::new(),
        }
    }

    pub fn validate(&self) -> MarketResult<()> {
        if self.order_id.trim().is_empty() {
            return Err(MarketError::validation("orderId is required"));
        }
        if self.transaction_id.trim().is_empty() {
            return Err(MarketError::validation("transactionId is required"));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(MarketError::validation(format!(
                "price must be a non-negative amount, got {}",
                self.price
            )));
        }
        Ok(())
    }
}

/// Keep the first order per buyer email, preserving input order
pub fn dedup_by_buyer(orders: Vec<Order>) -> Vec<Order> {
    let mut seen = HashSet::new();
    orders
        .into_iter()
        .filter(|order| seen.insert(order.email.clone()))
        .collect()
}
