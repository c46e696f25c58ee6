//! # Product Documents
//!
//! Listings posted by sellers, plus the filter and patch types the stores
//! understand.

use crate::error::{MarketError, MarketResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sale state of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Available,
    Sold,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Available => "available",
            ProductStatus::Sold => "sold",
        }
    }
}

impl Default for ProductStatus {
    fn default() -> Self {
        ProductStatus::Available
    }
}

/// A listing in the marketplace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Store-assigned identifier
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Numeric category key
    pub category_id: i64,

    /// Display name
    pub name: String,

    /// Seller that owns the listing
    pub owner_email: String,

    /// Asking price (decimal currency units)
    pub price: f64,

    #[serde(default)]
    pub status: ProductStatus,

    #[serde(default)]
    pub is_advertised: bool,

    #[serde(default)]
    pub is_reported: bool,

    /// Epoch milliseconds, assigned by the server after insertion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,

    /// Free-form description fields (location, condition, images...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    pub fn new(
        category_id: i64,
        name: impl Into<String>,
        owner_email: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            id: None,
            category_id,
            name: name.into(),
            owner_email: owner_email.into(),
            price,
            status: ProductStatus::Available,
            is_advertised: false,
            is_reported: false,
            timestamp: None,
            extra: Map::new(),
        }
    }

    /// Builder: add a description field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn is_available(&self) -> bool {
        self.status == ProductStatus::Available
    }

    pub fn validate(&self) -> MarketResult<()> {
        if self.name.trim().is_empty() {
            return Err(MarketError::validation("product name is required"));
        }
        if self.owner_email.trim().is_empty() {
            return Err(MarketError::validation("ownerEmail is required"));
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

/// Query over the products collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub category_id: Option<i64>,
    pub owner_email: Option<String>,
    pub status: Option<ProductStatus>,
    pub advertised: Option<bool>,
    pub reported: Option<bool>,
    /// Sort by `timestamp` descending
    pub newest_first: bool,
}

impl ProductFilter {
    pub fn in_category(category_id: i64) -> Self {
        Self {
            category_id: Some(category_id),
            newest_first: true,
            ..Default::default()
        }
    }

    pub fn owned_by(email: impl Into<String>) -> Self {
        Self {
            owner_email: Some(email.into()),
            newest_first: true,
            ..Default::default()
        }
    }

    pub fn advertised_available() -> Self {
        Self {
            advertised: Some(true),
            status: Some(ProductStatus::Available),
            ..Default::default()
        }
    }

    pub fn reported() -> Self {
        Self {
            reported: Some(true),
            ..Default::default()
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.category_id.map_or(true, |c| product.category_id == c)
            && self
                .owner_email
                .as_deref()
                .map_or(true, |e| product.owner_email == e)
            && self.status.map_or(true, |s| product.status == s)
            && self.advertised.map_or(true, |a| product.is_advertised == a)
            && self.reported.map_or(true, |r| product.is_reported == r)
    }
}

/// Field updates for an existing product. Never creates a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub status: Option<ProductStatus>,
    pub is_advertised: Option<bool>,
    pub is_reported: Option<bool>,
    pub timestamp: Option<i64>,
    /// Only apply when the stored status equals this value
    pub only_if_status: Option<ProductStatus>,
}

impl ProductPatch {
    /// Post-insert stamp: creation time and a fresh `available` status
    pub fn stamp(timestamp: i64) -> Self {
        Self {
            status: Some(ProductStatus::Available),
            timestamp: Some(timestamp),
            ..Default::default()
        }
    }

    /// Mark an available listing as sold and pull it from advertising
    pub fn sell() -> Self {
        Self {
            status: Some(ProductStatus::Sold),
            is_advertised: Some(false),
            only_if_status: Some(ProductStatus::Available),
            ..Default::default()
        }
    }

    pub fn advertise() -> Self {
        Self {
            is_advertised: Some(true),
            ..Default::default()
        }
    }

    pub fn report() -> Self {
        Self {
            is_reported: Some(true),
            ..Default::default()
        }
    }

    pub fn allows(&self, product: &Product) -> bool {
        self.only_if_status.map_or(true, |s| product.status == s)
    }

    pub fn apply(&self, product: &mut Product) {
        if let Some(status) = self.status {
            product.status = status;
        }
        if let Some(advertised) = self.is_advertised {
            product.is_advertised = advertised;
        }
        if let Some(reported) = self.is_reported {
            product.is_reported = reported;
        }
        if let Some(ts) = self.timestamp {
            product.timestamp = Some(ts);
        }
    }
}
