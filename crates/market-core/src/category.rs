//! # Category Documents
//!
//! Categories are read-only through the API. The in-memory store seeds them
//! from `config/categories.toml`. Stored categories may carry only an id and a
//! label, so every other field is optional on read.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A product category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Numeric key products reference through `categoryId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,

    /// Display name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Anything else stored on the document (image, description...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Category {
    pub fn new(category_id: i64, name: impl Into<String>) -> Self {
        Self {
            id: None,
            category_id: Some(category_id),
            name: name.into(),
            extra: Map::new(),
        }
    }
}

/// Category seed list (loaded from config)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryCatalog {
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl CategoryCatalog {
    /// Load catalog from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}
