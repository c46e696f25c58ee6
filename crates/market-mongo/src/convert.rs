//! BSON <-> document conversion.
//!
//! Documents travel through the API with a string `_id`; in MongoDB the same
//! field is an `ObjectId`. These helpers do the swap in both directions.

use market_core::{MarketError, MarketResult};
use mongodb::bson::{self, oid::ObjectId, Bson, Document};
use mongodb::results::InsertOneResult;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Serialize for insertion. Any `_id` is dropped so the server assigns one.
pub fn to_document<T: Serialize>(value: &T) -> MarketResult<Document> {
    let mut doc = bson::to_document(value)
        .map_err(|e| MarketError::Serialization(format!("to BSON: {}", e)))?;
    doc.remove("_id");
    Ok(doc)
}

/// Deserialize a stored document, rendering `_id` as a hex string and a
/// BSON date `timestamp` as epoch milliseconds
pub fn from_document<T: DeserializeOwned>(mut doc: Document) -> MarketResult<T> {
    if let Some(id) = doc.remove("_id") {
        doc.insert("_id", id_string(id));
    }
    if let Some(Bson::DateTime(at)) = doc.get("timestamp") {
        let millis = at.timestamp_millis();
        doc.insert("timestamp", millis);
    }
    bson::from_document(doc).map_err(|e| MarketError::Serialization(format!("from BSON: {}", e)))
}

fn id_string(id: Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s,
        other => other.to_string(),
    }
}

/// Parse an API identifier. Malformed ids match nothing.
pub fn object_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

pub fn inserted_id(result: InsertOneResult) -> String {
    id_string(result.inserted_id)
}
