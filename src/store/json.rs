//! Conversion between JSON request/response bodies and stored BSON documents.
//!
//! Identifiers are rendered as plain 24-character hex strings rather than
//! extended-JSON `{"$oid": ...}` objects, which is what browser clients of
//! this API expect.

use mongodb::bson::{oid::ObjectId, Bson, Document};
use serde_json::{Map, Number, Value};

use crate::error::StoreError;

/// Parse a path identifier into an ObjectId.
///
/// Returns `None` for anything that is not exactly 24 hex digits.
pub fn parse_object_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

/// Convert a JSON value to BSON.
///
/// Integers that fit in `i64` stay integral; everything else numeric becomes
/// a double.
pub fn json_to_bson(value: Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(b),
        Value::Number(n) => number_to_bson(&n),
        Value::String(s) => Bson::String(s),
        Value::Array(items) => Bson::Array(items.into_iter().map(json_to_bson).collect()),
        Value::Object(map) => Bson::Document(object_to_document(map)),
    }
}

fn number_to_bson(n: &Number) -> Bson {
    if let Some(i) = n.as_i64() {
        if let Ok(small) = i32::try_from(i) {
            Bson::Int32(small)
        } else {
            Bson::Int64(i)
        }
    } else {
        Bson::Double(n.as_f64().unwrap_or(f64::NAN))
    }
}

/// Convert a JSON object to a BSON document, preserving key order.
pub fn object_to_document(map: Map<String, Value>) -> Document {
    map.into_iter()
        .map(|(key, value)| (key, json_to_bson(value)))
        .collect()
}

/// Convert a JSON body into a document for insertion.
///
/// The body must be an object. Any client-supplied `_id` is discarded since
/// identifiers are always assigned by the store.
pub fn body_to_document(body: Value) -> Result<Document, StoreError> {
    match body {
        Value::Object(mut map) => {
            map.remove("_id");
            Ok(object_to_document(map))
        }
        other => Err(StoreError::Encoding(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Build a `$set` payload from the allow-listed fields present in `body`.
///
/// Fields outside `allowed` are dropped. Fields in `allowed` but absent
/// from the body are left untouched in the stored document.
pub fn select_fields(body: &Map<String, Value>, allowed: &[&str]) -> Document {
    let mut selected = Document::new();
    for field in allowed {
        if let Some(value) = body.get(*field) {
            selected.insert(*field, json_to_bson(value.clone()));
        }
    }
    selected
}

/// Convert a stored BSON value to JSON.
pub fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => dt
            .try_to_rfc3339_string()
            .map(Value::String)
            .unwrap_or_else(|_| Value::from(dt.timestamp_millis())),
        Bson::Document(doc) => document_to_json(doc),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}

/// Convert a stored document to a JSON object.
pub fn document_to_json(doc: Document) -> Value {
    Value::Object(
        doc.into_iter()
            .map(|(key, value)| (key, bson_to_json(value)))
            .collect(),
    )
}

/// Short name of a JSON value's type for error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
