//! Response envelope handling shared by every upstream listing.
//!
//! The platform answers listings either with a bare array or with
//! `{"data": [...]}` depending on endpoint and version.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// Turn an upstream listing body into its record sequence.
pub fn normalize_records(body: Value) -> Vec<Value> {
    let records = match body {
        Value::Object(mut envelope) if envelope.contains_key("data") => {
            envelope.remove("data").unwrap_or_default()
        }
        other => other,
    };

    match records {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => {
            warn!("Expected a list of records, got: {}", other);
            Vec::new()
        }
    }
}

/// Deserialize each record, skipping the ones that do not fit.
pub(crate) fn parse_records<T: DeserializeOwned>(records: Vec<Value>, context: &str) -> Vec<T> {
    let mut parsed = Vec::with_capacity(records.len());
    for record in records {
        match serde_json::from_value(record) {
            Ok(item) => parsed.push(item),
            Err(e) => warn!("{}: skipping malformed record: {}", context, e),
        }
    }
    parsed
}
