//! Loosely-typed upstream records.
//!
//! Upstream calendars publish arrays of JSON objects whose field names and
//! value types drift between providers (and sometimes between endpoints of
//! the same provider). [`RawRecord`] keeps that data untyped until a fetcher
//! translates it into an [`EconomicEvent`](econcal_core::EconomicEvent).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{SourceError, SourceResult};

/// One upstream record, as a string-keyed map of JSON values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: Map<String, Value>,
}

impl RawRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing JSON object.
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Builder method to set a field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Returns the raw JSON value of a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns the first non-blank value among `keys`, trimmed.
    ///
    /// Strings are used as-is, numbers and booleans are rendered as text,
    /// `null`, arrays and objects count as absent.
    pub fn text(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|key| self.fields.get(*key))
            .filter_map(value_as_text)
            .find(|text| !text.is_empty())
    }

    /// Like [`RawRecord::text`] but returns an empty string when absent.
    pub fn text_or_empty(&self, keys: &[&str]) -> String {
        self.text(keys).unwrap_or_default()
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Splits a JSON payload into records.
///
/// The payload must be an array. Elements that are not objects are skipped
/// with a debug log rather than failing the whole payload.
pub fn records_from_value(payload: Value) -> SourceResult<Vec<RawRecord>> {
    let Value::Array(items) = payload else {
        return Err(SourceError::invalid_response(format!(
            "expected a JSON array, got {}",
            json_kind(&payload)
        )));
    };

    let total = items.len();
    let records: Vec<RawRecord> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(RawRecord::from_map(map)),
            _ => None,
        })
        .collect();

    if records.len() != total {
        tracing::debug!(
            "skipped {} non-object elements in payload",
            total - records.len()
        );
    }
    Ok(records)
}

/// Parses a JSON document and splits it into records.
pub fn records_from_str(body: &str) -> SourceResult<Vec<RawRecord>> {
    let payload: Value = serde_json::from_str(body).map_err(|e| {
        SourceError::invalid_response(format!("failed to parse payload: {}", e)).with_cause(e)
    })?;
    records_from_value(payload)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
