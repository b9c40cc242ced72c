// 📦 Records - normalized items returned by a provider load
// The payload is tagged once, at load time: typed record list or opaque JSON

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ============================================================================
// RECORD
// ============================================================================

/// Record - one item returned by `/integrations/{slug}/load`
///
/// Only `id` is required. Optional fields are read leniently: numbers become
/// their decimal text, while `null`, `""`, arrays and objects count as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(deserialize_with = "required_text")]
    pub id: String,

    #[serde(default, deserialize_with = "optional_text")]
    pub name: Option<String>,

    /// Declared category ("contact", "company", ...); absent for untyped providers
    #[serde(default, rename = "type", deserialize_with = "optional_text")]
    pub record_type: Option<String>,

    #[serde(default, deserialize_with = "optional_text")]
    pub creation_time: Option<String>,

    #[serde(default, deserialize_with = "optional_text")]
    pub url: Option<String>,
}

impl Record {
    /// Display name; a record without one renders with an empty name
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

fn scalar_text(value: Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(format!("expected a scalar, found {}", other)),
    }
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_text(value).unwrap_or(None))
}

fn required_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    scalar_text(value)
        .map_err(serde::de::Error::custom)?
        .ok_or_else(|| serde::de::Error::custom("record id must not be empty"))
}

// ============================================================================
// PAYLOAD
// ============================================================================

/// Payload - the body of one successful load
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A JSON array of objects. Elements without a usable `id` are left out of
    /// `records` but stay in `raw`.
    Records { records: Vec<Record>, raw: Value },

    /// Anything else; only ever shown as raw JSON
    Opaque(Value),
}

impl Payload {
    /// Tag a response body by shape
    pub fn from_value(value: Value) -> Self {
        let items = match &value {
            Value::Array(items) if items.iter().all(Value::is_object) => items,
            _ => return Payload::Opaque(value),
        };

        let mut records = Vec::with_capacity(items.len());
        for item in items {
            match Record::deserialize(item) {
                Ok(record) => records.push(record),
                Err(e) => tracing::debug!(error = %e, "skipping record without a usable id"),
            }
        }

        Payload::Records { records, raw: value }
    }

    /// The JSON exactly as the backend returned it
    pub fn raw(&self) -> &Value {
        match self {
            Payload::Records { raw, .. } => raw,
            Payload::Opaque(raw) => raw,
        }
    }

    pub fn records(&self) -> Option<&[Record]> {
        match self {
            Payload::Records { records, .. } => Some(records),
            Payload::Opaque(_) => None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
