use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::scan::scan_model::FieldSummary;

/// How a mapped value is meant to be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Generated document content for a file-upload style field.
    Document,
    /// Plain value written into the control. Unknown kinds fall back here.
    #[default]
    #[serde(other)]
    Text,
}

/// One field's answer from the mapping collaborator.
///
/// Also accepts the collaborator's legacy wire names (`fieldId`,
/// `mappedValue`, `valueType`, `selector`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingResult {
    #[serde(alias = "fieldId")]
    pub field_key: String,
    #[serde(default, alias = "mappedValue", deserialize_with = "scalar_as_string")]
    pub value: Option<String>,
    #[serde(default, alias = "valueType")]
    pub value_kind: ValueKind,
    #[serde(default, deserialize_with = "lenient_confidence")]
    pub confidence: f32,
    #[serde(default, alias = "selector", skip_serializing_if = "Option::is_none")]
    pub locator_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// A field the collaborator says it could not map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedMissing {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default, alias = "fieldId", skip_serializing_if = "Option::is_none")]
    pub field_key: Option<String>,
}

/// Request body for one mapping call.
#[derive(Debug, Clone, Serialize)]
pub struct MappingRequest {
    pub fields: IndexMap<String, FieldSummary>,
    pub dataset: Value,
}

/// Response of one mapping call. Either array may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub mapped_fields: Vec<MappingResult>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub missing_fields: Vec<ReportedMissing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A field that leaves the mapping stage without a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingField {
    pub field_key: String,
    pub label: String,
    pub reason: String,
}

/// Aggregate of every chunk's results, in input field order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingOutcome {
    pub mapped: Vec<MappingResult>,
    pub missing: Vec<MissingField>,
    pub chunked: bool,
    pub total_chunks: usize,
    pub successful_chunks: usize,
}

impl MappingOutcome {
    pub fn accounted_fields(&self) -> usize {
        self.mapped.len() + self.missing.len()
    }
}

// Serde helpers

fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

fn lenient_confidence<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    // NaN survives `clamp` and would serialize as null.
    if !raw.is_finite() {
        return Ok(0.0);
    }
    Ok(raw.clamp(0.0, 1.0) as f32)
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
