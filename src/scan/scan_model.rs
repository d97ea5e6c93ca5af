use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dom::NodeId;
use crate::scan::locator::Locator;

// ============================================================================
// Extractor output
// ============================================================================

/// One discovered input, exactly as the page presents it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRecord {
    pub tag: String,
    #[serde(rename = "type")]
    pub input_type: String,
    pub raw_id: String,
    pub raw_name: String,
    pub placeholder: String,
    pub associated_label_text: String,
    #[serde(default)]
    pub aria_label: String,
    #[serde(default)]
    pub title: String,
    pub locator: Locator,
}

/// An element the extractor could not give a locator to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionGap {
    pub node: NodeId,
    pub tag: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub records: Vec<FieldRecord>,
    pub gaps: Vec<ExtractionGap>,
}

// ============================================================================
// Classifier output
// ============================================================================

/// Coarse kind of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Email,
    Password,
    Number,
    Date,
    Tel,
    Url,
    Select,
    Checkbox,
    Radio,
    File,
    Textarea,
    Other,
}

/// Pipeline-internal representation of one discovered input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalField {
    pub field_key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub tag: String,
    pub locator: Locator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aria_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// What the mapping collaborator sees of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub tag: String,
    pub locator: Locator,
}

impl From<&CanonicalField> for FieldSummary {
    fn from(field: &CanonicalField) -> Self {
        FieldSummary {
            label: field.label.clone(),
            field_type: field.field_type,
            tag: field.tag.clone(),
            locator: field.locator.clone(),
        }
    }
}

/// Ordered `fieldKey -> summary` map, the serialized form of a scan.
pub fn field_map(fields: &[CanonicalField]) -> IndexMap<String, FieldSummary> {
    fields
        .iter()
        .map(|f| (f.field_key.clone(), FieldSummary::from(f)))
        .collect()
}

/// Result of scanning one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub scanned_at: String,
    pub field_count: usize,
    pub fields: IndexMap<String, FieldSummary>,
}

impl ScanReport {
    pub fn new(url: Option<&str>, fields: &[CanonicalField]) -> Self {
        ScanReport {
            url: url.map(str::to_string),
            scanned_at: chrono::Utc::now().to_rfc3339(),
            field_count: fields.len(),
            fields: field_map(fields),
        }
    }
}
