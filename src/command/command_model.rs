use serde::{Deserialize, Serialize};

use crate::mapping::mapping_model::ValueKind;
use crate::scan::locator::Locator;
use crate::scan::scan_model::FieldType;

/// An alternative way to find a field when its primary locator misses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "camelCase")]
pub enum Criterion {
    /// CSS selector supplied by the mapping collaborator.
    Selector { selector: String },
    /// Exact `id` attribute.
    Id { id: String },
    /// Exact `name` attribute.
    Name { name: String },
    /// Exact match on `aria-label`, `placeholder` or `title`.
    AttributeEquals { attribute: String, value: String },
    /// Fuzzy match against the human label.
    LabelText { label: String },
}

impl Criterion {
    pub fn describe(&self) -> String {
        match self {
            Criterion::Selector { selector } => format!("selector {}", selector),
            Criterion::Id { id } => format!("id={}", id),
            Criterion::Name { name } => format!("name={}", name),
            Criterion::AttributeEquals { attribute, value } => format!("{}={}", attribute, value),
            Criterion::LabelText { label } => format!("label~{}", label),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillAction {
    #[default]
    Fill,
    Document,
}

/// One instruction to write one value into one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillCommand {
    pub field_key: String,
    pub locator: Locator,
    #[serde(default)]
    pub fallback_locators: Vec<Criterion>,
    pub value: String,
    #[serde(default)]
    pub value_kind: ValueKind,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub action: FillAction,
}

impl FillCommand {
    /// Document commands render content for review instead of writing a value.
    pub fn is_document(&self) -> bool {
        self.action == FillAction::Document || self.value_kind == ValueKind::Document
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandMetadata {
    pub total_fields: usize,
    pub missing_fields: usize,
    pub timestamp: String,
}

/// What crosses the boundary to wherever injection runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandEnvelope {
    pub commands: Vec<FillCommand>,
    pub metadata: CommandMetadata,
}

impl CommandEnvelope {
    pub fn new(commands: Vec<FillCommand>, missing_fields: usize) -> Self {
        let metadata = CommandMetadata {
            total_fields: commands.len(),
            missing_fields,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        Self { commands, metadata }
    }
}
