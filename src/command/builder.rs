use std::collections::HashMap;

use tracing::{debug, warn};

use crate::command::command_model::{Criterion, FillAction, FillCommand};
use crate::mapping::mapping_model::{MappingResult, ValueKind};
use crate::scan::scan_model::{CanonicalField, FieldType};

/// Attributes compared against the label by the equality strategy, in order.
const LABEL_ATTRIBUTES: [&str; 3] = ["aria-label", "placeholder", "title"];

/// One command per mapped result with a value, in mapping order.
///
/// Results whose key matches no scanned field are dropped with a warning.
pub fn build_commands(fields: &[CanonicalField], mapped: &[MappingResult]) -> Vec<FillCommand> {
    let by_key: HashMap<&str, &CanonicalField> =
        fields.iter().map(|f| (f.field_key.as_str(), f)).collect();

    mapped
        .iter()
        .filter_map(|result| {
            let value = result.value.as_ref()?;
            let Some(field) = by_key.get(result.field_key.as_str()) else {
                warn!(key = %result.field_key, "mapping result for unknown field, no command built");
                return None;
            };
            Some(build_command(field, result, value))
        })
        .collect()
}

pub fn build_command(field: &CanonicalField, result: &MappingResult, value: &str) -> FillCommand {
    let action = if result.value_kind == ValueKind::Document || field.field_type == FieldType::File {
        FillAction::Document
    } else {
        FillAction::Fill
    };

    let fallback_locators = fallback_criteria(field, result.locator_hint.as_deref());
    debug!(
        key = %field.field_key,
        fallbacks = fallback_locators.len(),
        "built fill command"
    );

    FillCommand {
        field_key: field.field_key.clone(),
        locator: field.locator.clone(),
        fallback_locators,
        value: value.to_string(),
        value_kind: result.value_kind,
        field_type: field.field_type,
        label: field.label.clone(),
        confidence: result.confidence,
        action,
    }
}

/// Fallback criteria from most to least specific: collaborator hint, own
/// id, name, label-equal attributes, then fuzzy label text.
pub fn fallback_criteria(field: &CanonicalField, hint: Option<&str>) -> Vec<Criterion> {
    let mut out: Vec<Criterion> = Vec::new();
    let mut push = |c: Criterion| {
        if !out.contains(&c) {
            out.push(c);
        }
    };

    if let Some(selector) = hint.map(str::trim).filter(|s| !s.is_empty()) {
        push(Criterion::Selector {
            selector: selector.to_string(),
        });
    }
    if let Some(id) = &field.element_id {
        push(Criterion::Id { id: id.clone() });
    }
    if let Some(name) = &field.element_name {
        push(Criterion::Name { name: name.clone() });
    }

    let label = field.label.trim();
    if !label.is_empty() {
        for attribute in LABEL_ATTRIBUTES {
            push(Criterion::AttributeEquals {
                attribute: attribute.to_string(),
                value: label.to_string(),
            });
        }
        push(Criterion::LabelText {
            label: label.to_string(),
        });
    }

    out
}
