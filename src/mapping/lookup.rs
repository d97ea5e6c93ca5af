use serde_json::Value;

use crate::mapping::backend::{MappingBackend, MappingError};
use crate::mapping::mapping_model::{
    MappingRequest, MappingResponse, MappingResult, ReportedMissing, ValueKind,
};
use crate::scan::scan_model::FieldType;

/// Offline collaborator that answers from the dataset by key matching.
///
/// Each dataset leaf is indexed by its normalized key; a field maps when its
/// key or label normalizes to the same string. No inference, so results are
/// deterministic and confidence is always 1.0.
#[derive(Debug, Default)]
pub struct DatasetLookupBackend;

impl MappingBackend for DatasetLookupBackend {
    fn map_fields(&self, request: &MappingRequest) -> Result<MappingResponse, MappingError> {
        let mut leaves = Vec::new();
        flatten(&request.dataset, "", &mut leaves);

        let mut response = MappingResponse::default();
        for (key, field) in &request.fields {
            let wanted = [normalize(key), normalize(&field.label)];
            let hit = leaves.iter().find(|(path, _)| {
                let leaf = path.rsplit('.').next().unwrap_or(path);
                let leaf = normalize(leaf);
                !leaf.is_empty() && wanted.iter().any(|w| *w == leaf)
            });

            match hit {
                Some((path, value)) => response.mapped_fields.push(MappingResult {
                    field_key: key.clone(),
                    value: Some(value.clone()),
                    value_kind: if field.field_type == FieldType::File {
                        ValueKind::Document
                    } else {
                        ValueKind::Text
                    },
                    confidence: 1.0,
                    locator_hint: None,
                    label: Some(field.label.clone()),
                    reasoning: Some(format!("dataset key '{}'", path)),
                }),
                None => response.missing_fields.push(ReportedMissing {
                    label: field.label.clone(),
                    reason: "Dataset does not contain this information".into(),
                    field_key: Some(key.clone()),
                }),
            }
        }
        Ok(response)
    }
}

/// Lowercase alphanumerics only: `"Full Name"`, `full_name` and `fullName` agree.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn flatten(value: &Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                let path = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{}.{}", prefix, k)
                };
                flatten(v, &path, out);
            }
        }
        Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                flatten(v, &format!("{}.{}", prefix, i), out);
            }
        }
        Value::Null => {}
        Value::String(s) => out.push((prefix.to_string(), s.clone())),
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_ignores_case_and_separators() {
        assert_eq!(normalize("Full Name"), normalize("full_name"));
        assert_eq!(normalize("fullName"), "fullname");
    }

    #[test]
    fn flatten_produces_dotted_paths() {
        let mut out = Vec::new();
        flatten(
            &serde_json::json!({"org": {"pan": "ABCDE1234F", "years": [2020]}}),
            "",
            &mut out,
        );
        assert!(out.contains(&("org.pan".to_string(), "ABCDE1234F".to_string())));
        assert!(out.contains(&("org.years.0".to_string(), "2020".to_string())));
    }
}
