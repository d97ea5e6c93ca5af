use std::collections::HashSet;

use sha1::{Digest, Sha1};
use tracing::debug;

use crate::scan::scan_model::{CanonicalField, FieldRecord, FieldType};

const GENERATED_KEY_PREFIX: &str = "field_";

/// Hands out field keys that are unique within one scan.
///
/// A preferred key (name, then id) is used when still free. Otherwise the
/// key falls back to a content hash of the locator, with a numeric suffix
/// appended until it is unique. Same input order, same keys.
#[derive(Debug, Default)]
pub struct KeyAllocator {
    used: HashSet<String>,
}

impl KeyAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, preferred: Option<&str>, locator: &str) -> String {
        if let Some(key) = preferred.filter(|k| !self.used.contains(*k)) {
            self.used.insert(key.to_string());
            return key.to_string();
        }

        let base = generated_key(locator);
        let mut candidate = base.clone();
        let mut n = 2;
        while self.used.contains(&candidate) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

/// `field_` plus the first 8 hex chars of the locator's SHA-1.
pub fn generated_key(locator: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(locator.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{}{}", GENERATED_KEY_PREFIX, &digest[..8])
}

/// Classify every record of a scan. One field per record, keys unique.
pub fn classify(records: &[FieldRecord]) -> Vec<CanonicalField> {
    let mut keys = KeyAllocator::new();
    records
        .iter()
        .map(|record| classify_record(record, &mut keys))
        .collect()
}

pub fn classify_record(record: &FieldRecord, keys: &mut KeyAllocator) -> CanonicalField {
    let locator = record.locator.to_string();
    let preferred = non_empty(&record.raw_name).or(non_empty(&record.raw_id));
    let field_key = keys.allocate(preferred, &locator);

    let label = non_empty(&record.associated_label_text)
        .or(non_empty(&record.placeholder))
        .or(non_empty(&record.aria_label))
        .unwrap_or_default()
        .to_string();

    let field_type = classify_field_type(&record.tag, &record.input_type, &label);

    if preferred.is_some_and(|p| p != field_key) {
        debug!(key = %field_key, preferred = ?preferred, "field key collision, using generated key");
    }

    CanonicalField {
        field_key,
        label,
        field_type,
        tag: record.tag.clone(),
        locator: record.locator.clone(),
        element_id: non_empty(&record.raw_id).map(str::to_string),
        element_name: non_empty(&record.raw_name).map(str::to_string),
        placeholder: non_empty(&record.placeholder).map(str::to_string),
        aria_label: non_empty(&record.aria_label).map(str::to_string),
        title: non_empty(&record.title).map(str::to_string),
    }
}

/// Coarse field type from the control kind, falling back to label wording.
pub fn classify_field_type(tag: &str, input_type: &str, label: &str) -> FieldType {
    match tag {
        "select" => return FieldType::Select,
        "textarea" => return FieldType::Textarea,
        _ => {}
    }

    match input_type {
        "email" => return FieldType::Email,
        "password" => return FieldType::Password,
        "number" | "range" => return FieldType::Number,
        "date" | "datetime-local" | "datetime" => return FieldType::Date,
        "tel" => return FieldType::Tel,
        "url" => return FieldType::Url,
        "checkbox" => return FieldType::Checkbox,
        "radio" => return FieldType::Radio,
        "file" => return FieldType::File,
        "hidden" | "submit" | "button" | "reset" | "image" => return FieldType::Other,
        _ => {}
    }

    let lower = label.to_lowercase();
    if lower.contains("email") {
        return FieldType::Email;
    }
    if lower.contains("password") {
        return FieldType::Password;
    }
    if lower.contains("phone") || lower.contains("tel") {
        return FieldType::Tel;
    }
    if lower.contains("url") || lower.contains("website") {
        return FieldType::Url;
    }
    if lower.contains("date") {
        return FieldType::Date;
    }
    if lower.contains("number") || lower.contains("amount") || lower.contains("quantity") {
        return FieldType::Number;
    }

    FieldType::Text
}

fn non_empty(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}
