use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::command::command_model::FillCommand;
use crate::dom::events::{EventKind, HighlightKind};
use crate::dom::{Document, NodeId};
use crate::inject::date::normalize_date;

/// Values that check a checkbox. Anything else unchecks it.
const AFFIRMATIVE: [&str; 4] = ["yes", "true", "1", "checked"];

/// Dataset keys written on a document-kind field.
pub const DOCUMENT_CONTENT_KEY: &str = "ai-document-content";
pub const DOCUMENT_READY_KEY: &str = "ai-document-ready";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InjectError {
    /// The element exists but cannot take this value.
    #[error("{0}")]
    ValueRejected(String),
}

/// What a successful injection wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Injected {
    Value(String),
    Checked(bool),
    Document,
}

pub type InjectResult = Result<Injected, InjectError>;

pub fn is_affirmative(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    AFFIRMATIVE.contains(&v.as_str())
}

/// Writes one command's value into a resolved element.
#[derive(Debug, Clone, Copy)]
pub struct Injector {
    highlight: bool,
}

impl Default for Injector {
    fn default() -> Self {
        Self { highlight: true }
    }
}

impl Injector {
    pub fn new(highlight: bool) -> Self {
        Self { highlight }
    }

    pub fn inject(&self, doc: &mut Document, node: NodeId, command: &FillCommand) -> InjectResult {
        if command.is_document() {
            return Ok(self.attach_document(doc, node, command));
        }

        let injected = match doc.tag(node) {
            "input" => self.fill_input(doc, node, command)?,
            "select" => fill_select(doc, node, &command.value)?,
            _ => {
                doc.set_value(node, &command.value);
                Injected::Value(command.value.clone())
            }
        };

        trigger_events(doc, node);
        self.mark(doc, node, HighlightKind::Success);
        debug!(key = %command.field_key, element = %doc.describe(node), ?injected, "value injected");
        Ok(injected)
    }

    fn fill_input(&self, doc: &mut Document, node: NodeId, command: &FillCommand) -> InjectResult {
        let value = command.value.as_str();
        match doc.control_type(node).as_str() {
            "checkbox" => {
                let checked = is_affirmative(value);
                doc.set_checked(node, checked);
                Ok(Injected::Checked(checked))
            }
            "radio" => {
                let wanted = value.trim();
                let matches = !wanted.is_empty()
                    && (doc.attr(node, "value") == Some(wanted)
                        || doc.attr(node, "id").is_some_and(|id| id.contains(wanted)));
                if !matches {
                    return Err(InjectError::ValueRejected("radio value mismatch".into()));
                }
                doc.set_checked(node, true);
                Ok(Injected::Checked(true))
            }
            "date" => {
                let date = normalize_date(value);
                doc.set_value(node, &date);
                Ok(Injected::Value(date))
            }
            _ => {
                doc.set_value(node, value);
                Ok(Injected::Value(value.to_string()))
            }
        }
    }

    /// Document content is never written as a native value. A review panel is
    /// attached next to the element and the content kept in its dataset.
    fn attach_document(&self, doc: &mut Document, node: NodeId, command: &FillCommand) -> Injected {
        let title = if command.label.trim().is_empty() {
            "Document"
        } else {
            command.label.trim()
        };
        if !doc.attach_affordance(node, title, &command.value) {
            debug!(key = %command.field_key, "container already holds a document panel");
        }
        doc.set_data(node, DOCUMENT_CONTENT_KEY, &command.value);
        doc.set_data(node, DOCUMENT_READY_KEY, "true");
        self.mark(doc, node, HighlightKind::Document);
        Injected::Document
    }

    fn mark(&self, doc: &mut Document, node: NodeId, kind: HighlightKind) {
        if self.highlight {
            doc.highlight(node, kind);
        }
    }
}

/// Exact option value or text first, then a case-insensitive substring of either.
fn fill_select(doc: &mut Document, node: NodeId, value: &str) -> InjectResult {
    let options = doc.options(node);
    let needle = value.to_lowercase();
    let chosen = options
        .iter()
        .find(|o| o.value == value || o.text == value)
        .or_else(|| {
            options.iter().find(|o| {
                o.text.to_lowercase().contains(&needle) || o.value.to_lowercase().contains(&needle)
            })
        })
        .map(|o| o.value.clone());

    match chosen {
        Some(option_value) => {
            doc.set_value(node, &option_value);
            Ok(Injected::Value(option_value))
        }
        None => Err(InjectError::ValueRejected("option not found in select".into())),
    }
}

/// `input`, `change`, `blur`, then the native setter and a second `input`
/// so framework-managed controls pick up the write.
pub fn trigger_events(doc: &mut Document, node: NodeId) {
    for kind in [EventKind::Input, EventKind::Change, EventKind::Blur] {
        doc.dispatch(node, kind);
    }
    let current = doc.value(node);
    doc.set_value(node, &current);
    doc.dispatch(node, EventKind::NativeValueSet);
    doc.dispatch(node, EventKind::Input);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affirmative_values() {
        assert!(is_affirmative("Yes"));
        assert!(is_affirmative(" TRUE "));
        assert!(is_affirmative("1"));
        assert!(!is_affirmative("no"));
        assert!(!is_affirmative(""));
    }
}
