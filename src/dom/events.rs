use serde::{Deserialize, Serialize};

use super::document::NodeId;

/// DOM events the injector dispatches on a control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Input,
    Change,
    Blur,
    /// The prototype-level value setter was re-invoked so that framework
    /// wrappers around the `value` property observe the write.
    NativeValueSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomEvent {
    pub target: NodeId,
    pub kind: EventKind,
    pub bubbles: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightKind {
    Success,
    Document,
}

/// Cosmetic highlight applied to a control after a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub target: NodeId,
    pub kind: HighlightKind,
    pub reverted: bool,
}

/// Inline review panel attached next to a document-kind field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Affordance {
    /// The control the affordance belongs to.
    pub anchor: NodeId,
    /// The parent element the panel is appended to.
    pub container: Option<NodeId>,
    pub title: String,
    pub content: String,
}

/// Current state of one form control, for reporting a filled page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlSnapshot {
    pub node: NodeId,
    pub tag: String,
    #[serde(rename = "type")]
    pub control_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
}
