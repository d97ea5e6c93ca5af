use std::collections::{BTreeMap, HashMap};

use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};

use super::events::{Affordance, ControlSnapshot, DomEvent, EventKind, Highlight, HighlightKind};

/// Handle to one element of a parsed `Document`.
///
/// Handles are positions in document order and stay valid for the lifetime
/// of the document they came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
struct ElementNode {
    tag: String,
    attrs: Vec<(String, String)>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Own text runs and child elements, in source order.
    content: Vec<Content>,
}

#[derive(Debug, Clone)]
enum Content {
    Text(String),
    Element(NodeId),
}

/// Mutable control state layered over the parsed markup.
#[derive(Debug, Clone, Default)]
struct LiveState {
    value: Option<String>,
    checked: Option<bool>,
    dataset: BTreeMap<String, String>,
}

/// Returned when a CSS selector string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSelector {
    pub selector: String,
    pub reason: String,
}

/// One `<option>` of a select control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
}

/// A parsed HTML page plus the live state the injector writes into it.
///
/// Element structure is immutable after parsing. Values, checked flags,
/// dataset entries, dispatched events, highlights and inline affordances
/// live in an overlay, and only the injector writes to it.
#[derive(Debug)]
pub struct Document {
    html: Html,
    nodes: Vec<ElementNode>,
    live: HashMap<NodeId, LiveState>,
    events: Vec<DomEvent>,
    highlights: Vec<Highlight>,
    affordances: Vec<Affordance>,
}

pub const FORM_CONTROL_TAGS: [&str; 3] = ["input", "select", "textarea"];

impl Document {
    pub fn parse(source: &str) -> Self {
        let html = Html::parse_document(source);
        let nodes = collect_elements(html.root_element());

        Document {
            html,
            nodes,
            live: HashMap::new(),
            events: Vec::new(),
            highlights: Vec::new(),
            affordances: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// The root (`html`) element.
    pub fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() { None } else { Some(NodeId(0)) }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Elements whose tag is one of `tags`, in document order.
    pub fn elements_by_tag<'a>(&'a self, tags: &'a [&'a str]) -> impl Iterator<Item = NodeId> + 'a {
        self.elements().filter(move |id| tags.contains(&self.tag(*id)))
    }

    /// `input`, `select` and `textarea` elements in document order.
    pub fn form_controls(&self) -> Vec<NodeId> {
        self.elements_by_tag(&FORM_CONTROL_TAGS).collect()
    }

    pub fn tag(&self, id: NodeId) -> &str {
        self.nodes.get(id.0).map(|n| n.tag.as_str()).unwrap_or("")
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes.get(id.0).and_then(|n| {
            n.attrs
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        })
    }

    /// Attribute value, treating an empty string as absent.
    pub fn non_empty_attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attr(id, name).filter(|v| !v.trim().is_empty())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.0).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Raw text content of the element and its descendants.
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack: Vec<&Content> = self.content(id).iter().rev().collect();
        while let Some(next) = stack.pop() {
            match next {
                Content::Text(t) => out.push_str(t),
                Content::Element(child) => stack.extend(self.content(*child).iter().rev()),
            }
        }
        out
    }

    fn content(&self, id: NodeId) -> &[Content] {
        self.nodes.get(id.0).map(|n| n.content.as_slice()).unwrap_or(&[])
    }

    /// Text content with runs of whitespace collapsed, as a browser renders it.
    pub fn inner_text(&self, id: NodeId) -> String {
        collapse_whitespace(&self.text(id))
    }

    /// Descendant elements in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Element siblings that follow `id` under the same parent.
    pub fn following_siblings(&self, id: NodeId) -> Vec<NodeId> {
        match self.parent(id) {
            Some(parent) => self
                .children(parent)
                .iter()
                .skip_while(|c| **c != id)
                .skip(1)
                .copied()
                .collect(),
            None => Vec::new(),
        }
    }

    /// Element siblings sharing `id`'s parent, including `id` itself.
    pub fn siblings(&self, id: NodeId) -> &[NodeId] {
        match self.parent(id) {
            Some(parent) => self.children(parent),
            None => &[],
        }
    }

    pub fn is_form_control(&self, id: NodeId) -> bool {
        FORM_CONTROL_TAGS.contains(&self.tag(id))
    }

    /// The control kind the element reports, mirroring the DOM `type` property.
    pub fn control_type(&self, id: NodeId) -> String {
        match self.tag(id) {
            "input" => self
                .non_empty_attr(id, "type")
                .map(|t| t.trim().to_lowercase())
                .unwrap_or_else(|| "text".to_string()),
            "select" => {
                if self.attr(id, "multiple").is_some() {
                    "select-multiple".to_string()
                } else {
                    "select-one".to_string()
                }
            }
            "textarea" => "textarea".to_string(),
            other => other.to_string(),
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// First element whose `id` attribute equals `value`.
    pub fn find_by_id(&self, value: &str) -> Option<NodeId> {
        self.elements().find(|id| self.attr(*id, "id") == Some(value))
    }

    /// Number of elements carrying `name="value"`.
    pub fn count_with_attr(&self, name: &str, value: &str) -> usize {
        self.elements()
            .filter(|id| self.attr(*id, name) == Some(value))
            .count()
    }

    /// First element in document order matching a CSS selector.
    pub fn select_first(&self, selector: &str) -> Result<Option<NodeId>, InvalidSelector> {
        let parsed = Selector::parse(selector).map_err(|e| InvalidSelector {
            selector: selector.to_string(),
            reason: e.to_string(),
        })?;

        // Same pre-order walk as `collect_elements`, so positions line up.
        let hit = self
            .html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .position(|el| parsed.matches(&el));

        Ok(hit.map(NodeId))
    }

    /// Short human description used in logs, e.g. `input#email[name=email]`.
    pub fn describe(&self, id: NodeId) -> String {
        let mut out = self.tag(id).to_string();
        if let Some(v) = self.non_empty_attr(id, "id") {
            out.push('#');
            out.push_str(v);
        }
        if let Some(v) = self.non_empty_attr(id, "name") {
            out.push_str(&format!("[name={}]", v));
        }
        out
    }

    // ------------------------------------------------------------------
    // Control state
    // ------------------------------------------------------------------

    /// Current value of a control.
    pub fn value(&self, id: NodeId) -> String {
        if let Some(v) = self.live.get(&id).and_then(|s| s.value.clone()) {
            return v;
        }
        match self.tag(id) {
            "textarea" => self.text(id),
            "select" => {
                let options = self.option_nodes(id);
                options
                    .iter()
                    .find(|o| self.attr(**o, "selected").is_some())
                    .or(options.first())
                    .map(|o| self.option_value(*o))
                    .unwrap_or_default()
            }
            _ => self.attr(id, "value").unwrap_or_default().to_string(),
        }
    }

    pub fn set_value(&mut self, id: NodeId, value: &str) {
        self.live.entry(id).or_default().value = Some(value.to_string());
    }

    pub fn checked(&self, id: NodeId) -> bool {
        self.live
            .get(&id)
            .and_then(|s| s.checked)
            .unwrap_or_else(|| self.attr(id, "checked").is_some())
    }

    /// Set the checked flag. Checking a radio unchecks the rest of its group.
    pub fn set_checked(&mut self, id: NodeId, checked: bool) {
        if checked && self.control_type(id) == "radio" {
            if let Some(group) = self.non_empty_attr(id, "name").map(str::to_string) {
                let peers: Vec<NodeId> = self
                    .elements_by_tag(&["input"])
                    .filter(|peer| {
                        *peer != id
                            && self.control_type(*peer) == "radio"
                            && self.attr(*peer, "name") == Some(group.as_str())
                    })
                    .collect();
                for peer in peers {
                    self.live.entry(peer).or_default().checked = Some(false);
                }
            }
        }
        self.live.entry(id).or_default().checked = Some(checked);
    }

    /// Options of a select control in document order.
    pub fn options(&self, id: NodeId) -> Vec<SelectOption> {
        self.option_nodes(id)
            .into_iter()
            .map(|o| SelectOption {
                value: self.option_value(o),
                text: self.inner_text(o),
            })
            .collect()
    }

    fn option_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|d| self.tag(*d) == "option")
            .collect()
    }

    fn option_value(&self, option: NodeId) -> String {
        // An option without a value attribute submits its text.
        self.attr(option, "value")
            .map(str::to_string)
            .unwrap_or_else(|| self.inner_text(option))
    }

    /// Dataset entry (`data-<key>`), live writes taking precedence over markup.
    pub fn data(&self, id: NodeId, key: &str) -> Option<String> {
        self.live
            .get(&id)
            .and_then(|s| s.dataset.get(key).cloned())
            .or_else(|| self.attr(id, &format!("data-{}", key)).map(str::to_string))
    }

    pub fn set_data(&mut self, id: NodeId, key: &str, value: &str) {
        self.live
            .entry(id)
            .or_default()
            .dataset
            .insert(key.to_string(), value.to_string());
    }

    // ------------------------------------------------------------------
    // Events, highlights, affordances
    // ------------------------------------------------------------------

    pub fn dispatch(&mut self, target: NodeId, kind: EventKind) {
        self.events.push(DomEvent {
            target,
            kind,
            bubbles: true,
        });
    }

    pub fn events(&self) -> &[DomEvent] {
        &self.events
    }

    /// Event kinds dispatched on `target`, in order.
    pub fn events_for(&self, target: NodeId) -> Vec<EventKind> {
        self.events
            .iter()
            .filter(|e| e.target == target)
            .map(|e| e.kind.clone())
            .collect()
    }

    pub fn highlight(&mut self, target: NodeId, kind: HighlightKind) {
        self.highlights.push(Highlight {
            target,
            kind,
            reverted: false,
        });
    }

    /// Restore the original background of every highlighted control.
    pub fn revert_highlights(&mut self) {
        for h in &mut self.highlights {
            h.reverted = true;
        }
    }

    pub fn highlights(&self) -> &[Highlight] {
        &self.highlights
    }

    /// Attach an inline affordance next to its anchor.
    ///
    /// Returns `false` when the anchor's parent already holds one.
    pub fn attach_affordance(&mut self, anchor: NodeId, title: &str, content: &str) -> bool {
        let container = self.parent(anchor);
        if container.is_some() && self.affordances.iter().any(|a| a.container == container) {
            return false;
        }
        self.affordances.push(Affordance {
            anchor,
            container,
            title: title.to_string(),
            content: content.to_string(),
        });
        true
    }

    pub fn affordances(&self) -> &[Affordance] {
        &self.affordances
    }

    /// Current state of every form control.
    pub fn snapshot(&self) -> Vec<ControlSnapshot> {
        self.form_controls()
            .into_iter()
            .map(|id| {
                let control_type = self.control_type(id);
                let checked = matches!(control_type.as_str(), "checkbox" | "radio")
                    .then(|| self.checked(id));
                ControlSnapshot {
                    node: id,
                    tag: self.tag(id).to_string(),
                    control_type,
                    id: self.non_empty_attr(id, "id").map(str::to_string),
                    name: self.non_empty_attr(id, "name").map(str::to_string),
                    value: self.value(id),
                    checked,
                }
            })
            .collect()
    }
}

/// Pre-order walk that flattens the parsed tree into an element arena.
///
/// Uses an explicit stack so nesting depth is bounded by memory, not by the
/// call stack. A child's slot in its parent's content is reserved when the
/// parent is visited and filled in once the child gets its id.
fn collect_elements(root: ElementRef<'_>) -> Vec<ElementNode> {
    let mut nodes: Vec<ElementNode> = Vec::new();
    let mut stack: Vec<(ElementRef<'_>, Option<(NodeId, usize)>)> = vec![(root, None)];

    while let Some((el, slot)) = stack.pop() {
        let id = NodeId(nodes.len());
        if let Some((parent, index)) = slot {
            nodes[parent.0].children.push(id);
            nodes[parent.0].content[index] = Content::Element(id);
        }

        let mut content = Vec::new();
        let mut pending = Vec::new();
        for child in el.children() {
            match child.value() {
                Node::Text(text) => content.push(Content::Text(String::from(&**text))),
                Node::Element(_) => {
                    if let Some(child_el) = ElementRef::wrap(child) {
                        pending.push((child_el, Some((id, content.len()))));
                        content.push(Content::Element(id));
                    }
                }
                _ => {}
            }
        }

        let value = el.value();
        nodes.push(ElementNode {
            tag: value.name().to_lowercase(),
            attrs: value
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            parent: slot.map(|(p, _)| p),
            children: Vec::new(),
            content,
        });

        // Reversed so the first child is visited next, keeping document order.
        stack.extend(pending.into_iter().rev());
    }
    nodes
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
