use crate::command::command_model::Criterion;
use crate::dom::document::InvalidSelector;
use crate::dom::{Document, NodeId};
use crate::scan::locator::Locator;

/// Hit, miss, or a selector the query engine rejects.
pub type StrategyResult = Result<Option<NodeId>, InvalidSelector>;

/// Following siblings inspected after a matching label.
const LABEL_SIBLING_WINDOW: usize = 3;

pub fn by_locator(locator: &Locator, doc: &Document) -> StrategyResult {
    Ok(locator.resolve(doc))
}

pub fn by_criterion(criterion: &Criterion, doc: &Document) -> StrategyResult {
    match criterion {
        Criterion::Selector { selector } => doc.select_first(selector),
        Criterion::Id { id } => Ok(doc.find_by_id(id)),
        Criterion::Name { name } => Ok(first_control(doc, |n| doc.attr(n, "name") == Some(name.as_str()))),
        Criterion::AttributeEquals { attribute, value } => Ok(first_control(doc, |n| {
            doc.attr(n, attribute).map(str::trim) == Some(value.trim())
        })),
        Criterion::LabelText { label } => Ok(by_label_text(label, doc)),
    }
}

fn first_control(doc: &Document, pred: impl Fn(NodeId) -> bool) -> Option<NodeId> {
    doc.form_controls().into_iter().find(|n| pred(*n))
}

/// Fuzzy label search, most specific first:
/// 1. a `<label>` whose text overlaps the label: its `for` target, a control
///    inside it, or a control among the next few siblings;
/// 2. a control whose `name` contains the label with whitespace stripped;
/// 3. a control whose placeholder overlaps the label.
///
/// All comparisons are case-insensitive and ignore whitespace.
pub fn by_label_text(label: &str, doc: &Document) -> Option<NodeId> {
    let needle = squash(&clean_label(label));
    if needle.is_empty() {
        return None;
    }

    for label_node in doc.elements_by_tag(&["label"]) {
        let text = squash(&clean_label(&doc.inner_text(label_node)));
        if !overlaps(&text, &needle) {
            continue;
        }
        if let Some(found) = control_for_label(doc, label_node) {
            return Some(found);
        }
    }

    if let Some(found) = first_control(doc, |n| {
        doc.non_empty_attr(n, "name")
            .is_some_and(|name| squash(name).contains(&needle))
    }) {
        return Some(found);
    }

    first_control(doc, |n| {
        doc.non_empty_attr(n, "placeholder")
            .is_some_and(|p| overlaps(&squash(p), &needle))
    })
}

fn control_for_label(doc: &Document, label_node: NodeId) -> Option<NodeId> {
    if let Some(target) = doc.non_empty_attr(label_node, "for").and_then(|f| doc.find_by_id(f)) {
        return Some(target);
    }

    if let Some(inner) = first_control_within(doc, label_node) {
        return Some(inner);
    }

    doc.following_siblings(label_node)
        .into_iter()
        .take(LABEL_SIBLING_WINDOW)
        .find_map(|sibling| {
            if doc.is_form_control(sibling) {
                Some(sibling)
            } else {
                first_control_within(doc, sibling)
            }
        })
}

fn first_control_within(doc: &Document, node: NodeId) -> Option<NodeId> {
    doc.descendants(node).into_iter().find(|d| doc.is_form_control(*d))
}

fn overlaps(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

/// Drop "(required)" markers and trailing `*` / `:` decorations.
pub fn clean_label(label: &str) -> String {
    let lower = label.to_ascii_lowercase();
    let without = match lower.find("(required)") {
        Some(pos) => {
            let mut s = label.to_string();
            s.replace_range(pos..pos + "(required)".len(), "");
            s
        }
        None => label.to_string(),
    };
    without
        .trim()
        .trim_end_matches(|c: char| c == '*' || c == ':' || c.is_whitespace())
        .to_string()
}

/// Lowercase with all whitespace removed.
fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_markers_are_stripped() {
        assert_eq!(clean_label("Email (Required)"), "Email");
        assert_eq!(clean_label("Full name *"), "Full name");
        assert_eq!(clean_label("Phone:"), "Phone");
    }

    #[test]
    fn squash_removes_whitespace_and_case() {
        assert_eq!(squash(" Date of  Birth "), "dateofbirth");
    }
}
