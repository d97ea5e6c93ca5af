use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dom::{Document, NodeId};
use crate::error::AutofillError;

/// One level of a positional path: a tag and its 1-based rank among
/// same-tag element siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathStep {
    pub tag: String,
    pub index: usize,
}

/// Structural identity of a discovered field.
///
/// `Id` is used when the element carries an `id` that is unique in the
/// document. Otherwise `Path` records the ancestor chain from the root,
/// which survives attribute and class churn but not sibling reordering or
/// tag changes. Two structurally identical sibling forms produce distinct
/// paths only through the rank of their containers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Locator {
    Id(String),
    Path(Vec<PathStep>),
}

impl Locator {
    /// Locator for an element: its unique id if it has one, else its path.
    pub fn for_element(doc: &Document, node: NodeId) -> Option<Locator> {
        if let Some(id) = doc.non_empty_attr(node, "id") {
            if doc.count_with_attr("id", id) == 1 {
                return Some(Locator::Id(id.to_string()));
            }
        }
        Self::path_of(doc, node)
    }

    /// Positional path from the root element down to `node`.
    pub fn path_of(doc: &Document, node: NodeId) -> Option<Locator> {
        if node.0 >= doc.len() {
            return None;
        }

        let mut steps = Vec::new();
        let mut current = Some(node);
        while let Some(el) = current {
            let tag = doc.tag(el);
            if tag.is_empty() {
                return None;
            }
            let rank = doc
                .siblings(el)
                .iter()
                .take_while(|s| **s != el)
                .filter(|s| doc.tag(**s) == tag)
                .count()
                + 1;
            steps.push(PathStep {
                tag: tag.to_string(),
                index: rank,
            });
            current = doc.parent(el);
        }
        steps.reverse();
        Some(Locator::Path(steps))
    }

    /// Find the element this locator names in `doc`.
    pub fn resolve(&self, doc: &Document) -> Option<NodeId> {
        match self {
            Locator::Id(id) => doc.find_by_id(id),
            Locator::Path(steps) => {
                let (first, rest) = steps.split_first()?;
                let root = doc.root()?;
                if doc.tag(root) != first.tag || first.index != 1 {
                    return None;
                }
                rest.iter().try_fold(root, |parent, step| {
                    doc.children(parent)
                        .iter()
                        .filter(|c| doc.tag(**c) == step.tag)
                        .nth(step.index.checked_sub(1)?)
                        .copied()
                })
            }
        }
    }

    pub fn is_positional(&self) -> bool {
        matches!(self, Locator::Path(_))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(id) if id.contains('"') => write!(f, "//*[@id='{}']", id),
            Locator::Id(id) => write!(f, "//*[@id=\"{}\"]", id),
            Locator::Path(steps) => {
                for step in steps {
                    write!(f, "/{}[{}]", step.tag, step.index)?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for Locator {
    type Err = AutofillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| AutofillError::InvalidLocator {
            locator: s.to_string(),
            reason: reason.to_string(),
        };
        let trimmed = s.trim();

        if let Some(rest) = trimmed.strip_prefix("//*[@id=") {
            let inner = rest.strip_suffix(']').ok_or_else(|| invalid("unterminated id predicate"))?;
            let id = inner
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| inner.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .ok_or_else(|| invalid("id value must be quoted"))?;
            if id.is_empty() {
                return Err(invalid("empty id"));
            }
            return Ok(Locator::Id(id.to_string()));
        }

        let body = trimmed
            .strip_prefix('/')
            .ok_or_else(|| invalid("expected an absolute path or id predicate"))?;

        let steps = body
            .split('/')
            .map(|part| parse_step(part).ok_or_else(|| invalid(&format!("bad step '{}'", part))))
            .collect::<Result<Vec<_>, _>>()?;

        if steps.is_empty() {
            return Err(invalid("empty path"));
        }
        Ok(Locator::Path(steps))
    }
}

fn parse_step(part: &str) -> Option<PathStep> {
    let (tag, index) = match part.find('[') {
        Some(open) => {
            let digits = part[open + 1..].strip_suffix(']')?;
            (&part[..open], digits.parse::<usize>().ok()?)
        }
        None => (part, 1),
    };
    let valid_tag = !tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if !valid_tag || index == 0 {
        return None;
    }
    Some(PathStep {
        tag: tag.to_ascii_lowercase(),
        index,
    })
}

impl TryFrom<String> for Locator {
    type Error = AutofillError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Locator> for String {
    fn from(locator: Locator) -> Self {
        locator.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_display_and_parse_agree() {
        let text = "/html[1]/body[1]/form[2]/input[3]";
        let locator: Locator = text.parse().unwrap();
        assert!(locator.is_positional());
        assert_eq!(locator.to_string(), text);
    }

    #[test]
    fn id_predicate_parses_both_quote_styles() {
        assert_eq!(
            "//*[@id=\"email\"]".parse::<Locator>().unwrap(),
            Locator::Id("email".into())
        );
        assert_eq!(
            "//*[@id='email']".parse::<Locator>().unwrap(),
            Locator::Id("email".into())
        );
    }

    #[test]
    fn malformed_locators_are_rejected() {
        assert!("input[2]".parse::<Locator>().is_err());
        assert!("/html[0]".parse::<Locator>().is_err());
        assert!("/html[1]/bo dy[1]".parse::<Locator>().is_err());
        assert!("//*[@id=email]".parse::<Locator>().is_err());
    }
}
