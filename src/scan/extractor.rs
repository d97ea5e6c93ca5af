use tracing::{debug, warn};

use crate::dom::{Document, NodeId};
use crate::scan::locator::Locator;
use crate::scan::scan_model::{ExtractionGap, FieldRecord, ScanOutcome};

/// Walk the document and emit one `FieldRecord` per `input`, `select` and
/// `textarea`, in document order.
///
/// Read-only: the document is not touched. Elements without a derivable
/// locator are reported as gaps and skipped.
pub fn extract_fields(doc: &Document) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();

    for node in doc.form_controls() {
        let Some(locator) = Locator::for_element(doc, node) else {
            warn!(element = %doc.describe(node), "no derivable locator, skipping");
            outcome.gaps.push(ExtractionGap {
                node,
                tag: doc.tag(node).to_string(),
                reason: "no identifying attribute and no derivable position".into(),
            });
            continue;
        };

        let raw_id = attr_or_empty(doc, node, "id");
        let record = FieldRecord {
            tag: doc.tag(node).to_string(),
            input_type: doc.control_type(node),
            associated_label_text: label_for(doc, &raw_id),
            raw_name: attr_or_empty(doc, node, "name"),
            placeholder: attr_or_empty(doc, node, "placeholder"),
            aria_label: attr_or_empty(doc, node, "aria-label"),
            title: attr_or_empty(doc, node, "title"),
            raw_id,
            locator,
        };

        debug!(
            tag = %record.tag,
            kind = %record.input_type,
            locator = %record.locator,
            "extracted field"
        );
        outcome.records.push(record);
    }

    outcome
}

fn attr_or_empty(doc: &Document, node: NodeId, name: &str) -> String {
    doc.attr(node, name).map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Text of the first `<label for="...">` that references `id`.
fn label_for(doc: &Document, id: &str) -> String {
    if id.is_empty() {
        return String::new();
    }
    doc.elements_by_tag(&["label"])
        .find(|label| doc.attr(*label, "for") == Some(id))
        .map(|label| doc.inner_text(label))
        .unwrap_or_default()
}
