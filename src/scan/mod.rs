pub mod classifier;
pub mod extractor;
pub mod locator;
pub mod scan_model;

use tracing::info;

use crate::dom::Document;
use scan_model::{CanonicalField, ScanOutcome};

/// Extract and classify every field of a page.
pub fn scan(doc: &Document) -> (ScanOutcome, Vec<CanonicalField>) {
    let outcome = extractor::extract_fields(doc);
    let fields = classifier::classify(&outcome.records);
    info!(
        fields = fields.len(),
        gaps = outcome.gaps.len(),
        "scan complete"
    );
    (outcome, fields)
}
