use std::collections::HashMap;
use std::ops::Range;
use std::thread;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::AutofillError;
use crate::mapping::backend::{MappingBackend, MappingError};
use crate::mapping::mapping_model::{
    MappingOutcome, MappingRequest, MappingResponse, MappingResult, MissingField,
};
use crate::scan::scan_model::{CanonicalField, field_map};

pub const DEFAULT_THRESHOLD: usize = 10;
pub const DEFAULT_CHUNK_SIZE: usize = 10;
pub const DEFAULT_CHUNK_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Field sets up to this size go out in a single call.
    pub threshold: usize,
    /// Chunk size above the threshold. Clamped to `1..=threshold`.
    pub chunk_size: usize,
    /// Pause between consecutive chunk calls.
    pub chunk_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_delay: DEFAULT_CHUNK_DELAY,
        }
    }
}

/// Ordered index ranges of the calls needed for `count` fields.
pub fn plan_chunks(count: usize, config: &BatchConfig) -> Vec<Range<usize>> {
    if count == 0 {
        return Vec::new();
    }
    let threshold = config.threshold.max(1);
    if count <= threshold {
        return vec![0..count];
    }
    let size = config.chunk_size.clamp(1, threshold);
    (0..count)
        .step_by(size)
        .map(|start| start..(start + size).min(count))
        .collect()
}

/// Drives the mapping collaborator over a field set, one chunk at a time.
pub struct MappingBatcher<'a> {
    backend: &'a dyn MappingBackend,
    config: BatchConfig,
}

impl<'a> MappingBatcher<'a> {
    pub fn new(backend: &'a dyn MappingBackend, config: BatchConfig) -> Self {
        Self { backend, config }
    }

    /// Map every field. A failing chunk turns its fields into missing
    /// entries and the remaining chunks still run. Only when every chunk
    /// fails is the collaborator considered unavailable.
    pub fn map(&self, fields: &[CanonicalField], dataset: &Value) -> Result<MappingOutcome, AutofillError> {
        let chunks = plan_chunks(fields.len(), &self.config);
        let total = chunks.len();
        let mut outcome = MappingOutcome {
            chunked: total > 1,
            total_chunks: total,
            ..MappingOutcome::default()
        };
        let mut last_error = None;

        if outcome.chunked {
            info!(fields = fields.len(), chunks = total, "large form, mapping in chunks");
        }

        for (i, range) in chunks.into_iter().enumerate() {
            let chunk = &fields[range];
            let request = MappingRequest {
                fields: field_map(chunk),
                dataset: dataset.clone(),
            };

            debug!(chunk = i + 1, of = total, fields = chunk.len(), "mapping chunk");
            match self.backend.map_fields(&request).and_then(reject_reported_error) {
                Ok(response) => {
                    let before = outcome.mapped.len();
                    reconcile(chunk, response, &mut outcome);
                    outcome.successful_chunks += 1;
                    info!(
                        chunk = i + 1,
                        of = total,
                        mapped = outcome.mapped.len() - before,
                        "chunk mapped"
                    );
                }
                Err(err) => {
                    warn!(chunk = i + 1, of = total, error = %err, "chunk failed, fields marked missing");
                    let reason = format!("mapping chunk {}/{} failed: {}", i + 1, total, err);
                    outcome.missing.extend(chunk.iter().map(|f| MissingField {
                        field_key: f.field_key.clone(),
                        label: f.label.clone(),
                        reason: reason.clone(),
                    }));
                    last_error = Some(err.to_string());
                }
            }

            if i + 1 < total && !self.config.chunk_delay.is_zero() {
                thread::sleep(self.config.chunk_delay);
            }
        }

        if total > 0 && outcome.successful_chunks == 0 {
            return Err(AutofillError::MappingUnavailable(
                last_error.unwrap_or_else(|| "every mapping chunk failed".into()),
            ));
        }

        info!(
            mapped = outcome.mapped.len(),
            missing = outcome.missing.len(),
            successful_chunks = outcome.successful_chunks,
            total_chunks = total,
            "mapping complete"
        );
        Ok(outcome)
    }
}

/// A response that carries an `error` and maps nothing is a failed chunk.
fn reject_reported_error(response: MappingResponse) -> Result<MappingResponse, MappingError> {
    match response.error {
        Some(err) if response.mapped_fields.is_empty() => Err(MappingError::Rejected(err)),
        _ => Ok(response),
    }
}

/// Fold one chunk's response into the outcome, in the chunk's field order.
///
/// Every field of the chunk lands in exactly one of mapped or missing.
fn reconcile(chunk: &[CanonicalField], response: MappingResponse, outcome: &mut MappingOutcome) {
    let mut by_key: HashMap<String, MappingResult> = HashMap::new();
    for result in response.mapped_fields {
        if !chunk.iter().any(|f| f.field_key == result.field_key) {
            debug!(key = %result.field_key, "dropping result for a field outside this chunk");
            continue;
        }
        by_key.entry(result.field_key.clone()).or_insert(result);
    }

    for field in chunk {
        let reported = response.missing_fields.iter().find(|m| {
            m.field_key.as_deref() == Some(field.field_key.as_str())
                || (!m.label.is_empty() && m.label.eq_ignore_ascii_case(&field.label))
        });
        let reported_reason = reported
            .map(|m| m.reason.clone())
            .filter(|r| !r.is_empty());

        match by_key.remove(&field.field_key) {
            Some(result) if result.value.is_some() => outcome.mapped.push(result),
            Some(_) => outcome.missing.push(MissingField {
                field_key: field.field_key.clone(),
                label: field.label.clone(),
                reason: reported_reason.unwrap_or_else(|| "no value supplied".into()),
            }),
            None => outcome.missing.push(MissingField {
                field_key: field.field_key.clone(),
                label: field.label.clone(),
                reason: reported_reason.unwrap_or_else(|| "absent from mapping response".into()),
            }),
        }
    }
}
