use serde::{Deserialize, Serialize};

use crate::command::command_model::{CommandEnvelope, CommandMetadata, FillCommand};
use crate::mapping::mapping_model::MissingField;
use crate::scan::scan_model::ExtractionGap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillStatus {
    Filled,
    Skipped,
    Failed,
}

/// What happened to one command. `reason` is present iff not filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillOutcome {
    pub field_key: String,
    pub status: FillStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl FillOutcome {
    pub fn filled(field_key: &str) -> Self {
        Self {
            field_key: field_key.to_string(),
            status: FillStatus::Filled,
            reason: None,
        }
    }

    pub fn skipped(field_key: &str, reason: impl Into<String>) -> Self {
        Self {
            field_key: field_key.to_string(),
            status: FillStatus::Skipped,
            reason: Some(reason.into()),
        }
    }

    pub fn failed(field_key: &str, reason: impl Into<String>) -> Self {
        Self {
            field_key: field_key.to_string(),
            status: FillStatus::Failed,
            reason: Some(reason.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Warning,
}

/// The single user-facing message shown when a pass ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

/// Account of one injection pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total: usize,
    pub filled: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outcomes: Vec<FillOutcome>,
    pub notification: Notification,
}

impl RunSummary {
    pub fn from_outcomes(outcomes: Vec<FillOutcome>) -> Self {
        let count = |status| outcomes.iter().filter(|o| o.status == status).count();
        let filled = count(FillStatus::Filled);
        let skipped = count(FillStatus::Skipped);
        let failed = count(FillStatus::Failed);
        let unfilled = skipped + failed;

        let notification = if unfilled > 0 {
            Notification {
                message: format!("Filled {} fields, {} failed", filled, unfilled),
                level: NotificationLevel::Warning,
            }
        } else {
            Notification {
                message: format!("Successfully filled {} fields", filled),
                level: NotificationLevel::Success,
            }
        };

        Self {
            total: outcomes.len(),
            filled,
            skipped,
            failed,
            outcomes,
            notification,
        }
    }
}

// ============================================================================
// Injection trigger wire shape
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectionRequest {
    pub commands: Vec<FillCommand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CommandMetadata>,
}

impl From<CommandEnvelope> for InjectionRequest {
    fn from(envelope: CommandEnvelope) -> Self {
        Self {
            commands: envelope.commands,
            metadata: Some(envelope.metadata),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectionResponse {
    pub success: bool,
    pub success_count: usize,
    pub fail_count: usize,
    pub results: Vec<FillOutcome>,
}

impl From<RunSummary> for InjectionResponse {
    fn from(summary: RunSummary) -> Self {
        Self {
            success: true,
            success_count: summary.filled,
            fail_count: summary.skipped + summary.failed,
            results: summary.outcomes,
        }
    }
}

// ============================================================================
// End-to-end report
// ============================================================================

/// Every discovered field ends up filled, skipped, failed or missing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub fields_discovered: usize,
    pub gaps: Vec<ExtractionGap>,
    pub total_chunks: usize,
    pub successful_chunks: usize,
    pub commands: Vec<FillCommand>,
    pub missing: Vec<MissingField>,
    pub summary: RunSummary,
}

impl PipelineReport {
    /// Fields with a final disposition. Equals `fields_discovered` for a complete run.
    pub fn accounted_fields(&self) -> usize {
        self.summary.total + self.missing.len()
    }
}
