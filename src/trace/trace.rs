use serde::Serialize;

use crate::orchestrator::outcome_model::FillStatus;
use crate::resolve::engine::{Attempt, Resolution};

/// One line of the run trace: what happened to one command.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub step: u64,

    pub field_key: String,

    /// Strategy index that resolved the element, 0 being the primary locator.
    pub strategy: Option<usize>,
    pub attempts: Vec<Attempt>,

    pub status: Option<FillStatus>,
    pub reason: Option<String>,
}

impl TraceEvent {
    pub fn now(step: u64, field_key: &str) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            step,
            field_key: field_key.to_string(),
            strategy: None,
            attempts: vec![],
            status: None,
            reason: None,
        }
    }

    pub fn with_resolution(mut self, resolution: &Resolution) -> Self {
        self.strategy = resolution.strategy();
        self.attempts = resolution.attempts.clone();
        self
    }

    pub fn with_status(mut self, status: FillStatus, reason: Option<&str>) -> Self {
        self.status = Some(status);
        self.reason = reason.map(str::to_string);
        self
    }
}
