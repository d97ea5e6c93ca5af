use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::command::command_model::FillCommand;
use crate::dom::Document;
use crate::error::AutofillError;
use crate::inject::Injector;
use crate::orchestrator::outcome_model::{
    FillOutcome, InjectionRequest, InjectionResponse, RunSummary,
};
use crate::resolve::resolve;
use crate::trace::{TraceEvent, TraceLogger};

pub const DEFAULT_COMMAND_PAUSE: Duration = Duration::from_millis(100);
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(200);

/// Timing of an injection pass.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    /// Pause between consecutive commands.
    pub command_pause: Duration,
    /// Pause after an element is resolved, before it is written.
    pub settle: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            command_pause: DEFAULT_COMMAND_PAUSE,
            settle: DEFAULT_SETTLE,
        }
    }
}

impl Pacing {
    pub fn immediate() -> Self {
        Self {
            command_pause: Duration::ZERO,
            settle: Duration::ZERO,
        }
    }
}

/// The injection side of one document load.
///
/// Owns the document and the "already injected" flag. A fresh host is made
/// for every load, so the flag never outlives the page it guards.
pub struct InjectionHost {
    doc: Document,
    injected: bool,
    injector: Injector,
    pacing: Pacing,
    tracer: TraceLogger,
}

impl InjectionHost {
    pub fn new(doc: Document) -> Self {
        Self {
            doc,
            injected: false,
            injector: Injector::default(),
            pacing: Pacing::default(),
            tracer: TraceLogger::disabled(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_injector(mut self, injector: Injector) -> Self {
        self.injector = injector;
        self
    }

    pub fn with_tracer(mut self, tracer: TraceLogger) -> Self {
        self.tracer = tracer;
        self
    }

    /// Mark the host as injected. Refused if this load was already injected.
    pub fn install(&mut self) -> Result<(), AutofillError> {
        if self.injected {
            warn!("autofill already injected, skipping duplicate install");
            return Err(AutofillError::AlreadyInjected);
        }
        self.injected = true;
        debug!("autofill installed");
        Ok(())
    }

    pub fn is_installed(&self) -> bool {
        self.injected
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Apply every command in order, one at a time.
    ///
    /// Each command yields exactly one outcome; nothing aborts the pass.
    pub fn run(&mut self, commands: &[FillCommand]) -> RunSummary {
        info!(commands = commands.len(), "executing autofill");
        let mut outcomes = Vec::with_capacity(commands.len());

        for (step, command) in commands.iter().enumerate() {
            outcomes.push(self.fill_one(step as u64, command));

            if step + 1 < commands.len() && !self.pacing.command_pause.is_zero() {
                thread::sleep(self.pacing.command_pause);
            }
        }

        self.doc.revert_highlights();
        let summary = RunSummary::from_outcomes(outcomes);
        info!(
            total = summary.total,
            filled = summary.filled,
            skipped = summary.skipped,
            failed = summary.failed,
            "{}",
            summary.notification.message
        );
        summary
    }

    /// Handle an injection trigger.
    pub fn execute(&mut self, request: InjectionRequest) -> InjectionResponse {
        if let Some(meta) = &request.metadata {
            debug!(total = meta.total_fields, missing = meta.missing_fields, "injection requested");
        }
        self.run(&request.commands).into()
    }

    fn fill_one(&mut self, step: u64, command: &FillCommand) -> FillOutcome {
        let key = command.field_key.as_str();
        let resolution = resolve(command, &self.doc);
        let event = TraceEvent::now(step, key).with_resolution(&resolution);

        let outcome = match resolution.node() {
            None => {
                let reason = format!(
                    "element not found (tried {} strategies)",
                    resolution.attempts.len()
                );
                warn!(key, %reason, "field skipped");
                FillOutcome::skipped(key, reason)
            }
            Some(node) => {
                if !self.pacing.settle.is_zero() {
                    thread::sleep(self.pacing.settle);
                }
                match self.injector.inject(&mut self.doc, node, command) {
                    Ok(_) => FillOutcome::filled(key),
                    Err(e) => {
                        warn!(key, error = %e, "field failed");
                        FillOutcome::failed(key, e.to_string())
                    }
                }
            }
        };

        self.tracer
            .log(&event.with_status(outcome.status, outcome.reason.as_deref()));
        outcome
    }
}
