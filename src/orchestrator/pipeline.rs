use std::path::PathBuf;

use serde_json::Value;
use tracing::info;

use crate::command::builder::build_commands;
use crate::command::command_model::CommandEnvelope;
use crate::dom::Document;
use crate::error::Result;
use crate::inject::Injector;
use crate::mapping::backend::MappingBackend;
use crate::mapping::batcher::{BatchConfig, MappingBatcher};
use crate::mapping::mapping_model::MappingOutcome;
use crate::orchestrator::orchestrator::{InjectionHost, Pacing};
use crate::orchestrator::outcome_model::PipelineReport;
use crate::scan::scan;
use crate::scan::scan_model::{CanonicalField, ExtractionGap};
use crate::trace::TraceLogger;

/// Settings threaded through one pipeline run.
#[derive(Debug, Clone)]
pub struct AutofillConfig {
    pub batch: BatchConfig,
    pub pacing: Pacing,
    pub highlight: bool,
    /// JSONL run trace, one line per command.
    pub trace_path: Option<PathBuf>,
}

impl Default for AutofillConfig {
    fn default() -> Self {
        Self {
            batch: BatchConfig::default(),
            pacing: Pacing::default(),
            highlight: true,
            trace_path: None,
        }
    }
}

impl AutofillConfig {
    /// No delays anywhere. Useful for tests and offline runs.
    pub fn immediate() -> Self {
        Self {
            batch: BatchConfig {
                chunk_delay: std::time::Duration::ZERO,
                ..BatchConfig::default()
            },
            pacing: Pacing::immediate(),
            highlight: false,
            trace_path: None,
        }
    }

    /// A host for `doc` with this run's pacing, injector and tracer.
    pub fn host(&self, doc: Document) -> InjectionHost {
        let tracer = match &self.trace_path {
            Some(path) => TraceLogger::new(path),
            None => TraceLogger::disabled(),
        };
        InjectionHost::new(doc)
            .with_pacing(self.pacing)
            .with_injector(Injector::new(self.highlight))
            .with_tracer(tracer)
    }
}

/// Everything known before injection starts.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub fields: Vec<CanonicalField>,
    pub gaps: Vec<ExtractionGap>,
    pub mapping: MappingOutcome,
    pub envelope: CommandEnvelope,
}

/// Scan, map and build commands. Nothing is written to the document.
///
/// Fails with `MappingUnavailable` before any command exists when every
/// mapping chunk failed.
pub fn prepare(
    doc: &Document,
    dataset: &Value,
    backend: &dyn MappingBackend,
    config: &AutofillConfig,
) -> Result<Prepared> {
    let (scanned, fields) = scan(doc);
    let mapping = MappingBatcher::new(backend, config.batch.clone()).map(&fields, dataset)?;
    let commands = build_commands(&fields, &mapping.mapped);
    let envelope = CommandEnvelope::new(commands, mapping.missing.len());

    info!(
        fields = fields.len(),
        commands = envelope.commands.len(),
        missing = mapping.missing.len(),
        "commands ready"
    );
    Ok(Prepared {
        fields,
        gaps: scanned.gaps,
        mapping,
        envelope,
    })
}

/// Run scan, map, build and inject against the host's document.
pub fn run_pipeline(
    host: &mut InjectionHost,
    dataset: &Value,
    backend: &dyn MappingBackend,
    config: &AutofillConfig,
) -> Result<PipelineReport> {
    let prepared = prepare(host.document(), dataset, backend, config)?;
    host.install()?;
    let summary = host.run(&prepared.envelope.commands);

    Ok(PipelineReport {
        fields_discovered: prepared.fields.len(),
        gaps: prepared.gaps,
        total_chunks: prepared.mapping.total_chunks,
        successful_chunks: prepared.mapping.successful_chunks,
        commands: prepared.envelope.commands,
        missing: prepared.mapping.missing,
        summary,
    })
}
