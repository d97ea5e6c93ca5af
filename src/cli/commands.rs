use std::time::Duration;

use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::config::{AppConfig, build_autofill_config, resolve_model_settings};
use crate::command::script::generate_playwright_script;
use crate::dom::Document;
use crate::error::{AutofillError, Result};
use crate::mapping::backend::{HttpMappingBackend, MappingBackend, unwrap_dataset};
use crate::mapping::lookup::DatasetLookupBackend;
use crate::orchestrator::outcome_model::InjectionRequest;
use crate::orchestrator::{prepare, run_pipeline};
use crate::scan::scan;
use crate::scan::scan_model::ScanReport;

/// Model settings from the global CLI flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelArgs<'a> {
    pub endpoint: Option<&'a str>,
    pub model: Option<&'a str>,
}

// ============================================================================
// scan subcommand
// ============================================================================

pub fn cmd_scan(input: &str) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let doc = load_page(input)?;
    let (_, fields) = scan(&doc);
    let report = ScanReport::new(is_url(input).then_some(input), &fields);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

// ============================================================================
// map subcommand
// ============================================================================

pub fn cmd_map(
    input: &str,
    dataset_path: &str,
    backend_name: &str,
    output: Option<&str>,
    model_args: ModelArgs<'_>,
    config: &AppConfig,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let doc = load_page(input)?;
    let dataset = load_dataset(dataset_path)?;
    let backend = build_backend(backend_name, model_args, config)?;

    let prepared = prepare(&doc, &dataset, backend.as_ref(), &build_autofill_config(config))?;
    for missing in &prepared.mapping.missing {
        info!(key = %missing.field_key, reason = %missing.reason, "unmapped field");
    }

    let json = serde_json::to_string_pretty(&prepared.envelope)?;
    write_or_print(output, &json)?;
    Ok(())
}

// ============================================================================
// fill subcommand
// ============================================================================

pub fn cmd_fill(
    input: &str,
    commands_path: &str,
    output: Option<&str>,
    config: &AppConfig,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let doc = load_page(input)?;
    let content = std::fs::read_to_string(commands_path)
        .map_err(|e| AutofillError::io(commands_path, e))?;
    let request: InjectionRequest =
        serde_json::from_str(&content).map_err(|e| AutofillError::json(commands_path, e))?;

    let mut host = build_autofill_config(config).host(doc);
    host.install()?;
    let response = host.execute(request);
    println!("{}", serde_json::to_string_pretty(&response)?);

    if let Some(path) = output {
        let snapshot = serde_json::to_string_pretty(&host.document().snapshot())?;
        std::fs::write(path, snapshot).map_err(|e| AutofillError::io(path, e))?;
    }
    Ok(())
}

// ============================================================================
// autofill subcommand
// ============================================================================

pub fn cmd_autofill(
    input: &str,
    dataset_path: &str,
    backend_name: &str,
    script: Option<&str>,
    output: Option<&str>,
    model_args: ModelArgs<'_>,
    config: &AppConfig,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let doc = load_page(input)?;
    let dataset = load_dataset(dataset_path)?;
    let backend = build_backend(backend_name, model_args, config)?;
    let autofill_config = build_autofill_config(config);

    let mut host = autofill_config.host(doc);
    let report = run_pipeline(&mut host, &dataset, backend.as_ref(), &autofill_config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(path) = script {
        let code = generate_playwright_script(&report.commands, input);
        std::fs::write(path, code).map_err(|e| AutofillError::io(path, e))?;
        info!(path, "wrote playwright script");
    }
    if let Some(path) = output {
        let snapshot = serde_json::to_string_pretty(&host.document().snapshot())?;
        std::fs::write(path, snapshot).map_err(|e| AutofillError::io(path, e))?;
    }
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Install the log subscriber. `RUST_LOG` wins over `-v` flags.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Parse a page from a local file or an http(s) URL.
pub fn load_page(input: &str) -> Result<Document> {
    let html = if is_url(input) {
        let response = reqwest::blocking::get(input).map_err(|source| AutofillError::Http {
            context: input.to_string(),
            source,
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(AutofillError::PageLoad {
                source_ref: input.to_string(),
                reason: format!("HTTP {}", status.as_u16()),
            });
        }
        response.text().map_err(|source| AutofillError::Http {
            context: input.to_string(),
            source,
        })?
    } else {
        std::fs::read_to_string(input).map_err(|e| AutofillError::io(input, e))?
    };
    Ok(Document::parse(&html))
}

pub fn load_dataset(path: &str) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| AutofillError::io(path, e))?;
    let value: Value = serde_json::from_str(&content).map_err(|e| AutofillError::json(path, e))?;
    Ok(unwrap_dataset(value))
}

/// Build the mapping backend named on the command line.
pub fn build_backend(
    name: &str,
    model_args: ModelArgs<'_>,
    config: &AppConfig,
) -> Result<Box<dyn MappingBackend>> {
    match name {
        "lookup" => Ok(Box::new(DatasetLookupBackend)),
        "llm" => {
            let mapping = &config.mapping;
            let (endpoint, model) =
                resolve_model_settings(model_args.endpoint, model_args.model, mapping);
            let api_key = std::env::var(&mapping.api_key_env).ok();
            let backend = HttpMappingBackend::new(
                &endpoint,
                &model,
                api_key,
                Duration::from_secs(mapping.timeout_secs),
            )
            .map_err(|e| AutofillError::Config(e.to_string()))?
            .with_sampling(mapping.temperature, mapping.max_tokens);
            Ok(Box::new(backend))
        }
        other => Err(AutofillError::Config(format!(
            "unknown backend '{}', expected lookup or llm",
            other
        ))),
    }
}

fn write_or_print(output: Option<&str>, content: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, content).map_err(|e| AutofillError::io(path, e)),
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}
