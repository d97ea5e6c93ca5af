use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AutofillError, Result};
use crate::mapping::batcher::BatchConfig;
use crate::orchestrator::{AutofillConfig, Pacing};

pub const DEFAULT_CONFIG_FILE: &str = "form-autofill.yaml";
pub const DEFAULT_ENDPOINT: &str = "https://ollama.com/api/chat";
pub const DEFAULT_MODEL: &str = "glm-4.6";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "form-autofill",
    version,
    about = "Fill web forms from a structured dataset"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Chat-completions endpoint of the mapping model
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Mapping model name
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Path to config file (default: form-autofill.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the fillable fields of a page
    Scan {
        /// HTML file path or http(s) URL
        #[arg(long)]
        input: String,
    },

    /// Map a dataset onto a page and print the fill commands
    Map {
        /// HTML file path or http(s) URL
        #[arg(long)]
        input: String,

        /// JSON dataset file
        #[arg(long)]
        dataset: String,

        /// Mapping backend: lookup or llm
        #[arg(long, default_value = "lookup")]
        backend: String,

        /// Write the command envelope here instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Apply a command envelope to a page
    Fill {
        /// HTML file path or http(s) URL
        #[arg(long)]
        input: String,

        /// JSON command envelope produced by `map`
        #[arg(long)]
        commands: String,

        /// Write the filled control state here
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Scan, map and fill in one pass
    Autofill {
        /// HTML file path or http(s) URL
        #[arg(long)]
        input: String,

        /// JSON dataset file
        #[arg(long)]
        dataset: String,

        /// Mapping backend: lookup or llm
        #[arg(long, default_value = "lookup")]
        backend: String,

        /// Also write a Playwright script replaying the fill
        #[arg(long)]
        script: Option<String>,

        /// Write the filled control state here
        #[arg(short, long)]
        output: Option<String>,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `form-autofill.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub mapping: MappingConfig,
    #[serde(default)]
    pub inject: InjectConfig,
    #[serde(default)]
    pub trace: TraceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    #[serde(default = "default_ten")]
    pub threshold: usize,

    #[serde(default = "default_ten")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_delay_ms")]
    pub chunk_delay_ms: u64,

    pub endpoint: Option<String>,
    pub model: Option<String>,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            threshold: 10,
            chunk_size: 10,
            chunk_delay_ms: 1000,
            endpoint: None,
            model: None,
            api_key_env: default_api_key_env(),
            timeout_secs: 60,
            temperature: 0.3,
            max_tokens: 4000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjectConfig {
    #[serde(default = "default_command_pause_ms")]
    pub command_pause_ms: u64,

    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    #[serde(default = "default_true")]
    pub highlight: bool,
}

impl Default for InjectConfig {
    fn default() -> Self {
        Self {
            command_pause_ms: 100,
            settle_ms: 200,
            highlight: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceConfig {
    /// JSONL trace file. Tracing is off when unset.
    pub path: Option<String>,
}

// Serde default helpers
fn default_ten() -> usize { 10 }
fn default_chunk_delay_ms() -> u64 { 1000 }
fn default_api_key_env() -> String { "OLLAMA_API_KEY".to_string() }
fn default_timeout_secs() -> u64 { 60 }
fn default_temperature() -> f32 { 0.3 }
fn default_max_tokens() -> u32 { 4000 }
fn default_command_pause_ms() -> u64 { 100 }
fn default_settle_ms() -> u64 { 200 }
fn default_true() -> bool { true }

// ============================================================================
// Config File Loading
// ============================================================================

/// Read and parse a YAML config file.
pub fn read_config(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| AutofillError::io(path, e))?;
    serde_yaml::from_str(&content).map_err(|source| AutofillError::Yaml {
        context: path.to_string(),
        source,
    })
}

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_FILE);
    match read_config(config_path) {
        Ok(config) => config,
        Err(e @ AutofillError::Yaml { .. }) => {
            warn!(error = %e, "malformed config file, using defaults");
            AppConfig::default()
        }
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

pub fn build_batch_config(mapping: &MappingConfig) -> BatchConfig {
    BatchConfig {
        threshold: mapping.threshold,
        chunk_size: mapping.chunk_size,
        chunk_delay: Duration::from_millis(mapping.chunk_delay_ms),
    }
}

pub fn build_pacing(inject: &InjectConfig) -> Pacing {
    Pacing {
        command_pause: Duration::from_millis(inject.command_pause_ms),
        settle: Duration::from_millis(inject.settle_ms),
    }
}

pub fn build_autofill_config(config: &AppConfig) -> AutofillConfig {
    AutofillConfig {
        batch: build_batch_config(&config.mapping),
        pacing: build_pacing(&config.inject),
        highlight: config.inject.highlight,
        trace_path: config.trace.path.as_ref().map(PathBuf::from),
    }
}

/// Endpoint and model for the HTTP backend: CLI > config > env > defaults.
pub fn resolve_model_settings(
    cli_endpoint: Option<&str>,
    cli_model: Option<&str>,
    mapping: &MappingConfig,
) -> (String, String) {
    let endpoint = cli_endpoint
        .map(str::to_string)
        .or_else(|| mapping.endpoint.clone())
        .or_else(|| std::env::var("FORM_AUTOFILL_ENDPOINT").ok())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    let model = cli_model
        .map(str::to_string)
        .or_else(|| mapping.model.clone())
        .or_else(|| std::env::var("FORM_AUTOFILL_MODEL").ok())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    (endpoint, model)
}
