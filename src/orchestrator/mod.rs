pub mod orchestrator;
pub mod outcome_model;
pub mod pipeline;

pub use orchestrator::{InjectionHost, Pacing};
pub use pipeline::{AutofillConfig, prepare, run_pipeline};
