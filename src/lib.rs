pub mod cli;
pub mod command;
pub mod dom;
pub mod error;
pub mod inject;
pub mod mapping;
pub mod orchestrator;
pub mod resolve;
pub mod scan;
pub mod trace;

pub use error::{AutofillError, Result};
