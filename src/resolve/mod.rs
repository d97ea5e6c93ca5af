pub mod engine;
pub mod strategy;

pub use engine::{Resolution, ResolutionState, resolve};
