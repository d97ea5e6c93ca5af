pub mod backend;
pub mod batcher;
pub mod lookup;
pub mod mapping_model;
