pub mod document;
pub mod events;

pub use document::{Document, NodeId, SelectOption};
