pub mod builder;
pub mod command_model;
pub mod script;
