pub mod date;
pub mod injector;

pub use injector::{InjectError, InjectResult, Injected, Injector, is_affirmative};
