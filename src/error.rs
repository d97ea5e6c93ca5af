use thiserror::Error;

/// Faults that cross a pipeline boundary.
///
/// Local, recoverable conditions (a skipped element, a failed chunk, a
/// missing option) are carried as values in the stage outputs instead.
#[derive(Debug, Error)]
pub enum AutofillError {
    /// Every mapping chunk failed, so no commands can be built.
    #[error("mapping collaborator unavailable: {0}")]
    MappingUnavailable(String),

    /// A serialized locator could not be parsed back.
    #[error("invalid locator '{locator}': {reason}")]
    InvalidLocator { locator: String, reason: String },

    /// The page source could not be loaded.
    #[error("failed to load page '{source_ref}': {reason}")]
    PageLoad { source_ref: String, reason: String },

    /// A second injection pass was requested on the same document load.
    #[error("autofill already injected into this document")]
    AlreadyInjected,

    #[error("I/O error ({context}): {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error ({context}): {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("YAML error ({context}): {source}")]
    Yaml {
        context: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("HTTP error ({context}): {source}")]
    Http {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl AutofillError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        AutofillError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        AutofillError::Json {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, AutofillError>;
