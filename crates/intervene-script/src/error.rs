//! Error types for intervene-script

use thiserror::Error;

/// Setup error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Duplicate definition: {0}")]
    DuplicateDefinition(String),

    #[error("Intervention '{id}': {source}")]
    Intervention {
        id: String,
        #[source]
        source: intervene_core::Error,
    },

    #[error("Trigger '{id}': {source}")]
    Trigger {
        id: String,
        #[source]
        source: intervene_core::Error,
    },

    #[error(transparent)]
    Core(#[from] intervene_core::Error),

    #[error("Logging initialisation failed: {0}")]
    Logging(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
