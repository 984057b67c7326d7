//! Error types for intervene-core
//!
//! Document and binary *readers* never return these: they degrade the object
//! they build to invalid. Errors are reserved for setup-time binding problems
//! and for failures while writing state out.

use crate::{TargetKind, ValueType};
use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("no binder registered for method '{method}' on {target}")]
    UnknownMethod { target: TargetKind, method: String },

    #[error("argument for '{method}' must be {expected}, got {got}")]
    ArgumentType {
        method: String,
        expected: ValueType,
        got: ValueType,
    },

    #[error("operation on {target} cannot be bound to {subject}")]
    TargetMismatch { target: TargetKind, subject: String },

    #[error("variable not found: {0}")]
    VariableNotFound(String),

    #[error("invalid definition: {0}")]
    InvalidDefinition(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encode error: {0}")]
    Encode(#[from] bincode::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
