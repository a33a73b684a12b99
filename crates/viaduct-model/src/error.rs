//! Model error types

use thiserror::Error;

/// Errors surfaced by model mutation, lookup, and convergence operations
#[derive(Debug, Error)]
pub enum ModelError {
    /// A configuration value failed validation; nothing was written
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The topology is internally inconsistent (malformed circuit pairing)
    #[error("topology integrity error: {0}")]
    Integrity(String),

    /// The operation is not permitted in the current model state
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// The operation referenced an entity the model does not hold
    #[error("unknown {kind}: {name}")]
    UnknownEntity { kind: &'static str, name: String },

    /// The convergence pass bound was exhausted before a fixed point
    ///
    /// Not fatal: the last pass's state stays in the model, readable but
    /// provisional.
    #[error("convergence not reached after {passes} passes")]
    ConvergenceNotReached { passes: usize },
}

impl ModelError {
    pub(crate) fn unknown(kind: &'static str, name: impl Into<String>) -> Self {
        Self::UnknownEntity {
            kind,
            name: name.into(),
        }
    }
}

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;
