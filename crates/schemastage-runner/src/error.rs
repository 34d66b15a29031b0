//! Error types for processors, generators and the pipeline.

use std::time::Duration;

/// Errors raised while rendering or applying expressions.
#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    /// The driver rejected a statement or the connection failed.
    #[error("Database error: {0}")]
    Execution(#[from] sqlx::Error),

    /// The dialect does not support the requested operation.
    #[error("Operation '{operation}' is not supported by the {dialect} processor")]
    Unsupported {
        /// Dialect name.
        dialect: &'static str,
        /// Operation that was refused.
        operation: String,
    },

    /// A positional template could not be rendered.
    #[error("Invalid SQL template: {0}")]
    Template(String),

    /// An expression failed validation before SQL generation.
    #[error("Invalid {kind} expression: {}", .errors.join("; "))]
    InvalidExpression {
        /// Expression kind.
        kind: &'static str,
        /// Validation messages.
        errors: Vec<String>,
    },

    /// A database round-trip exceeded the configured timeout.
    #[error("Statement timed out after {0:?}")]
    Timeout(Duration),

    /// The blocking runtime could not be created.
    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

impl ProcessorError {
    /// Creates an [`ProcessorError::Unsupported`] error.
    pub fn unsupported(dialect: &'static str, operation: impl Into<String>) -> Self {
        Self::Unsupported {
            dialect,
            operation: operation.into(),
        }
    }
}

/// Result type for processor operations.
pub type Result<T> = std::result::Result<T, ProcessorError>;
