//! Error types for pgplan.

use crate::expr::PartitionKind;
use thiserror::Error;

/// The main error type for compiling, executing and reading queries.
#[derive(Debug, Error)]
pub enum PlanError {
    /// An expression node reached a renderer that cannot render it.
    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),

    /// A partition list entry the pagination emulator cannot apply.
    #[error("Unimplemented operator: {0}")]
    UnimplementedOperator(String),

    /// `Take` / `Skip` without a count argument.
    #[error("Partition operator {0:?} requires a count argument")]
    MissingArgument(PartitionKind),

    /// Record access by a name the record does not carry.
    #[error("Field not found: '{0}'")]
    FieldNotFound(String),

    /// Record access with a type the stored value cannot convert to.
    #[error("Type mismatch on field '{field}': expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: String,
    },

    /// An update whose column set is empty once identity columns are left out.
    #[error("Update of {0} sets no columns")]
    EmptyUpdate(String),

    /// A `@name` placeholder with no matching parameter.
    #[error("Missing parameter: '@{0}'")]
    MissingParameter(String),

    /// A result column whose backend type cannot be read into a value.
    #[error("Unsupported column type '{type_name}' for column '{column}'")]
    UnsupportedColumnType { column: String, type_name: String },

    /// Error reported by the database backend, passed through unchanged.
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlanError {
    /// Wrap a backend error without reinterpreting it.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }

    /// Create a type mismatch error for a record field.
    pub fn mismatch(field: impl Into<String>, expected: &'static str, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            expected,
            found: found.into(),
        }
    }
}

/// Result type alias for pgplan operations.
pub type PlanResult<T> = Result<T, PlanError>;
