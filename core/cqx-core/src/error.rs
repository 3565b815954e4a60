//! Error types for the cqx write path.
//!
//! All public APIs return `CqxResult<T>`; library code does not panic.

use crate::consistency::Consistency;
use crate::statement::Statement;
use thiserror::Error;

/// Unified error type for all cqx operations.
#[derive(Debug, Error)]
pub enum CqxError {
    /// A statement asked for a consistency level other than the enclosing batch's
    #[error(
        "attempting to perform query with consistency {requested} in batch with consistency {batch}"
    )]
    ConsistencyConflict {
        requested: Consistency,
        batch: Consistency,
    },

    /// A column value cannot be encoded for the requested statement position
    #[error("cannot encode column '{column}': {message}")]
    Encoding { column: String, message: String },

    /// Unrecognized or out-of-range option
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// Invalid operation
    #[error("invalid operation: {message}\nContext: {context}")]
    InvalidOperation { message: String, context: String },

    /// The transport rejected or failed to prepare a statement
    #[error("failed to prepare statement: {message}\nCQL: {cql}")]
    Prepare { cql: String, message: String },

    /// Network or server-side failure reported by the transport
    #[error("transport error: {0}")]
    Transport(String),

    /// A scoped batch failed to flush; `unsent` holds its queue for a retry
    #[error("batch flush failed with {} unsent statements: {source}", unsent.len())]
    BatchNotApplied {
        source: Box<CqxError>,
        unsent: Vec<Statement>,
    },

    /// Configuration loading error
    #[error("config error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Standard I/O error
    #[error("io error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl CqxError {
    /// Operational failures that the caller may legitimately retry.
    ///
    /// Consistency conflicts, encoding errors and rejected statement text are
    /// programming errors and must be fixed at the call site instead.
    pub fn is_retryable(&self) -> bool {
        match self {
            CqxError::Transport(_) => true,
            CqxError::BatchNotApplied { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

/// Result type alias for all cqx operations.
pub type CqxResult<T> = Result<T, CqxError>;

impl From<serde_json::Error> for CqxError {
    fn from(err: serde_json::Error) -> Self {
        CqxError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_consistency_conflict() {
        let err = CqxError::ConsistencyConflict {
            requested: Consistency::One,
            batch: Consistency::Quorum,
        };
        assert_eq!(
            err.to_string(),
            "attempting to perform query with consistency ONE in batch with consistency QUORUM"
        );
    }

    #[test]
    fn error_display_encoding() {
        let err = CqxError::Encoding {
            column: "views".to_string(),
            message: "counter delta is not allowed in VALUES".to_string(),
        };
        assert!(err.to_string().contains("'views'"));
        assert!(err.to_string().contains("counter delta"));
    }

    #[test]
    fn error_display_invalid_operation() {
        let err = CqxError::InvalidOperation {
            message: "no columns to insert".to_string(),
            context: "Inserter::execute".to_string(),
        };
        assert!(err.to_string().contains("invalid operation"));
        assert!(err.to_string().contains("Inserter::execute"));
    }

    #[test]
    fn retryable_classification() {
        assert!(CqxError::Transport("connection reset".to_string()).is_retryable());
        assert!(
            !CqxError::Prepare {
                cql: "SELEC".to_string(),
                message: "syntax error".to_string(),
            }
            .is_retryable()
        );
        assert!(!CqxError::InvalidOption("auto_apply".to_string()).is_retryable());
        assert!(
            !CqxError::ConsistencyConflict {
                requested: Consistency::All,
                batch: Consistency::One,
            }
            .is_retryable()
        );
    }

    #[test]
    fn batch_not_applied_follows_its_source() {
        let err = CqxError::BatchNotApplied {
            source: Box::new(CqxError::Transport("timeout".to_string())),
            unsent: vec![Statement::new(), Statement::new()],
        };
        assert!(err.is_retryable());
        assert!(err.to_string().contains("2 unsent statements"));
        assert!(err.to_string().contains("timeout"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn serde_json_error_converts() {
        let err: CqxError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, CqxError::Serialization(_)));
    }
}
