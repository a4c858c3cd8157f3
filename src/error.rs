//! error types for query execution and the storage collaborator

use crate::tuple::ColumnType;
use thiserror::Error;

pub type ExecResult<T> = Result<T, ExecError>;

/// errors raised by the storage collaborator (tables, csv ingestion)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("tuple does not match table descriptor: {0}")]
    DescriptorMismatch(String),

    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("csv error at line {line}: {message}")]
    Csv { line: u64, message: String },

    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e.to_string())
    }
}

impl From<csv::Error> for StorageError {
    fn from(e: csv::Error) -> Self {
        let line = e.position().map(|p| p.line()).unwrap_or(0);
        match e.into_kind() {
            csv::ErrorKind::Io(io) => StorageError::Io(io.to_string()),
            kind => StorageError::Csv {
                line,
                message: format!("{:?}", kind),
            },
        }
    }
}

/// errors that can occur while building or running an operator tree
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecError {
    // construction errors
    #[error("{what}: expected {expected} entries, found {found}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    // evaluation errors
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("column index {index} out of bounds for tuple with {len} fields")]
    ColumnIndexOutOfBounds { index: usize, len: usize },

    #[error("column \"{0}\" does not exist")]
    ColumnNotFound(String),

    #[error("integer overflow")]
    IntegerOverflow,

    #[error("division by zero")]
    DivisionByZero,

    // type errors
    #[error("invalid limit: {0}")]
    InvalidLimit(String),

    #[error("unsupported type {type_} for {context}")]
    UnsupportedType {
        context: &'static str,
        type_: ColumnType,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// malformed internal state; a defect rather than bad input
    #[error("internal error: {0}")]
    Internal(String),
}

impl ExecError {
    pub fn type_mismatch(expected: impl ToString, found: impl ToString) -> Self {
        ExecError::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// whether the error signals a bug in the executor rather than bad input
    pub fn is_internal(&self) -> bool {
        matches!(self, ExecError::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_is_distinguishable() {
        assert!(ExecError::Internal("missing group".into()).is_internal());
        assert!(!ExecError::DivisionByZero.is_internal());
        assert!(!ExecError::Storage(StorageError::Io("gone".into())).is_internal());
    }

    #[test]
    fn test_error_display() {
        let err = ExecError::LengthMismatch {
            what: "output names",
            expected: 2,
            found: 1,
        };
        assert_eq!(err.to_string(), "output names: expected 2 entries, found 1");

        let err: ExecError = StorageError::Csv {
            line: 3,
            message: "bad field".into(),
        }
        .into();
        assert_eq!(err.to_string(), "csv error at line 3: bad field");
    }
}
