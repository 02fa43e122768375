//! Error types for the dialVM I/O crate.

use thiserror::Error;

/// I/O operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IoError {
    /// Unexpected end of stream.
    #[error("Unexpected end of stream: expected {expected} more bytes while reading {context}")]
    EndOfStream { expected: usize, context: String },

    /// Invalid data content.
    #[error("Invalid data: {context}, value: {value}")]
    InvalidData { context: String, value: String },

    /// Invalid operation attempted.
    #[error("Invalid operation: {operation} not allowed in {context}")]
    InvalidOperation { operation: String, context: String },
}

impl IoError {
    /// Create a new end of stream error.
    pub fn end_of_stream<S: Into<String>>(expected: usize, context: S) -> Self {
        Self::EndOfStream {
            expected,
            context: context.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data<S: Into<String>>(context: S, value: S) -> Self {
        Self::InvalidData {
            context: context.into(),
            value: value.into(),
        }
    }

    /// Create a new invalid operation error.
    pub fn invalid_operation<S: Into<String>>(operation: S, context: S) -> Self {
        Self::InvalidOperation {
            operation: operation.into(),
            context: context.into(),
        }
    }
}

/// Result type for I/O operations.
pub type IoResult<T> = std::result::Result<T, IoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = IoError::invalid_data("field", "value");
        assert!(matches!(error, IoError::InvalidData { .. }));
        assert_eq!(error.to_string(), "Invalid data: field, value: value");
    }

    #[test]
    fn test_specific_errors() {
        let error = IoError::end_of_stream(10, "reading header");
        assert_eq!(
            error.to_string(),
            "Unexpected end of stream: expected 10 more bytes while reading reading header"
        );

        let error = IoError::invalid_operation("seek", "position 100 out of bounds");
        assert_eq!(
            error.to_string(),
            "Invalid operation: seek not allowed in position 100 out of bounds"
        );
    }
}
