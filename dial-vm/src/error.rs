//! Error types for the dialVM execution core.
//!
//! Runtime failures are represented as a `thiserror`-derived enum rather
//! than bare strings, with one variant per distinct fault kind. The legacy
//! human-readable error slot the interpreter exposes is always produced by
//! `Display`-ing one of these variants, so diagnostics stay layered over a
//! typed enum.

use thiserror::Error;

/// An execution or load-time error raised by the dialVM core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DialError {
    /// The `.dsb` blob did not start with the `DSBC` magic.
    #[error("bad magic: expected DSBC")]
    BadMagic,

    /// A read ran past the end of the `.dsb` blob.
    #[error("truncated bytecode: {context}")]
    Truncated { context: String },

    /// The metadata hash or code checksum did not match on load.
    #[error("integrity mismatch: {reason}")]
    IntegrityMismatch { reason: String },

    /// An opcode attempted to pop more operands than were on the stack.
    #[error("stack underflow: attempted to access {requested} item(s), only {available} available")]
    StackUnderflow { requested: usize, available: usize },

    /// A value had the wrong variant for the operation being performed.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// `MOD` was attempted with a zero divisor.
    #[error("division by zero in {operation}")]
    DivideByZero { operation: String },

    /// The fetched byte did not map to a known opcode.
    #[error("unknown opcode: {opcode:#04x}")]
    UnknownOpcode { opcode: u8 },

    /// A constant, global, function, or local index was out of range.
    #[error("invalid {kind} index: {index}")]
    InvalidIndex { kind: &'static str, index: u32 },

    /// An indirect or method call's argument count didn't match the
    /// callee's declared parameter count.
    #[error("arity mismatch: expected {expected} argument(s), got {actual}")]
    ArityMismatch { expected: u8, actual: u8 },

    /// `THROW` executed with no active exception handler.
    #[error("unhandled exception: {message}")]
    UnhandledException { message: String },

    /// The Pool's `heap_size` ceiling was exceeded even after a
    /// reclamation pass.
    #[error("out of memory: {requested} bytes requested, {available} available")]
    OutOfMemory { requested: usize, available: usize },

    /// A receiver was required to be an Object but was not.
    #[error("bad receiver: expected Object, found {found}")]
    BadReceiver { found: String },

    /// An `InterpreterLimits` ceiling (operand stack depth or call depth)
    /// was exceeded.
    #[error("stack overflow: exceeded limit of {max_size}")]
    StackOverflow { max_size: usize },

    /// Wraps a lower-level I/O failure encountered while loading or
    /// serializing a Module.
    #[error("io error: {0}")]
    Io(#[from] dial_io::IoError),
}

impl DialError {
    pub fn truncated<S: Into<String>>(context: S) -> Self {
        Self::Truncated {
            context: context.into(),
        }
    }

    pub fn integrity_mismatch<S: Into<String>>(reason: S) -> Self {
        Self::IntegrityMismatch {
            reason: reason.into(),
        }
    }

    pub fn stack_underflow(requested: usize, available: usize) -> Self {
        Self::StackUnderflow {
            requested,
            available,
        }
    }

    pub fn type_mismatch<S: Into<String>>(expected: S, found: S) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn divide_by_zero<S: Into<String>>(operation: S) -> Self {
        Self::DivideByZero {
            operation: operation.into(),
        }
    }

    pub fn invalid_index(kind: &'static str, index: u32) -> Self {
        Self::InvalidIndex { kind, index }
    }

    pub fn arity_mismatch(expected: u8, actual: u8) -> Self {
        Self::ArityMismatch { expected, actual }
    }

    pub fn unhandled_exception<S: Into<String>>(message: S) -> Self {
        Self::UnhandledException {
            message: message.into(),
        }
    }

    pub fn out_of_memory(requested: usize, available: usize) -> Self {
        Self::OutOfMemory {
            requested,
            available,
        }
    }

    pub fn bad_receiver<S: Into<String>>(found: S) -> Self {
        Self::BadReceiver {
            found: found.into(),
        }
    }

    pub fn stack_overflow(max_size: usize) -> Self {
        Self::StackOverflow { max_size }
    }

    /// Whether an active `TRY`/`THROW` handler can intercept this error.
    ///
    /// Only `THROW` of an explicit script value is catchable; every other
    /// runtime fault is fatal to the program.
    pub fn is_catchable(&self) -> bool {
        matches!(self, DialError::UnhandledException { .. })
    }

    /// Whether this error necessarily halts the program — every kind
    /// except a `THROW` that still has an active handler to reach.
    pub fn is_fatal(&self) -> bool {
        !self.is_catchable()
    }

    /// Short, stable category tag useful for logging/metrics.
    pub fn category(&self) -> &'static str {
        match self {
            DialError::BadMagic | DialError::Truncated { .. } | DialError::IntegrityMismatch { .. } => {
                "load"
            }
            DialError::StackUnderflow { .. } => "stack",
            DialError::TypeMismatch { .. } | DialError::BadReceiver { .. } => "type",
            DialError::DivideByZero { .. } => "arithmetic",
            DialError::UnknownOpcode { .. } => "decode",
            DialError::InvalidIndex { .. } => "index",
            DialError::ArityMismatch { .. } => "call",
            DialError::UnhandledException { .. } => "exception",
            DialError::OutOfMemory { .. } => "memory",
            DialError::StackOverflow { .. } => "limit",
            DialError::Io(_) => "io",
        }
    }
}

/// Result type for dialVM operations.
pub type DialResult<T> = std::result::Result<T, DialError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_spec_wording() {
        let err = DialError::stack_underflow(2, 0);
        assert_eq!(
            err.to_string(),
            "stack underflow: attempted to access 2 item(s), only 0 available"
        );
    }

    #[test]
    fn only_unhandled_exception_is_catchable() {
        assert!(DialError::unhandled_exception("boom").is_catchable());
        assert!(!DialError::out_of_memory(10, 0).is_catchable());
        assert!(!DialError::UnknownOpcode { opcode: 0xFF }.is_catchable());
    }

    #[test]
    fn categories_are_stable() {
        assert_eq!(DialError::BadMagic.category(), "load");
        assert_eq!(DialError::arity_mismatch(2, 1).category(), "call");
    }
}
