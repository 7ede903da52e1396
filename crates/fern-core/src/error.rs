use thiserror::Error;

/// Error taxonomy for the runtime core.
///
/// Every failure is signalled synchronously to the caller; the core never
/// retries, logs, or swallows an error. `AccessDenied` marks illegal-state
/// conditions (things that should not happen in correct code) and is kept
/// distinct from ordinary argument errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FernError {
    #[error("arity mismatch: {0}")]
    Arity(String),

    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("out of bounds: {0}")]
    OutOfBounds(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("access denied: {0}")]
    AccessDenied(String),
}

impl FernError {
    pub fn arity(message: impl Into<String>) -> Self {
        FernError::Arity(message.into())
    }

    pub fn illegal(message: impl Into<String>) -> Self {
        FernError::IllegalArgument(message.into())
    }

    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        FernError::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn out_of_bounds(message: impl Into<String>) -> Self {
        FernError::OutOfBounds(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        FernError::Unsupported(message.into())
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        FernError::AccessDenied(message.into())
    }
}

impl From<String> for FernError {
    fn from(s: String) -> Self {
        FernError::illegal(s)
    }
}

impl From<&str> for FernError {
    fn from(s: &str) -> Self {
        FernError::illegal(s.to_string())
    }
}
