pub type Result<T, E = ExecutionError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    #[error("unknown function {0}")]
    UnknownFunction(String),

    #[error("unknown attribute {0}")]
    UnknownAttribute(String),

    #[error("unknown value class {0}")]
    UnknownClass(String),

    #[error("expected {expected} value, got {value}")]
    TypeMismatch {
        expected: &'static str,
        value: String,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("{0}")]
    Function(String),
}

impl ExecutionError {
    /// Failure inside a builtin function.
    pub fn function(msg: impl Into<String>) -> Self {
        ExecutionError::Function(msg.into())
    }
}
