pub type Result<T, E = ParseError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// End of input reached before the closing quote of a string literal.
    #[error("reached end of stream inside string literal at byte {0}")]
    UnterminatedString(usize),

    #[error("expected {expected}, got {got}")]
    Unexpected { expected: String, got: String },

    #[error("expected {expected}, got end of statement")]
    UnexpectedEnd { expected: String },

    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("invalid integer literal '{0}'")]
    InvalidNumber(String),

    #[error("empty expression list")]
    EmptyExpressionList,

    #[error("duplicate {0} element in group by")]
    DuplicateGroupElement(&'static str),
}

impl ParseError {
    /// Expected-token mismatch, with the offending token rendered into the
    /// message.
    pub fn unexpected(expected: impl Into<String>, got: impl std::fmt::Display) -> Self {
        ParseError::Unexpected {
            expected: expected.into(),
            got: got.to_string(),
        }
    }

    pub fn unexpected_end(expected: impl Into<String>) -> Self {
        ParseError::UnexpectedEnd {
            expected: expected.into(),
        }
    }
}
