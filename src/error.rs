//! Error types for the form logic engine

use thiserror::Error;

/// Main error type for the form logic engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormLogicError {
    /// A group node carried a combinator tag other than `and`/`or`
    #[error("Invalid grammar: unrecognized combinator '{0}'")]
    InvalidGrammar(String),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Evaluation task failed: {0}")]
    EvaluationTaskFailed(String),
}

impl From<serde_json::Error> for FormLogicError {
    fn from(err: serde_json::Error) -> Self {
        FormLogicError::DeserializationError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for FormLogicError {
    fn from(err: tokio::task::JoinError) -> Self {
        FormLogicError::EvaluationTaskFailed(err.to_string())
    }
}

/// Result type alias for the form logic engine
pub type Result<T> = std::result::Result<T, FormLogicError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_grammar_names_tag() {
        let err = FormLogicError::InvalidGrammar("xor".to_string());
        assert!(err.to_string().contains("'xor'"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let err: FormLogicError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, FormLogicError::DeserializationError(_)));
    }
}
