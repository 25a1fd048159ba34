use quill_security::SecurityError;
use thiserror::Error;

use crate::dom::DomError;

/// Error types for the parser and sanitizer
#[derive(Debug, Error)]
pub enum ParserError {
    /// Input could not be turned into a tree
    #[error("HTML parse error: {0}")]
    ParseFailure(String),
    /// Nesting too deep
    #[error("Nesting too deep: {0}")]
    NestingTooDeep(usize),
    /// Writing the tree back out failed
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// A selector string could not be parsed
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
    /// Policy could not be loaded or built
    #[error("Policy error: {0}")]
    Policy(#[from] SecurityError),
    /// Tree edit on a node of the wrong kind
    #[error("DOM error: {0}")]
    Dom(#[from] DomError),
}

impl ParserError {
    /// True for the errors that mean the input never became a tree.
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, ParserError::ParseFailure(_) | ParserError::NestingTooDeep(_))
    }
}

/// Result type for parser operations
pub type ParserResult<T> = Result<T, ParserError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let err = ParserError::ParseFailure("invalid UTF-8".to_string());
        assert_eq!(err.to_string(), "HTML parse error: invalid UTF-8");

        let err = ParserError::NestingTooDeep(100);
        assert_eq!(err.to_string(), "Nesting too deep: 100");
        assert!(err.is_parse_failure());

        let err = ParserError::Serialization("broken pipe".to_string());
        assert!(!err.is_parse_failure());
    }

    #[test]
    fn test_error_source() {
        let err = ParserError::from(SecurityError::InvalidConfiguration("empty prefix".to_string()));
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("Policy error:"));

        let err = ParserError::InvalidSelector("".to_string());
        assert!(err.source().is_none());
    }
}
