//! Security specific errors for the Quill sanitizer.

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SecurityError {
    #[error("Invalid security configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid policy rule {rule:?}: {reason}")]
    InvalidRule { rule: String, reason: String },

    #[error("Malformed policy tables: {0}")]
    Json(String),
}

impl From<serde_json::Error> for SecurityError {
    fn from(err: serde_json::Error) -> Self {
        SecurityError::Json(err.to_string())
    }
}

/// Result type for policy construction.
pub type SecurityResult<T> = Result<T, SecurityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SecurityError::InvalidRule {
            rule: "*".to_string(),
            reason: "bare wildcard".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid policy rule \"*\": bare wildcard");

        let err = SecurityError::InvalidConfiguration("empty prefix".to_string());
        assert_eq!(err.to_string(), "Invalid security configuration: empty prefix");
    }

    #[test]
    fn test_json_error_conversion() {
        let err: SecurityError = serde_json::from_str::<Vec<String>>("{").unwrap_err().into();
        assert!(matches!(err, SecurityError::Json(_)));
    }
}
