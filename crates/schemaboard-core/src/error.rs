//! Schema document error types.

use thiserror::Error;

/// Errors raised while importing a schema document.
///
/// Graph-shape problems (dangling references, empty schema) are never errors;
/// only a document that cannot be turned into a graph is.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The text is not valid JSON
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A required top-level member is missing or not an array
    #[error("invalid schema document: '{member}' must be an array")]
    InvalidShape { member: &'static str },

    /// A single table, field or edge entry could not be read
    #[error("invalid {location}: {message}")]
    InvalidRecord { location: String, message: String },
}

impl ImportError {
    /// Create a new InvalidShape error.
    pub fn invalid_shape(member: &'static str) -> Self {
        Self::InvalidShape { member }
    }

    /// Create a new InvalidRecord error.
    pub fn invalid_record(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            location: location.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ImportError::invalid_shape("schema");
        assert_eq!(
            err.to_string(),
            "invalid schema document: 'schema' must be an array"
        );

        let err = ImportError::invalid_record("edges[3]", "missing source");
        assert!(err.to_string().contains("edges[3]"));
        assert!(err.to_string().contains("missing source"));
    }

    #[test]
    fn test_parse_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ImportError = json_err.into();
        assert!(err.to_string().starts_with("invalid JSON:"));
    }
}
