//! Error types for interchange operations.
//!
//! Every fallible operation returns [`Result`], whose error is
//! [`InterchangeError`]. All errors are fatal for the call that produced
//! them: no partial document, JSON Schema or source text is returned.
//!
//! Declarations that cannot be expressed as source are *not* errors; the
//! renderer substitutes a placeholder and records the location in
//! [`crate::GeneratedCode::lossy`].

use thiserror::Error;

use crate::config::ConfigValidationError;

/// Result type alias for interchange operations.
pub type Result<T> = std::result::Result<T, InterchangeError>;

/// Main error type for interchange operations.
#[derive(Debug, Error)]
pub enum InterchangeError {
    /// A recursive node has no identifier anywhere along its cycle, so it
    /// cannot be hoisted into the definitions table.
    #[error("recursive schema without an identifier at {}", format_path(path))]
    MissingIdentifier { path: Vec<String> },

    /// A unique symbol (or symbol property key) has no global registry key
    /// and cannot be recreated from source.
    #[error("symbol {symbol} cannot be rendered at {}: it has no registry key", format_path(path))]
    UnrepresentableSymbol { path: Vec<String>, symbol: String },

    /// The JSON Schema lies outside the subset this crate produces.
    #[error("malformed JSON Schema at '{pointer}': {reason}")]
    MalformedJsonSchema { pointer: String, reason: String },

    /// A plain JSON document did not match the node shape.
    #[error("invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration failed validation before any work was done.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigValidationError),
}

impl InterchangeError {
    /// Create a `MalformedJsonSchema` error.
    pub fn malformed(pointer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedJsonSchema {
            pointer: pointer.into(),
            reason: reason.into(),
        }
    }
}

/// Render a traversal path as `/a/b/c` (or `/` at the root).
fn format_path(path: &[String]) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path.iter().map(|segment| format!("/{}", segment)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_identifier_message() {
        let error = InterchangeError::MissingIdentifier {
            path: vec!["anyOf".into(), "0".into()],
        };
        assert_eq!(
            error.to_string(),
            "recursive schema without an identifier at /anyOf/0"
        );
    }

    #[test]
    fn test_malformed_message() {
        let error = InterchangeError::malformed("/$defs/A", "dangling $ref");
        assert_eq!(
            error.to_string(),
            "malformed JSON Schema at '/$defs/A': dangling $ref"
        );
    }

    #[test]
    fn test_config_error_converts() {
        let error: InterchangeError = ConfigValidationError::EmptyNamespace.into();
        assert!(matches!(error, InterchangeError::InvalidConfig(_)));
    }
}
