use thiserror::Error;

/// Result type for model construction and evaluation
pub type Result<T> = std::result::Result<T, ModelError>;

/// Main error type for the crate
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// The environment descriptor, layer stack or configuration cannot produce a valid model
    #[error("Configuration error in '{name}': {reason}")]
    Configuration {
        name: String,
        reason: String,
    },

    /// A tensor handed to the model does not have the shape it was built for
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        expected: String,
        actual: String,
    },

    /// Configuration documents that fail to (de)serialize
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors (reading configuration files)
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ModelError {
    fn from(err: std::io::Error) -> Self {
        ModelError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

// Helper functions for common error patterns
impl ModelError {
    pub fn configuration<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        ModelError::Configuration {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn shape_mismatch<E: Into<String>, A: Into<String>>(expected: E, actual: A) -> Self {
        ModelError::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, ModelError::Configuration { .. })
    }

    pub fn is_shape_mismatch(&self) -> bool {
        matches!(self, ModelError::ShapeMismatch { .. })
    }
}
