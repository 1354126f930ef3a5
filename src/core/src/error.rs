use thiserror::Error;

/// olmoci error types
#[derive(Error, Debug)]
pub enum OlmError {
    /// Reference string could not be parsed
    #[error("Invalid reference '{reference}': {message}")]
    InvalidReference { reference: String, message: String },

    /// Artifact is not one of the kinds allowed for the requested operation
    #[error("Unsupported artifact type: {0}")]
    UnsupportedArtifactType(String),

    /// Manifest bytes could not be decoded or failed validation
    #[error("Malformed manifest: {0}")]
    MalformedManifest(String),

    /// Annotation mapping is not usable (e.g. empty key)
    #[error("Invalid annotations: {0}")]
    InvalidAnnotations(String),

    /// Bundle payload is not usable
    #[error("Invalid bundle: {0}")]
    InvalidBundle(String),

    /// Content or tag does not exist in the repository
    #[error("Not found: {0}")]
    NotFound(String),

    /// Container registry error
    #[error("Registry error: {registry} - {message}")]
    RegistryError { registry: String, message: String },

    /// Repository state conflicts with the requested change
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Bundle or annotation file could not be read
    #[error("Filesystem error: {path} - {message}")]
    FilesystemError { path: String, message: String },

    /// Operation was cancelled by the caller
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl OlmError {
    /// Shorthand for an `InvalidReference` error.
    pub fn invalid_reference(reference: &str, message: impl Into<String>) -> Self {
        OlmError::InvalidReference {
            reference: reference.to_string(),
            message: message.into(),
        }
    }

    /// Shorthand for a `RegistryError`.
    pub fn registry(registry: &str, message: impl Into<String>) -> Self {
        OlmError::RegistryError {
            registry: registry.to_string(),
            message: message.into(),
        }
    }

    /// Shorthand for a `FilesystemError`.
    pub fn filesystem(path: &std::path::Path, message: impl std::fmt::Display) -> Self {
        OlmError::FilesystemError {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }
}

impl From<serde_json::Error> for OlmError {
    fn from(err: serde_json::Error) -> Self {
        OlmError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for OlmError {
    fn from(err: serde_yaml::Error) -> Self {
        OlmError::SerializationError(err.to_string())
    }
}

/// Result type alias for olmoci operations
pub type Result<T> = std::result::Result<T, OlmError>;
