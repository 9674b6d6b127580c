//! Error types for Cadence.

use thiserror::Error;

/// Main error type for Cadence operations.
#[derive(Error, Debug)]
pub enum CadenceError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Occurrence not found: {0}")]
    NotFound(String),

    #[error("Invalid deletion scope: {0}")]
    InvalidScope(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CadenceError {
    /// Whether this error means the target occurrence does not exist.
    ///
    /// Storage-level not-found (a row vanishing between read and write) is
    /// folded in so callers can render "already removed" for both.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CadenceError::NotFound(_) | CadenceError::Storage(StorageError::NotFound(_))
        )
    }
}

/// Entity-level validation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("owning user id is required")]
    MissingOwner,

    #[error("start and end must both be set or both be absent")]
    HalfScheduled,

    #[error("cannot resize an occurrence without a start instant")]
    MissingStart,

    #[error("end must be after start")]
    EndBeforeStart,

    #[error("duration of {minutes} minutes is not a multiple of 30 minutes")]
    InvalidDuration { minutes: i64 },

    #[error("unknown recurrence tag: {0}")]
    UnknownRecurrence(String),

    #[error("unknown status: {0}")]
    UnknownStatus(String),

    #[error("occurrence {0} is not a group root")]
    NotARoot(String),

    #[error("invalid calendar date: {0}")]
    InvalidDate(String),
}

/// Storage-related errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias for Cadence operations.
pub type Result<T> = std::result::Result<T, CadenceError>;
