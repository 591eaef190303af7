use thiserror::Error;

/// Unified error type for autover operations
#[derive(Error, Debug)]
pub enum AutoverError {
    #[error("Version parse error: {0}")]
    Parse(String),

    #[error("Conflicting versions within project: {0}")]
    Conflict(String),

    #[error("No version found: {0}")]
    NotFound(String),

    #[error("Not a significant figure: {0}")]
    InvalidSigFig(String),

    #[error("Failed to complete all expected replacements: {0}")]
    IncompleteWrite(String),

    #[error("Git command failed: {0}")]
    Subprocess(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in autover
pub type Result<T> = std::result::Result<T, AutoverError>;

impl AutoverError {
    /// Create a parse error with context
    pub fn parse(msg: impl Into<String>) -> Self {
        AutoverError::Parse(msg.into())
    }

    /// Create a conflict error with context
    pub fn conflict(msg: impl Into<String>) -> Self {
        AutoverError::Conflict(msg.into())
    }

    /// Create a not-found error with context
    pub fn not_found(msg: impl Into<String>) -> Self {
        AutoverError::NotFound(msg.into())
    }

    /// Create an invalid-significant-figure error with context
    pub fn invalid_sigfig(msg: impl Into<String>) -> Self {
        AutoverError::InvalidSigFig(msg.into())
    }

    /// Create an incomplete-write error with context
    pub fn incomplete_write(msg: impl Into<String>) -> Self {
        AutoverError::IncompleteWrite(msg.into())
    }

    /// Create a subprocess error with context
    pub fn subprocess(msg: impl Into<String>) -> Self {
        AutoverError::Subprocess(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        AutoverError::Config(msg.into())
    }
}
