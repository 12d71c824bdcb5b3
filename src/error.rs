//! Error types for the strm organizer.
//!
//! Recoverable, per-item problems (unreachable directories, unresolved
//! episodes, failed writes) are plain records in the stage outputs. This enum
//! covers the failures that stop a command.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the strm organizer.
#[derive(Error, Debug)]
pub enum Error {
    // Preflight / configuration errors
    #[error("TMDB API key not configured. Set TMDB_API_KEY environment variable")]
    TmdbApiKeyMissing,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid rules file: {0}")]
    InvalidRules(String),

    // Storage errors
    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("File already exists: {0}")]
    FileAlreadyExists(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Checksum mismatch after copy: {0}")]
    ChecksumMismatch(String),

    // Metadata errors
    #[error("TMDB request failed: {0}")]
    TmdbRequest(String),

    #[error("No metadata for id {0}")]
    MetadataNotFound(u64),

    // Plan / execute errors
    #[error("Invalid plan file: {0}")]
    InvalidPlanFile(String),

    #[error("An operation batch is already in flight")]
    ExecutorBusy,

    // History errors
    #[error("History record not found: {0}")]
    HistoryRecordNotFound(u64),

    #[error("Rollback conflict: {0}")]
    RollbackConflict(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // TOML errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    // Archive errors
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Create a configuration error. Configuration errors halt a command
    /// before anything is written.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Whether this error comes from configuration rather than the backend.
    pub fn is_fatal_config(&self) -> bool {
        matches!(
            self,
            Error::Config(_) | Error::TmdbApiKeyMissing
        )
    }
}
