//! Error types for repometa-core

use std::fmt;

/// Result type alias for repometa operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for repometa operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or missing required input
    #[error("Configuration error: {0}")]
    Config(String),

    /// Diff strategy exhausted the fetch-depth bound without finding a merge base
    #[error("Insufficient history: {0}")]
    InsufficientHistory(String),

    /// API credential rejected
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// JSON or YAML rendering failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Git operation error
    #[error("Git error: {0}")]
    Git(String),

    /// HTTP/API error
    #[error("HTTP error: {0}")]
    Http(String),

    /// Runtime error (Tokio, threading, etc.)
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<git2::Error> for Error {
    fn from(err: git2::Error) -> Self {
        Error::Git(err.message().to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // Strip the URL: it may carry query parameters we do not want echoed.
        Error::Http(err.without_url().to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(format!("JSON: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(format!("YAML: {}", err))
    }
}

/// Fieldless error category for zero-cost pattern matching.
///
/// Single byte representation (`#[repr(u8)]`), `Copy`, no allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorKind {
    /// Configuration error
    Config,
    /// Fetch-depth bound exceeded
    InsufficientHistory,
    /// Credential rejected
    Authentication,
    /// Rendering failed
    Serialization,
    /// I/O operation error
    Io,
    /// Git operation error
    Git,
    /// HTTP/API error
    Http,
    /// Runtime error
    Runtime,
}

impl Error {
    /// Error category without the message
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Config,
            Error::InsufficientHistory(_) => ErrorKind::InsufficientHistory,
            Error::Authentication(_) => ErrorKind::Authentication,
            Error::Serialization(_) => ErrorKind::Serialization,
            Error::Io(_) => ErrorKind::Io,
            Error::Git(_) => ErrorKind::Git,
            Error::Http(_) => ErrorKind::Http,
            Error::Runtime(_) => ErrorKind::Runtime,
        }
    }

    /// Borrow the error message
    #[inline]
    pub fn message(&self) -> &str {
        match self {
            Error::Config(msg)
            | Error::InsufficientHistory(msg)
            | Error::Authentication(msg)
            | Error::Serialization(msg)
            | Error::Git(msg)
            | Error::Http(msg)
            | Error::Runtime(msg) => msg,
            Error::Io(_) => "I/O error",
        }
    }
}

/// Pipeline stage an error is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading environment variables and the event payload
    Environment,
    /// Event classification and ref resolution
    Classification,
    /// Changed-file detection
    ChangedFiles,
    /// Assembling the metadata record
    Aggregation,
    /// JSON/YAML rendering
    Serialization,
    /// Writing artifact files
    Artifacts,
    /// Writing step outputs and the job summary
    Outputs,
}

impl Stage {
    /// Stable lowercase name used in diagnostics
    pub const fn as_str(&self) -> &'static str {
        match self {
            Stage::Environment => "environment",
            Stage::Classification => "classification",
            Stage::ChangedFiles => "changed-files",
            Stage::Aggregation => "aggregation",
            Stage::Serialization => "serialization",
            Stage::Artifacts => "artifacts",
            Stage::Outputs => "outputs",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error together with the stage that produced it
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed: {error}")]
pub struct Failure {
    /// Failing stage
    pub stage: Stage,
    /// Underlying error
    #[source]
    pub error: Error,
}

/// Attach a stage to a `Result`
pub trait AtStage<T> {
    /// Convert the error into a [`Failure`] at `stage`
    fn at(self, stage: Stage) -> std::result::Result<T, Failure>;
}

impl<T> AtStage<T> for Result<T> {
    fn at(self, stage: Stage) -> std::result::Result<T, Failure> {
        self.map_err(|error| Failure { stage, error })
    }
}
