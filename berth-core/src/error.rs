//! Error types for berth.
//!
//! All errors use `thiserror` for ergonomic error handling and proper error chains.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for berth operations.
pub type Result<T> = std::result::Result<T, BerthError>;

/// Main error type for berth.
#[derive(Error, Debug)]
pub enum BerthError {
    // Network errors
    #[error("No such network: {id}")]
    NoSuchNetwork { id: String },

    #[error("Invalid ID: {id} matches more than one network")]
    InvalidId { id: String },

    #[error("Network with name {name} already exists")]
    NetworkNameConflict { name: String },

    #[error("Invalid subnet {subnet} : {reason}")]
    InvalidSubnet { subnet: String, reason: String },

    #[error("Networking is not enabled on this daemon")]
    NetworkingDisabled,

    /// The request is well-formed but not allowed (e.g. touching a pre-defined network).
    #[error("{reason}")]
    Forbidden { reason: String },

    // Service errors
    #[error("No such service: {id}")]
    ServiceNotFound { id: String },

    #[error("Service name {name} conflicts with an existing service")]
    ServiceNameConflict { name: String },

    #[error("Invalid service spec: {reason}")]
    InvalidServiceSpec { reason: String },

    #[error("Invalid filter '{key}'")]
    InvalidFilter { key: String },

    #[error("Service {id} version {expected} is out of date (current version {current})")]
    ServiceVersionConflict { id: String, expected: u64, current: u64 },

    #[error("No such node: {id}")]
    NodeNotFound { id: String },

    // Bundle errors
    #[error("Bundle {} not found. Specify the path with --file", .path.display())]
    BundleNotFound { path: PathBuf },

    #[error("Error reading {}: {reason}", .path.display())]
    InvalidBundle { path: PathBuf, reason: String },

    // File system errors
    #[error("I/O error at {path:?}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // API errors
    #[error("API error: {message}")]
    ApiError { message: String },

    // Configuration errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BerthError {
    /// Create an Internal error from any error type.
    pub fn internal(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Internal(err.to_string())
    }

    /// Shorthand for a forbidden request.
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden { reason: reason.into() }
    }

    /// Whether this error means a network lookup found nothing.
    pub fn is_no_such_network(&self) -> bool {
        matches!(self, Self::NoSuchNetwork { .. })
    }

    /// Whether this error means the requested object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NoSuchNetwork { .. } | Self::ServiceNotFound { .. } | Self::NodeNotFound { .. }
        )
    }
}
