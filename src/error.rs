//! Error types for crumbjar
//!
//! All modules use `JarResult<T>` as their return type. Value encryption has
//! its own [`CodecError`](crate::codec::CodecError), wrapped here as
//! [`JarError::Crypto`].

use crate::codec::CodecError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for crumbjar operations
pub type JarResult<T> = Result<T, JarError>;

/// All errors that can occur in crumbjar
#[derive(Error, Debug)]
pub enum JarError {
    // Locking errors
    #[error("Timed out after {waited:?} waiting for lock on {path}")]
    LockTimeout { path: PathBuf, waited: Duration },

    // Cookie file errors
    #[error("Cookie file {path} is not valid JSON: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot truncate file {path}: {source}")]
    Truncate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Encryption error: {0}")]
    Crypto(#[from] CodecError),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid encryption key: {0}")]
    KeyInvalid(String),

    #[error("No encryption key configured")]
    KeyMissing,

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("{0}")]
    User(String),
}

impl JarError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LockTimeout { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::LockTimeout { .. } => {
                Some("Another process is using the cookie file; try again shortly")
            }
            Self::KeyMissing => Some("Set CRUMBJAR_KEY or encryption.key_file (see: crumbjar keygen)"),
            Self::Crypto(CodecError::Authentication) => {
                Some("The configured key does not match the one used to write the cookie file")
            }
            _ => None,
        }
    }
}
