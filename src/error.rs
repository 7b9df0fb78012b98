//! Global error handling for treepick
//!
//! Two layers: `CapabilityError` is what a directory capability reports for a
//! single operation, `EngineError` is what the engine surfaces to its caller.
//! None of these are fatal; the engine either absorbs them into a partial
//! result or hands them back as values.

use std::io;
use thiserror::Error;

use crate::clipboard::ClipboardError;

/// Failure reported by a directory or file capability
#[derive(Error, Debug)]
pub enum CapabilityError {
    /// No entry with that name
    #[error("not found: {0}")]
    NotFound(String),

    /// Entry exists but is not a directory
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Entry exists but is not a file
    #[error("not a file: {0}")]
    NotAFile(String),

    /// The platform refused access
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The root capability was revoked
    #[error("capability revoked")]
    Revoked,

    /// Any other I/O failure
    #[error("I/O error on {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
}

impl CapabilityError {
    /// Map an I/O error for the entry `name` onto the capability taxonomy
    pub fn from_io(name: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(name.to_string()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(name.to_string()),
            _ => Self::Io {
                name: name.to_string(),
                source: err,
            },
        }
    }
}

/// Global error type for treepick operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// A directory could not be listed
    #[error("cannot list {path}: {source}")]
    Enumeration {
        path: String,
        #[source]
        source: CapabilityError,
    },

    /// A path segment no longer resolves
    #[error("cannot resolve {path}: {source}")]
    Resolution {
        path: String,
        #[source]
        source: CapabilityError,
    },

    /// File content could not be read
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: CapabilityError,
    },

    /// The export could not be handed to the publish sink
    #[error("publish failed: {0}")]
    Publish(#[from] ClipboardError),

    /// The user dismissed a capability prompt
    #[error("cancelled by user")]
    UserCancelled,

    /// An operation needs a root directory and none is open
    #[error("no directory is open")]
    NoRoot,

    /// The path does not denote a file in the current tree
    #[error("not a file in the current tree: {0}")]
    NotAFile(String),

    /// File system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl EngineError {
    /// The path this error concerns, when it concerns one
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Enumeration { path, .. }
            | Self::Resolution { path, .. }
            | Self::Read { path, .. } => Some(path),
            Self::NotAFile(path) => Some(path),
            _ => None,
        }
    }
}

/// Specialized Result type for treepick operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Creates an EngineError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::EngineError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}

// The binary's main returns io::Result, like the rest of the CLI plumbing
impl From<EngineError> for io::Error {
    fn from(err: EngineError) -> Self {
        io::Error::new(io::ErrorKind::Other, err.to_string())
    }
}
