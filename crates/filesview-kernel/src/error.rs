//! Kernel error types.

use std::io;
use thiserror::Error;

/// Errors from attaching, resolving, and reading files.
///
/// Resolution errors carry the *virtual* path the client asked for,
/// never the real path it was mapped to.
#[derive(Debug, Error)]
pub enum FilesError {
    /// The path handed to `attach` could not be canonicalized.
    #[error("failed to get realpath of '{path}': {source}")]
    Realpath {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The canonical attach target is not readable by this process.
    #[error("failed to access '{path}': {source}")]
    AccessDenied {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A resolved candidate could not be canonicalized.
    #[error("failed to determine canonical path of '{path}': {source}")]
    Canonicalize {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Path escapes its attached root (security violation).
    #[error("'{0}' is inaccessible")]
    PathEscapesRoot(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The namespace actor has stopped.
    #[error("files service shut down")]
    Shutdown,
}

impl FilesError {
    /// Create a PathEscapesRoot error.
    pub fn path_escapes_root(path: impl Into<String>) -> Self {
        Self::PathEscapesRoot(path.into())
    }

    /// Create a Canonicalize error.
    pub fn canonicalize(path: impl Into<String>, source: io::Error) -> Self {
        Self::Canonicalize {
            path: path.into(),
            source,
        }
    }
}

/// Kernel result type.
pub type FilesResult<T> = Result<T, FilesError>;
