//! Centralized error types for mailshrink.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the mailshrink library.
///
/// An unsupported (non-image) attachment is not an error, and neither is
/// running out of resize attempts; both are ordinary outcomes of a reduction.
#[derive(Error, Debug)]
pub enum ShrinkError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified attachment does not exist.
    #[error("Attachment not found: {0}")]
    FileNotFound(PathBuf),

    /// An editor accepted a file but failed to resize or save it.
    #[error("Image error for '{path}': {reason}")]
    Image { path: PathBuf, reason: String },

    /// A tuning parameter is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The mail arguments handed to the filter have an unexpected shape.
    #[error("Invalid mail arguments: {0}")]
    InvalidArgs(String),
}

/// Convenience alias for `Result<T, ShrinkError>`.
pub type Result<T> = std::result::Result<T, ShrinkError>;

impl ShrinkError {
    /// Create an `Io` variant from a path and an `io::Error`.
    ///
    /// `NotFound` is mapped to [`ShrinkError::FileNotFound`] so callers can
    /// tell a vanished attachment apart from other failures.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::FileNotFound(path);
        }
        Self::Io { path, source }
    }

    /// Create an `Image` variant from a path and any displayable cause.
    pub fn image(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::Image {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (rare, prefer `ShrinkError::io`).
impl From<std::io::Error> for ShrinkError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
