//! Error and warning types for bundling runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that stop a run.
///
/// Everything the walk can recover from is reported as a [`WalkWarning`]
/// instead; only setup, allocation and output failures end up here.
#[derive(Debug, Error)]
pub enum WalkError {
    /// Permission denied for the walk root.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Walk root not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error on the walk root.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Engine setup failed (rule chain construction, pattern compilation).
    #[error("Setup failed: {message}")]
    Setup {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A chunk buffer could not be acquired.
    #[error("Cannot acquire a {requested} byte buffer (limit {limit})")]
    BufferUnavailable { requested: usize, limit: usize },

    /// The output boundary failed to accept data.
    #[error("Output failed: {source}")]
    Output {
        #[source]
        source: std::io::Error,
    },
}

impl WalkError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Wrap an output boundary failure.
    pub fn output(source: std::io::Error) -> Self {
        Self::Output { source }
    }
}

/// Kind of walk warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// Entry disappeared between listing and use.
    Vanished,
    /// Symbolic link target does not exist or cannot be resolved.
    BrokenSymlink,
    /// Error reading a file or directory.
    ReadError,
    /// Error reading metadata.
    MetadataError,
    /// Path longer than the configured limit.
    PathTooLong,
    /// Entry deeper than the configured limit.
    DepthLimit,
    /// Identity tracker is full.
    IdentityCapacity,
    /// Directory already open on the current descent path.
    CycleDetected,
    /// File larger than the configured ceiling.
    FileTooLarge,
    /// Socket, FIFO or device; listed but never read.
    NotRegular,
}

/// Non-fatal condition encountered during a walk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl WalkWarning {
    /// Create a new walk warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Classify an I/O error hit while touching `path`.
    pub fn from_io(path: impl Into<PathBuf>, what: &str, error: &std::io::Error) -> Self {
        let path = path.into();
        let (kind, message) = match error.kind() {
            std::io::ErrorKind::PermissionDenied => (
                WarningKind::PermissionDenied,
                format!("Permission denied {what}: {}", path.display()),
            ),
            std::io::ErrorKind::NotFound => (
                WarningKind::Vanished,
                format!("Disappeared during processing: {}", path.display()),
            ),
            _ => (
                WarningKind::ReadError,
                format!("Cannot {what}: {} - {error}", path.display()),
            ),
        };
        Self {
            path,
            message,
            kind,
        }
    }

    /// Create a broken symlink warning.
    pub fn broken_symlink(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let path = path.into();
        Self {
            message: format!("Cannot resolve symlink: {} - {error}", path.display()),
            path,
            kind: WarningKind::BrokenSymlink,
        }
    }

    /// Create a cycle warning.
    pub fn cycle(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Directory already on the walk path, not descending: {}", path.display()),
            path,
            kind: WarningKind::CycleDetected,
        }
    }
}
