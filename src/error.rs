//! Custom error types for tensorstyle.

use std::collections::TryReserveError;
use std::path::PathBuf;
use thiserror::Error;

/// Boxed error produced by an inference engine backend.
pub type EngineError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Status code reported across the JNI boundary on success.
pub const STATUS_OK: i32 = 0;

/// Status code reported across the JNI boundary on any failure.
pub const STATUS_FAILED: i32 = -1;

/// Main error type for the tensorstyle library.
#[derive(Error, Debug)]
pub enum Error {
    /// The graph asset could not be resolved or read.
    #[error("failed to read graph asset {path}: {source}")]
    Asset {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The engine rejected the graph (malformed bytes, unsupported operation).
    #[error("failed to bind graph {path}: {source}")]
    GraphBind {
        path: String,
        #[source]
        source: EngineError,
    },

    /// Session execution failed.
    #[error("graph execution failed: {source}")]
    Inference {
        #[source]
        source: EngineError,
    },

    /// The result buffer could not be allocated.
    #[error("failed to allocate result buffer of {len} pixels: {source}")]
    Allocation {
        len: usize,
        #[source]
        source: TryReserveError,
    },

    /// Execution was requested before a graph was loaded.
    #[error("no graph loaded; call initialize first")]
    NotInitialized,

    /// Shape mismatch in tensor operations.
    #[error("tensor shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// A thread panicked while holding the session lock.
    #[error("session lock poisoned")]
    LockPoisoned,

    /// Failed to load an image file.
    #[error("failed to load image from {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse failure category, so callers can tell causes apart without
/// matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or corrupt asset, or a graph the engine refused.
    GraphLoad,
    /// The engine declined to run.
    Execution,
    /// The result buffer could not be created.
    Allocation,
    /// No session is installed.
    NotInitialized,
    /// Caller-supplied pixels, dimensions or configuration are unusable.
    InvalidInput,
    /// Lock poisoning and local file I/O.
    Internal,
}

impl Error {
    /// Failure category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Asset { .. } | Self::GraphBind { .. } => ErrorKind::GraphLoad,
            Self::Inference { .. } => ErrorKind::Execution,
            Self::Allocation { .. } => ErrorKind::Allocation,
            Self::NotInitialized => ErrorKind::NotInitialized,
            Self::ShapeMismatch { .. } | Self::InvalidParameter { .. } => ErrorKind::InvalidInput,
            Self::LockPoisoned | Self::ImageLoad { .. } | Self::ImageSave { .. } | Self::Io(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Status code reported to managed callers. Every failure collapses to
    /// [`STATUS_FAILED`].
    #[must_use]
    pub const fn status_code(&self) -> i32 {
        STATUS_FAILED
    }

    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for tensorstyle operations.
pub type Result<T> = std::result::Result<T, Error>;
