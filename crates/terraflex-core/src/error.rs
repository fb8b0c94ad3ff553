//! Shared error vocabulary for the terraflex state backend.
//!
//! Every crate in the workspace propagates errors through this enum (or
//! wraps it with `#[from]`) so the HTTP surface can map a single type to
//! status codes instead of threading per-crate error types through.

use thiserror::Error;

/// Errors produced anywhere in the state lifecycle engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested object (state, lock, dependency, key material) is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// A config references a stack name that was never declared.
    #[error("unknown stack: {0}")]
    UnknownStack(String),

    /// A config references a storage provider name that was never declared.
    #[error("unknown storage provider: {0}")]
    UnknownProvider(String),

    /// A config references a transformer name that was never declared.
    #[error("unknown transformer: {0}")]
    UnknownTransformer(String),

    /// The operation requires a capability (writable/lockable) the driver lacks.
    #[error("unsupported capability: {0}")]
    UnsupportedCapability(String),

    /// A lock is held by someone else, absent when required, or the driver
    /// refused acquisition (e.g. a losing push race).
    #[error("lock conflict: {message}")]
    LockConflict {
        /// Human-readable explanation of the conflict.
        message: String,
        /// The lock ID the caller attempted to use.
        id: String,
    },

    /// The configuration document failed schema or version validation.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// A required helper binary could not be resolved.
    #[error("missing dependency: {0}")]
    DependencyMissing(String),

    /// The underlying storage medium or subprocess failed.
    #[error("driver failure: {0}")]
    DriverFailure(String),

    /// Wrapped I/O error, retagged with the path it concerns.
    #[error("io error at {path}: {source}")]
    Io {
        /// Path involved in the failing operation.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a [`Error::LockConflict`] carrying the attempted lock ID.
    pub fn lock_conflict(message: impl Into<String>, id: impl Into<String>) -> Self {
        Self::LockConflict {
            message: message.into(),
            id: id.into(),
        }
    }

    /// Wrap a `std::io::Error` with the path that triggered it.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_conflict_carries_id() {
        let err = Error::lock_conflict("someone else holds it", "l1");
        match err {
            Error::LockConflict { id, .. } => assert_eq!(id, "l1"),
            _ => panic!("expected LockConflict"),
        }
    }

    #[test]
    fn display_is_stable() {
        let err = Error::UnknownStack("main".to_string());
        assert_eq!(err.to_string(), "unknown stack: main");
    }
}
