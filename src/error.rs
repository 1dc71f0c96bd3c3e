//! Error types shared by the storage and URL layers.
//!
//! ERROR MODEL
//! ===========
//! Decode failures are recovered inside the reconciler and never reach callers.
//! Backend failures (quota, security, missing storage) are fatal to the
//! triggering call and surface as [`StorageError`].

use crate::storage::StorageArea;

/// Failure reported by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The requested storage area does not exist in this environment.
    #[error("{area} storage is not available")]
    Unavailable { area: StorageArea },
    /// The backend rejected an operation (quota exceeded, security error, ...).
    #[error("storage {op} failed for key `{key}`: {message}")]
    Backend { op: &'static str, key: String, message: String },
    /// The hook owning the binding has been disposed.
    #[error("storage binding used after its owner was disposed")]
    Detached,
}

impl StorageError {
    pub(crate) fn backend(op: &'static str, key: &str, message: impl Into<String>) -> Self {
        Self::Backend { op, key: key.to_owned(), message: message.into() }
    }
}

/// Failure to turn a persisted raw string back into a value.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The raw string is not valid JSON for the target type.
    #[error("invalid stored JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A custom deserializer refused the raw string.
    #[error("rejected stored value: {0}")]
    Rejected(String),
}
