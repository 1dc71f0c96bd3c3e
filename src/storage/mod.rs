//! Key/value string storage backends and their change notifications.
//!
//! SYSTEM CONTEXT
//! ==============
//! The reconciler only talks to storage through [`StorageBackend`]. Browser
//! builds use [`WebStorage`] over `localStorage`/`sessionStorage`; server
//! rendering and tests use [`MemoryStorage`], which can also stand in for
//! several tabs sharing one origin.
//!
//! Notifications follow the browser `storage` event contract: a write is
//! reported to every *other* context sharing the backend, never to the writer.

pub mod memory;
#[cfg(feature = "hydrate")]
pub mod web;

use std::fmt;
use std::rc::Rc;

pub use memory::MemoryStorage;
#[cfg(feature = "hydrate")]
pub use web::WebStorage;

use crate::error::StorageError;

/// Which browser storage area a binding persists into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StorageArea {
    /// Origin-scoped persistent storage (`localStorage`).
    #[default]
    Local,
    /// Tab-scoped storage (`sessionStorage`).
    Session,
}

impl StorageArea {
    /// Resolve the backend for this area in the current environment.
    ///
    /// In the browser this opens the real storage object. Elsewhere (SSR,
    /// native) it returns a fresh in-memory store, so nothing leaks between
    /// requests.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] when the browser refuses access to
    /// the area (no window, privacy mode, sandboxed iframe).
    pub fn backend(self) -> Result<Rc<dyn StorageBackend>, StorageError> {
        #[cfg(feature = "hydrate")]
        {
            Ok(Rc::new(WebStorage::open(self)?))
        }
        #[cfg(not(feature = "hydrate"))]
        {
            Ok(Rc::new(MemoryStorage::new(self)))
        }
    }
}

impl fmt::Display for StorageArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Session => f.write_str("session"),
        }
    }
}

/// A change made to a storage area by another context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageEvent {
    /// Changed key, or `None` when the whole area was cleared.
    pub key: Option<String>,
    pub old_value: Option<String>,
    /// New raw value, or `None` when the key was removed.
    pub new_value: Option<String>,
    pub area: StorageArea,
}

/// Callback invoked for each delivered [`StorageEvent`].
pub type StorageListener = Rc<dyn Fn(&StorageEvent)>;

/// String key/value store with cross-context change notifications.
pub trait StorageBackend {
    /// Area this backend writes into; compared against event areas.
    fn area(&self) -> StorageArea;

    /// Read the raw string stored at `key`.
    ///
    /// # Errors
    ///
    /// Propagates backend failures (security errors, detached storage).
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` at `key`.
    ///
    /// # Errors
    ///
    /// Propagates backend failures, most commonly quota exhaustion.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Register `listener` for changes made by other contexts.
    ///
    /// The listener stays registered until the returned guard is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error when the notification channel cannot be attached.
    fn subscribe(&self, listener: StorageListener) -> Result<Subscription, StorageError>;
}

/// Guard for a registered [`StorageListener`]; unregisters on drop.
#[must_use = "dropping a subscription unregisters its listener"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self { release: Some(Box::new(release)) }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("active", &self.release.is_some()).finish()
    }
}
