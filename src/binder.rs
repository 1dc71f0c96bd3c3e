//! Mirrors a stored value into a URL query parameter.
//!
//! DESIGN
//! ======
//! The binder persists the *encoded* string through a
//! [`StorageReconciler<String>`] keyed per page (or per explicit prefix) and
//! treats the query parameter named `kebab_case(key)` as the authoritative
//! source. [`UrlBinder::reconcile`] is the single place that decides between
//! URL and storage:
//!
//! 1. the storage key follows the current path (migrating when it moves);
//! 2. no parameter in the URL: write the stored value into the URL, replacing
//!    the current history entry;
//! 3. a parameter that differs from storage: storage is overwritten with it.
//!
//! The visible value is always decoded from the URL, falling back to the
//! default only while the parameter is absent.

#[cfg(test)]
#[path = "binder_test.rs"]
mod binder_test;

use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec::{Codec, decode_value, encode_value};
use crate::error::StorageError;
use crate::key::{kebab_case, storage_key};
use crate::location::{HistoryMode, Navigator, QueryString};
use crate::reconciler::{StorageOptions, StorageReconciler};
use crate::storage::{StorageArea, StorageBackend};

/// Configuration of a URL-bound value.
///
/// Defaults: no prefix (storage is scoped to the current path) and
/// `StorageArea::Local`.
#[derive(Clone, Debug)]
pub struct UrlStorageOptions<T> {
    pub key: String,
    pub default_value: T,
    pub prefix: Option<String>,
    pub area: StorageArea,
}

impl<T> UrlStorageOptions<T> {
    pub fn new(key: impl Into<String>, default_value: T) -> Self {
        Self { key: key.into(), default_value, prefix: None, area: StorageArea::default() }
    }

    /// Share the stored value across paths under `<prefix>_<key>`.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn area(mut self, area: StorageArea) -> Self {
        self.area = area;
        self
    }
}

/// A value kept in storage and mirrored into the URL.
pub struct UrlBinder<T: 'static> {
    key: String,
    param: String,
    prefix: Option<String>,
    default_value: T,
    storage: StorageReconciler<String>,
    navigator: Rc<dyn Navigator>,
}

impl<T> UrlBinder<T>
where
    T: Serialize + DeserializeOwned + Clone + 'static,
{
    /// Bind the value and run the first reconciliation.
    ///
    /// # Errors
    ///
    /// Propagates storage backend failures.
    pub fn mount(
        options: UrlStorageOptions<T>,
        backend: Rc<dyn StorageBackend>,
        navigator: Rc<dyn Navigator>,
    ) -> Result<Self, StorageError> {
        let UrlStorageOptions { key, default_value, prefix, area } = options;
        let derived = storage_key(prefix.as_deref(), &navigator.current_path(), &key);
        let storage_options = StorageOptions::new(derived, encode_value(&default_value))
            .area(area)
            .codec(Codec::raw());
        let storage = StorageReconciler::mount(storage_options, backend)?;

        let binder = Self { param: kebab_case(&key), key, prefix, default_value, storage, navigator };
        binder.reconcile()?;
        Ok(binder)
    }

    /// Name of the query parameter.
    #[must_use]
    pub fn param(&self) -> &str {
        &self.param
    }

    /// Storage key currently in use.
    #[must_use]
    pub fn storage_key(&self) -> String {
        self.storage.key()
    }

    /// Bring storage and URL into agreement; the URL wins when both are set.
    ///
    /// Safe to call repeatedly: with nothing changed it rewrites the same
    /// stored string and leaves history alone.
    ///
    /// # Errors
    ///
    /// Propagates storage backend failures.
    pub fn reconcile(&self) -> Result<(), StorageError> {
        let derived = storage_key(self.prefix.as_deref(), &self.navigator.current_path(), &self.key);
        self.storage.set_key(derived)?;

        let mut query = QueryString::parse(&self.navigator.current_query());
        let stored = self.storage.value();
        match query.get(&self.param).map(str::to_owned) {
            None => {
                query.set(&self.param, &stored);
                self.navigator.navigate(&query.encode(), HistoryMode::Replace);
            }
            Some(from_url) if from_url != stored => self.storage.set(from_url)?,
            Some(_) => {}
        }
        Ok(())
    }

    /// Current value, decoded from the URL parameter.
    #[must_use]
    pub fn value(&self) -> T {
        let query = QueryString::parse(&self.navigator.current_query());
        query
            .get(&self.param)
            .and_then(decode_value::<T>)
            .unwrap_or_else(|| self.default_value.clone())
    }

    /// Write `value` into the URL as a new history entry, then reconcile.
    ///
    /// # Errors
    ///
    /// Propagates storage backend failures of the follow-up reconciliation.
    pub fn set(&self, value: T) -> Result<(), StorageError> {
        let mut query = QueryString::parse(&self.navigator.current_query());
        query.set(&self.param, &encode_value(&value));
        self.navigator.navigate(&query.encode(), HistoryMode::Push);
        self.reconcile()
    }

    /// Compute the next value from the *stored* value and [`set`](Self::set) it.
    ///
    /// # Errors
    ///
    /// Propagates storage backend failures.
    pub fn update(&self, next: impl FnOnce(T) -> T) -> Result<(), StorageError> {
        let current = decode_value::<T>(&self.storage.value()).unwrap_or_else(|| self.default_value.clone());
        self.set(next(current))
    }
}
