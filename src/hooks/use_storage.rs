//! `use_storage`: a signal persisted to browser storage.

#[cfg(test)]
#[path = "use_storage_test.rs"]
mod use_storage_test;

use std::rc::Rc;

use leptos::prelude::*;

use crate::error::StorageError;
use crate::reconciler::{DefaultValue, StorageOptions, StorageReconciler};
use crate::storage::StorageBackend;

type Entry<T> = StoredValue<StorageReconciler<T>, LocalStorage>;

/// Value signal, setter and raw recompute handle returned by [`use_storage`].
pub type UseStorage<T> = (ReadSignal<T, LocalStorage>, SetStorage<T>, RecomputeFromRaw<T>);

fn with_entry<T, R>(
    entry: Entry<T>,
    op: impl FnOnce(&StorageReconciler<T>) -> Result<R, StorageError>,
) -> Result<R, StorageError>
where
    T: Clone + 'static,
{
    entry.try_with_value(op).unwrap_or(Err(StorageError::Detached))
}

/// Write side of a [`use_storage`] binding.
pub struct SetStorage<T: 'static> {
    entry: Entry<T>,
}

impl<T: 'static> Clone for SetStorage<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> Copy for SetStorage<T> {}

impl<T: Clone + 'static> SetStorage<T> {
    /// Replace the value and persist it.
    ///
    /// # Errors
    ///
    /// Propagates storage failures (e.g. quota exceeded).
    pub fn set(&self, value: T) -> Result<(), StorageError> {
        with_entry(self.entry, move |entry| entry.set(value))
    }

    /// Compute the next value from the current one and persist it.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub fn update(&self, next: impl FnOnce(&T) -> T) -> Result<(), StorageError> {
        with_entry(self.entry, move |entry| entry.update(next))
    }

    /// Move the value to another key, deleting the old entry.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub fn set_key(&self, key: impl Into<String>) -> Result<(), StorageError> {
        let key = key.into();
        with_entry(self.entry, move |entry| entry.set_key(key))
    }

    /// Replace the default used when the stored value is cleared or invalid.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Detached`] after the owner is disposed.
    pub fn set_default(&self, default_value: impl Into<DefaultValue<T>>) -> Result<(), StorageError> {
        let default_value = default_value.into();
        with_entry(self.entry, move |entry| {
            entry.set_default(default_value);
            Ok(())
        })
    }

    /// Follow a reactive key: every change migrates the stored entry.
    pub fn track_key(self, key: Signal<String>) {
        Effect::new(move || {
            let key = key.get();
            if let Err(err) = self.set_key(key) {
                tracing::warn!(error = %err, "failed to migrate storage key");
            }
        });
    }
}

/// Re-resolves a [`use_storage`] value from an arbitrary raw string.
pub struct RecomputeFromRaw<T: 'static> {
    entry: Entry<T>,
}

impl<T: 'static> Clone for RecomputeFromRaw<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> Copy for RecomputeFromRaw<T> {}

impl<T: Clone + 'static> RecomputeFromRaw<T> {
    /// Resolve `raw` as on first load (force-init, decode, default) and adopt it.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub fn run(&self, raw: Option<&str>) -> Result<(), StorageError> {
        with_entry(self.entry, move |entry| entry.recompute_from_raw(raw))
    }
}

/// Bind a signal to the storage area named in `options`.
///
/// The backend is resolved from `options.area` at call time.
///
/// # Errors
///
/// Propagates storage failures from opening the area or the initial
/// read/commit.
pub fn use_storage<T: Clone + 'static>(options: StorageOptions<T>) -> Result<UseStorage<T>, StorageError> {
    let backend = options.area.backend()?;
    use_storage_with_backend(options, backend)
}

/// Bind a signal to an explicit storage backend.
///
/// # Errors
///
/// Propagates storage failures from the initial read/commit.
pub fn use_storage_with_backend<T: Clone + 'static>(
    options: StorageOptions<T>,
    backend: Rc<dyn StorageBackend>,
) -> Result<UseStorage<T>, StorageError> {
    let reconciler = StorageReconciler::mount(options, backend)?;
    let value = RwSignal::new_local(reconciler.value());
    reconciler.on_change(move |next: &T| {
        if value.try_set(next.clone()).is_some() {
            tracing::debug!("storage value changed after its signal was disposed");
        }
    });

    let entry = StoredValue::new_local(reconciler);
    Ok((value.read_only(), SetStorage { entry }, RecomputeFromRaw { entry }))
}
