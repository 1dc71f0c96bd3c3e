//! Keeps one in-memory value and one storage entry in agreement.
//!
//! ARCHITECTURE
//! ============
//! A [`StorageReconciler`] owns the current binding (key, default, codec,
//! force-init predicate) and the in-memory value behind a shared cell. Every
//! reaction runs to completion in one call:
//!
//! 1. derive the next value (explicit set, key change, live-sync event),
//! 2. commit it: remove the previously committed key if the key moved, then
//!    write `serialize(value)` under the current key.
//!
//! Resolution order for a raw stored string is: stored value (unless it is
//! empty, the force-init predicate rejects it, or it fails to deserialize) and
//! then the default. A corrupt entry is purged before the default is adopted.
//!
//! LIVE SYNC
//! =========
//! With `live` enabled the reconciler registers one listener for its whole
//! lifetime. The listener holds only a weak reference to the shared cell and
//! always reads the latest binding from it, so key or default changes never
//! require re-registering. Dropping the reconciler drops the subscription.

#[cfg(test)]
#[path = "reconciler_test.rs"]
mod reconciler_test;

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec::Codec;
use crate::error::StorageError;
use crate::storage::{StorageArea, StorageBackend, StorageEvent, StorageListener, Subscription};

/// Predicate deciding whether an existing raw value is discarded for the default.
pub type ForceInitFn = Rc<dyn Fn(&str) -> bool>;

/// Default value of a binding: a value, or a producer invoked on each use.
pub enum DefaultValue<T> {
    Value(T),
    Producer(Rc<dyn Fn() -> T>),
}

impl<T: Clone> DefaultValue<T> {
    /// Produce the default, invoking the producer if there is one.
    #[must_use]
    pub fn resolve(&self) -> T {
        match self {
            Self::Value(value) => value.clone(),
            Self::Producer(produce) => produce(),
        }
    }
}

impl<T> DefaultValue<T> {
    pub fn producer(produce: impl Fn() -> T + 'static) -> Self {
        Self::Producer(Rc::new(produce))
    }
}

impl<T: Clone> Clone for DefaultValue<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Value(value) => Self::Value(value.clone()),
            Self::Producer(produce) => Self::Producer(Rc::clone(produce)),
        }
    }
}

impl<T> From<T> for DefaultValue<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for DefaultValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Producer(_) => f.write_str("Producer"),
        }
    }
}

/// Configuration of a storage binding.
///
/// Defaults: `area = StorageArea::Local`, `live = false`, JSON codec, and a
/// force-init predicate that never fires.
pub struct StorageOptions<T> {
    pub key: String,
    pub default_value: DefaultValue<T>,
    pub area: StorageArea,
    pub live: bool,
    pub codec: Codec<T>,
    pub force_init: Option<ForceInitFn>,
}

impl<T: Serialize + DeserializeOwned + 'static> StorageOptions<T> {
    /// Bind `key` with a fixed default value.
    pub fn new(key: impl Into<String>, default_value: T) -> Self {
        Self::with_default(key, DefaultValue::Value(default_value))
    }

    /// Bind `key` with a default computed on demand.
    pub fn lazy(key: impl Into<String>, produce: impl Fn() -> T + 'static) -> Self {
        Self::with_default(key, DefaultValue::producer(produce))
    }

    fn with_default(key: impl Into<String>, default_value: DefaultValue<T>) -> Self {
        Self {
            key: key.into(),
            default_value,
            area: StorageArea::default(),
            live: false,
            codec: Codec::json(),
            force_init: None,
        }
    }
}

impl<T> StorageOptions<T> {
    #[must_use]
    pub fn area(mut self, area: StorageArea) -> Self {
        self.area = area;
        self
    }

    /// Follow writes made by other tabs to the same key.
    #[must_use]
    pub fn live(mut self, live: bool) -> Self {
        self.live = live;
        self
    }

    #[must_use]
    pub fn codec(mut self, codec: Codec<T>) -> Self {
        self.codec = codec;
        self
    }

    /// Discard stored raw values for which `predicate` returns `true`.
    #[must_use]
    pub fn force_init(mut self, predicate: impl Fn(&str) -> bool + 'static) -> Self {
        self.force_init = Some(Rc::new(predicate));
        self
    }
}

struct Binding<T> {
    key: String,
    default_value: DefaultValue<T>,
    codec: Codec<T>,
    force_init: Option<ForceInitFn>,
}

impl<T: Clone> Binding<T> {
    fn forced(&self, raw: &str) -> bool {
        self.force_init.as_ref().is_some_and(|predicate| predicate(raw))
    }

    /// Turn a raw stored string into the value to adopt.
    ///
    /// An empty string counts as a cleared entry.
    fn resolve(&self, backend: &dyn StorageBackend, raw: Option<&str>) -> Result<T, StorageError> {
        let Some(raw) = raw.filter(|raw| !raw.is_empty()) else {
            return Ok(self.default_value.resolve());
        };
        if self.forced(raw) {
            tracing::debug!(key = %self.key, "stored value rejected by force-init; using default");
            return Ok(self.default_value.resolve());
        }
        match self.codec.deserialize(raw) {
            Ok(value) => Ok(value),
            Err(err) => {
                tracing::debug!(key = %self.key, error = %err, "purging undecodable stored value");
                backend.remove(&self.key)?;
                Ok(self.default_value.resolve())
            }
        }
    }
}

type Observer<T> = Rc<dyn Fn(&T)>;

struct EntryState<T> {
    binding: Binding<T>,
    value: T,
    committed_key: Option<String>,
    backend: Rc<dyn StorageBackend>,
    observer: Option<Observer<T>>,
}

impl<T: Clone> EntryState<T> {
    fn serialized(&self) -> String {
        self.binding.codec.serialize(&self.value)
    }

    fn commit(&mut self) -> Result<(), StorageError> {
        if let Some(previous) = self.committed_key.as_deref() {
            if previous != self.binding.key {
                tracing::debug!(from = %previous, to = %self.binding.key, "migrating storage key");
                self.backend.remove(previous)?;
            }
        }
        self.backend.set(&self.binding.key, &self.serialized())?;
        self.committed_key = Some(self.binding.key.clone());
        Ok(())
    }

    fn adopt_raw(&mut self, raw: Option<&str>) -> Result<(), StorageError> {
        self.value = self.binding.resolve(self.backend.as_ref(), raw)?;
        self.commit()
    }

    fn apply_event(&mut self, event: &StorageEvent) -> Result<bool, StorageError> {
        if event.area != self.backend.area() || event.key.as_deref() != Some(self.binding.key.as_str()) {
            return Ok(false);
        }
        if event.new_value.as_deref() == Some(self.serialized().as_str()) {
            return Ok(false);
        }
        self.adopt_raw(event.new_value.as_deref())?;
        Ok(true)
    }
}

/// Run one reaction against the shared cell and notify the observer when the
/// value changed. The observer runs after the borrow is released.
fn react<T: Clone>(
    state: &RefCell<EntryState<T>>,
    reaction: impl FnOnce(&mut EntryState<T>) -> Result<bool, StorageError>,
) -> Result<bool, StorageError> {
    let (changed, notify) = {
        let mut entry = state.borrow_mut();
        let changed = reaction(&mut entry)?;
        let notify = if changed { entry.observer.clone().map(|observer| (observer, entry.value.clone())) } else { None };
        (changed, notify)
    };
    if let Some((observer, value)) = notify {
        observer(&value);
    }
    Ok(changed)
}

/// One value bound to one storage key.
pub struct StorageReconciler<T: 'static> {
    state: Rc<RefCell<EntryState<T>>>,
    subscription: Option<Subscription>,
}

impl<T: Clone + 'static> StorageReconciler<T> {
    /// Resolve the initial value and commit it.
    ///
    /// # Errors
    ///
    /// Propagates backend failures from the initial read, the purge of a
    /// corrupt entry, the first commit, or attaching the live listener.
    pub fn mount(options: StorageOptions<T>, backend: Rc<dyn StorageBackend>) -> Result<Self, StorageError> {
        let StorageOptions { key, default_value, area, live, codec, force_init } = options;
        if area != backend.area() {
            tracing::debug!(configured = %area, backend = %backend.area(), "storage area differs from backend");
        }

        let binding = Binding { key, default_value, codec, force_init };
        let raw = backend.get(&binding.key)?;
        let value = binding.resolve(backend.as_ref(), raw.as_deref())?;

        let mut entry = EntryState { binding, value, committed_key: None, backend, observer: None };
        entry.commit()?;
        let state = Rc::new(RefCell::new(entry));

        let subscription = if live { Some(Self::subscribe(&state)?) } else { None };
        Ok(Self { state, subscription })
    }

    fn subscribe(state: &Rc<RefCell<EntryState<T>>>) -> Result<Subscription, StorageError> {
        let weak: Weak<RefCell<EntryState<T>>> = Rc::downgrade(state);
        let listener: StorageListener = Rc::new(move |event: &StorageEvent| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            if let Err(err) = react(&state, |entry| entry.apply_event(event)) {
                tracing::warn!(error = %err, key = ?event.key, "live storage sync failed");
            }
        });
        let backend = Rc::clone(&state.borrow().backend);
        backend.subscribe(listener)
    }

    /// Current in-memory value.
    #[must_use]
    pub fn value(&self) -> T {
        self.state.borrow().value.clone()
    }

    /// Current key.
    #[must_use]
    pub fn key(&self) -> String {
        self.state.borrow().binding.key.clone()
    }

    /// Serialized form of the current value.
    #[must_use]
    pub fn serialized(&self) -> String {
        self.state.borrow().serialized()
    }

    /// Whether a live-sync listener is attached.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.subscription.is_some()
    }

    /// Register a callback run after each change of the in-memory value.
    pub fn on_change(&self, observer: impl Fn(&T) + 'static) {
        self.state.borrow_mut().observer = Some(Rc::new(observer));
    }

    /// Replace the value and commit it.
    ///
    /// # Errors
    ///
    /// Propagates the backend failure of the commit; the new value is kept.
    pub fn set(&self, value: T) -> Result<(), StorageError> {
        react(&self.state, |entry| {
            entry.value = value;
            entry.commit()?;
            Ok(true)
        })
        .map(drop)
    }

    /// Compute the next value from the current one and commit it.
    ///
    /// # Errors
    ///
    /// Propagates the backend failure of the commit.
    pub fn update(&self, next: impl FnOnce(&T) -> T) -> Result<(), StorageError> {
        react(&self.state, |entry| {
            entry.value = next(&entry.value);
            entry.commit()?;
            Ok(true)
        })
        .map(drop)
    }

    /// Move the binding to `key`, carrying the current value.
    ///
    /// The entry under the previous key is removed and the value is committed
    /// under the new one. Setting the same key again does nothing.
    ///
    /// # Errors
    ///
    /// Propagates backend failures of the removal or the commit.
    pub fn set_key(&self, key: impl Into<String>) -> Result<(), StorageError> {
        let key = key.into();
        react(&self.state, |entry| {
            if entry.binding.key == key {
                return Ok(false);
            }
            entry.binding.key = key;
            entry.commit()?;
            Ok(false)
        })
        .map(drop)
    }

    /// Replace the default used by future resolutions.
    pub fn set_default(&self, default_value: impl Into<DefaultValue<T>>) {
        self.state.borrow_mut().binding.default_value = default_value.into();
    }

    /// Re-resolve the value from `raw` as on first load and commit it.
    ///
    /// # Errors
    ///
    /// Propagates backend failures of the purge or the commit.
    pub fn recompute_from_raw(&self, raw: Option<&str>) -> Result<(), StorageError> {
        react(&self.state, |entry| {
            entry.adopt_raw(raw)?;
            Ok(true)
        })
        .map(drop)
    }

    /// Apply a storage notification as the live listener would.
    ///
    /// Returns `true` when the in-memory value was replaced.
    ///
    /// # Errors
    ///
    /// Propagates backend failures of the purge or the commit.
    pub fn handle_event(&self, event: &StorageEvent) -> Result<bool, StorageError> {
        react(&self.state, |entry| entry.apply_event(event))
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for StorageReconciler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entry = self.state.borrow();
        f.debug_struct("StorageReconciler")
            .field("key", &entry.binding.key)
            .field("value", &entry.value)
            .field("live", &self.subscription.is_some())
            .finish_non_exhaustive()
    }
}
