//! `use_url_storage`: a stored value mirrored into the router's query string.

#[cfg(test)]
#[path = "use_url_storage_test.rs"]
mod use_url_storage_test;

use std::rc::Rc;

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_location, use_navigate};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::binder::{UrlBinder, UrlStorageOptions};
use crate::error::StorageError;
use crate::location::{HistoryMode, Navigator};
use crate::storage::StorageBackend;

/// [`Navigator`] over the router's location memos and `navigate`.
struct RouterNavigator {
    pathname: Memo<String>,
    search: Memo<String>,
    navigate: Rc<dyn Fn(&str, NavigateOptions)>,
}

impl Navigator for RouterNavigator {
    fn current_path(&self) -> String {
        self.pathname.get_untracked()
    }

    fn current_query(&self) -> String {
        self.search.get_untracked()
    }

    fn navigate(&self, query: &str, mode: HistoryMode) {
        let path = self.current_path();
        let url = if query.is_empty() { path } else { format!("{path}?{query}") };
        let options = NavigateOptions { replace: mode == HistoryMode::Replace, ..NavigateOptions::default() };
        (self.navigate)(&url, options);
    }
}

type Binder<T> = StoredValue<UrlBinder<T>, LocalStorage>;

/// Write side of a [`use_url_storage`] binding.
pub struct SetUrlStorage<T: 'static> {
    binder: Binder<T>,
}

impl<T: 'static> Clone for SetUrlStorage<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> Copy for SetUrlStorage<T> {}

impl<T> SetUrlStorage<T>
where
    T: Serialize + DeserializeOwned + Clone + 'static,
{
    /// Put `value` in the URL (new history entry) and persist it.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub fn set(&self, value: T) -> Result<(), StorageError> {
        self.binder
            .try_with_value(move |binder| binder.set(value))
            .unwrap_or(Err(StorageError::Detached))
    }

    /// Compute the next value from the stored one, then [`set`](Self::set) it.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub fn update(&self, next: impl FnOnce(T) -> T) -> Result<(), StorageError> {
        self.binder
            .try_with_value(move |binder| binder.update(next))
            .unwrap_or(Err(StorageError::Detached))
    }
}

/// Bind a value to the router URL and the storage area named in `options`.
///
/// Must be called under a `<Router>`.
///
/// # Errors
///
/// Propagates storage failures from opening the area or the first
/// reconciliation.
pub fn use_url_storage<T>(options: UrlStorageOptions<T>) -> Result<(Signal<T, LocalStorage>, SetUrlStorage<T>), StorageError>
where
    T: Serialize + DeserializeOwned + Clone + 'static,
{
    let backend = options.area.backend()?;
    let location = use_location();
    let navigator = RouterNavigator {
        pathname: location.pathname,
        search: location.search,
        navigate: Rc::new(use_navigate()),
    };
    let (pathname, search) = (location.pathname, location.search);
    let url = Signal::derive(move || format!("{}?{}", pathname.get(), search.get()));
    use_url_storage_with(options, backend, Rc::new(navigator), url)
}

/// Bind a value with an explicit backend and navigator.
///
/// `url` must change whenever the navigator's location changes; each change
/// re-runs reconciliation and re-derives the visible value.
///
/// # Errors
///
/// Propagates storage failures from the first reconciliation.
pub fn use_url_storage_with<T>(
    options: UrlStorageOptions<T>,
    backend: Rc<dyn StorageBackend>,
    navigator: Rc<dyn Navigator>,
    url: Signal<String>,
) -> Result<(Signal<T, LocalStorage>, SetUrlStorage<T>), StorageError>
where
    T: Serialize + DeserializeOwned + Clone + 'static,
{
    let default_value = options.default_value.clone();
    let binder: Binder<T> = StoredValue::new_local(UrlBinder::mount(options, backend, navigator)?);

    Effect::new(move || {
        url.track();
        if let Some(Err(err)) = binder.try_with_value(UrlBinder::reconcile) {
            tracing::warn!(error = %err, "url storage reconciliation failed");
        }
    });

    let value = Signal::derive_local(move || {
        url.track();
        binder
            .try_with_value(UrlBinder::value)
            .unwrap_or_else(|| default_value.clone())
    });

    Ok((value, SetUrlStorage { binder }))
}
