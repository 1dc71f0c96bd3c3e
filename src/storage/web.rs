//! Browser `localStorage` / `sessionStorage` backend.
//!
//! Requires a browser environment; only compiled with the `hydrate` feature.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::Closure;

use super::{StorageArea, StorageBackend, StorageEvent, StorageListener, Subscription};
use crate::error::StorageError;

/// Handle to one of the window's storage objects.
#[derive(Clone)]
pub struct WebStorage {
    area: StorageArea,
    storage: web_sys::Storage,
}

impl WebStorage {
    /// Open the storage object for `area` on the current window.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] when there is no window or the
    /// browser denies access to the area.
    pub fn open(area: StorageArea) -> Result<Self, StorageError> {
        let window = web_sys::window().ok_or(StorageError::Unavailable { area })?;
        let storage = match area {
            StorageArea::Local => window.local_storage(),
            StorageArea::Session => window.session_storage(),
        };
        match storage {
            Ok(Some(storage)) => Ok(Self { area, storage }),
            Ok(None) | Err(_) => Err(StorageError::Unavailable { area }),
        }
    }

    /// Map the event's storage object to an area. Events for a storage object
    /// other than ours are reported against the opposite area so the
    /// reconciler filters them out.
    fn event_area(&self, event: &web_sys::StorageEvent) -> StorageArea {
        let same = event
            .storage_area()
            .is_some_and(|other| js_sys::Object::is(other.as_ref(), self.storage.as_ref()));
        match (same, self.area) {
            (true, area) => area,
            (false, StorageArea::Local) => StorageArea::Session,
            (false, StorageArea::Session) => StorageArea::Local,
        }
    }
}

fn js_message(value: &wasm_bindgen::JsValue) -> String {
    value
        .dyn_ref::<js_sys::Error>()
        .map_or_else(|| format!("{value:?}"), |err| String::from(err.message()))
}

impl StorageBackend for WebStorage {
    fn area(&self) -> StorageArea {
        self.area
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage
            .get_item(key)
            .map_err(|e| StorageError::backend("get", key, js_message(&e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StorageError::backend("set", key, js_message(&e)))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.storage
            .remove_item(key)
            .map_err(|e| StorageError::backend("remove", key, js_message(&e)))
    }

    fn subscribe(&self, listener: StorageListener) -> Result<Subscription, StorageError> {
        let window = web_sys::window().ok_or(StorageError::Unavailable { area: self.area })?;
        let this = self.clone();
        let closure = Closure::<dyn FnMut(web_sys::StorageEvent)>::new(move |raw: web_sys::StorageEvent| {
            let event = StorageEvent {
                key: raw.key(),
                old_value: raw.old_value(),
                new_value: raw.new_value(),
                area: this.event_area(&raw),
            };
            listener(&event);
        });

        window
            .add_event_listener_with_callback("storage", closure.as_ref().unchecked_ref())
            .map_err(|e| StorageError::backend("subscribe", "storage", js_message(&e)))?;

        Ok(Subscription::new(move || {
            if let Err(err) =
                window.remove_event_listener_with_callback("storage", closure.as_ref().unchecked_ref())
            {
                tracing::warn!(error = %js_message(&err), "failed to detach storage listener");
            }
        }))
    }
}
