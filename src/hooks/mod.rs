//! Leptos hooks over the storage reconciler and URL binder.
//!
//! SYSTEM CONTEXT
//! ==============
//! The core types are plain Rust and know nothing about the reactive runtime.
//! These hooks own a core instance in a [`StoredValue`](leptos::prelude::StoredValue)
//! tied to the calling component's owner, expose the value as a signal, and
//! re-run reconciliation from effects. Disposing the owner drops the core
//! instance, which releases its storage subscription.

mod use_storage;
mod use_url_storage;

pub use use_storage::{RecomputeFromRaw, SetStorage, UseStorage, use_storage, use_storage_with_backend};
pub use use_url_storage::{SetUrlStorage, use_url_storage, use_url_storage_with};
