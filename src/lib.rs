//! Storage-backed state and URL query-parameter binding for Leptos apps.
//!
//! Two hooks, layered:
//!
//! - [`use_storage`] keeps a signal in agreement with a `localStorage` /
//!   `sessionStorage` entry, optionally following writes from other tabs;
//! - [`use_url_storage`] mirrors such a value into a query parameter, with the
//!   URL taking precedence over what was stored.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`reconciler`] | Storage reconciliation core ([`StorageReconciler`]) |
//! | [`binder`] | URL/storage precedence rules ([`UrlBinder`]) |
//! | [`storage`] | Backend trait, browser and in-memory backends |
//! | [`location`] | Navigator trait, query strings, in-memory history |
//! | [`codec`] | Value <-> persisted string conversions |
//! | [`key`] | Storage key and URL parameter naming |
//! | [`hooks`] | Leptos hooks wiring the core into the reactive runtime |
//! | [`error`] | Error types |
//!
//! The core modules do not depend on the reactive runtime and are exercised
//! natively with [`MemoryStorage`] and [`MemoryNavigator`].

pub mod binder;
pub mod codec;
pub mod error;
pub mod hooks;
pub mod key;
pub mod location;
pub mod reconciler;
pub mod storage;

pub use binder::{UrlBinder, UrlStorageOptions};
pub use codec::Codec;
pub use error::{CodecError, StorageError};
pub use hooks::{use_storage, use_url_storage};
pub use location::{HistoryMode, MemoryNavigator, Navigator};
pub use reconciler::{DefaultValue, StorageOptions, StorageReconciler};
pub use storage::{MemoryStorage, StorageArea, StorageBackend, StorageEvent};
