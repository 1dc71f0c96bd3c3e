//! Access to the current URL and history.
//!
//! SYSTEM CONTEXT
//! ==============
//! The URL binder reads the path and query through [`Navigator`] and writes the
//! query back with an explicit [`HistoryMode`]. The Leptos hook adapts the
//! router's location and `navigate`; tests use [`MemoryNavigator`].

pub mod memory;
pub mod query;

pub use memory::MemoryNavigator;
pub use query::QueryString;

/// How a navigation interacts with the history stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryMode {
    /// Rewrite the current entry; back/forward navigation is unaffected.
    Replace,
    /// Add a new entry.
    Push,
}

/// Current location plus query-string navigation.
pub trait Navigator {
    /// Path component of the current URL, e.g. `/boards`.
    fn current_path(&self) -> String;

    /// Query string of the current URL, with or without the leading `?`.
    fn current_query(&self) -> String;

    /// Navigate to the current path with `query` (no leading `?`).
    fn navigate(&self, query: &str, mode: HistoryMode);
}
