//! In-memory history stack implementing [`Navigator`].
//!
//! Used for server rendering and tests; it records every entry so history
//! behavior (replace vs push) can be asserted.

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;

use std::cell::RefCell;
use std::rc::Rc;

use super::{HistoryMode, Navigator};

#[derive(Clone, Debug, PartialEq, Eq)]
struct Entry {
    path: String,
    query: String,
}

impl Entry {
    fn parse(url: &str) -> Self {
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        let path = if path.is_empty() { "/" } else { path };
        Self { path: path.to_owned(), query: query.to_owned() }
    }

    fn url(&self) -> String {
        if self.query.is_empty() { self.path.clone() } else { format!("{}?{}", self.path, self.query) }
    }
}

#[derive(Debug)]
struct History {
    entries: Vec<Entry>,
    index: usize,
    replace_count: usize,
}

impl History {
    fn current(&self) -> &Entry {
        &self.entries[self.index]
    }
}

/// Shared history; clones observe the same stack.
#[derive(Clone, Debug)]
pub struct MemoryNavigator {
    history: Rc<RefCell<History>>,
}

impl MemoryNavigator {
    /// Start with a single entry at `url` (`/path?query`).
    #[must_use]
    pub fn new(url: &str) -> Self {
        let history = History { entries: vec![Entry::parse(url)], index: 0, replace_count: 0 };
        Self { history: Rc::new(RefCell::new(history)) }
    }

    /// Navigate to an arbitrary URL as the user would (push, forward entries dropped).
    pub fn visit(&self, url: &str) {
        self.push(Entry::parse(url));
    }

    /// Step back one entry; returns `false` at the start of history.
    pub fn back(&self) -> bool {
        let mut history = self.history.borrow_mut();
        if history.index == 0 {
            return false;
        }
        history.index -= 1;
        true
    }

    /// Step forward one entry; returns `false` at the end of history.
    pub fn forward(&self) -> bool {
        let mut history = self.history.borrow_mut();
        if history.index + 1 >= history.entries.len() {
            return false;
        }
        history.index += 1;
        true
    }

    /// Current URL as `/path?query`.
    #[must_use]
    pub fn current_url(&self) -> String {
        self.history.borrow().current().url()
    }

    /// Number of history entries.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.borrow().entries.len()
    }

    /// Number of navigations that replaced the current entry.
    #[must_use]
    pub fn replace_count(&self) -> usize {
        self.history.borrow().replace_count
    }

    fn push(&self, entry: Entry) {
        let mut history = self.history.borrow_mut();
        let keep = history.index + 1;
        history.entries.truncate(keep);
        history.entries.push(entry);
        history.index = keep;
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.history.borrow().current().path.clone()
    }

    fn current_query(&self) -> String {
        self.history.borrow().current().query.clone()
    }

    fn navigate(&self, query: &str, mode: HistoryMode) {
        let entry = Entry { path: self.current_path(), query: query.to_owned() };
        match mode {
            HistoryMode::Push => self.push(entry),
            HistoryMode::Replace => {
                let mut history = self.history.borrow_mut();
                let index = history.index;
                history.entries[index] = entry;
                history.replace_count += 1;
            }
        }
    }
}
