//! In-process storage backend.
//!
//! DESIGN
//! ======
//! One [`MemoryStorage`] origin can hand out several contexts via
//! [`MemoryStorage::open_context`], each playing the role of a browser tab.
//! Writes queue a [`StorageEvent`] for every other context; queued events are
//! only delivered by [`MemoryStorage::dispatch_pending`], mirroring how the
//! browser delivers `storage` events as separate tasks rather than inside the
//! writing call.

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::rc::{Rc, Weak};

use super::{StorageArea, StorageBackend, StorageEvent, StorageListener, Subscription};
use crate::error::StorageError;

struct ListenerSlot {
    id: u64,
    context: u64,
    listener: StorageListener,
}

struct PendingEvent {
    source: u64,
    event: StorageEvent,
}

struct Origin {
    area: StorageArea,
    entries: RefCell<BTreeMap<String, String>>,
    listeners: RefCell<Vec<ListenerSlot>>,
    pending: RefCell<VecDeque<PendingEvent>>,
    quota: Cell<Option<usize>>,
    next_context: Cell<u64>,
    next_listener: Cell<u64>,
}

impl Origin {
    fn used_bytes_with(&self, key: &str, value: &str) -> usize {
        let entries = self.entries.borrow();
        let others: usize = entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum();
        others + key.len() + value.len()
    }

    fn listener(&self, id: u64) -> Option<StorageListener> {
        self.listeners
            .borrow()
            .iter()
            .find(|slot| slot.id == id)
            .map(|slot| Rc::clone(&slot.listener))
    }
}

/// Shared in-memory storage area; clones address the same context.
#[derive(Clone)]
pub struct MemoryStorage {
    origin: Rc<Origin>,
    context: u64,
}

impl MemoryStorage {
    /// Create an empty origin and return its first context.
    #[must_use]
    pub fn new(area: StorageArea) -> Self {
        let origin = Origin {
            area,
            entries: RefCell::new(BTreeMap::new()),
            listeners: RefCell::new(Vec::new()),
            pending: RefCell::new(VecDeque::new()),
            quota: Cell::new(None),
            next_context: Cell::new(1),
            next_listener: Cell::new(0),
        };
        Self { origin: Rc::new(origin), context: 0 }
    }

    /// Limit the total stored bytes (keys plus values); writes beyond it fail.
    #[must_use]
    pub fn with_quota(self, max_bytes: usize) -> Self {
        self.origin.quota.set(Some(max_bytes));
        self
    }

    /// Open another context (a second "tab") over the same entries.
    #[must_use]
    pub fn open_context(&self) -> Self {
        let context = self.origin.next_context.get();
        self.origin.next_context.set(context + 1);
        Self { origin: Rc::clone(&self.origin), context }
    }

    /// Remove every entry, notifying other contexts with a key-less event.
    pub fn clear(&self) {
        let had_entries = {
            let mut entries = self.origin.entries.borrow_mut();
            let had_entries = !entries.is_empty();
            entries.clear();
            had_entries
        };
        if had_entries {
            self.enqueue(None, None, None);
        }
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.origin.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.origin.entries.borrow().is_empty()
    }

    /// Number of live listeners across every context of this origin.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.origin.listeners.borrow().len()
    }

    /// Number of events waiting for [`MemoryStorage::dispatch_pending`].
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.origin.pending.borrow().len()
    }

    /// Deliver queued events until the queue is empty.
    ///
    /// Events produced by listeners while dispatching are delivered in the same
    /// call. Returns the number of events processed.
    pub fn dispatch_pending(&self) -> usize {
        let mut processed = 0;
        loop {
            let Some(pending) = self.origin.pending.borrow_mut().pop_front() else {
                break;
            };
            processed += 1;

            let targets: Vec<u64> = self
                .origin
                .listeners
                .borrow()
                .iter()
                .filter(|slot| slot.context != pending.source)
                .map(|slot| slot.id)
                .collect();

            for id in targets {
                // A listener may have been unregistered by an earlier one.
                if let Some(listener) = self.origin.listener(id) {
                    listener(&pending.event);
                }
            }
        }
        processed
    }

    fn enqueue(&self, key: Option<&str>, old_value: Option<String>, new_value: Option<String>) {
        let event = StorageEvent {
            key: key.map(str::to_owned),
            old_value,
            new_value,
            area: self.origin.area,
        };
        self.origin
            .pending
            .borrow_mut()
            .push_back(PendingEvent { source: self.context, event });
    }
}

impl StorageBackend for MemoryStorage {
    fn area(&self) -> StorageArea {
        self.origin.area
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.origin.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(max) = self.origin.quota.get() {
            let needed = self.origin.used_bytes_with(key, value);
            if needed > max {
                return Err(StorageError::backend(
                    "set",
                    key,
                    format!("quota exceeded ({needed} of {max} bytes)"),
                ));
            }
        }

        let old_value = self
            .origin
            .entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        // Rewriting an identical value is not a change.
        if old_value.as_deref() != Some(value) {
            self.enqueue(Some(key), old_value, Some(value.to_owned()));
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let old_value = self.origin.entries.borrow_mut().remove(key);
        if old_value.is_some() {
            self.enqueue(Some(key), old_value, None);
        }
        Ok(())
    }

    fn subscribe(&self, listener: StorageListener) -> Result<Subscription, StorageError> {
        let id = self.origin.next_listener.get();
        self.origin.next_listener.set(id + 1);
        self.origin
            .listeners
            .borrow_mut()
            .push(ListenerSlot { id, context: self.context, listener });

        let origin: Weak<Origin> = Rc::downgrade(&self.origin);
        Ok(Subscription::new(move || {
            if let Some(origin) = origin.upgrade() {
                origin.listeners.borrow_mut().retain(|slot| slot.id != id);
            }
        }))
    }
}
