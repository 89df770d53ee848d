//! Storage of handler registrations per event key.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::trace;

use crate::handler::{Context, Handler};
use crate::key::EventKey;

/// A single entry in a key's handler list.
///
/// Entries are compared by identity, so registering the same handler twice
/// yields two independent entries.
pub(crate) struct Registration {
    pub(crate) handler: Handler,
    pub(crate) context: Option<Context>,
    pub(crate) once: bool,
    fired: AtomicBool,
}

impl Registration {
    pub(crate) fn new(handler: Handler, context: Option<Context>, once: bool) -> Self {
        Self {
            handler,
            context,
            once,
            fired: AtomicBool::new(false),
        }
    }

    /// Claim the single invocation of a once entry.
    ///
    /// Returns `false` if another dispatch already claimed it. Persistent
    /// entries can always fire.
    pub(crate) fn claim(&self) -> bool {
        !self.once || !self.fired.swap(true, Ordering::AcqRel)
    }
}

/// Shared registration entries captured for one dispatch.
pub(crate) type Snapshot = Vec<Arc<Registration>>;

struct HandlerList {
    /// Creation order of the key, used to report names in a stable order.
    seq: u64,
    entries: Vec<Arc<Registration>>,
}

/// Mapping from event key to its ordered, non-empty handler list.
#[derive(Default)]
pub(crate) struct Registry {
    lists: HashMap<EventKey, HandlerList>,
    next_seq: u64,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a registration, creating the key's list if needed.
    ///
    /// Returns the list length after the append.
    pub(crate) fn push(&mut self, key: EventKey, registration: Registration) -> usize {
        let seq = self.next_seq;
        let list = self.lists.entry(key).or_insert_with(|| HandlerList {
            seq,
            entries: Vec::new(),
        });
        if list.seq == seq {
            self.next_seq = self.next_seq.wrapping_add(1);
        }
        list.entries.push(Arc::new(registration));
        list.entries.len()
    }

    /// Delete a key's list. Returns the number of entries removed.
    pub(crate) fn remove_key(&mut self, key: &EventKey) -> usize {
        self.lists.remove(key).map_or(0, |list| list.entries.len())
    }

    /// Remove every entry whose handler is `handler`.
    ///
    /// Deletes the key when nothing remains. Returns the number of entries
    /// removed.
    pub(crate) fn remove_handler(&mut self, key: &EventKey, handler: &Handler) -> usize {
        self.retain(key, |entry| !entry.handler.same(handler))
    }

    /// Remove the given entries (by identity) from a key's list.
    ///
    /// Entries already gone are ignored. Deletes the key when nothing
    /// remains. Returns the number of entries removed.
    pub(crate) fn remove_entries(&mut self, key: &EventKey, entries: &[Arc<Registration>]) -> usize {
        self.retain(key, |entry| {
            !entries.iter().any(|removed| Arc::ptr_eq(removed, entry))
        })
    }

    fn retain<F>(&mut self, key: &EventKey, keep: F) -> usize
    where
        F: Fn(&Arc<Registration>) -> bool,
    {
        let Some(list) = self.lists.get_mut(key) else {
            return 0;
        };

        let before = list.entries.len();
        list.entries.retain(|entry| keep(entry));
        let removed = before.saturating_sub(list.entries.len());

        if list.entries.is_empty() {
            self.lists.remove(key);
            trace!(event = %key, "Handler list emptied, key removed");
        }

        removed
    }

    /// Remove every key.
    pub(crate) fn clear(&mut self) {
        self.lists.clear();
    }

    /// Copy of a key's entries, or `None` if the key has no handlers.
    pub(crate) fn snapshot(&self, key: &EventKey) -> Option<Snapshot> {
        self.lists.get(key).map(|list| list.entries.clone())
    }

    pub(crate) fn len(&self, key: &EventKey) -> usize {
        self.lists.get(key).map_or(0, |list| list.entries.len())
    }

    pub(crate) fn contains(&self, key: &EventKey) -> bool {
        self.lists
            .get(key)
            .is_some_and(|list| !list.entries.is_empty())
    }

    /// All present keys in the order they were first registered.
    pub(crate) fn keys(&self) -> Vec<EventKey> {
        let mut keys: Vec<(u64, &EventKey)> = self
            .lists
            .iter()
            .map(|(key, list)| (list.seq, key))
            .collect();
        keys.sort_unstable_by_key(|(seq, _)| *seq);
        keys.into_iter().map(|(_, key)| key.clone()).collect()
    }

    pub(crate) fn handlers(&self, key: &EventKey) -> Vec<Handler> {
        self.lists.get(key).map_or_else(Vec::new, |list| {
            list.entries
                .iter()
                .map(|entry| entry.handler.clone())
                .collect()
        })
    }

    pub(crate) fn key_count(&self) -> usize {
        self.lists.len()
    }
}
