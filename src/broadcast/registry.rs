//! # Subscriber registry.
//!
//! Ordered collection of live subscribers. Not synchronized by itself: the
//! broadcaster keeps it behind a single mutex.
//!
//! ## Rules
//! - Ids are unique within the registry.
//! - Eviction removes by position in **descending** index order with
//!   `swap_remove`, so removing one entry never shifts an index still to be
//!   removed. Survivor order is therefore not preserved.
//! - Stale or duplicate indices in an eviction batch are ignored.
//! - `drain` closes the registry for good; later pushes are handed back.

use super::subscriber::{Subscriber, SubscriberId};

/// One registered subscriber.
pub struct Entry {
    pub id: SubscriberId,
    pub sub: Box<dyn Subscriber>,
}

/// Live subscribers, in registration order until the first eviction.
#[derive(Default)]
pub struct Registry {
    entries: Vec<Entry>,
    closed: bool,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscriber, or hands it back once the registry is closed.
    pub fn push(
        &mut self,
        id: SubscriberId,
        sub: Box<dyn Subscriber>,
    ) -> Result<(), Box<dyn Subscriber>> {
        if self.closed {
            return Err(sub);
        }
        self.entries.push(Entry { id, sub });
        Ok(())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entry> {
        self.entries.iter_mut()
    }

    /// Removes the entries at `marked` positions and returns them.
    ///
    /// Returned entries are in descending original index order.
    pub fn evict(&mut self, mut marked: Vec<usize>) -> Vec<Entry> {
        marked.sort_unstable_by(|a, b| b.cmp(a));
        marked.dedup();

        let mut evicted = Vec::with_capacity(marked.len());
        for idx in marked {
            if idx < self.entries.len() {
                evicted.push(self.entries.swap_remove(idx));
            }
        }
        evicted
    }

    /// Removes every entry and closes the registry.
    pub fn drain(&mut self) -> Vec<Entry> {
        self.closed = true;
        std::mem::take(&mut self.entries)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<SubscriberId> {
        self.entries.iter().map(|e| e.id).collect()
    }
}
