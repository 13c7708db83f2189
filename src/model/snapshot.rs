//! # Snapshot: the complete set of one entity kind as of one poll.
//!
//! Keeps the listing order (events are emitted in listing order) and an id index
//! for membership checks. Ids are unique: a listing that repeats an id keeps the
//! first occurrence.

use std::collections::HashMap;

use super::Entity;

/// Id-unique, order-preserving collection of entities of one kind.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T: Entity> Snapshot<T> {
    /// Builds a snapshot from a raw listing, dropping repeated ids.
    pub fn from_listing(listing: Vec<T>) -> Self {
        let mut items = Vec::with_capacity(listing.len());
        let mut index = HashMap::with_capacity(listing.len());

        for item in listing {
            if index.contains_key(item.id()) {
                tracing::debug!(id = item.id(), "duplicate id in listing, keeping first");
                continue;
            }
            index.insert(item.id().to_string(), items.len());
            items.push(item);
        }

        Self { items, index }
    }

    /// Entities in listing order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Looks up an entity by id.
    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&i| &self.items[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Entity> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Entity> FromIterator<T> for Snapshot<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_listing(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Node;

    fn node(id: &str, state: &str) -> Node {
        Node {
            id: id.into(),
            state: state.into(),
            ..Node::default()
        }
    }

    #[test]
    fn repeated_ids_keep_first_occurrence() {
        let snap = Snapshot::from_listing(vec![
            node("a", "ready"),
            node("b", "ready"),
            node("a", "down"),
        ]);
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.get("a").map(|n| n.state.as_str()), Some("ready"));
        assert_eq!(snap.items()[1].id, "b");
    }

    #[test]
    fn empty_listing_gives_empty_snapshot() {
        let snap: Snapshot<Node> = Snapshot::from_listing(Vec::new());
        assert!(snap.is_empty());
        assert!(!snap.contains("a"));
    }
}
