//! Shared group-and-merge kernel behind the course, instructor and subject
//! aggregators.
//!
//! Upstream items are visited in their canonical order. The first item with a
//! new key seeds an entity; later items with the same key merge into it. The
//! finished collection is sorted by key, which reorders entities but never
//! touches the back-reference arrays they carry.

use std::hash::Hash;

use indexmap::IndexMap;
use indexmap::map::Entry;

/// An entity built by grouping upstream items on a dedup key.
pub trait Aggregate: Sized {
    /// Upstream record type.
    type Item;
    /// Dedup key; exact match, ordered for the final sort.
    type Key: Hash + Eq + Ord;
    /// Extra read-only input needed to seed an entity.
    type Context: ?Sized;

    fn key(item: &Self::Item) -> Self::Key;

    /// Build a new entity from the first item with its key, at `idx`.
    fn seed(item: &Self::Item, idx: usize, ctx: &Self::Context) -> Self;

    /// Fold a later item with the same key, at `idx`, into this entity.
    fn merge(&mut self, item: &Self::Item, idx: usize);
}

/// Group `items` into entities, one per key, sorted by key.
pub fn aggregate<A: Aggregate>(items: &[A::Item], ctx: &A::Context) -> Vec<A> {
    let mut groups: IndexMap<A::Key, A> = IndexMap::new();

    for (idx, item) in items.iter().enumerate() {
        match groups.entry(A::key(item)) {
            Entry::Occupied(mut entry) => entry.get_mut().merge(item, idx),
            Entry::Vacant(entry) => {
                entry.insert(A::seed(item, idx, ctx));
            }
        }
    }

    groups.sort_keys();
    groups.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Bucket {
        key: char,
        idxs: Vec<usize>,
    }

    impl Aggregate for Bucket {
        type Item = char;
        type Key = char;
        type Context = ();

        fn key(item: &char) -> char {
            *item
        }

        fn seed(item: &char, idx: usize, _ctx: &()) -> Self {
            Self {
                key: *item,
                idxs: vec![idx],
            }
        }

        fn merge(&mut self, _item: &char, idx: usize) {
            self.idxs.push(idx);
        }
    }

    #[test]
    fn groups_in_encounter_order_and_sorts_by_key() {
        let items = ['c', 'a', 'c', 'b', 'a'];
        let buckets: Vec<Bucket> = aggregate(&items, &());
        assert_eq!(
            buckets,
            vec![
                Bucket { key: 'a', idxs: vec![1, 4] },
                Bucket { key: 'b', idxs: vec![3] },
                Bucket { key: 'c', idxs: vec![0, 2] },
            ]
        );
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let buckets = aggregate::<Bucket>(&[], &());
        assert!(buckets.is_empty());
    }
}
