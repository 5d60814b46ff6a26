//! A disk-backed, B+-tree-shaped ordered collection ("skip tree").
//!
//! Internal nodes record each child's *minimum* row rather than a
//! separator key, and leaves are chained left-to-right for cheap
//! in-order and range scans. Split policy halves an overfull node;
//! remove policy merges or redistributes an underfull node against its
//! left sibling when possible, otherwise its right sibling.

mod cursor;
mod node;
mod tree;

pub use cursor::{Cursor, SkipTreeCursor};
pub use node::{Node, NodeBody, INTERNAL_CAPACITY, LEAF_CAPACITY, MIN_INTERNAL_FILL, MIN_LEAF_FILL};
pub use tree::SkipTree;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Capability a type needs to live in a [`SkipTree`]. `Ord`/`Eq` define
/// both the tree's sort order and what counts as "the same row" for
/// insert/find; a type that wants unique keys with mutable payload
/// fields (like a key-value row) implements `Ord`/`Eq` over the key only
/// and overrides `overwrite_from` to update the payload in place.
pub trait Row: Clone + Debug + Ord + Eq + Serialize + DeserializeOwned + Send + Sync + 'static {
    fn smallest() -> Self;
    fn largest() -> Self;
    /// The successor of this row in whatever domain it represents.
    /// Composite integer rows typically bump their leading field.
    fn next(&self) -> Self;

    /// Called when `insert` finds a row that already compares equal to
    /// the one being inserted. Default behavior replaces the whole row;
    /// a unique-key row overrides this to copy only its payload fields,
    /// since its key is by definition already correct.
    fn overwrite_from(&mut self, other: &Self) {
        *self = other.clone();
    }
}
