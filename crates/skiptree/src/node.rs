//! Page payload for a [`crate::SkipTree`]: either a leaf of sorted rows or
//! an internal node of (child minimum, child id) pairs.

use crate::Row;
use common::PageId;
use serde::{Deserialize, Serialize};

/// Capacity and minimum fill are the same for leaf and internal nodes,
/// matching the original engine's `kLeafSize`/`kNodeSize` constants.
pub const LEAF_CAPACITY: usize = 32;
pub const INTERNAL_CAPACITY: usize = 32;
pub const MIN_LEAF_FILL: usize = 16;
pub const MIN_INTERNAL_FILL: usize = 16;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum NodeBody<T> {
    Leaf(Vec<T>),
    Internal { rows: Vec<T>, children: Vec<PageId> },
}

/// One page's worth of a skip tree: either a leaf of rows or an internal
/// fan-out node. `depth` is 0 for a leaf; `next` chains leaves (and, as a
/// side effect of how splits propagate, same-depth internal nodes) left
/// to right for fast range scans.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node<T> {
    pub depth: u16,
    pub id: PageId,
    pub next: Option<PageId>,
    pub body: NodeBody<T>,
}

impl<T: Row> Node<T> {
    pub fn is_leaf(&self) -> bool {
        self.depth == 0
    }

    pub fn len(&self) -> usize {
        match &self.body {
            NodeBody::Leaf(rows) => rows.len(),
            NodeBody::Internal { rows, .. } => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The smallest row reachable under this node, used by the parent as
    /// this child's separator.
    pub fn min_row(&self) -> T {
        match &self.body {
            NodeBody::Leaf(rows) => rows[0].clone(),
            NodeBody::Internal { rows, .. } => rows[0].clone(),
        }
    }

    pub fn is_full(&self) -> bool {
        let cap = if self.is_leaf() {
            LEAF_CAPACITY
        } else {
            INTERNAL_CAPACITY
        };
        self.len() >= cap
    }

    pub fn is_too_small(&self) -> bool {
        let min_fill = if self.is_leaf() {
            MIN_LEAF_FILL
        } else {
            MIN_INTERNAL_FILL
        };
        self.len() < min_fill
    }
}
