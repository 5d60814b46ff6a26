//! Concrete row types for use with [`skiptree::SkipTree`] and the
//! [`iterkit`] cursor algebra.

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use skiptree::Row;
use std::cmp::Ordering;

/// A bare `u64`, ordered and compared on its whole value. Used for plain
/// sets of document ids with no attached payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocRow(pub u64);

impl Row for DocRow {
    fn smallest() -> Self {
        DocRow(0)
    }
    fn largest() -> Self {
        DocRow(u64::MAX)
    }
    fn next(&self) -> Self {
        DocRow(self.0 + 1)
    }
}

/// A `(docid, value)` pair ordered lexicographically by `docid` then
/// `value`, so a single posting list can hold more than one value per
/// document (e.g. successive term positions).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairRow {
    pub docid: u32,
    pub value: u32,
}

impl PairRow {
    pub fn make(docid: u32, value: u32) -> Self {
        Self { docid, value }
    }
}

impl Row for PairRow {
    fn smallest() -> Self {
        PairRow { docid: 0, value: 0 }
    }
    fn largest() -> Self {
        PairRow {
            docid: u32::MAX,
            value: u32::MAX,
        }
    }
    fn next(&self) -> Self {
        PairRow {
            docid: self.docid + 1,
            value: 0,
        }
    }
}

/// A `(key, value)` pair where order and equality consider only `key`, so
/// a tree of these rows holds at most one row per key. `value` can be
/// updated in place via [`Row::overwrite_from`] without disturbing the
/// tree's sort order.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct KeyValueRow {
    pub key: u64,
    pub value: u64,
}

impl KeyValueRow {
    pub fn make(key: u64, value: u64) -> Self {
        Self { key, value }
    }
}

impl PartialEq for KeyValueRow {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for KeyValueRow {}

impl PartialOrd for KeyValueRow {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyValueRow {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl Row for KeyValueRow {
    fn smallest() -> Self {
        KeyValueRow { key: 0, value: 0 }
    }
    fn largest() -> Self {
        KeyValueRow {
            key: u64::MAX,
            value: u64::MAX,
        }
    }
    fn next(&self) -> Self {
        KeyValueRow {
            key: self.key + 1,
            value: 0,
        }
    }
    fn overwrite_from(&mut self, other: &Self) {
        self.value = other.value;
    }
}

impl iterkit::KeyValueRow for KeyValueRow {
    type Value = u64;
    fn key(&self) -> u64 {
        self.key
    }
    fn value(&self) -> u64 {
        self.value
    }
    fn make(key: u64, value: u64) -> Self {
        KeyValueRow { key, value }
    }
    fn value_sentinel() -> u64 {
        0
    }
}
