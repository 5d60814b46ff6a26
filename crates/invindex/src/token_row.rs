use common::Token;
use serde::{Deserialize, Serialize};
use skiptree::Row;
use std::cmp::Ordering;

/// Header row: one per token ever inserted, recording how many rows it
/// has and where its postings live. `root` is `None` while the token is
/// still small enough to share the rare tree.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TokenRow {
    pub token: Token,
    pub count: u64,
    pub root: Option<common::PageId>,
}

impl PartialEq for TokenRow {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
    }
}

impl Eq for TokenRow {}

impl PartialOrd for TokenRow {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TokenRow {
    fn cmp(&self, other: &Self) -> Ordering {
        self.token.cmp(&other.token)
    }
}

impl Row for TokenRow {
    fn smallest() -> Self {
        TokenRow {
            token: 0,
            count: 0,
            root: None,
        }
    }
    fn largest() -> Self {
        TokenRow {
            token: Token::MAX,
            count: 0,
            root: None,
        }
    }
    fn next(&self) -> Self {
        TokenRow {
            token: self.token + 1,
            count: 0,
            root: None,
        }
    }
    fn overwrite_from(&mut self, other: &Self) {
        self.count = other.count;
        self.root = other.root;
    }
}
