use common::Token;
use pagestore::PageManager;
use serde::{Deserialize, Serialize};
use skiptree::{Cursor, Node, Row, SkipTreeCursor};
use std::cmp::Ordering;

/// A row sharing the single "rare tokens" tree, ordered first by token
/// then by the wrapped row, so every rare token's postings occupy a
/// contiguous range of the tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct RareRow<T: Row> {
    pub token: Token,
    pub row: T,
}

impl<T: Row> PartialEq for RareRow<T> {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token && self.row == other.row
    }
}

impl<T: Row> Eq for RareRow<T> {}

impl<T: Row> PartialOrd for RareRow<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Row> Ord for RareRow<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.token.cmp(&other.token).then_with(|| self.row.cmp(&other.row))
    }
}

impl<T: Row> Row for RareRow<T> {
    fn smallest() -> Self {
        RareRow {
            token: 0,
            row: T::smallest(),
        }
    }
    fn largest() -> Self {
        RareRow {
            token: Token::MAX,
            row: T::largest(),
        }
    }
    fn next(&self) -> Self {
        RareRow {
            token: self.token,
            row: self.row.next(),
        }
    }
}

/// Adapts a [`SkipTreeCursor`] over the shared rare tree, fixed to one
/// token, into a plain `Cursor<T>` over that token's rows.
pub struct RareToCommonCursor<T: Row, M: PageManager<Node<RareRow<T>>>> {
    token: Token,
    inner: SkipTreeCursor<RareRow<T>, M>,
}

impl<T: Row, M: PageManager<Node<RareRow<T>>>> RareToCommonCursor<T, M> {
    pub fn new(token: Token, inner: SkipTreeCursor<RareRow<T>, M>) -> Self {
        Self { token, inner }
    }
}

impl<T: Row, M: PageManager<Node<RareRow<T>>>> Cursor<T> for RareToCommonCursor<T, M> {
    fn current(&self) -> T {
        self.inner.current().row
    }

    fn skip_to(&mut self, row: T) -> T {
        self.inner
            .skip_to(RareRow {
                token: self.token,
                row,
            })
            .row
    }

    fn next(&mut self) -> T {
        self.inner.next().row
    }
}
