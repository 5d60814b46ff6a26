//! Top-level facade: a disk-backed inverted index plus the composed
//! cursor operations (`intersect`, `generalized_intersect`,
//! `union_iterator`, `kv_union`) applications actually query with.

#[cfg(test)]
mod tests;

use common::{Config, IndexResult, Token};
use invindex::{InvertedIndex, RareRow, TokenRow};
use iterkit::{GeneralIntersectionCursor, IntersectionCursor, KeyValueRow, KvUnionCursor, NegatableCursor, UnionCursor};
use pagestore::DiskPageManager;
use skiptree::{Cursor, Node, Row};
use std::path::Path;

/// A disk-backed inverted index over rows of type `T`.
///
/// Opening `name` creates (or attaches to) three files: `<name>` holding
/// the per-token posting pages, `<name>.tokens` holding the token header
/// tree, and `<name>.rare` holding the shared rare-token tree. Each of
/// those carries its own `.header` free-list sidecar
/// (`<name>.tokens.header`, `<name>.rare.header`), distinct from the
/// `<name>.header` tree file itself.
pub struct Index<T: Row> {
    inner: InvertedIndex<
        T,
        DiskPageManager<Node<TokenRow>>,
        DiskPageManager<Node<RareRow<T>>>,
        DiskPageManager<Node<T>>,
    >,
}

impl<T: Row> Index<T> {
    /// Opens the index rooted at `name` under [`Config::default`]'s data
    /// directory, creating its files if they do not already exist.
    pub fn open(name: impl AsRef<Path>) -> IndexResult<Self> {
        Self::open_with_config(name, &Config::default())
    }

    /// Opens the index rooted at `name` under `config.data_dir` (if `name`
    /// is itself absolute, `data_dir` is ignored), using `config.page_size`
    /// for every page file and `config.rare_threshold` as the rare/common
    /// promotion boundary.
    pub fn open_with_config(name: impl AsRef<Path>, config: &Config) -> IndexResult<Self> {
        let base = config.data_dir.join(name.as_ref());
        let header_path = append_suffix(&base, ".tokens");
        let rare_path = append_suffix(&base, ".rare");

        let header_pm = open_or_create::<Node<TokenRow>>(&header_path, config.page_size)?;
        let rare_pm = open_or_create::<Node<RareRow<T>>>(&rare_path, config.page_size)?;
        let common_pm = open_or_create::<Node<T>>(&base, config.page_size)?;

        Ok(Self {
            inner: InvertedIndex::with_rare_threshold(header_pm, rare_pm, common_pm, config.rare_threshold)?,
        })
    }

    pub fn insert(&self, token: Token, row: T) -> IndexResult<()> {
        self.inner.insert(token, row)
    }

    pub fn remove(&self, token: Token, row: T) -> IndexResult<bool> {
        self.inner.remove(token, row)
    }

    pub fn count(&self, token: Token) -> IndexResult<u64> {
        self.inner.count(token)
    }

    /// A cursor over `token`'s rows starting from `lower_bound`.
    pub fn iterator(&self, token: Token, lower_bound: T) -> Box<dyn Cursor<T>> {
        self.inner.iterator_from(token, lower_bound)
    }

    /// Rows present under every one of `tokens`, starting from
    /// `lower_bound`, capped at `limit` results.
    pub fn intersect(
        &self,
        tokens: &[Token],
        lower_bound: T,
        limit: usize,
    ) -> IndexResult<Vec<T>> {
        let cursors: Vec<Box<dyn Cursor<T>>> = tokens
            .iter()
            .map(|t| self.inner.iterator_from(*t, T::smallest()))
            .collect();
        let mut cursor = IntersectionCursor::new(cursors)?;
        cursor.skip_to(lower_bound);
        Ok(fetch_many(&mut cursor, limit))
    }

    /// Rows present under every non-negated token in `ops` and absent
    /// from every negated one, starting from `lower_bound`, capped at
    /// `limit` results.
    pub fn generalized_intersect(
        &self,
        ops: &[(Token, bool)],
        lower_bound: T,
        limit: usize,
    ) -> IndexResult<Vec<T>> {
        let children = ops
            .iter()
            .map(|(token, negated)| {
                NegatableCursor::new(self.inner.iterator_from(*token, lower_bound.clone()), *negated)
            })
            .collect();
        let mut cursor = GeneralIntersectionCursor::new(children)?;
        Ok(fetch_many(&mut cursor, limit))
    }

    /// A cursor over the union of `tokens`' rows, starting from
    /// `lower_bound`.
    pub fn union_iterator(
        &self,
        tokens: &[Token],
        lower_bound: T,
    ) -> IndexResult<Box<dyn Cursor<T>>> {
        let cursors: Vec<Box<dyn Cursor<T>>> = tokens
            .iter()
            .map(|t| self.inner.iterator_from(*t, T::smallest()))
            .collect();
        let mut cursor = UnionCursor::new(cursors)?;
        cursor.skip_to(lower_bound);
        Ok(Box::new(cursor))
    }

    pub fn flush(&self) -> IndexResult<()> {
        self.inner.flush()
    }

    pub fn commit(&self) -> IndexResult<()> {
        self.inner.commit()
    }
}

impl<T: KeyValueRow> Index<T> {
    /// For each key present under any of `tokens`, every token's value
    /// at that key (or its sentinel if absent there).
    pub fn kv_union(&self, tokens: &[Token]) -> IndexResult<Vec<(u64, Vec<T::Value>)>> {
        let cursors: Vec<Box<dyn Cursor<T>>> = tokens.iter().map(|t| self.inner.iterator(*t)).collect();
        let mut cursor = KvUnionCursor::new(cursors)?;
        let mut out = Vec::new();
        let mut current = cursor.current();
        while current.0 != u64::MAX {
            out.push(current.clone());
            current = cursor.next();
        }
        Ok(out)
    }
}

/// Drains `cursor` into a `Vec`, stopping at exhaustion or `limit`
/// results, whichever comes first.
pub fn fetch_many<T: Row>(cursor: &mut dyn Cursor<T>, limit: usize) -> Vec<T> {
    let mut out = Vec::new();
    let mut v = cursor.current();
    while v != T::largest() && out.len() < limit {
        out.push(v.clone());
        v = cursor.next();
    }
    out
}

fn append_suffix(path: &Path, suffix: &str) -> std::path::PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(suffix);
    std::path::PathBuf::from(s)
}

fn open_or_create<N: Clone + serde::Serialize + serde::de::DeserializeOwned>(
    path: &Path,
    page_size: usize,
) -> IndexResult<DiskPageManager<N>> {
    if path.exists() {
        DiskPageManager::open(path, page_size)
    } else {
        DiskPageManager::create(path, page_size)
    }
}
