use crate::rare_row::{RareRow, RareToCommonCursor};
use crate::token_row::TokenRow;
use common::{IndexResult, PageId, Token};
use hashbrown::HashMap;
use iterkit::ConstCursor;
use pagestore::PageManager;
use skiptree::{Cursor, Node, Row, SkipTree};
use std::cell::RefCell;
use std::rc::Rc;

/// Token occurrence count at or below which a token's postings live in
/// the shared rare tree instead of a tree of their own.
pub const RARE_THRESHOLD: u64 = 50;

/// An inverted index mapping [`Token`]s to sorted collections of rows.
///
/// Tokens with few postings share one "rare" tree, keyed by
/// `(token, row)`, to avoid the per-tree overhead of a whole page file
/// for a handful of rows. Once a token's count exceeds
/// [`RARE_THRESHOLD`] its postings are migrated into a tree of their
/// own, backed by the shared common-token page store and looked up by
/// the root page id recorded on its [`TokenRow`]. Migration copies
/// rows into the new tree but does not remove them from the rare tree:
/// the rare tree keeps dead weight for already-promoted tokens, a
/// trade accepted in exchange for never blocking inserts on a cleanup
/// pass.
pub struct InvertedIndex<T, H, R, C>
where
    T: Row,
    H: PageManager<Node<TokenRow>>,
    R: PageManager<Node<RareRow<T>>>,
    C: PageManager<Node<T>>,
{
    header: SkipTree<TokenRow, H>,
    rare: SkipTree<RareRow<T>, R>,
    common_pm: Rc<RefCell<C>>,
    collections: RefCell<HashMap<Token, SkipTree<T, C>>>,
    rare_threshold: u64,
}

impl<T, H, R, C> InvertedIndex<T, H, R, C>
where
    T: Row,
    H: PageManager<Node<TokenRow>>,
    R: PageManager<Node<RareRow<T>>> + 'static,
    C: PageManager<Node<T>> + 'static,
{
    /// Opens an index over the given page managers, creating a fresh
    /// header and rare tree if `header_pm` reports no existing pages.
    /// Uses [`RARE_THRESHOLD`] as the rare/common promotion boundary; see
    /// [`Self::with_rare_threshold`] to set a different one.
    pub fn new(header_pm: H, rare_pm: R, common_pm: C) -> IndexResult<Self> {
        Self::with_rare_threshold(header_pm, rare_pm, common_pm, RARE_THRESHOLD)
    }

    /// Opens an index, migrating a token's postings out of the rare tree
    /// once its count exceeds `rare_threshold` rather than the default
    /// [`RARE_THRESHOLD`].
    pub fn with_rare_threshold(
        header_pm: H,
        rare_pm: R,
        common_pm: C,
        rare_threshold: u64,
    ) -> IndexResult<Self> {
        let header_empty = header_pm.empty();
        let rare_empty = rare_pm.empty();
        let header_pm = Rc::new(RefCell::new(header_pm));
        let rare_pm = Rc::new(RefCell::new(rare_pm));
        let common_pm = Rc::new(RefCell::new(common_pm));

        let header = if header_empty {
            SkipTree::create(header_pm)?
        } else {
            SkipTree::attach(header_pm, PageId(0))
        };
        let rare = if rare_empty {
            SkipTree::create(rare_pm)?
        } else {
            SkipTree::attach(rare_pm, PageId(0))
        };

        Ok(Self {
            header,
            rare,
            common_pm,
            collections: RefCell::new(HashMap::new()),
            rare_threshold,
        })
    }

    fn collection(&self, token: Token, root: PageId) -> SkipTree<T, C> {
        if let Some(tree) = self.collections.borrow().get(&token) {
            return tree.clone();
        }
        let tree = SkipTree::attach(self.common_pm.clone(), root);
        self.collections.borrow_mut().insert(token, tree.clone());
        tree
    }

    fn new_collection(&self, token: Token) -> IndexResult<SkipTree<T, C>> {
        let tree = SkipTree::create(self.common_pm.clone())?;
        self.collections.borrow_mut().insert(token, tree.clone());
        Ok(tree)
    }

    /// Inserts `row` under `token`, creating the token's header entry on
    /// first use and migrating it out of the rare tree once its count
    /// passes the index's rare threshold.
    pub fn insert(&self, token: Token, row: T) -> IndexResult<()> {
        let query = TokenRow {
            token,
            count: 0,
            root: None,
        };
        let token_row = match self.header.find_and_modify(&query, |tr| tr.count += 1)? {
            Some(tr) => tr,
            None => {
                let tr = TokenRow {
                    token,
                    count: 1,
                    root: None,
                };
                self.header.insert(tr)?;
                tr
            }
        };

        match token_row.root {
            None => {
                self.rare.insert(RareRow { token, row })?;
            }
            Some(root) => {
                self.collection(token, root).insert(row)?;
            }
        }

        if token_row.root.is_none() && token_row.count > self.rare_threshold {
            self.migrate_to_common(token)?;
        }
        Ok(())
    }

    fn migrate_to_common(&self, token: Token) -> IndexResult<()> {
        let tree = self.new_collection(token)?;
        let root = tree.root();
        self.header.find_and_modify(
            &TokenRow {
                token,
                count: 0,
                root: None,
            },
            |tr| tr.root = Some(root),
        )?;
        let rows = self.rare.range(
            &RareRow {
                token,
                row: T::smallest(),
            },
            &RareRow {
                token,
                row: T::largest(),
            },
            None,
        )?;
        for rare_row in rows {
            tree.insert(rare_row.row)?;
        }
        Ok(())
    }

    /// Removes `row` from `token`'s postings. Returns `false` if the
    /// token or row was not present.
    pub fn remove(&self, token: Token, row: T) -> IndexResult<bool> {
        let Some(token_row) = self.header.find(&TokenRow {
            token,
            count: 0,
            root: None,
        })?
        else {
            return Ok(false);
        };
        match token_row.root {
            None => self.rare.remove(&RareRow { token, row }),
            Some(root) => self.collection(token, root).remove(&row),
        }
    }

    /// Every row stored under `token`, in order.
    pub fn all(&self, token: Token) -> IndexResult<Vec<T>> {
        self.range(token, &T::smallest(), &T::largest(), None)
    }

    /// Rows for `token` on the interval `[low, high)`.
    pub fn range(
        &self,
        token: Token,
        low: &T,
        high: &T,
        reserve: Option<usize>,
    ) -> IndexResult<Vec<T>> {
        let Some(token_row) = self.header.find(&TokenRow {
            token,
            count: 0,
            root: None,
        })?
        else {
            return Ok(Vec::new());
        };
        match token_row.root {
            None => {
                let rows = self.rare.range(
                    &RareRow {
                        token,
                        row: low.clone(),
                    },
                    &RareRow {
                        token,
                        row: high.clone(),
                    },
                    reserve,
                )?;
                Ok(rows.into_iter().map(|r| r.row).collect())
            }
            Some(root) => self.collection(token, root).range(low, high, reserve),
        }
    }

    /// A cursor over every row stored under `token`. Tokens that have
    /// never been inserted read as permanently exhausted.
    pub fn iterator(&self, token: Token) -> Box<dyn Cursor<T>> {
        self.iterator_from(token, T::smallest())
    }

    /// A cursor over `token`'s rows starting from `lower_bound`.
    pub fn iterator_from(&self, token: Token, lower_bound: T) -> Box<dyn Cursor<T>> {
        let Some(token_row) = self
            .header
            .find(&TokenRow {
                token,
                count: 0,
                root: None,
            })
            .expect("page store error while resolving token header")
        else {
            return Box::new(ConstCursor::largest());
        };
        match token_row.root {
            None => {
                let inner = self.rare.iterator(
                    RareRow {
                        token,
                        row: lower_bound,
                    },
                    RareRow {
                        token,
                        row: T::largest(),
                    },
                );
                Box::new(RareToCommonCursor::new(token, inner))
            }
            Some(root) => Box::new(
                self.collection(token, root)
                    .iterator(lower_bound, T::largest()),
            ),
        }
    }

    /// Number of rows stored under `token`, or 0 if it was never
    /// inserted.
    pub fn count(&self, token: Token) -> IndexResult<u64> {
        Ok(self
            .header
            .find(&TokenRow {
                token,
                count: 0,
                root: None,
            })?
            .map(|tr| tr.count)
            .unwrap_or(0))
    }

    pub fn flush(&self) -> IndexResult<()> {
        self.header.flush()?;
        self.rare.flush()?;
        self.common_pm.borrow_mut().flush()
    }

    pub fn commit(&self) -> IndexResult<()> {
        self.header.commit()?;
        self.rare.commit()?;
        self.common_pm.borrow_mut().commit()
    }

    pub fn current_memory_used(&self) -> usize {
        self.common_pm.borrow().current_memory_used()
    }
}
