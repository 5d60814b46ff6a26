use crate::node::NodeBody;
use crate::tree::SkipTree;
use crate::{Node, Row};
use pagestore::PageManager;

/// Uniform read cursor over a sorted stream of rows. Every composed
/// operator in `iterkit` consumes trees of these.
///
/// `skip_to`/`next` don't return `Result`: a failure while navigating
/// pages is a page-store contract violation or disk I/O error, both of
/// which are fatal at this layer (matching the original engine, whose
/// iterator interface has no error path either). `SkipTreeCursor` turns
/// page-store errors into panics at the point they'd be detected.
pub trait Cursor<T: Row> {
    fn current(&self) -> T;
    fn skip_to(&mut self, v: T) -> T;
    fn next(&mut self) -> T;
}

/// Cursor over one [`SkipTree`], bounded to `[low, high)` at construction
/// time (values at or past `high` read as `Row::largest()`, the
/// exhausted-cursor sentinel).
pub struct SkipTreeCursor<T: Row, M: PageManager<Node<T>>> {
    tree: SkipTree<T, M>,
    high: T,
    current: T,
    loc: Option<(Node<T>, usize)>,
}

impl<T: Row, M: PageManager<Node<T>>> SkipTreeCursor<T, M> {
    pub fn new(tree: SkipTree<T, M>, low: T, high: T) -> Self {
        let mut cursor = Self {
            tree,
            high,
            current: T::largest(),
            loc: None,
        };
        cursor.skip_to(low);
        cursor
    }
}

impl<T: Row, M: PageManager<Node<T>>> Cursor<T> for SkipTreeCursor<T, M> {
    fn current(&self) -> T {
        self.current.clone()
    }

    fn skip_to(&mut self, v: T) -> T {
        self.loc = self
            .tree
            .lower_bound(&v)
            .expect("page store error during cursor navigation");
        self.current = match &self.loc {
            Some((leaf, idx)) => {
                let NodeBody::Leaf(rows) = &leaf.body else {
                    unreachable!()
                };
                let row = rows[*idx].clone();
                if row < self.high {
                    row
                } else {
                    T::largest()
                }
            }
            None => T::largest(),
        };
        self.current.clone()
    }

    fn next(&mut self) -> T {
        let Some((leaf, idx)) = self.loc.take() else {
            self.current = T::largest();
            return self.current.clone();
        };
        let mut leaf = leaf;
        let mut idx = idx + 1;
        if idx >= leaf.len() {
            match leaf.next {
                Some(next_id) => {
                    leaf = self
                        .tree
                        .pm
                        .borrow_mut()
                        .load_page(next_id)
                        .expect("page store error during cursor navigation");
                    idx = 0;
                }
                None => {
                    self.loc = None;
                    self.current = T::largest();
                    return self.current.clone();
                }
            }
        }
        let NodeBody::Leaf(rows) = &leaf.body else {
            unreachable!()
        };
        let row = rows[idx].clone();
        self.current = if row < self.high {
            row
        } else {
            T::largest()
        };
        self.loc = Some((leaf, idx));
        self.current.clone()
    }
}
