use crate::cursor::SkipTreeCursor;
use crate::node::{Node, NodeBody};
use crate::Row;
use common::{IndexResult, PageId};
use pagestore::PageManager;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

/// Index into `rows` of the rightmost entry `<= query`, clamped to 0.
/// Since every internal row is the minimum of the subtree it labels,
/// this is always the subtree that can contain `query`.
fn child_index<T: Ord>(rows: &[T], query: &T) -> usize {
    rows.partition_point(|r| r <= query).saturating_sub(1)
}

/// A skip tree over rows of type `T`, backed by page manager `M`.
///
/// `root` never changes after construction: growing the tree by a level
/// or demoting it rewrites the root page's *contents* in place. That
/// makes `SkipTree` cheap to clone (an `Rc` bump and a `Copy` of the
/// root id) and lets every operation take `&self`, with mutation routed
/// through the page manager's interior mutability.
pub struct SkipTree<T: Row, M: PageManager<Node<T>>> {
    root: PageId,
    pub(crate) pm: Rc<RefCell<M>>,
    _marker: PhantomData<T>,
}

impl<T: Row, M: PageManager<Node<T>>> Clone for SkipTree<T, M> {
    fn clone(&self) -> Self {
        Self {
            root: self.root,
            pm: self.pm.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Row, M: PageManager<Node<T>>> SkipTree<T, M> {
    /// Create a fresh tree with a new, empty root leaf.
    pub fn create(pm: Rc<RefCell<M>>) -> IndexResult<Self> {
        let placeholder = Node {
            depth: 0,
            id: PageId(0),
            next: None,
            body: NodeBody::Leaf(Vec::new()),
        };
        let id = pm.borrow_mut().new_page(placeholder.clone())?;
        let root = Node { id, ..placeholder };
        pm.borrow_mut().write_page(id, root)?;
        Ok(Self {
            root: id,
            pm,
            _marker: PhantomData,
        })
    }

    /// Attach to an existing tree whose root page is already populated.
    pub fn attach(pm: Rc<RefCell<M>>, root: PageId) -> Self {
        Self {
            root,
            pm,
            _marker: PhantomData,
        }
    }

    pub fn root(&self) -> PageId {
        self.root
    }

    fn create_node(&self, depth: u16) -> IndexResult<Node<T>> {
        let body = if depth == 0 {
            NodeBody::Leaf(Vec::new())
        } else {
            NodeBody::Internal {
                rows: Vec::new(),
                children: Vec::new(),
            }
        };
        let placeholder = Node {
            depth,
            id: PageId(0),
            next: None,
            body,
        };
        let id = self.pm.borrow_mut().new_page(placeholder.clone())?;
        let node = Node { id, ..placeholder };
        self.pm.borrow_mut().write_page(id, node.clone())?;
        Ok(node)
    }

    /// Inserts `row`, returning `true` if it was new and `false` if an
    /// equal row already existed (and was updated via `overwrite_from`).
    pub fn insert(&self, row: T) -> IndexResult<bool> {
        let root = self.pm.borrow_mut().load_page(self.root)?;
        let inserted = self.insert_rec(&root, row)?;
        let root = self.pm.borrow_mut().load_page(self.root)?;
        if root.is_full() {
            self.grow_root(root)?;
        }
        Ok(inserted)
    }

    fn insert_into_leaf(&self, id: PageId, row: T) -> IndexResult<bool> {
        let mut node = self.pm.borrow_mut().load_and_modify_page(id)?;
        let NodeBody::Leaf(rows) = &mut node.body else {
            unreachable!("insert_into_leaf called on an internal node")
        };
        let inserted = match rows.binary_search(&row) {
            Ok(idx) => {
                rows[idx].overwrite_from(&row);
                false
            }
            Err(idx) => {
                rows.insert(idx, row);
                true
            }
        };
        self.pm.borrow_mut().write_page(id, node)?;
        Ok(inserted)
    }

    fn insert_rec(&self, node: &Node<T>, row: T) -> IndexResult<bool> {
        if node.is_leaf() {
            return self.insert_into_leaf(node.id, row);
        }
        let NodeBody::Internal { rows, children } = &node.body else {
            unreachable!()
        };
        let idx = child_index(rows, &row);
        let child_id = children[idx];
        let separator = rows[idx].clone();

        let child = self.pm.borrow_mut().load_page(child_id)?;
        let result = self.insert_rec(&child, row)?;
        let child = self.pm.borrow_mut().load_page(child_id)?;

        if child.min_row() != separator {
            let mut parent = self.pm.borrow_mut().load_and_modify_page(node.id)?;
            if let NodeBody::Internal { rows, .. } = &mut parent.body {
                rows[idx] = child.min_row();
            }
            self.pm.borrow_mut().write_page(node.id, parent)?;
        }

        if child.is_full() {
            let parent = self.pm.borrow_mut().load_and_modify_page(node.id)?;
            let child = self.pm.borrow_mut().load_and_modify_page(child_id)?;
            self.split(parent, child, idx)?;
        }

        Ok(result)
    }

    fn split(&self, mut parent: Node<T>, mut child: Node<T>, idx: usize) -> IndexResult<()> {
        let mut new_child = self.create_node(child.depth)?;
        let left_n = child.len() / 2;

        match &mut child.body {
            NodeBody::Leaf(rows) => {
                new_child.body = NodeBody::Leaf(rows.split_off(left_n));
            }
            NodeBody::Internal { rows, children } => {
                let right_rows = rows.split_off(left_n);
                let right_children = children.split_off(left_n);
                new_child.body = NodeBody::Internal {
                    rows: right_rows,
                    children: right_children,
                };
            }
        }
        new_child.next = child.next;
        child.next = Some(new_child.id);

        let child_min = child.min_row();
        let new_child_min = new_child.min_row();

        self.pm.borrow_mut().write_page(child.id, child.clone())?;
        self.pm
            .borrow_mut()
            .write_page(new_child.id, new_child.clone())?;

        if let NodeBody::Internal { rows, children } = &mut parent.body {
            rows[idx] = child_min;
            rows.insert(idx + 1, new_child_min);
            children.insert(idx + 1, new_child.id);
        }
        self.pm.borrow_mut().write_page(parent.id, parent)?;
        Ok(())
    }

    fn grow_root(&self, root: Node<T>) -> IndexResult<()> {
        let mut child = self.create_node(root.depth)?;
        child.body = root.body.clone();
        child.next = root.next;
        self.pm.borrow_mut().write_page(child.id, child.clone())?;

        let new_root = Node {
            depth: root.depth + 1,
            id: root.id,
            next: None,
            body: NodeBody::Internal {
                rows: vec![child.min_row()],
                children: vec![child.id],
            },
        };
        self.pm.borrow_mut().write_page(root.id, new_root.clone())?;
        self.split(new_root, child, 0)
    }

    /// Removes a row equal to `row`. Returns `true` if it was present.
    pub fn remove(&self, row: &T) -> IndexResult<bool> {
        let root = self.pm.borrow_mut().load_page(self.root)?;
        let removed = self.remove_rec(&root, row)?;
        let root = self.pm.borrow_mut().load_page(self.root)?;
        if root.len() == 1 && !root.is_leaf() {
            self.demote_root(root)?;
        }
        Ok(removed)
    }

    fn demote_root(&self, root: Node<T>) -> IndexResult<()> {
        let NodeBody::Internal { children, .. } = &root.body else {
            return Ok(());
        };
        let child_id = children[0];
        let child = self.pm.borrow_mut().load_and_modify_page(child_id)?;
        let new_root = Node {
            depth: child.depth,
            id: root.id,
            next: None,
            body: child.body.clone(),
        };
        self.pm.borrow_mut().write_page(root.id, new_root)?;
        self.pm.borrow_mut().delete_page(child_id)?;
        Ok(())
    }

    fn remove_rec(&self, node: &Node<T>, row: &T) -> IndexResult<bool> {
        if node.is_leaf() {
            let mut leaf = self.pm.borrow_mut().load_and_modify_page(node.id)?;
            let NodeBody::Leaf(rows) = &mut leaf.body else {
                unreachable!()
            };
            let removed = match rows.binary_search(row) {
                Ok(idx) => {
                    rows.remove(idx);
                    true
                }
                Err(_) => false,
            };
            self.pm.borrow_mut().write_page(node.id, leaf)?;
            return Ok(removed);
        }

        let NodeBody::Internal { rows, children } = &node.body else {
            unreachable!()
        };
        let idx = child_index(rows, row);
        let separator = rows[idx].clone();
        let child_id = children[idx];

        let child = self.pm.borrow_mut().load_page(child_id)?;
        let result = self.remove_rec(&child, row)?;
        let child = self.pm.borrow_mut().load_page(child_id)?;

        if child.is_too_small() {
            let parent = self.pm.borrow_mut().load_and_modify_page(node.id)?;
            self.handle_too_small_child(parent, idx)?;
        } else if child.min_row() != separator {
            let mut parent = self.pm.borrow_mut().load_and_modify_page(node.id)?;
            if let NodeBody::Internal { rows, .. } = &mut parent.body {
                rows[idx] = child.min_row();
            }
            self.pm.borrow_mut().write_page(node.id, parent)?;
        }

        Ok(result)
    }

    fn handle_too_small_child(&self, parent: Node<T>, idx: usize) -> IndexResult<()> {
        let NodeBody::Internal { children, .. } = &parent.body else {
            unreachable!()
        };
        let (left_idx, left_id, right_id) = if idx != 0 {
            (idx - 1, children[idx - 1], children[idx])
        } else {
            (idx, children[idx], children[idx + 1])
        };

        let left = self.pm.borrow_mut().load_and_modify_page(left_id)?;
        let right = self.pm.borrow_mut().load_and_modify_page(right_id)?;
        let min_fill = if left.is_leaf() {
            crate::node::MIN_LEAF_FILL
        } else {
            crate::node::MIN_INTERNAL_FILL
        };

        if left.len() + right.len() < 2 * min_fill {
            self.merge(parent, left, right, left_idx)
        } else {
            self.rebalance(parent, left, right, left_idx)
        }
    }

    fn merge(
        &self,
        mut parent: Node<T>,
        mut left: Node<T>,
        right: Node<T>,
        left_idx: usize,
    ) -> IndexResult<()> {
        let right_id = right.id;
        let right_next = right.next;

        match (&mut left.body, right.body) {
            (NodeBody::Leaf(lrows), NodeBody::Leaf(rrows)) => lrows.extend(rrows),
            (
                NodeBody::Internal {
                    rows: lrows,
                    children: lchildren,
                },
                NodeBody::Internal {
                    rows: rrows,
                    children: rchildren,
                },
            ) => {
                lrows.extend(rrows);
                lchildren.extend(rchildren);
            }
            _ => unreachable!("merge between mismatched node kinds"),
        }
        left.next = right_next;

        self.pm.borrow_mut().write_page(left.id, left.clone())?;
        self.pm.borrow_mut().delete_page(right_id)?;

        if let NodeBody::Internal { rows, children } = &mut parent.body {
            rows[left_idx] = left.min_row();
            rows.remove(left_idx + 1);
            children.remove(left_idx + 1);
        }
        self.pm.borrow_mut().write_page(parent.id, parent)?;
        Ok(())
    }

    fn rebalance(
        &self,
        mut parent: Node<T>,
        mut left: Node<T>,
        mut right: Node<T>,
        left_idx: usize,
    ) -> IndexResult<()> {
        if left.len() < right.len() {
            let delta = (right.len() - left.len()) / 2;
            match (&mut left.body, &mut right.body) {
                (NodeBody::Leaf(lrows), NodeBody::Leaf(rrows)) => {
                    lrows.extend(rrows.drain(0..delta));
                }
                (
                    NodeBody::Internal {
                        rows: lrows,
                        children: lchildren,
                    },
                    NodeBody::Internal {
                        rows: rrows,
                        children: rchildren,
                    },
                ) => {
                    lrows.extend(rrows.drain(0..delta));
                    lchildren.extend(rchildren.drain(0..delta));
                }
                _ => unreachable!("rebalance between mismatched node kinds"),
            }
        } else {
            let delta = (left.len() - right.len()) / 2;
            match (&mut left.body, &mut right.body) {
                (NodeBody::Leaf(lrows), NodeBody::Leaf(rrows)) => {
                    let moved = lrows.split_off(lrows.len() - delta);
                    rrows.splice(0..0, moved);
                }
                (
                    NodeBody::Internal {
                        rows: lrows,
                        children: lchildren,
                    },
                    NodeBody::Internal {
                        rows: rrows,
                        children: rchildren,
                    },
                ) => {
                    let moved_rows = lrows.split_off(lrows.len() - delta);
                    let moved_children = lchildren.split_off(lchildren.len() - delta);
                    rrows.splice(0..0, moved_rows);
                    rchildren.splice(0..0, moved_children);
                }
                _ => unreachable!("rebalance between mismatched node kinds"),
            }
        }

        self.pm.borrow_mut().write_page(left.id, left.clone())?;
        self.pm.borrow_mut().write_page(right.id, right.clone())?;

        if let NodeBody::Internal { rows, .. } = &mut parent.body {
            rows[left_idx] = left.min_row();
            rows[left_idx + 1] = right.min_row();
        }
        self.pm.borrow_mut().write_page(parent.id, parent)?;
        Ok(())
    }

    pub fn find(&self, query: &T) -> IndexResult<Option<T>> {
        let Some((leaf, idx)) = self.lower_bound(query)? else {
            return Ok(None);
        };
        let NodeBody::Leaf(rows) = &leaf.body else {
            unreachable!()
        };
        Ok((&rows[idx] == query).then(|| rows[idx].clone()))
    }

    /// Finds a row equal to `query` and lets `f` mutate it in place.
    /// `f` must not change the row's order key — this is asserted, not
    /// merely assumed, since violating it would silently corrupt the
    /// tree's internal separators.
    pub fn find_and_modify<F: FnOnce(&mut T)>(
        &self,
        query: &T,
        f: F,
    ) -> IndexResult<Option<T>> {
        let Some((leaf, idx)) = self.lower_bound(query)? else {
            return Ok(None);
        };
        {
            let NodeBody::Leaf(rows) = &leaf.body else {
                unreachable!()
            };
            if &rows[idx] != query {
                return Ok(None);
            }
        }
        let mut node = self.pm.borrow_mut().load_and_modify_page(leaf.id)?;
        let NodeBody::Leaf(rows) = &mut node.body else {
            unreachable!()
        };
        let before = rows[idx].clone();
        f(&mut rows[idx]);
        assert_eq!(
            before.cmp(&rows[idx]),
            std::cmp::Ordering::Equal,
            "find_and_modify must not change a row's order key"
        );
        let result = rows[idx].clone();
        self.pm.borrow_mut().write_page(node.id, node)?;
        Ok(Some(result))
    }

    pub(crate) fn lower_bound(&self, query: &T) -> IndexResult<Option<(Node<T>, usize)>> {
        let root = self.pm.borrow_mut().load_page(self.root)?;
        self.lower_bound_from(root, query)
    }

    fn lower_bound_from(&self, node: Node<T>, query: &T) -> IndexResult<Option<(Node<T>, usize)>> {
        if node.is_leaf() {
            let NodeBody::Leaf(rows) = &node.body else {
                unreachable!()
            };
            let idx = rows.partition_point(|r| r < query);
            if idx < rows.len() {
                return Ok(Some((node, idx)));
            }
            if let (Some(first), Some(next_id)) = (rows.first(), node.next) {
                if first < query {
                    let next = self.pm.borrow_mut().load_page(next_id)?;
                    let NodeBody::Leaf(nrows) = &next.body else {
                        unreachable!()
                    };
                    let idx = nrows.partition_point(|r| r < query);
                    if idx < nrows.len() {
                        return Ok(Some((next, idx)));
                    }
                }
            }
            return Ok(None);
        }

        let NodeBody::Internal { rows, children } = &node.body else {
            unreachable!()
        };
        let idx = child_index(rows, query);
        let child = self.pm.borrow_mut().load_page(children[idx])?;
        self.lower_bound_from(child, query)
    }

    /// Rows on the interval `[low, high)`.
    pub fn range(&self, low: &T, high: &T, reserve: Option<usize>) -> IndexResult<Vec<T>> {
        let mut out = Vec::new();
        if let Some(cap) = reserve {
            out.reserve(cap);
        }
        let Some((mut leaf, mut idx)) = self.lower_bound(low)? else {
            return Ok(out);
        };
        loop {
            let NodeBody::Leaf(rows) = &leaf.body else {
                unreachable!()
            };
            if rows.is_empty() || &rows[0] >= high {
                break;
            }
            for row in &rows[idx..] {
                if row >= high {
                    return Ok(out);
                }
                out.push(row.clone());
            }
            match leaf.next {
                Some(next_id) => {
                    leaf = self.pm.borrow_mut().load_page(next_id)?;
                    idx = 0;
                }
                None => break,
            }
        }
        Ok(out)
    }

    /// Every row in the tree, in order.
    pub fn all(&self, reserve: Option<usize>) -> IndexResult<Vec<T>> {
        let mut out = Vec::new();
        if let Some(cap) = reserve {
            out.reserve(cap);
        }
        let mut node = self.pm.borrow_mut().load_page(self.root)?;
        while !node.is_leaf() {
            let NodeBody::Internal { children, .. } = &node.body else {
                unreachable!()
            };
            node = self.pm.borrow_mut().load_page(children[0])?;
        }
        loop {
            let NodeBody::Leaf(rows) = &node.body else {
                unreachable!()
            };
            out.extend(rows.iter().cloned());
            match node.next {
                Some(next_id) => node = self.pm.borrow_mut().load_page(next_id)?,
                None => break,
            }
        }
        Ok(out)
    }

    pub fn iterator(&self, low: T, high: T) -> SkipTreeCursor<T, M> {
        SkipTreeCursor::new(self.clone(), low, high)
    }

    pub fn commit(&self) -> IndexResult<()> {
        self.pm.borrow_mut().commit()
    }

    pub fn flush(&self) -> IndexResult<()> {
        self.pm.borrow_mut().flush()
    }
}
