//! Composable cursor algebra over [`skiptree::Cursor`]s: intersection,
//! negated/generalized intersection, union, and a key-value union that
//! aligns several cursors' values by key.


use common::{IndexError, IndexResult};
use skiptree::{Cursor, Row};

/// A fixed value that never advances. Used for a token the index has
/// never seen: its cursor always reads as exhausted.
pub struct ConstCursor<T>(T);

impl<T: Row> ConstCursor<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn largest() -> Self {
        Self(T::largest())
    }
}

impl<T: Row> Cursor<T> for ConstCursor<T> {
    fn current(&self) -> T {
        self.0.clone()
    }
    fn skip_to(&mut self, _v: T) -> T {
        self.0.clone()
    }
    fn next(&mut self) -> T {
        self.0.clone()
    }
}

/// Cursor over an in-memory sorted `Vec<T>`, for fixtures and for
/// materialized intermediate results.
pub struct VectorCursor<T: Row> {
    data: Vec<T>,
    current: T,
}

impl<T: Row> VectorCursor<T> {
    pub fn new(data: Vec<T>) -> Self {
        let current = data.first().cloned().unwrap_or_else(T::largest);
        Self { data, current }
    }
}

impl<T: Row> Cursor<T> for VectorCursor<T> {
    fn current(&self) -> T {
        self.current.clone()
    }

    fn skip_to(&mut self, row: T) -> T {
        let idx = self.data.partition_point(|r| *r < row);
        self.current = self.data.get(idx).cloned().unwrap_or_else(T::largest);
        self.current.clone()
    }

    fn next(&mut self) -> T {
        let idx = self.data.partition_point(|r| *r < self.current);
        self.current = self.data.get(idx + 1).cloned().unwrap_or_else(T::largest);
        self.current.clone()
    }
}

/// Intersection of several cursors: the smallest value present in every
/// child, computed by repeatedly skipping every child to the current
/// running maximum until they all agree.
pub struct IntersectionCursor<T: Row> {
    children: Vec<Box<dyn Cursor<T>>>,
    current: T,
}

impl<T: Row> std::fmt::Debug for IntersectionCursor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntersectionCursor")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl<T: Row> IntersectionCursor<T> {
    pub fn new(children: Vec<Box<dyn Cursor<T>>>) -> IndexResult<Self> {
        if children.is_empty() {
            return Err(IndexError::EmptyOperandList);
        }
        let mut cursor = Self {
            children,
            current: T::largest(),
        };
        cursor.skip_to(T::smallest());
        Ok(cursor)
    }
}

impl<T: Row> Cursor<T> for IntersectionCursor<T> {
    fn current(&self) -> T {
        self.current.clone()
    }

    fn skip_to(&mut self, row: T) -> T {
        let mut vals: Vec<T> = self
            .children
            .iter_mut()
            .map(|c| c.skip_to(row.clone()))
            .collect();
        let mut x = vals.iter().cloned().max().expect("non-empty operand list");
        loop {
            for (val, child) in vals.iter_mut().zip(self.children.iter_mut()) {
                if *val < x {
                    *val = child.skip_to(x.clone());
                }
            }
            let y = vals.iter().cloned().max().expect("non-empty operand list");
            if x == y || y == T::largest() {
                self.current = y;
                return self.current.clone();
            }
            x = y;
        }
    }

    fn next(&mut self) -> T {
        let succ = self.current.next();
        self.skip_to(succ)
    }
}

/// A child cursor tagged as either matching normally or as a forbidden
/// value (negated) for [`GeneralIntersectionCursor`].
pub struct NegatableCursor<T: Row> {
    inner: Box<dyn Cursor<T>>,
    negated: bool,
    current: T,
}

impl<T: Row> std::fmt::Debug for NegatableCursor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NegatableCursor")
            .field("negated", &self.negated)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl<T: Row> NegatableCursor<T> {
    pub fn new(inner: Box<dyn Cursor<T>>, negated: bool) -> Self {
        let current = inner.current();
        Self {
            inner,
            negated,
            current,
        }
    }

    pub fn negated(&self) -> bool {
        self.negated
    }
}

impl<T: Row> Cursor<T> for NegatableCursor<T> {
    fn current(&self) -> T {
        self.current.clone()
    }
    fn skip_to(&mut self, v: T) -> T {
        self.current = self.inner.skip_to(v);
        self.current.clone()
    }
    fn next(&mut self) -> T {
        self.current = self.inner.next();
        self.current.clone()
    }
}

/// Intersection that allows some operands to be negated ("must not
/// match"). At least one operand must be non-negated, since otherwise
/// there is no positive set to exclude values from.
pub struct GeneralIntersectionCursor<T: Row> {
    children: Vec<NegatableCursor<T>>,
    num_non_negated: usize,
    current: T,
}

impl<T: Row> std::fmt::Debug for GeneralIntersectionCursor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneralIntersectionCursor")
            .field("num_non_negated", &self.num_non_negated)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl<T: Row> GeneralIntersectionCursor<T> {
    pub fn new(children: Vec<NegatableCursor<T>>) -> IndexResult<Self> {
        if children.is_empty() {
            return Err(IndexError::EmptyOperandList);
        }
        let num_non_negated = children.iter().filter(|c| !c.negated()).count();
        if num_non_negated == 0 {
            return Err(IndexError::MissingPositiveOperand);
        }
        let mut cursor = Self {
            children,
            num_non_negated,
            current: T::largest(),
        };
        let (start, _) = cursor.max_non_negated();
        cursor.skip_to(start);
        Ok(cursor)
    }

    /// The largest value among non-negated children, and how many of
    /// them currently sit on it.
    fn max_non_negated(&self) -> (T, usize) {
        let mut r = T::smallest();
        let mut count = 0;
        for child in self.children.iter().filter(|c| !c.negated()) {
            let v = child.current();
            if r < v {
                r = v;
                count = 1;
            } else if r == v {
                count += 1;
            }
        }
        (r, count)
    }
}

impl<T: Row> Cursor<T> for GeneralIntersectionCursor<T> {
    fn current(&self) -> T {
        self.current.clone()
    }

    fn skip_to(&mut self, row: T) -> T {
        for child in self.children.iter_mut() {
            child.skip_to(row.clone());
        }
        let (mut x, mut count) = self.max_non_negated();
        loop {
            if x == T::largest() {
                self.current = x;
                return self.current.clone();
            }
            if count == self.num_non_negated {
                let mut is_match = true;
                for child in self.children.iter_mut() {
                    if child.negated() && child.skip_to(x.clone()) == x {
                        is_match = false;
                        break;
                    }
                }
                if is_match {
                    self.current = x;
                    return self.current.clone();
                }
                for child in self.children.iter_mut() {
                    child.next();
                }
            } else {
                for child in self.children.iter_mut() {
                    child.skip_to(x.clone());
                }
            }
            let (nx, ncount) = self.max_non_negated();
            x = nx;
            count = ncount;
        }
    }

    fn next(&mut self) -> T {
        let succ = self.current.next();
        self.skip_to(succ)
    }
}

/// Union of several cursors: the smallest value present in any child.
pub struct UnionCursor<T: Row> {
    children: Vec<Box<dyn Cursor<T>>>,
    current: T,
}

impl<T: Row> std::fmt::Debug for UnionCursor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnionCursor")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl<T: Row> UnionCursor<T> {
    pub fn new(children: Vec<Box<dyn Cursor<T>>>) -> IndexResult<Self> {
        if children.is_empty() {
            return Err(IndexError::EmptyOperandList);
        }
        let mut cursor = Self {
            children,
            current: T::largest(),
        };
        cursor.skip_to(T::smallest());
        Ok(cursor)
    }

    fn lowest(&self) -> T {
        self.children
            .iter()
            .map(|c| c.current())
            .min()
            .unwrap_or_else(T::largest)
    }
}

impl<T: Row> Cursor<T> for UnionCursor<T> {
    fn current(&self) -> T {
        self.current.clone()
    }

    fn skip_to(&mut self, row: T) -> T {
        self.current = self
            .children
            .iter_mut()
            .map(|c| c.skip_to(row.clone()))
            .min()
            .unwrap_or_else(T::largest);
        self.current.clone()
    }

    fn next(&mut self) -> T {
        let low = self.lowest();
        if low == T::largest() {
            self.current = low;
            return self.current.clone();
        }
        for child in self.children.iter_mut() {
            if child.current() == low {
                child.next();
            }
        }
        self.current = self.lowest();
        self.current.clone()
    }
}

/// A row shaped as a key plus a value, where order and equality consider
/// only the key. [`KvUnionCursor`] uses this to align several cursors'
/// values by key.
pub trait KeyValueRow: Row {
    type Value: Clone + PartialEq;
    fn key(&self) -> u64;
    fn value(&self) -> Self::Value;
    fn make(key: u64, value: Self::Value) -> Self;
    fn value_sentinel() -> Self::Value;
}

/// Union over several key-value cursors that, for each key present in
/// any child, reports every child's value at that key (or a sentinel if
/// that child has no row at that key). Typically used to fetch every
/// per-token value (e.g. term frequency) for every document that
/// matches at least one of the tokens.
pub struct KvUnionCursor<T: KeyValueRow> {
    children: Vec<Box<dyn Cursor<T>>>,
    current: (u64, Vec<T::Value>),
}

impl<T: KeyValueRow> std::fmt::Debug for KvUnionCursor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvUnionCursor")
            .field("current_key", &self.current.0)
            .finish_non_exhaustive()
    }
}

impl<T: KeyValueRow> KvUnionCursor<T> {
    pub fn new(children: Vec<Box<dyn Cursor<T>>>) -> IndexResult<Self> {
        if children.is_empty() {
            return Err(IndexError::EmptyOperandList);
        }
        let n = children.len();
        let mut cursor = Self {
            children,
            current: (0, vec![T::value_sentinel(); n]),
        };
        cursor.skip_to_key(0);
        Ok(cursor)
    }

    fn lowest(&self) -> T {
        self.children
            .iter()
            .map(|c| c.current())
            .min()
            .unwrap_or_else(T::largest)
    }

    fn update_value(&mut self) {
        let lowest = self.lowest();
        self.current.0 = lowest.key();
        for (slot, child) in self.current.1.iter_mut().zip(self.children.iter()) {
            let cur = child.current();
            *slot = if cur == lowest {
                cur.value()
            } else {
                T::value_sentinel()
            };
        }
    }

    pub fn current(&self) -> (u64, Vec<T::Value>) {
        self.current.clone()
    }

    pub fn skip_to_key(&mut self, key: u64) -> (u64, Vec<T::Value>) {
        for child in self.children.iter_mut() {
            child.skip_to(T::make(key, T::value_sentinel()));
        }
        self.update_value();
        self.current.clone()
    }

    pub fn next(&mut self) -> (u64, Vec<T::Value>) {
        let low = self.lowest();
        for child in self.children.iter_mut() {
            if child.current() == low {
                child.next();
            }
        }
        self.update_value();
        self.current.clone()
    }
}
