use crate::{DocRow, KeyValueRow, PairRow};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use skiptree::Row;
use std::cmp::Ordering;

#[test]
fn doc_row_orders_by_value() {
    assert!(DocRow(1) < DocRow(2));
    assert_eq!(DocRow::smallest(), DocRow(0));
    assert_eq!(DocRow(5).next(), DocRow(6));
}

#[test]
fn pair_row_orders_lexicographically() {
    let a = PairRow::make(1, 9);
    let b = PairRow::make(2, 0);
    assert!(a < b);
    let c = PairRow::make(1, 3);
    assert!(c < a);
}

#[test]
fn pair_row_next_resets_value_and_bumps_docid() {
    let row = PairRow::make(4, 7);
    assert_eq!(row.next(), PairRow::make(5, 0));
}

#[test]
fn key_value_row_ignores_value_in_ordering() {
    let a = KeyValueRow::make(3, 100);
    let b = KeyValueRow::make(3, 1);
    assert_eq!(a.cmp(&b), Ordering::Equal);
    assert_eq!(a, b);
}

#[test]
fn key_value_row_overwrite_from_preserves_key() {
    let mut row = KeyValueRow::make(9, 1);
    let update = KeyValueRow::make(9, 2);
    row.overwrite_from(&update);
    assert_eq!(row.key, 9);
    assert_eq!(row.value, 2);
}

#[test]
fn key_value_row_implements_iterkit_key_value_row() {
    use iterkit::KeyValueRow as _;
    let row = KeyValueRow::make(5, 42);
    assert_eq!(row.key(), 5);
    assert_eq!(row.value(), 42);
    assert_eq!(KeyValueRow::value_sentinel(), 0);
}

proptest! {
    #[test]
    fn pair_row_order_matches_tuple_order(
        a in (0u32..1000, 0u32..1000),
        b in (0u32..1000, 0u32..1000),
    ) {
        let ra = PairRow::make(a.0, a.1);
        let rb = PairRow::make(b.0, b.1);
        prop_assert_eq!(ra.cmp(&rb), a.cmp(&b));
    }

    #[test]
    fn key_value_row_order_ignores_value(
        key in 0u64..1000,
        va in 0u64..1000,
        vb in 0u64..1000,
    ) {
        let a = KeyValueRow::make(key, va);
        let b = KeyValueRow::make(key, vb);
        prop_assert_eq!(a.cmp(&b), Ordering::Equal);
    }
}
