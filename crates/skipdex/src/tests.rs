use crate::{fetch_many, Index};
use common::Config;
use pretty_assertions::assert_eq;
use rows::{DocRow, KeyValueRow};
use skiptree::{Cursor, Row};

fn temp_index<T: Row>(dir: &tempfile::TempDir, name: &str) -> Index<T> {
    Index::open(dir.path().join(name)).unwrap()
}

#[test]
fn open_create_then_reopen_attaches_to_existing_files() {
    let dir = tempfile::tempdir().unwrap();
    {
        let idx: Index<DocRow> = temp_index(&dir, "basic");
        idx.insert(1, DocRow(10)).unwrap();
        idx.flush().unwrap();
    }
    let idx: Index<DocRow> = temp_index(&dir, "basic");
    assert_eq!(idx.count(1).unwrap(), 1);
}

#[test]
fn s1_uint64_intersection() {
    let dir = tempfile::tempdir().unwrap();
    let idx: Index<DocRow> = temp_index(&dir, "s1");
    const N: u64 = 500_000;
    for d in 1..=N {
        idx.insert(1, DocRow(d)).unwrap();
        if d % 2 == 0 {
            idx.insert(2, DocRow(d)).unwrap();
        }
        if d % 3 == 0 {
            idx.insert(3, DocRow(d)).unwrap();
        }
    }
    let results = idx
        .intersect(&[2, 3], DocRow(0), usize::MAX)
        .unwrap();
    assert_eq!(results.len(), 83_333);
    assert_eq!(results.first().unwrap().0, 6);
    assert_eq!(results.last().unwrap().0, 499_998);
    assert!(results.iter().all(|r| r.0 % 6 == 0));
}

#[test]
fn s2_generalized_intersect() {
    let dir = tempfile::tempdir().unwrap();
    let idx: Index<DocRow> = temp_index(&dir, "s2");
    for d in [1u64, 2, 3] {
        idx.insert(1, DocRow(d)).unwrap();
    }
    for d in [2u64, 3, 4] {
        idx.insert(2, DocRow(d)).unwrap();
    }
    idx.insert(3, DocRow(3)).unwrap();

    let results = idx
        .generalized_intersect(&[(1, false), (2, false), (3, true)], DocRow(0), usize::MAX)
        .unwrap();
    assert_eq!(results.into_iter().map(|r| r.0).collect::<Vec<_>>(), vec![2]);
}

#[test]
fn s3_rare_common_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let idx: Index<DocRow> = temp_index(&dir, "s3");
    for i in 1..=49u64 {
        idx.insert(1, DocRow(i)).unwrap();
        assert_eq!(idx.count(1).unwrap(), i);
    }
    idx.insert(1, DocRow(50)).unwrap();
    assert_eq!(idx.count(1).unwrap(), 50);

    let all: Vec<u64> = idx
        .intersect(&[1], DocRow(0), usize::MAX)
        .unwrap()
        .into_iter()
        .map(|r| r.0)
        .collect();
    let expected: Vec<u64> = (1..=50).collect();
    assert_eq!(all, expected);
}

#[test]
fn s4_kv_union() {
    let dir = tempfile::tempdir().unwrap();
    let idx: Index<KeyValueRow> = temp_index(&dir, "s4");
    idx.insert(1, KeyValueRow::make(3, 100)).unwrap();
    idx.insert(2, KeyValueRow::make(3, 200)).unwrap();
    idx.insert(2, KeyValueRow::make(5, 201)).unwrap();

    let results = idx.kv_union(&[1, 2]).unwrap();
    assert_eq!(results, vec![(3, vec![100, 200]), (5, vec![0, 201])]);
}

#[test]
fn s5_remove_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let idx: Index<DocRow> = temp_index(&dir, "s5");
        for i in 1..=100u64 {
            idx.insert(7, DocRow(i)).unwrap();
        }
        for i in [2u64, 50, 99] {
            assert!(idx.remove(7, DocRow(i)).unwrap());
        }
        idx.commit().unwrap();
    }

    let idx: Index<DocRow> = temp_index(&dir, "s5");
    let mut cursor = idx.iterator(7, DocRow(0));
    let mut got = Vec::new();
    let mut v = cursor.current();
    while v != DocRow::largest() {
        got.push(v.0);
        v = cursor.next();
    }
    let expected: Vec<u64> = (1..=100).filter(|i| ![2, 50, 99].contains(i)).collect();
    assert_eq!(got, expected);
}

#[test]
fn s6_randomized_delete_soak() {
    // A fixed, well-shuffled permutation stands in for a random shuffle so
    // the test is deterministic without depending on a source of entropy.
    let dir = tempfile::tempdir().unwrap();
    let idx: Index<DocRow> = temp_index(&dir, "s6");
    const N: u64 = 100_000;

    let mut order: Vec<u64> = (1..=N).collect();
    let mut state: u64 = 0x9e3779b97f4a7c15;
    for i in (1..order.len()).rev() {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let j = (state % (i as u64 + 1)) as usize;
        order.swap(i, j);
    }
    for &d in &order {
        idx.insert(1, DocRow(d)).unwrap();
    }

    let mut removed = std::collections::BTreeSet::new();
    for &d in order.iter().take((N / 2) as usize) {
        assert!(idx.remove(1, DocRow(d)).unwrap());
        removed.insert(d);
    }

    let remaining: Vec<u64> = idx
        .intersect(&[1], DocRow(0), usize::MAX)
        .unwrap()
        .into_iter()
        .map(|r| r.0)
        .collect();
    let expected: Vec<u64> = (1..=N).filter(|d| !removed.contains(d)).collect();
    assert_eq!(remaining, expected);
}

#[test]
fn union_iterator_is_generic_over_cursor_source() {
    let dir = tempfile::tempdir().unwrap();
    let idx: Index<DocRow> = temp_index(&dir, "union");
    for d in [1u64, 3, 5] {
        idx.insert(1, DocRow(d)).unwrap();
    }
    for d in [2u64, 3, 6] {
        idx.insert(2, DocRow(d)).unwrap();
    }
    let mut cursor = idx.union_iterator(&[1, 2], DocRow(0)).unwrap();
    let got = fetch_many(cursor.as_mut(), usize::MAX)
        .into_iter()
        .map(|r| r.0)
        .collect::<Vec<_>>();
    assert_eq!(got, vec![1, 2, 3, 5, 6]);
}

#[test]
fn fetch_many_respects_limit() {
    let dir = tempfile::tempdir().unwrap();
    let idx: Index<DocRow> = temp_index(&dir, "limit");
    for d in 0..20u64 {
        idx.insert(1, DocRow(d)).unwrap();
    }
    let mut cursor = idx.iterator(1, DocRow(0));
    let got = fetch_many(cursor.as_mut(), 5);
    assert_eq!(got.into_iter().map(|r| r.0).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn intersect_on_empty_token_list_is_empty_operand_error() {
    let dir = tempfile::tempdir().unwrap();
    let idx: Index<DocRow> = temp_index(&dir, "empty");
    let err = idx.intersect(&[], DocRow(0), usize::MAX).unwrap_err();
    assert!(matches!(err, common::IndexError::EmptyOperandList));
}

#[test]
fn intersect_honors_lower_bound_above_tree_minimum() {
    let dir = tempfile::tempdir().unwrap();
    let idx: Index<DocRow> = temp_index(&dir, "lb");
    for d in 1..=20u64 {
        idx.insert(1, DocRow(d)).unwrap();
    }
    let results = idx.intersect(&[1], DocRow(5), usize::MAX).unwrap();
    assert_eq!(
        results.into_iter().map(|r| r.0).collect::<Vec<_>>(),
        (5..=20).collect::<Vec<_>>()
    );
}

#[test]
fn union_iterator_honors_lower_bound_above_tree_minimum() {
    let dir = tempfile::tempdir().unwrap();
    let idx: Index<DocRow> = temp_index(&dir, "union_lb");
    for d in [1u64, 3, 5, 8] {
        idx.insert(1, DocRow(d)).unwrap();
    }
    for d in [2u64, 4, 8] {
        idx.insert(2, DocRow(d)).unwrap();
    }
    let mut cursor = idx.union_iterator(&[1, 2], DocRow(4)).unwrap();
    let got = fetch_many(cursor.as_mut(), usize::MAX)
        .into_iter()
        .map(|r| r.0)
        .collect::<Vec<_>>();
    assert_eq!(got, vec![4, 5, 8]);
}

#[test]
fn open_with_config_honors_data_dir_page_size_and_rare_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::builder()
        .data_dir(dir.path().to_path_buf())
        .page_size(8192)
        .rare_threshold(3)
        .build();

    let idx: Index<DocRow> = Index::open_with_config("cfg", &config).unwrap();
    for d in 1..=10u64 {
        idx.insert(1, DocRow(d)).unwrap();
    }
    idx.commit().unwrap();
    assert_eq!(idx.count(1).unwrap(), 10);
    assert!(dir.path().join("cfg.tokens").exists());
}
