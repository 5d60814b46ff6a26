use crate::{InvertedIndex, RARE_THRESHOLD};
use pagestore::{DiskPageManager, MemoryPageManager};
use pretty_assertions::assert_eq;
use rows::DocRow;
use skiptree::{Cursor, Row};

type MemIndex = InvertedIndex<
    DocRow,
    MemoryPageManager<skiptree::Node<crate::TokenRow>>,
    MemoryPageManager<skiptree::Node<crate::RareRow<DocRow>>>,
    MemoryPageManager<skiptree::Node<DocRow>>,
>;

fn mem_index() -> MemIndex {
    InvertedIndex::new(
        MemoryPageManager::new(),
        MemoryPageManager::new(),
        MemoryPageManager::new(),
    )
    .unwrap()
}

fn drain(mut cursor: Box<dyn Cursor<DocRow>>) -> Vec<u64> {
    let mut out = Vec::new();
    let mut v = cursor.current();
    while v != DocRow::largest() {
        out.push(v.0);
        v = cursor.next();
    }
    out
}

#[test]
fn insert_and_all_roundtrip_for_rare_token() {
    let index = mem_index();
    index.insert(7, DocRow(1)).unwrap();
    index.insert(7, DocRow(3)).unwrap();
    index.insert(7, DocRow(2)).unwrap();
    let all = index.all(7).unwrap();
    assert_eq!(all.into_iter().map(|r| r.0).collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[test]
fn count_reflects_insertions_and_missing_token_is_zero() {
    let index = mem_index();
    for i in 0..5u64 {
        index.insert(42, DocRow(i)).unwrap();
    }
    assert_eq!(index.count(42).unwrap(), 5);
    assert_eq!(index.count(999).unwrap(), 0);
}

#[test]
fn remove_reports_whether_row_was_present() {
    let index = mem_index();
    index.insert(1, DocRow(10)).unwrap();
    assert!(index.remove(1, DocRow(10)).unwrap());
    assert!(!index.remove(1, DocRow(10)).unwrap());
    assert!(!index.remove(1, DocRow(11)).unwrap());
    assert_eq!(index.all(1).unwrap(), vec![]);
}

#[test]
fn unseen_token_iterator_is_immediately_exhausted() {
    let index = mem_index();
    let cursor = index.iterator(123);
    assert_eq!(drain(cursor), Vec::<u64>::new());
}

#[test]
fn iterator_matches_range_for_rare_token() {
    let index = mem_index();
    for i in [5u64, 1, 9, 3, 7] {
        index.insert(2, DocRow(i)).unwrap();
    }
    let cursor = index.iterator(2);
    assert_eq!(drain(cursor), vec![1, 3, 5, 7, 9]);
}

#[test]
fn token_migrates_to_its_own_tree_past_rare_threshold() {
    let index = mem_index();
    for i in 0..(RARE_THRESHOLD + 10) {
        index.insert(1, DocRow(i)).unwrap();
    }
    assert_eq!(index.count(1).unwrap(), RARE_THRESHOLD + 10);
    let all: Vec<u64> = index.all(1).unwrap().into_iter().map(|r| r.0).collect();
    let expected: Vec<u64> = (0..(RARE_THRESHOLD + 10)).collect();
    assert_eq!(all, expected);
}

#[test]
fn tokens_below_threshold_stay_isolated_from_each_other() {
    let index = mem_index();
    for i in 0..5u64 {
        index.insert(1, DocRow(i)).unwrap();
        index.insert(2, DocRow(i + 100)).unwrap();
    }
    assert_eq!(
        index.all(1).unwrap().into_iter().map(|r| r.0).collect::<Vec<_>>(),
        vec![0, 1, 2, 3, 4]
    );
    assert_eq!(
        index.all(2).unwrap().into_iter().map(|r| r.0).collect::<Vec<_>>(),
        vec![100, 101, 102, 103, 104]
    );
}

#[test]
fn remove_works_after_migration_to_common_tree() {
    let index = mem_index();
    for i in 0..(RARE_THRESHOLD + 5) {
        index.insert(1, DocRow(i)).unwrap();
    }
    assert!(index.remove(1, DocRow(0)).unwrap());
    assert!(!index.all(1).unwrap().iter().any(|r| r.0 == 0));
}

#[test]
fn range_is_half_open_and_honors_token_isolation() {
    let index = mem_index();
    for i in 0..20u64 {
        index.insert(1, DocRow(i)).unwrap();
    }
    let r = index.range(1, &DocRow(5), &DocRow(10), None).unwrap();
    assert_eq!(r.into_iter().map(|x| x.0).collect::<Vec<_>>(), vec![5, 6, 7, 8, 9]);
}

#[test]
fn persists_across_disk_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("idx");
    let header_path = base.with_extension("tokens");
    let rare_path = base.with_extension("rare");

    {
        let header_pm = DiskPageManager::create(&header_path, pagestore::PAGE_SIZE).unwrap();
        let rare_pm = DiskPageManager::create(&rare_path, pagestore::PAGE_SIZE).unwrap();
        let common_pm = DiskPageManager::create(&base, pagestore::PAGE_SIZE).unwrap();
        let index: InvertedIndex<
            DocRow,
            DiskPageManager<skiptree::Node<crate::TokenRow>>,
            DiskPageManager<skiptree::Node<crate::RareRow<DocRow>>>,
            DiskPageManager<skiptree::Node<DocRow>>,
        > = InvertedIndex::new(header_pm, rare_pm, common_pm).unwrap();
        for i in 0..(RARE_THRESHOLD + 3) {
            index.insert(1, DocRow(i)).unwrap();
        }
        index.insert(2, DocRow(1000)).unwrap();
        index.flush().unwrap();
    }

    let header_pm = DiskPageManager::open(&header_path, pagestore::PAGE_SIZE).unwrap();
    let rare_pm = DiskPageManager::open(&rare_path, pagestore::PAGE_SIZE).unwrap();
    let common_pm = DiskPageManager::open(&base, pagestore::PAGE_SIZE).unwrap();
    let index: InvertedIndex<
        DocRow,
        DiskPageManager<skiptree::Node<crate::TokenRow>>,
        DiskPageManager<skiptree::Node<crate::RareRow<DocRow>>>,
        DiskPageManager<skiptree::Node<DocRow>>,
    > = InvertedIndex::new(header_pm, rare_pm, common_pm).unwrap();

    assert_eq!(index.count(1).unwrap(), RARE_THRESHOLD + 3);
    assert_eq!(
        index.all(2).unwrap().into_iter().map(|r| r.0).collect::<Vec<_>>(),
        vec![1000]
    );
}
