use super::*;
use std::io;

#[test]
fn config_defaults_are_sane() {
    let cfg = Config::default();
    assert_eq!(cfg.page_size, 4096);
    assert_eq!(cfg.rare_threshold, 50);
    assert_eq!(cfg.data_dir, PathBuf::from("./index_data"));
}

#[test]
fn config_builder_overrides() {
    let cfg = Config::builder()
        .data_dir(PathBuf::from("/tmp/idx"))
        .page_size(8192)
        .rare_threshold(10)
        .build();
    assert_eq!(cfg.page_size, 8192);
    assert_eq!(cfg.rare_threshold, 10);
}

#[test]
fn index_error_formats_cleanly() {
    let err = IndexError::InvalidArgument("bad token".into());
    assert!(format!("{err}").contains("bad token"));
    assert!(format!("{}", IndexError::EmptyOperandList).contains("at least one operand"));
    assert!(format!("{}", IndexError::MissingPositiveOperand).contains("non-negated"));
}

#[test]
fn io_error_converts() {
    let e = io::Error::other("oops");
    let err: IndexError = e.into();
    assert!(matches!(err, IndexError::Io(_)));
}

#[test]
fn page_id_ordering() {
    assert!(PageId(1) < PageId(2));
    assert_eq!(PageId(3).as_u32(), 3);
}
