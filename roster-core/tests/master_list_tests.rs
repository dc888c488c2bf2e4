//! Master list error-message, schema, and archival integration tests.

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use roster_core::{
    master_list::{self, MASTER_COLUMNS},
    CsvMasterList, MasterListStore, SaveOutcome, StoreError, StudentRecord, Username,
};
use rstest::rstest;

fn student(username: &str, year: &str, secret: Option<&str>) -> StudentRecord {
    StudentRecord {
        username: Username::from(username),
        first_name: "Sam".into(),
        last_name: "Jones".into(),
        year_level: year.into(),
        class_name: format!("{year}A"),
        email: format!("{username}@school.test"),
        secret: secret.map(str::to_owned),
        remote_ref: None,
    }
}

// ---------------------------------------------------------------------------
// 1. Schema contract
// ---------------------------------------------------------------------------

#[test]
fn saved_file_uses_contract_columns_in_order() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("master.csv");
    let store = CsvMasterList::new(file.path());

    store
        .save(&[student("bob", "Prep", None), student("amy", "1", Some("Pear.1111"))])
        .expect("save");

    file.assert(predicate::str::starts_with(
        "Username,FirstName,LastName,YearLevel,Class,Email,Password\n",
    ));
    let contents = std::fs::read_to_string(file.path()).expect("read");
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("amy,"), "rows sorted by username");
    assert!(lines[2].starts_with("bob,"));
    assert_eq!(MASTER_COLUMNS.len(), 7);
}

#[test]
fn fields_with_commas_survive_roundtrip() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let store = CsvMasterList::new(dir.child("master.csv").path());
    let mut r = student("amy", "1", Some("Pear.1111"));
    r.last_name = "O'Neil, Jr".into();
    store.save(&[r.clone()]).expect("save");

    let loaded = store.load().expect("load");
    assert_eq!(loaded, vec![r]);
}

// ---------------------------------------------------------------------------
// 2. Load errors
// ---------------------------------------------------------------------------

#[test]
fn ragged_csv_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("master.csv");
    file.write_str("Username,FirstName,LastName,YearLevel,Class,Email,Password\namy,Amy\n")
        .expect("write");

    let err = CsvMasterList::new(file.path()).load().unwrap_err();
    assert!(matches!(err, StoreError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("master.csv"));
}

#[test]
fn blank_username_row_is_rejected() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("master.csv");
    file.write_str(
        "Username,FirstName,LastName,YearLevel,Class,Email,Password\n\
         amy,Amy,Lee,1,1A,amy@school.test,Pear.1111\n\
         ,No,Name,1,1A,x@school.test,\n",
    )
    .expect("write");

    let err = CsvMasterList::new(file.path()).load().unwrap_err();
    match err {
        StoreError::BlankUsername { line, .. } => assert_eq!(line, 3),
        other => panic!("expected BlankUsername, got {other}"),
    }
}

#[test]
fn blank_username_line_counts_multiline_quoted_fields() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("master.csv");
    file.write_str(
        "Username,FirstName,LastName,YearLevel,Class,Email,Password\n\
         amy,Amy,\"Lee\nSmith\",1,1A,amy@school.test,Pear.1111\n\
         ,No,Name,1,1A,x@school.test,\n",
    )
    .expect("write");

    let err = CsvMasterList::new(file.path()).load().unwrap_err();
    match err {
        StoreError::BlankUsername { line, .. } => assert_eq!(line, 4),
        other => panic!("expected BlankUsername, got {other}"),
    }
}

#[rstest]
#[case::empty_password("amy,Amy,Lee,1,1A,amy@school.test,\n", None)]
#[case::whitespace_password("amy,Amy,Lee,1,1A,amy@school.test,   \n", None)]
#[case::set_password("amy,Amy,Lee,1,1A,amy@school.test,Pear.1111\n", Some("Pear.1111"))]
fn password_cell_maps_to_secret(#[case] row: &str, #[case] expected: Option<&str>) {
    let csv = format!("Username,FirstName,LastName,YearLevel,Class,Email,Password\n{row}");
    let records =
        master_list::from_csv_str(std::path::Path::new("m.csv"), &csv).expect("parse");
    assert_eq!(records[0].secret.as_deref(), expected);
}

// ---------------------------------------------------------------------------
// 3. Archival
// ---------------------------------------------------------------------------

#[test]
fn each_changed_save_adds_one_archive_copy() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let store = CsvMasterList::new(dir.child("master.csv").path());

    store.save(&[student("amy", "1", None)]).expect("v1");
    store.save(&[student("amy", "2", None)]).expect("v2");
    store.save(&[student("amy", "3", None)]).expect("v3");
    let unchanged = store.save(&[student("amy", "3", None)]).expect("v3 again");
    assert!(matches!(unchanged, SaveOutcome::Unchanged { .. }));

    let archived = std::fs::read_dir(store.archive_dir())
        .expect("archive dir")
        .count();
    assert_eq!(archived, 2);
}

#[test]
fn duplicates_are_exported_next_to_master_list() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let store = CsvMasterList::new(dir.child("master.csv").path());
    let dupes = vec![student("amy", "1", None), student("amy", "2", None)];

    let path = store
        .export_duplicates(&dupes)
        .expect("export")
        .expect("path");
    assert_eq!(path, store.duplicates_path());
    dir.child("duplicates.csv")
        .assert(predicate::str::contains("amy,Sam,Jones,1,1A"));
    dir.child("duplicates.csv")
        .assert(predicate::str::contains("amy,Sam,Jones,2,2A"));
}

#[test]
fn empty_duplicates_export_removes_stale_file() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let store = CsvMasterList::new(dir.child("master.csv").path());
    store
        .export_duplicates(&[student("amy", "1", Some("Pear.1111")), student("amy", "2", None)])
        .expect("export");
    dir.child("duplicates.csv").assert(predicate::path::exists());

    assert!(store.export_duplicates(&[]).expect("clear").is_none());
    dir.child("duplicates.csv").assert(predicate::path::missing());
}
