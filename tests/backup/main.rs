//! Integration tests for JSON-lines backups.

use std::fs;

use serde::{Deserialize, Serialize};
use stored_rust::backup::{backup_file_name, backup_name};
use stored_rust::{
    Backup, BackupReport, Database, DatabaseMapping, Record, RecordsExt, Storable, StoreError,
};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Storable)]
#[storable(table = "authors")]
struct Author {
    #[storable(index)]
    name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Storable)]
#[storable(table = "books", versioning = "delta")]
struct Book {
    title: String,
    pages: u32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Storable)]
struct Unmapped {
    x: u8,
}

fn seeded_mapping() -> DatabaseMapping {
    let mapping = DatabaseMapping::new();
    mapping
        .map_type::<Author>(Database::new("memory", Vec::<(&str, &str)>::new()).unwrap())
        .unwrap();
    mapping
        .map_type::<Book>(Database::new("sqlite", [("filename", ":memory:")]).unwrap())
        .unwrap();
    mapping
        .map_type::<BackupReport>(Database::new("memory", Vec::<(&str, &str)>::new()).unwrap())
        .unwrap();

    let authors = mapping.records::<Author>();
    authors.ensure_table().unwrap();
    for name in ["Le Guin", "Banks"] {
        authors
            .save(&mut Record::new(Author { name: name.into() }))
            .unwrap();
    }

    let books = mapping.records::<Book>();
    books.ensure_table().unwrap();
    for (title, pages) in [("Excession", 451), ("The Dispossessed", 387), ("Use of Weapons", 411)] {
        let mut book = Record::new(Book {
            title: title.into(),
            pages: 1,
        });
        books.save(&mut book).unwrap();
        book.pages = pages;
        books.save(&mut book).unwrap();
    }
    mapping
}

#[test]
fn writes_one_line_per_record() {
    let mapping = seeded_mapping();
    let mut backup = Backup::new(&mapping).with_name("nightly");
    backup.add_type::<Author>().unwrap();
    backup.add_type::<Book>().unwrap();
    assert_eq!(backup.type_names(), vec!["Author:authors", "Book:books"]);

    let dir = tempfile::tempdir().unwrap();
    let report = backup.run(dir.path().join("out")).unwrap();

    assert_eq!(report.name, "nightly");
    assert_eq!(report.class_instance_stats["Author:authors"], 2);
    assert_eq!(report.class_instance_stats["Book:books"], 3);
    assert!(report
        .backup_log
        .contains(&"Book:books => 3 records backed up".to_string()));

    assert_eq!(backup_file_name("Book:books"), "Book_books.json");
    let books_file = dir.path().join("out").join(backup_file_name("Book:books"));
    let books = fs::read_to_string(books_file).unwrap();
    let lines: Vec<&str> = books.lines().collect();
    assert_eq!(lines.len(), 3);
    for line in lines {
        let restored = Record::<Book>::from_data(line).unwrap();
        assert!(restored.pages > 1);
        assert_eq!(restored.history().len(), 1);
        let versions = restored.version_history().unwrap().unwrap();
        assert_eq!(versions.last().unwrap().record.pages, 1);
    }
}

#[test]
fn rejects_types_without_a_database() {
    let mapping = seeded_mapping();
    let mut backup = Backup::new(&mapping);
    assert!(backup.is_backup_type::<Author>().unwrap());
    assert!(!backup.is_backup_type::<Unmapped>().unwrap());
    assert!(matches!(
        backup.add_type::<Unmapped>(),
        Err(StoreError::NoMapping { .. })
    ));
    assert_eq!(backup_name::<Unmapped>(), "Unmapped:Unmapped");
}

#[test]
fn report_can_be_saved_as_a_record() {
    let mapping = seeded_mapping();
    let mut backup = Backup::new(&mapping);
    backup.add_type::<Author>().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let report = backup.run(dir.path()).unwrap();

    let reports = mapping.records::<BackupReport>();
    reports.ensure_table().unwrap();
    let mut saved = Record::new(report.clone());
    reports.save(&mut saved).unwrap();

    let loaded = reports.find_one(saved.id()).unwrap().unwrap();
    assert_eq!(loaded.data(), &report);
    assert!(loaded.started.is_some());
}
