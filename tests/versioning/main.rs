//! Integration tests for delta version history.

use serde::{Deserialize, Serialize};
use serde_json::json;
use stored_rust::history::{self, parse_history};
use stored_rust::{
    Database, DatabaseConfig, DatabaseMapping, Record, RecordsExt, Storable, StoreError,
    Versioning,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Storable)]
#[storable(table = "SimpleVersionedTest", versioning = "delta")]
struct VersionedStorage {
    name: String,
    descrip: String,
    age: i64,
    extra_data: serde_json::Map<String, serde_json::Value>,
}

impl Default for VersionedStorage {
    fn default() -> Self {
        VersionedStorage {
            name: "default name".to_string(),
            descrip: String::new(),
            age: 42,
            extra_data: Default::default(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Storable)]
#[storable(table = "PlainTest")]
struct Plain {
    name: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Storable)]
#[storable(table = "LoggedTest", versioning = "ver:logged")]
struct Logged {
    name: String,
}

fn mapping(driver: &str) -> DatabaseMapping {
    let mapping = DatabaseMapping::new();
    let config = match driver {
        "sqlite" => DatabaseConfig::new("sqlite").param("filename", ":memory:"),
        other => DatabaseConfig::new(other),
    };
    mapping.set_default(Some(Database::open(config).unwrap())).unwrap();
    mapping
}

fn versioned_save_sequence(driver: &str) {
    let mapping = mapping(driver);
    let repo = mapping.records::<VersionedStorage>();
    repo.ensure_table().unwrap();
    assert_eq!(VersionedStorage::versioning().unwrap(), Versioning::DeltaHistory);

    let mut record = Record::new(VersionedStorage::default());
    repo.save(&mut record).unwrap();
    assert!(record.history().is_empty());
    assert_eq!(record.version_history().unwrap().unwrap().len(), 1);

    record.name = "first new name".into();
    repo.save(&mut record).unwrap();
    record.name = "last new name".into();
    repo.save(&mut record).unwrap();

    let stored = repo.find_one(record.id()).unwrap().unwrap();
    assert_eq!(stored.history().len(), 2);

    let current = stored.to_value().unwrap();
    let names: Vec<String> = parse_history(current, stored.history())
        .map(|step| step.unwrap().0["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["last new name", "first new name", "default name"]);

    let revisions = stored.version_history().unwrap().unwrap();
    assert_eq!(revisions.len(), 3);
    assert!(revisions[0].superseded_at.is_none());
    assert!(revisions[1].superseded_at.is_some());
    assert!(revisions[1].superseded_at >= revisions[2].superseded_at);
    assert!(revisions.iter().all(|r| r.record.id() == record.id()));
    assert!(revisions
        .iter()
        .all(|r| r.record.create_date() == record.create_date()));
}

#[test]
fn versioned_save_sequence_memory() {
    versioned_save_sequence("memory");
}

#[test]
fn versioned_save_sequence_journal() {
    versioned_save_sequence("journal");
}

#[test]
fn versioned_save_sequence_sqlite() {
    versioned_save_sequence("sqlite");
}

#[test]
fn history_is_stored_in_the_record() {
    let mapping = mapping("memory");
    let repo = mapping.records::<VersionedStorage>();
    repo.ensure_table().unwrap();

    let mut record = Record::new(VersionedStorage::default());
    repo.save(&mut record).unwrap();
    record.extra_data.insert("list".into(), json!([1, 2, 3]));
    repo.save(&mut record).unwrap();

    let text = record.to_data().unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let hist = value["_version_hist"].as_array().unwrap();
    assert_eq!(hist.len(), 1);
    // each entry is [diff, timestamp]
    let entry = hist[0].as_array().unwrap();
    assert_eq!(entry.len(), 2);
    assert!(entry[1].as_str().unwrap().starts_with("UTC:"));

    let decoded = history::decode_history(&value["_version_hist"]).unwrap();
    assert_eq!(decoded, record.history());
}

#[test]
fn repeated_saves_without_changes_add_nothing() {
    let mapping = mapping("memory");
    let repo = mapping.records::<VersionedStorage>();
    repo.ensure_table().unwrap();

    let mut record = Record::new(VersionedStorage::default());
    for _ in 0..4 {
        repo.save(&mut record).unwrap();
    }
    record.age = 1;
    repo.save(&mut record).unwrap();
    repo.save(&mut record).unwrap();

    let loaded = repo.find_one(record.id()).unwrap().unwrap();
    assert_eq!(loaded.history().len(), 1);
}

#[test]
fn loaded_record_continues_history() {
    let mapping = mapping("memory");
    let repo = mapping.records::<VersionedStorage>();
    repo.ensure_table().unwrap();

    let mut record = Record::new(VersionedStorage::default());
    repo.save(&mut record).unwrap();

    let mut loaded = repo.find_one(record.id()).unwrap().unwrap();
    loaded.descrip = "edited after load".into();
    repo.save(&mut loaded).unwrap();

    let descrips: Vec<String> = loaded
        .version_history()
        .unwrap()
        .unwrap()
        .into_iter()
        .map(|r| r.record.descrip.clone())
        .collect();
    assert_eq!(descrips, vec!["edited after load".to_string(), String::new()]);
}

#[test]
fn unversioned_types_report_not_applicable() {
    let mapping = mapping("memory");
    let repo = mapping.records::<Plain>();
    repo.ensure_table().unwrap();

    let mut record = Record::new(Plain { name: "a".into() });
    repo.save(&mut record).unwrap();
    record.name = "b".into();
    repo.save(&mut record).unwrap();

    assert!(record.history().is_empty());
    assert!(record.version_history().unwrap().is_none());
}

#[test]
fn unknown_versioning_mode_is_an_error() {
    let mapping = mapping("memory");
    let record = Record::new(Logged { name: "x".into() });
    assert!(matches!(
        record.version_history(),
        Err(StoreError::InvalidVersioningMode { ref mode, .. }) if mode == "ver:logged"
    ));

    let mut record = record;
    assert!(matches!(
        mapping.records::<Logged>().save(&mut record),
        Err(StoreError::InvalidVersioningMode { .. })
    ));
}
