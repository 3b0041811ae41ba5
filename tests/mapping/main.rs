//! Integration tests for database mapping resolution.

mod classes;

use std::sync::{Mutex, MutexGuard};

use classes::{Base, Broken, Derived1, Derived2, Derived3, MidA, MidB, MidC};
use stored_rust::mapping::{self, Database, DatabaseConfig, DatabaseMapping};
use stored_rust::{records, Record, RecordsExt, Storable, StoreError};

// The process-wide mapping is shared by every test in this binary.
static GLOBAL_LOCK: Mutex<()> = Mutex::new(());

fn lock_global() -> MutexGuard<'static, ()> {
    let guard = GLOBAL_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    mapping::clear_database_config().unwrap();
    guard
}

fn sqlite_memory() -> Database {
    Database::new("sqlite", [("filename", ":memory:")]).unwrap()
}

fn write_and_read<T: Storable + Default>(mapping: &DatabaseMapping) {
    let repo = mapping.records::<T>();
    repo.ensure_table().unwrap();
    let mut record = Record::new(T::default());
    repo.save(&mut record).unwrap();
    assert!(repo.find_one(record.id()).unwrap().is_some());
}

#[test]
fn every_class_is_readable_and_writable_on_default() {
    let mapping = DatabaseMapping::new();
    mapping.set_default(Some(sqlite_memory())).unwrap();

    write_and_read::<Base>(&mapping);
    write_and_read::<MidA>(&mapping);
    write_and_read::<MidB>(&mapping);
    write_and_read::<MidC>(&mapping);
    write_and_read::<Derived1>(&mapping);
    write_and_read::<Derived2>(&mapping);
    write_and_read::<Derived3>(&mapping);
}

#[test]
fn base_mapping_applies_all_the_way_down() {
    let mapping = DatabaseMapping::new();
    let defdb = sqlite_memory();
    let mapdb = sqlite_memory();
    mapping.set_default(Some(defdb.clone())).unwrap();
    mapping.map_type::<Base>(mapdb.clone()).unwrap();

    assert_eq!(mapping.resolve::<Base>().unwrap(), mapdb);
    assert_eq!(mapping.resolve::<MidA>().unwrap(), mapdb);
    assert_eq!(mapping.resolve::<MidB>().unwrap(), mapdb);
    assert_eq!(mapping.resolve::<MidC>().unwrap(), mapdb);
    assert_eq!(mapping.resolve::<Derived1>().unwrap(), mapdb);
    assert_eq!(mapping.resolve::<Derived2>().unwrap(), mapdb);
    assert_eq!(mapping.resolve::<Derived3>().unwrap(), mapdb);
    assert_ne!(mapping.resolve::<Base>().unwrap(), defdb);
}

#[test]
fn parent_order_decides_between_mids() {
    let mapping = DatabaseMapping::new();
    let a = Database::open(DatabaseConfig::new("memory")).unwrap();
    let b = Database::open(DatabaseConfig::new("memory")).unwrap();
    let c = Database::open(DatabaseConfig::new("memory")).unwrap();
    mapping.map_type::<MidA>(a.clone()).unwrap();
    mapping.map_type::<MidB>(b.clone()).unwrap();
    mapping.map_type::<MidC>(c.clone()).unwrap();

    assert_eq!(mapping.resolve::<Derived1>().unwrap(), a);
    assert_eq!(mapping.resolve::<Derived2>().unwrap(), c);
    assert_eq!(mapping.resolve::<Derived3>().unwrap(), b);
}

#[test]
fn lineage_is_linearized_most_specific_first() {
    let names: Vec<&str> = Derived3::lineage()
        .linearize()
        .unwrap()
        .iter()
        .map(|key| key.name().rsplit("::").next().unwrap_or(""))
        .collect();
    assert_eq!(names, vec!["Derived3", "MidB", "MidC", "MidA", "Base"]);
}

#[test]
fn inconsistent_parents_fail_resolution() {
    let mapping = DatabaseMapping::new();
    mapping.set_default(Some(sqlite_memory())).unwrap();
    assert!(matches!(
        mapping.resolve::<Broken>(),
        Err(StoreError::InconsistentHierarchy { .. })
    ));
}

#[test]
fn no_mapping_and_allow_missing() {
    let mapping = DatabaseMapping::new();
    assert!(matches!(
        mapping.resolve::<Derived1>(),
        Err(StoreError::NoMapping { .. })
    ));
    assert!(mapping.resolve_or_none::<Derived1>().unwrap().is_none());
}

#[test]
fn global_mapping_functions() {
    let _guard = lock_global();
    let defdb = sqlite_memory();
    let mapdb = sqlite_memory();

    assert!(matches!(
        mapping::get_mapping::<MidA>(),
        Err(StoreError::NoMapping { .. })
    ));
    assert!(mapping::get_mapping_or_none::<MidA>().unwrap().is_none());

    mapping::default_database(Some(defdb.clone())).unwrap();
    mapping::class_database::<MidA>(mapdb.clone()).unwrap();
    assert_eq!(mapping::get_mapping::<MidA>().unwrap(), mapdb);
    assert_eq!(mapping::get_mapping::<Derived1>().unwrap(), mapdb);
    assert_eq!(mapping::get_mapping::<MidB>().unwrap(), defdb);

    mapping::clear_database_config().unwrap();
    assert!(mapping::get_mapping_or_none::<MidB>().unwrap().is_none());
}

#[test]
fn global_records_use_global_mapping() {
    let _guard = lock_global();
    mapping::default_database(Some(sqlite_memory())).unwrap();

    let repo = records::<Base>();
    repo.ensure_table().unwrap();
    let mut record = Record::new(Base {
        name: "global".into(),
    });
    repo.save(&mut record).unwrap();
    assert_eq!(repo.find_one(record.id()).unwrap().unwrap().name, "global");

    mapping::clear_database_config().unwrap();
    assert!(matches!(
        repo.find_one(record.id()),
        Err(StoreError::NoMapping { .. })
    ));
}
