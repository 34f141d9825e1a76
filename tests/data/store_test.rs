use std::fs;
use std::sync::Arc;

use tempfile::TempDir;
use worklens::data::{load_collection, DataLoadError, DataStore, Value};

fn data_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

#[test]
fn test_load_collection_names_datasets_by_stem() {
    let dir = data_dir(&[
        ("employee.csv", "employee_id,company,band\n1,A,1\n2,B,2\n"),
        ("payroll.tsv", "employee_id\tamount\n1\t1000\n"),
        ("README.md", "not data"),
    ]);

    let collection = load_collection(dir.path()).unwrap();

    assert_eq!(collection.names().collect::<Vec<_>>(), vec!["employee", "payroll"]);
    let employees = collection.get("employee").unwrap();
    assert_eq!(employees.columns(), &["employee_id", "company", "band"]);
    assert_eq!(employees.len(), 2);
    assert_eq!(employees.records()[1].get("company"), &Value::from("B"));
    assert_eq!(
        collection.get("payroll").unwrap().records()[0].get("amount"),
        &Value::Number(1000.0)
    );
}

#[test]
fn test_cells_are_typed() {
    let dir = data_dir(&[(
        "employee.csv",
        "employee_id,date_of_exit,zone\n7,2024-03-31,\n8,NA,North\n",
    )]);

    let collection = load_collection(dir.path()).unwrap();
    let records = collection.get("employee").unwrap().records();

    assert_eq!(records[0].get("employee_id"), &Value::Number(7.0));
    assert!(records[0].get("date_of_exit").as_date().is_some());
    assert!(records[0].get("zone").is_null());
    assert!(records[1].get("date_of_exit").is_null());
    assert_eq!(records[1].get("zone").as_str(), Some("North"));
}

#[test]
fn test_empty_directory_is_empty_collection() {
    let dir = TempDir::new().unwrap();
    let collection = load_collection(dir.path()).unwrap();
    assert!(collection.is_empty());
}

#[test]
fn test_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");

    let err = load_collection(&missing).unwrap_err();
    assert!(matches!(err, DataLoadError::NotADirectory { .. }));
}

#[test]
fn test_malformed_file_names_the_file() {
    let dir = data_dir(&[
        ("employee.csv", "employee_id,company\n1,A\n"),
        ("broken.csv", "a,b\n1,2,3\n"),
    ]);

    let err = load_collection(dir.path()).unwrap_err();
    assert!(matches!(err, DataLoadError::Csv { .. }));
    assert!(err.to_string().contains("broken.csv"), "{}", err);
}

#[test]
fn test_duplicate_header_is_malformed() {
    let dir = data_dir(&[("employee.csv", "id,id\n1,2\n")]);

    let err = load_collection(dir.path()).unwrap_err();
    assert!(matches!(err, DataLoadError::Malformed { .. }));
    assert!(err.to_string().contains("employee.csv"));
}

#[test]
fn test_same_stem_twice_is_malformed() {
    let dir = data_dir(&[
        ("employee.csv", "id\n1\n"),
        ("employee.tsv", "id\n2\n"),
    ]);

    let err = load_collection(dir.path()).unwrap_err();
    assert!(matches!(err, DataLoadError::Malformed { .. }));
}

#[test]
fn test_store_memoizes_per_source() {
    let dir = data_dir(&[("employee.csv", "employee_id\n1\n")]);
    let store = DataStore::new();
    assert!(!store.is_cached(dir.path()));

    let first = store.load(dir.path()).unwrap();
    // Later edits are not seen: the first load is kept.
    fs::write(dir.path().join("employee.csv"), "employee_id\n1\n2\n").unwrap();
    let second = store.load(dir.path()).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.get("employee").unwrap().len(), 1);
    assert!(store.is_cached(dir.path()));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_store_does_not_cache_failures() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("later");
    let store = DataStore::new();

    assert!(store.load(&source).is_err());
    assert!(!store.is_cached(&source));
    assert!(store.is_empty());

    fs::create_dir(&source).unwrap();
    fs::write(source.join("employee.csv"), "employee_id\n1\n").unwrap();

    let collection = store.load(&source).unwrap();
    assert_eq!(collection.get("employee").unwrap().len(), 1);
}

#[test]
fn test_store_is_shared_across_threads() {
    let dir = data_dir(&[("employee.csv", "employee_id\n1\n2\n3\n")]);
    let store = Arc::new(DataStore::new());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let path = dir.path().to_path_buf();
            std::thread::spawn(move || store.load(&path).unwrap())
        })
        .collect();
    let loaded: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(loaded.iter().all(|c| Arc::ptr_eq(c, &loaded[0])));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_global_store_is_one_instance() {
    assert!(Arc::ptr_eq(&DataStore::global(), &DataStore::global()));
}
