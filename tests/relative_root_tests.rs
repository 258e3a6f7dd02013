//! Imports from source directories given relative to the working directory.
//!
//! Changes the process working directory, so this file holds a single test.

use std::env;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use csv_table_importer::{ImportDb, ImportSettings, discover_csv_files, run_import};

fn write_csv(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create directory");
    }
    fs::write(&path, content).expect("Failed to write CSV");
}

fn import_tables(root: &str, target: &Path) -> Vec<String> {
    if target.exists() {
        fs::remove_file(target).expect("Failed to remove previous database");
    }
    let settings = ImportSettings::builder()
        .source_directory(root)
        .connection_target(target.to_string_lossy())
        .recursive(true)
        .include_directory_in_table_name(true)
        .build()
        .expect("Failed to build settings");

    run_import(settings).unwrap_or_else(|e| panic!("import from {root:?} failed: {e}"));
    ImportDb::open(&target.to_string_lossy())
        .expect("Failed to open database")
        .table_names()
        .expect("Failed to list tables")
}

#[test]
fn test_relative_source_directories() {
    let work = TempDir::new().unwrap();
    let db_dir = TempDir::new().unwrap();
    let target = db_dir.path().join("import.duckdb");
    write_csv(work.path(), "data/top.csv", "a\n1\n");
    write_csv(work.path(), "data/reports/q1.csv", "a\n1\n");

    let previous = env::current_dir().unwrap();
    env::set_current_dir(work.path()).unwrap();

    for root in ["data", "data/", "./data", "./data/"] {
        let files = discover_csv_files(Path::new(root), true).unwrap();
        assert_eq!(files.len(), 2, "discovery from {root:?}");
        assert!(files.iter().all(|f| f.path.starts_with(root)));

        assert_eq!(import_tables(root, &target), vec!["reports_q1", "top"]);
    }

    env::set_current_dir(work.path().join("data")).unwrap();
    assert_eq!(import_tables(".", &target), vec!["reports_q1", "top"]);

    env::set_current_dir(previous).unwrap();
}
