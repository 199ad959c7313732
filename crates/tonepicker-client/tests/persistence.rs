use std::fs;

use pretty_assertions::assert_eq;
use serde_json::Value;
use tempfile::TempDir;

use tonepicker_client::{
    export_to_file, import_from_file, ClientDocument, FileStore, ImportError, KeyValueStore,
    LocalPersistence, SaveOutcome, STORAGE_KEY,
};

fn sample_document() -> ClientDocument {
    let mut doc = ClientDocument::new();
    doc.record("hey, meeting moved to 3");
    doc.record("Please note the meeting has been moved to 3 p.m.");
    doc
}

#[test]
fn file_store_persists_across_instances() {
    let dir = TempDir::new().unwrap();
    let doc = sample_document();

    let mut first = LocalPersistence::new(FileStore::new(dir.path()));
    assert_eq!(first.save(&doc), SaveOutcome::Saved);
    assert!(dir.path().join(format!("{STORAGE_KEY}.kv.json")).exists());

    let second = LocalPersistence::new(FileStore::new(dir.path()));
    let loaded = second.load().unwrap();
    assert_eq!(loaded.text, doc.text);
    assert_eq!(loaded.history, doc.history);
    assert_eq!(loaded.current_index, 1);
}

#[test]
fn file_store_clear_and_missing_dir() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("not-yet");

    let mut persistence = LocalPersistence::new(FileStore::new(&missing));
    assert!(persistence.load().is_none());
    persistence.clear();

    persistence.save(&sample_document());
    persistence.clear();
    assert!(persistence.load().is_none());

    let mut store = FileStore::new(&missing);
    store.set_item("other", "{}").unwrap();
    store.clear().unwrap();
    assert!(store.get_item("other").unwrap().is_none());
}

#[test]
fn clear_leaves_foreign_files_alone() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("package.json"), "{}").unwrap();
    fs::write(dir.path().join("notes.txt"), "keep me").unwrap();
    let exported = export_to_file(&sample_document(), dir.path()).unwrap();

    let mut persistence = LocalPersistence::new(FileStore::new(dir.path()));
    persistence.save(&sample_document());
    let mut store = FileStore::new(dir.path());
    store.clear().unwrap();

    assert!(persistence.load().is_none());
    assert!(dir.path().join("package.json").exists());
    assert!(dir.path().join("notes.txt").exists());
    assert!(exported.exists());
}

#[test]
fn export_writes_dated_file_with_metadata() {
    let dir = TempDir::new().unwrap();
    let doc = sample_document();

    let path = export_to_file(&doc, dir.path()).unwrap();
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("tone-picker-data-"), "{name}");
    assert!(name.ends_with(".json"));

    let exported: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(exported["version"], "1.0.0");
    assert!(exported["exportDate"].is_string());
    assert_eq!(exported["text"], doc.text.as_str());
    assert_eq!(exported["currentIndex"], 1);

    let imported = import_from_file(&path).unwrap();
    assert_eq!(imported.text, doc.text);
    assert_eq!(imported.history, doc.history);
    assert_eq!(imported.current_index, doc.current_index);
}

#[test]
fn importing_an_empty_object_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.json");
    fs::write(&path, "{}").unwrap();

    let imported = import_from_file(&path).unwrap();
    assert_eq!(imported.text, "");
    assert!(imported.history.is_empty());
    assert_eq!(imported.current_index, -1);
}

#[test]
fn import_rejects_bad_files() {
    let dir = TempDir::new().unwrap();

    let not_json = dir.path().join("garbage.json");
    fs::write(&not_json, "definitely not json").unwrap();
    assert!(matches!(import_from_file(&not_json), Err(ImportError::Parse(_))));

    let array = dir.path().join("array.json");
    fs::write(&array, "[1, 2, 3]").unwrap();
    let err = import_from_file(&array).unwrap_err();
    assert!(matches!(err, ImportError::InvalidFormat));
    assert_eq!(err.to_string(), "Failed to import data: Invalid file format");

    let missing = dir.path().join("missing.json");
    assert!(matches!(import_from_file(&missing), Err(ImportError::Read(_))));
}
