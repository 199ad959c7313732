//! Best-effort persistence of the [`ClientDocument`].
//!
//! The document lives under a single key in a [`KeyValueStore`]. Saving
//! never fails outright: when the store refuses a write, everything is
//! cleared and the current text is saved again without history. Loading
//! never fails either: malformed fields fall back to safe defaults.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, warn};

use crate::document::{clamp_index, now_millis, ClientDocument};

pub const STORAGE_KEY: &str = "tone-picker-data";
pub const EXPORT_VERSION: &str = "1.0.0";
const PROBE_KEY: &str = "__storage_test__";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage quota exceeded")]
    QuotaExceeded,
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("could not encode document: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Failed to import data: {0}")]
    Read(#[from] io::Error),
    #[error("Failed to import data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Failed to import data: Invalid file format")]
    InvalidFormat,
}

/// String key-value storage in the shape of browser `localStorage`.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
    fn clear(&mut self) -> Result<(), StorageError>;
}

// --- File-backed store ---

/// Resolve the default data directory (`$TONEPICKER_DATA_DIR` or `~/.tonepicker/`).
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("TONEPICKER_DATA_DIR").filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tonepicker")
}

/// One `<key>.kv.json` file per key inside a directory. The directory may
/// be shared, so only files with that suffix belong to the store.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}{KEY_FILE_SUFFIX}"))
    }
}

const KEY_FILE_SUFFIX: &str = ".kv.json";

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Temp file + rename, so a crash mid-write never leaves a torn document.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let tmp = self.dir.join(format!(".{key}{KEY_FILE_SUFFIX}.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, self.path_for(key))?;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let owned = name
                .to_str()
                .and_then(|name| name.strip_suffix(KEY_FILE_SUFFIX))
                .is_some_and(|key| !key.is_empty());
            if owned && entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }
}

// --- In-memory store ---

/// In-process store with an optional byte quota (keys + values).
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            items: HashMap::new(),
            quota: Some(quota),
        }
    }

    fn used_without(&self, key: &str) -> usize {
        self.items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            if self.used_without(key) + key.len() + value.len() > quota {
                return Err(StorageError::QuotaExceeded);
            }
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.items.clear();
        Ok(())
    }
}

// --- Persistence ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// The store rejected the full document; it was wiped and only the
    /// current text survived.
    SavedWithoutHistory,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageInfo {
    pub size: usize,
    pub history_count: usize,
    pub last_saved: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct LocalPersistence<S> {
    store: S,
}

impl<S: KeyValueStore> LocalPersistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn save(&mut self, document: &ClientDocument) -> SaveOutcome {
        let mut stored = document.normalized();
        stored.timestamp = now_millis();

        let err = match self.write(&stored) {
            Ok(()) => return SaveOutcome::Saved,
            Err(err) => err,
        };
        error!(error = %err, "failed to save document");

        let fallback = ClientDocument {
            text: stored.text,
            history: Vec::new(),
            current_index: -1,
            timestamp: now_millis(),
        };
        let retry = match self.store.clear() {
            Ok(()) => self.write(&fallback),
            Err(err) => Err(err),
        };
        match retry {
            Ok(()) => {
                warn!("storage was cleared, saved current text without history");
                SaveOutcome::SavedWithoutHistory
            }
            Err(err) => {
                error!(error = %err, "failed to clear storage");
                SaveOutcome::Failed
            }
        }
    }

    pub fn load(&self) -> Option<ClientDocument> {
        let raw = match self.store.get_item(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                error!(error = %err, "failed to load document");
                return None;
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(fields)) => Some(reconstruct(&fields)),
            Ok(_) => None,
            Err(err) => {
                error!(error = %err, "stored document is not valid JSON");
                None
            }
        }
    }

    pub fn clear(&mut self) {
        if let Err(err) = self.store.remove_item(STORAGE_KEY) {
            error!(error = %err, "failed to clear document");
        }
    }

    pub fn storage_info(&self) -> StorageInfo {
        let empty = StorageInfo {
            size: 0,
            history_count: 0,
            last_saved: None,
        };
        let raw = match self.store.get_item(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return empty,
            Err(err) => {
                error!(error = %err, "failed to read storage info");
                return empty;
            }
        };
        let Ok(value) = serde_json::from_str::<Value>(&raw) else {
            return empty;
        };
        StorageInfo {
            size: raw.len(),
            history_count: value["history"].as_array().map_or(0, Vec::len),
            last_saved: value["timestamp"]
                .as_i64()
                .and_then(DateTime::<Utc>::from_timestamp_millis),
        }
    }

    /// Whether the store accepts writes at all.
    pub fn is_available(&mut self) -> bool {
        self.store
            .set_item(PROBE_KEY, PROBE_KEY)
            .and_then(|()| self.store.remove_item(PROBE_KEY))
            .is_ok()
    }

    fn write(&mut self, document: &ClientDocument) -> Result<(), StorageError> {
        let json = serde_json::to_string(document)?;
        self.store.set_item(STORAGE_KEY, &json)
    }
}

/// Rebuild a document from untrusted JSON, replacing anything malformed.
fn reconstruct(fields: &Map<String, Value>) -> ClientDocument {
    let text = fields
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let history: Vec<String> = fields
        .get("history")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    let current_index = fields
        .get("currentIndex")
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
        .unwrap_or(-1);
    let timestamp = fields
        .get("timestamp")
        .and_then(Value::as_i64)
        .unwrap_or_else(now_millis);

    ClientDocument {
        current_index: clamp_index(current_index, history.len()),
        text,
        history,
        timestamp,
    }
}

// --- Export / import ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportedDocument<'a> {
    #[serde(flatten)]
    document: &'a ClientDocument,
    export_date: String,
    version: &'static str,
}

/// Write `document` as pretty JSON to `tone-picker-data-<date>.json` in `dir`.
pub fn export_to_file(document: &ClientDocument, dir: &Path) -> Result<PathBuf, StorageError> {
    let now = Utc::now();
    let exported = ExportedDocument {
        document,
        export_date: now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        version: EXPORT_VERSION,
    };
    let json = serde_json::to_string_pretty(&exported)?;
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}-{}.json", STORAGE_KEY, now.format("%Y-%m-%d")));
    fs::write(&path, json).inspect_err(|e| error!(error = %e, "failed to export data"))?;
    Ok(path)
}

/// Read a previously exported file. All or nothing: any problem with the
/// file as a whole is an error, but individual bad fields get defaults.
pub fn import_from_file(path: &Path) -> Result<ClientDocument, ImportError> {
    let raw = fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&raw)? {
        Value::Object(fields) => {
            let mut document = reconstruct(&fields);
            document.timestamp = now_millis();
            Ok(document)
        }
        _ => Err(ImportError::InvalidFormat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc_with_history(len: usize, current_index: i64) -> ClientDocument {
        ClientDocument {
            text: "current".to_string(),
            history: (0..len).map(|i| format!("v{i}")).collect(),
            current_index,
            timestamp: 0,
        }
    }

    #[test]
    fn save_then_load() {
        let mut persistence = LocalPersistence::new(MemoryStore::new());
        let doc = doc_with_history(3, 2);
        assert_eq!(persistence.save(&doc), SaveOutcome::Saved);

        let loaded = persistence.load().unwrap();
        assert_eq!(loaded.text, "current");
        assert_eq!(loaded.history, doc.history);
        assert_eq!(loaded.current_index, 2);
        assert!(loaded.timestamp > 0);
    }

    #[test]
    fn save_truncates_history_to_cap() {
        let mut persistence = LocalPersistence::new(MemoryStore::new());
        persistence.save(&doc_with_history(80, 79));

        let loaded = persistence.load().unwrap();
        assert_eq!(loaded.history.len(), 50);
        assert_eq!(loaded.history[0], "v30");
        assert_eq!(loaded.history[49], "v79");
        assert_eq!(loaded.current_index, 49);
    }

    #[test]
    fn quota_failure_falls_back_to_text_only() {
        let mut persistence = LocalPersistence::new(MemoryStore::with_quota(200));
        let outcome = persistence.save(&doc_with_history(40, 39));
        assert_eq!(outcome, SaveOutcome::SavedWithoutHistory);

        let loaded = persistence.load().unwrap();
        assert_eq!(loaded.text, "current");
        assert!(loaded.history.is_empty());
        assert_eq!(loaded.current_index, -1);
    }

    #[test]
    fn total_failure_is_reported_not_raised() {
        let mut persistence = LocalPersistence::new(MemoryStore::with_quota(10));
        assert_eq!(persistence.save(&doc_with_history(2, 1)), SaveOutcome::Failed);
        assert!(persistence.load().is_none());
    }

    #[test]
    fn load_repairs_malformed_fields() {
        let mut store = MemoryStore::new();
        store
            .set_item(
                STORAGE_KEY,
                r#"{"text":7,"history":["a",3,"b"],"currentIndex":"x","timestamp":"soon"}"#,
            )
            .unwrap();
        let loaded = LocalPersistence::new(store).load().unwrap();
        assert_eq!(loaded.text, "");
        assert_eq!(loaded.history, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(loaded.current_index, -1);
        assert!(loaded.timestamp > 0);
    }

    #[test]
    fn load_clamps_out_of_range_index() {
        let mut store = MemoryStore::new();
        store
            .set_item(STORAGE_KEY, r#"{"text":"t","history":["a"],"currentIndex":9}"#)
            .unwrap();
        assert_eq!(LocalPersistence::new(store).load().unwrap().current_index, 0);
    }

    #[test]
    fn load_rejects_non_objects_and_garbage() {
        for raw in ["[1,2]", "null", "{{{"] {
            let mut store = MemoryStore::new();
            store.set_item(STORAGE_KEY, raw).unwrap();
            assert!(LocalPersistence::new(store).load().is_none(), "{raw}");
        }
        assert!(LocalPersistence::new(MemoryStore::new()).load().is_none());
    }

    #[test]
    fn clear_removes_the_document() {
        let mut persistence = LocalPersistence::new(MemoryStore::new());
        persistence.save(&doc_with_history(1, 0));
        persistence.clear();
        assert!(persistence.load().is_none());
    }

    #[test]
    fn storage_info_reports_size_and_count() {
        let mut persistence = LocalPersistence::new(MemoryStore::new());
        assert_eq!(
            persistence.storage_info(),
            StorageInfo {
                size: 0,
                history_count: 0,
                last_saved: None
            }
        );

        persistence.save(&doc_with_history(4, 3));
        let info = persistence.storage_info();
        let raw = persistence.store().get_item(STORAGE_KEY).unwrap().unwrap();
        assert_eq!(info.size, raw.len());
        assert_eq!(info.history_count, 4);
        assert!(info.last_saved.is_some());
    }

    #[test]
    fn availability_probe_leaves_nothing_behind() {
        let mut persistence = LocalPersistence::new(MemoryStore::new());
        assert!(persistence.is_available());
        assert!(persistence.store().get_item(PROBE_KEY).unwrap().is_none());

        let mut full = LocalPersistence::new(MemoryStore::with_quota(4));
        assert!(!full.is_available());
    }
}
