pub mod document;
pub mod gateway;
pub mod storage;

pub use document::{ClientDocument, MAX_HISTORY};
pub use gateway::{ApiClient, ApiFailure, GatewayError, DEFAULT_BASE_URL, REQUEST_TIMEOUT};
pub use storage::{
    data_dir, export_to_file, import_from_file, FileStore, ImportError, KeyValueStore,
    LocalPersistence, MemoryStore, SaveOutcome, StorageError, StorageInfo, STORAGE_KEY,
};
