// crates/schema-sync-core/src/runtime/store.rs
// ============================================================================
// Module: Schema Sync Stores
// Description: In-memory and JSON-file version caches and settings stores.
// Purpose: Provide deterministic store implementations without an editor host.
// Dependencies: crate::interfaces, serde_json
// ============================================================================

//! ## Overview
//! In-memory stores are cloneable handles over shared maps, so tests can keep
//! a handle and inspect what the service wrote. File stores persist a single
//! JSON object (one key per entry) and replace it atomically on every update.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use serde_json::Map;
use serde_json::Value;

use crate::interfaces::SettingsStore;
use crate::interfaces::StoreError;
use crate::interfaces::VersionCache;

// ============================================================================
// SECTION: In-Memory Stores
// ============================================================================

/// In-memory version cache for tests and embedders.
#[derive(Debug, Default, Clone)]
pub struct InMemoryVersionCache {
    /// Cached versions protected by a mutex.
    versions: Arc<Mutex<BTreeMap<String, String>>>,
}

impl InMemoryVersionCache {
    /// Creates an empty in-memory version cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a cached version, returning the cache for chaining.
    #[must_use]
    pub fn with_entry(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Ok(mut guard) = self.versions.lock() {
            guard.insert(key.into(), value.into());
        }
        self
    }
}

impl VersionCache for InMemoryVersionCache {
    fn get(&self, key: &str) -> Option<String> {
        self.versions.lock().ok()?.get(key).cloned()
    }

    fn update(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.versions
            .lock()
            .map_err(|_| StoreError::Store("version cache mutex poisoned".to_string()))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// In-memory settings store for tests and embedders.
#[derive(Debug, Default, Clone)]
pub struct InMemorySettingsStore {
    /// Settings values protected by a mutex.
    values: Arc<Mutex<BTreeMap<String, Value>>>,
}

impl InMemorySettingsStore {
    /// Creates an empty in-memory settings store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a setting value, returning the store for chaining.
    #[must_use]
    pub fn with_value(self, key: impl Into<String>, value: Value) -> Self {
        if let Ok(mut guard) = self.values.lock() {
            guard.insert(key.into(), value);
        }
        self
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let guard = self
            .values
            .lock()
            .map_err(|_| StoreError::Store("settings store mutex poisoned".to_string()))?;
        Ok(guard.get(key).cloned())
    }

    fn update(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.values
            .lock()
            .map_err(|_| StoreError::Store("settings store mutex poisoned".to_string()))?
            .insert(key.to_string(), value);
        Ok(())
    }
}

// ============================================================================
// SECTION: JSON File Stores
// ============================================================================

/// JSON-object document persisted on disk.
#[derive(Debug)]
struct JsonObjectFile {
    /// Document path.
    path: PathBuf,
    /// Serializes read-modify-write cycles within the process.
    lock: Mutex<()>,
}

impl JsonObjectFile {
    /// Creates a handle for the document at `path`.
    fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Loads the document; a missing or empty file is an empty object.
    fn load(&self) -> Result<Map<String, Value>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(err) => return Err(StoreError::Io(err.to_string())),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(StoreError::Invalid(format!(
                "{} must contain a json object",
                self.path.display()
            ))),
            Err(err) => Err(StoreError::Invalid(err.to_string())),
        }
    }

    /// Writes the document through a temporary file and rename.
    fn save(&self, map: Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|err| StoreError::Io(err.to_string()))?;
        }
        let mut bytes = serde_json::to_vec_pretty(&Value::Object(map))
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        bytes.push(b'\n');
        let tmp_path = temp_path(&self.path);
        fs::write(&tmp_path, bytes).map_err(|err| StoreError::Io(err.to_string()))?;
        fs::rename(&tmp_path, &self.path).map_err(|err| StoreError::Io(err.to_string()))
    }

    /// Reads one key from the document.
    fn read_key(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let _guard =
            self.lock.lock().map_err(|_| StoreError::Store("file store mutex poisoned".to_string()))?;
        let mut map = self.load()?;
        Ok(map.remove(key))
    }

    /// Replaces one key in the document.
    fn write_key(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let _guard =
            self.lock.lock().map_err(|_| StoreError::Store("file store mutex poisoned".to_string()))?;
        let mut map = self.load()?;
        map.insert(key.to_string(), value);
        self.save(map)
    }
}

/// Returns the sibling temporary path used for atomic writes.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|name| name.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Version cache persisted as a JSON object file.
#[derive(Debug)]
pub struct JsonFileVersionCache {
    /// Backing document.
    file: JsonObjectFile,
}

impl JsonFileVersionCache {
    /// Opens (or lazily creates) the version cache at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonObjectFile::new(path),
        }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file.path
    }
}

impl VersionCache for JsonFileVersionCache {
    fn get(&self, key: &str) -> Option<String> {
        match self.file.read_key(key) {
            Ok(Some(Value::String(value))) => Some(value),
            _ => None,
        }
    }

    fn update(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.file.write_key(key, Value::String(value.to_string()))
    }
}

/// Settings store persisted as a JSON object file (a `settings.json` layout).
#[derive(Debug)]
pub struct JsonFileSettingsStore {
    /// Backing document.
    file: JsonObjectFile,
}

impl JsonFileSettingsStore {
    /// Opens (or lazily creates) the settings document at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonObjectFile::new(path),
        }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file.path
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.file.read_key(key)
    }

    fn update(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.file.write_key(key, value)
    }
}
