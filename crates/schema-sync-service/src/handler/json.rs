// crates/schema-sync-service/src/handler/json.rs
// ============================================================================
// Module: JSON Schema Handler
// Description: Maintains the JSON schema association list in editor settings.
// Purpose: Map documents to schemas through `{fileMatch, url}` entries.
// Dependencies: schema-sync-core, schema-sync-config, serde, serde_json
// ============================================================================

//! ## Overview
//! The settings key (default `json.schemas`) holds an ordered list of entries
//! `{ "fileMatch": [paths], "url": schema, ... }`. [`JsonSchemaHandler`]
//! moves a document path between entries as mappings arrive.
//! Invariants:
//! - A path appears in at most one entry's `fileMatch` after any update.
//! - Unknown entry fields are preserved verbatim.
//! - Entries without `fileMatch` are never modified or dropped by path edits.
//! - Entries whose `fileMatch` becomes empty are dropped.
//! - Entries whose `url` ends with a stale suffix are removed once per handler
//!   instance, together with the first successful update.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use schema_sync_config::JsonHandlerConfig;
use schema_sync_core::DocumentUri;
use schema_sync_core::JsonFileSettingsStore;
use schema_sync_core::ResolvedSchemas;
use schema_sync_core::SchemaMapping;
use schema_sync_core::SettingsStore;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use url::Url;

use crate::handler::HandlerError;
use crate::handler::SchemaHandler;
use crate::handler::resolve_schema;

// ============================================================================
// SECTION: Settings Entries
// ============================================================================

/// One JSON schema association entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct JsonSchemaEntry {
    /// Document paths associated with `url`.
    #[serde(rename = "fileMatch", default, skip_serializing_if = "Option::is_none")]
    file_match: Option<Vec<String>>,
    /// Schema URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    /// Fields this handler does not interpret.
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl JsonSchemaEntry {
    /// Creates an entry associating one path with a schema URI.
    fn new(path: &str, url: &str) -> Self {
        Self {
            file_match: Some(vec![path.to_string()]),
            url: Some(url.to_string()),
            extra: Map::new(),
        }
    }

    /// Returns true when the entry lists `path`.
    fn matches(&self, path: &str) -> bool {
        self.file_match.as_ref().is_some_and(|paths| paths.iter().any(|item| item == path))
    }
}

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Handler writing JSON schema associations into a settings store.
pub struct JsonSchemaHandler {
    /// Settings store holding the association list.
    store: Arc<dyn SettingsStore>,
    /// Settings key of the association list.
    settings_key: String,
    /// Schema URL suffixes treated as stale.
    stale_url_suffixes: Vec<String>,
    /// Serializes read-modify-write cycles; true once stale entries are cleaned.
    stale_cleaned: Mutex<bool>,
}

impl JsonSchemaHandler {
    /// Creates a handler over a settings store.
    #[must_use]
    pub fn new(
        store: Arc<dyn SettingsStore>,
        settings_key: impl Into<String>,
        stale_url_suffixes: Vec<String>,
    ) -> Self {
        Self {
            store,
            settings_key: settings_key.into(),
            stale_url_suffixes,
            stale_cleaned: Mutex::new(false),
        }
    }

    /// Creates a handler over the configured settings file.
    #[must_use]
    pub fn from_config(config: &JsonHandlerConfig) -> Self {
        Self::new(
            Arc::new(JsonFileSettingsStore::new(&config.settings_path)),
            config.settings_key.as_str(),
            config.stale_url_suffixes.clone(),
        )
    }

    /// Loads the association list; a missing or null value is empty.
    fn load_entries(&self) -> Result<Vec<JsonSchemaEntry>, HandlerError> {
        match self.store.get(&self.settings_key)? {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value).map_err(|err| {
                HandlerError::Invalid(format!("{}: {err}", self.settings_key))
            }),
        }
    }

    /// Persists the association list.
    fn save_entries(&self, entries: &[JsonSchemaEntry]) -> Result<(), HandlerError> {
        let value = serde_json::to_value(entries)
            .map_err(|err| HandlerError::Invalid(format!("{}: {err}", self.settings_key)))?;
        self.store.update(&self.settings_key, value)?;
        Ok(())
    }

    /// Returns true when a schema URL ends with a stale suffix.
    fn is_stale(&self, entry: &JsonSchemaEntry) -> bool {
        entry.url.as_deref().is_some_and(|url| {
            self.stale_url_suffixes.iter().any(|suffix| url.ends_with(suffix.as_str()))
        })
    }
}

#[async_trait]
impl SchemaHandler for JsonSchemaHandler {
    fn is_mapped(&self, uri: &DocumentUri) -> bool {
        let path = document_path(uri);
        self.load_entries().is_ok_and(|entries| entries.iter().any(|entry| entry.matches(&path)))
    }

    async fn handle_update(
        &self,
        mapping: &SchemaMapping,
        schemas: &ResolvedSchemas,
    ) -> Result<(), HandlerError> {
        let url = match &mapping.schema {
            Some(reference) => Some(resolve_schema(reference, schemas)?.to_string()),
            None => None,
        };
        let path = document_path(&mapping.uri);

        let mut stale_cleaned = self
            .stale_cleaned
            .lock()
            .map_err(|_| HandlerError::Invalid("mutex poisoned".to_string()))?;
        let mut entries = self.load_entries()?;
        if !*stale_cleaned {
            entries.retain(|entry| !self.is_stale(entry));
        }
        remove_path(&mut entries, &path);
        if let Some(url) = url {
            assign_path(&mut entries, &path, &url);
        }
        self.save_entries(&entries)?;
        *stale_cleaned = true;
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the `fileMatch` form of a document URI.
///
/// `file://` URIs become local paths; anything else is used verbatim.
fn document_path(uri: &DocumentUri) -> String {
    Url::parse(uri.as_str())
        .ok()
        .filter(|url| url.scheme() == "file")
        .and_then(|url| url.to_file_path().ok())
        .map_or_else(|| uri.as_str().to_string(), |path| path.display().to_string())
}

/// Removes `path` everywhere, dropping entries it leaves without paths.
fn remove_path(entries: &mut Vec<JsonSchemaEntry>, path: &str) {
    entries.retain_mut(|entry| {
        let Some(paths) = entry.file_match.as_mut() else {
            return true;
        };
        if !paths.iter().any(|item| item == path) {
            return true;
        }
        paths.retain(|item| item != path);
        !paths.is_empty()
    });
}

/// Adds `path` to the entry for `url`, creating the entry when absent.
fn assign_path(entries: &mut Vec<JsonSchemaEntry>, path: &str, url: &str) {
    match entries.iter_mut().find(|entry| entry.url.as_deref() == Some(url)) {
        Some(entry) => entry.file_match.get_or_insert_with(Vec::new).push(path.to_string()),
        None => entries.push(JsonSchemaEntry::new(path, url)),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
