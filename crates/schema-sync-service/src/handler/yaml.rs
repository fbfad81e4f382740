// crates/schema-sync-service/src/handler/yaml.rs
// ============================================================================
// Module: YAML Schema Handler
// Description: Feeds schema associations to an external YAML language service.
// Purpose: Lazily activate the service and answer its schema requests.
// Dependencies: async-trait, schema-sync-core, tokio, url
// ============================================================================

//! ## Overview
//! The YAML language service asks a registered [`SchemaContributor`] which
//! schema applies to a document and then for that schema's content. The
//! [`YamlSchemaRegistry`] answers both questions from the mappings applied by
//! [`YamlSchemaHandler`].
//! Invariants:
//! - The language service is activated, and the contributor registered, before
//!   the first mapping is applied. A failed activation is retried on the next
//!   update.
//! - Local schema files are exposed under the contributor's URI scheme.
//! - Unreadable schema content is answered with an empty string.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use schema_sync_core::DocumentUri;
use schema_sync_core::ResolvedSchemas;
use schema_sync_core::SchemaMapping;
use tokio::sync::OnceCell;
use url::Url;

use crate::handler::HandlerError;
use crate::handler::SchemaHandler;
use crate::handler::resolve_schema;

// ============================================================================
// SECTION: Language Service Interfaces
// ============================================================================

/// External YAML language service.
#[async_trait]
pub trait YamlLanguageService: Send + Sync {
    /// Activates the service.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Activation`] when the service cannot start.
    async fn activate(&self) -> Result<(), HandlerError>;

    /// Registers a schema contributor for URIs with the given scheme.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Activation`] when registration is refused.
    fn register_contributor(
        &self,
        scheme: &str,
        contributor: Arc<dyn SchemaContributor>,
    ) -> Result<(), HandlerError>;
}

/// Answers schema questions from the YAML language service.
#[async_trait]
pub trait SchemaContributor: Send + Sync {
    /// Returns the schema URI associated with a document, if any.
    fn request_schema(&self, resource: &str) -> Option<String>;

    /// Returns the content behind a schema URI; empty when unreadable.
    async fn request_schema_content(&self, uri: &str) -> String;
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Document-to-schema registry served to the YAML language service.
///
/// # Invariants
/// - Keys are document URIs; values are schema URIs.
#[derive(Debug)]
pub struct YamlSchemaRegistry {
    /// URI scheme under which local schema files are exposed.
    scheme: String,
    /// Schema URI per document URI.
    schemas: Mutex<BTreeMap<String, String>>,
}

impl YamlSchemaRegistry {
    /// Creates an empty registry for a URI scheme.
    #[must_use]
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            schemas: Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns the registry URI scheme.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Associates a document with a schema URI.
    fn assign(&self, uri: &DocumentUri, schema_uri: String) -> Result<(), HandlerError> {
        self.schemas
            .lock()
            .map_err(|_| HandlerError::Invalid("mutex poisoned".to_string()))?
            .insert(uri.as_str().to_string(), schema_uri);
        Ok(())
    }

    /// Removes any association for a document.
    fn remove(&self, uri: &DocumentUri) -> Result<(), HandlerError> {
        self.schemas
            .lock()
            .map_err(|_| HandlerError::Invalid("mutex poisoned".to_string()))?
            .remove(uri.as_str());
        Ok(())
    }

    /// Returns the schema URI for a document.
    #[must_use]
    pub fn get(&self, uri: &str) -> Option<String> {
        self.schemas.lock().ok().and_then(|guard| guard.get(uri).cloned())
    }

    /// Returns true when a document has an association.
    #[must_use]
    pub fn contains(&self, uri: &str) -> bool {
        self.schemas.lock().is_ok_and(|guard| guard.contains_key(uri))
    }

    /// Maps a schema URI back to a local file path.
    fn local_path(&self, uri: &str) -> Option<PathBuf> {
        let prefix = format!("{}://", self.scheme);
        let file_uri = match uri.strip_prefix(&prefix) {
            Some(rest) => format!("file://{rest}"),
            None => uri.to_string(),
        };
        let url = Url::parse(&file_uri).ok()?;
        if url.scheme() != "file" {
            return None;
        }
        url.to_file_path().ok()
    }
}

#[async_trait]
impl SchemaContributor for YamlSchemaRegistry {
    fn request_schema(&self, resource: &str) -> Option<String> {
        self.get(resource)
    }

    async fn request_schema_content(&self, uri: &str) -> String {
        let Some(path) = self.local_path(uri) else {
            return String::new();
        };
        tokio::fs::read_to_string(path).await.unwrap_or_default()
    }
}

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Handler applying mappings to the YAML language service registry.
pub struct YamlSchemaHandler {
    /// External language service.
    service: Arc<dyn YamlLanguageService>,
    /// Registry served to the language service.
    registry: Arc<YamlSchemaRegistry>,
    /// Set once activation and registration succeed.
    activated: OnceCell<()>,
}

impl YamlSchemaHandler {
    /// Creates a handler exposing local schemas under `scheme`.
    #[must_use]
    pub fn new(service: Arc<dyn YamlLanguageService>, scheme: impl Into<String>) -> Self {
        Self {
            service,
            registry: Arc::new(YamlSchemaRegistry::new(scheme)),
            activated: OnceCell::new(),
        }
    }

    /// Returns the registry served to the language service.
    #[must_use]
    pub fn registry(&self) -> Arc<YamlSchemaRegistry> {
        Arc::clone(&self.registry)
    }

    /// Returns true once the language service is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.activated.initialized()
    }

    /// Activates the language service and registers the contributor.
    async fn activate(&self) -> Result<(), HandlerError> {
        self.service.activate().await?;
        let contributor: Arc<dyn SchemaContributor> = self.registry();
        self.service.register_contributor(self.registry.scheme(), contributor)
    }
}

#[async_trait]
impl SchemaHandler for YamlSchemaHandler {
    fn is_mapped(&self, uri: &DocumentUri) -> bool {
        self.is_active() && self.registry.contains(uri.as_str())
    }

    async fn handle_update(
        &self,
        mapping: &SchemaMapping,
        schemas: &ResolvedSchemas,
    ) -> Result<(), HandlerError> {
        self.activated.get_or_try_init(|| self.activate()).await?;
        match &mapping.schema {
            Some(reference) => {
                let location = resolve_schema(reference, schemas)?;
                self.registry.assign(&mapping.uri, location.with_scheme(self.registry.scheme()))
            }
            None => self.registry.remove(&mapping.uri),
        }
    }
}
