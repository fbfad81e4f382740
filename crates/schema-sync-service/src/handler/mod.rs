// crates/schema-sync-service/src/handler/mod.rs
// ============================================================================
// Module: Schema Sync Handlers
// Description: Handler trait applying mappings to a backing store.
// Purpose: Separate ownership arbitration from store-specific writes.
// Dependencies: async-trait, schema-sync-core, thiserror
// ============================================================================

//! ## Overview
//! A [`SchemaHandler`] applies one admitted mapping to the store it owns: the
//! JSON settings association list or the YAML language-service registry.
//! Handlers guard their own stores; the service may interleave a flush with a
//! timer drain.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use schema_sync_core::DocumentUri;
use schema_sync_core::ResolvedSchemas;
use schema_sync_core::SchemaLocation;
use schema_sync_core::SchemaMapping;
use schema_sync_core::SchemaRef;
use schema_sync_core::StoreError;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors returned by schema handlers.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Schema reference could not be resolved to a location.
    #[error("unresolved schema: {0}")]
    Unresolved(String),
    /// External language service failed to activate or register.
    #[error("language service activation failed: {0}")]
    Activation(String),
    /// Backing store rejected a read or write.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
    /// Backing store holds data in an unexpected shape.
    #[error("invalid store contents: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Handler Trait
// ============================================================================

/// Applies admitted schema mappings to one backing store.
#[async_trait]
pub trait SchemaHandler: Send + Sync {
    /// Returns true when the store currently associates `uri` with a schema.
    fn is_mapped(&self, uri: &DocumentUri) -> bool;

    /// Applies one mapping: associate when `schema` is present, remove otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError`] when the schema cannot be resolved or the store
    /// cannot be updated. Nothing is written in that case.
    async fn handle_update(
        &self,
        mapping: &SchemaMapping,
        schemas: &ResolvedSchemas,
    ) -> Result<(), HandlerError>;
}

/// Resolves a schema reference against the resolved table.
///
/// Direct locations are returned as-is; names must be present in the table.
///
/// # Errors
///
/// Returns [`HandlerError::Unresolved`] when a named schema is not in the table.
pub fn resolve_schema(
    reference: &SchemaRef,
    schemas: &ResolvedSchemas,
) -> Result<SchemaLocation, HandlerError> {
    schemas.resolve(reference).ok_or_else(|| HandlerError::Unresolved(reference.to_string()))
}

// ============================================================================
// SECTION: Implementations
// ============================================================================

pub mod json;
pub mod yaml;

pub use json::JsonSchemaHandler;
pub use yaml::SchemaContributor;
pub use yaml::YamlLanguageService;
pub use yaml::YamlSchemaHandler;
pub use yaml::YamlSchemaRegistry;
