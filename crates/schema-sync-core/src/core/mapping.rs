// crates/schema-sync-core/src/core/mapping.rs
// ============================================================================
// Module: Schema Sync Mappings
// Description: Schema mapping requests and schema references.
// Purpose: Describe a single "associate or disassociate" request for a document.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`SchemaMapping`] asks the service to associate a document with a schema
//! (`schema` present) or to remove the association (`schema` absent). The
//! [`SchemaType`] selects the handler that applies it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::DocumentUri;
use crate::core::identifiers::OwnerId;
use crate::core::identifiers::SchemaName;
use crate::core::schemas::SchemaLocation;

// ============================================================================
// SECTION: Schema Type
// ============================================================================

/// Language service family a mapping targets.
///
/// # Invariants
/// - The set is closed; each variant maps to at most one registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaType {
    /// JSON documents (settings-backed association list).
    Json,
    /// YAML documents (language-service contributor registry).
    Yaml,
}

impl SchemaType {
    /// Returns a stable label for the schema type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Schema Reference
// ============================================================================

/// Reference to a schema carried by a mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SchemaRef {
    /// Short name resolved through the resolved schema table.
    Named(SchemaName),
    /// Concrete schema location used as-is.
    Location(SchemaLocation),
}

impl SchemaRef {
    /// Creates a named schema reference.
    #[must_use]
    pub fn named(name: impl Into<SchemaName>) -> Self {
        Self::Named(name.into())
    }

    /// Creates a direct location reference.
    #[must_use]
    pub const fn location(location: SchemaLocation) -> Self {
        Self::Location(location)
    }
}

impl fmt::Display for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => name.fmt(f),
            Self::Location(location) => location.fmt(f),
        }
    }
}

// ============================================================================
// SECTION: Schema Mapping
// ============================================================================

/// Request to associate (or disassociate) a document with a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaMapping {
    /// Document being mapped.
    pub uri: DocumentUri,
    /// Handler family that applies the mapping.
    #[serde(rename = "type")]
    pub schema_type: SchemaType,
    /// Feature claiming the document, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerId>,
    /// Schema to associate; `None` removes the existing association.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaRef>,
}

impl SchemaMapping {
    /// Creates an unowned removal mapping for the document.
    #[must_use]
    pub fn new(uri: impl Into<DocumentUri>, schema_type: SchemaType) -> Self {
        Self {
            uri: uri.into(),
            schema_type,
            owner: None,
            schema: None,
        }
    }

    /// Sets the owner claiming the document.
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<OwnerId>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Sets the schema reference.
    #[must_use]
    pub fn with_schema(mut self, schema: SchemaRef) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Returns true when the mapping removes an association.
    #[must_use]
    pub const fn is_removal(&self) -> bool {
        self.schema.is_none()
    }
}
