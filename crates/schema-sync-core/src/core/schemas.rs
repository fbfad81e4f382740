// crates/schema-sync-core/src/core/schemas.rs
// ============================================================================
// Module: Schema Sync Resolved Schemas
// Description: Schema locations and the resolved schema table.
// Purpose: Map short schema names to concrete schema locations.
// Dependencies: serde, thiserror, url
// ============================================================================

//! ## Overview
//! [`ResolvedSchemas`] is built once at service startup from the downloaded
//! default schemas. Mapping requests reference schemas either by short name
//! (looked up here) or by a direct [`SchemaLocation`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::core::identifiers::SchemaName;
use crate::core::mapping::SchemaRef;

// ============================================================================
// SECTION: Well-Known Names
// ============================================================================

/// Schema name for the CloudFormation template schema.
pub const CFN_SCHEMA: &str = "cfn";
/// Schema name for the SAM template schema.
pub const SAM_SCHEMA: &str = "sam";
/// Schema name for the CodeBuild buildspec schema.
pub const BUILDSPEC_SCHEMA: &str = "buildspec";

// ============================================================================
// SECTION: Schema Location
// ============================================================================

/// Errors raised when constructing a schema location.
#[derive(Debug, Error)]
pub enum SchemaLocationError {
    /// The location string is not a valid URI.
    #[error("invalid schema location: {0}")]
    InvalidUri(String),
    /// The file path cannot be expressed as a `file://` URI.
    #[error("schema path must be absolute: {0}")]
    RelativePath(String),
}

/// Concrete schema location (a `file://` URI for downloaded schemas).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaLocation(Url);

impl SchemaLocation {
    /// Parses a schema location from a URI string.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaLocationError::InvalidUri`] when the string is not a URI.
    pub fn parse(value: &str) -> Result<Self, SchemaLocationError> {
        Url::parse(value)
            .map(Self)
            .map_err(|err| SchemaLocationError::InvalidUri(format!("{value}: {err}")))
    }

    /// Builds a `file://` location from an absolute path.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaLocationError::RelativePath`] when the path is relative.
    pub fn from_file_path(path: impl AsRef<Path>) -> Result<Self, SchemaLocationError> {
        let path = path.as_ref();
        Url::from_file_path(path)
            .map(Self)
            .map_err(|()| SchemaLocationError::RelativePath(path.display().to_string()))
    }

    /// Returns the location as a URI string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns true when the location points at a local file.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.0.scheme() == "file"
    }

    /// Returns the local path for `file://` locations.
    #[must_use]
    pub fn to_file_path(&self) -> Option<PathBuf> {
        if !self.is_file() {
            return None;
        }
        self.0.to_file_path().ok()
    }

    /// Rewrites a `file://` location onto a custom URI scheme.
    ///
    /// Non-file locations are returned unchanged.
    #[must_use]
    pub fn with_scheme(&self, scheme: &str) -> String {
        if self.is_file() {
            format!("{scheme}://{}", self.0.path())
        } else {
            self.0.to_string()
        }
    }
}

impl fmt::Display for SchemaLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

// ============================================================================
// SECTION: Resolved Schema Table
// ============================================================================

/// Short schema name to location table resolved at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedSchemas {
    /// Resolved entries keyed by schema name.
    entries: BTreeMap<SchemaName, SchemaLocation>,
}

impl ResolvedSchemas {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a resolved entry.
    pub fn insert(&mut self, name: impl Into<SchemaName>, location: SchemaLocation) {
        self.entries.insert(name.into(), location);
    }

    /// Adds an entry, returning the table for chaining.
    #[must_use]
    pub fn with(mut self, name: impl Into<SchemaName>, location: SchemaLocation) -> Self {
        self.insert(name, location);
        self
    }

    /// Returns the location for a schema name.
    #[must_use]
    pub fn get(&self, name: &SchemaName) -> Option<&SchemaLocation> {
        self.entries.get(name)
    }

    /// Returns true when the schema name has been resolved.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&SchemaName::new(name))
    }

    /// Returns the number of resolved entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no schema was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates resolved entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&SchemaName, &SchemaLocation)> {
        self.entries.iter()
    }

    /// Resolves a schema reference to a concrete location.
    ///
    /// Direct locations are returned as-is; names are looked up in the table.
    #[must_use]
    pub fn resolve(&self, reference: &SchemaRef) -> Option<SchemaLocation> {
        match reference {
            SchemaRef::Location(location) => Some(location.clone()),
            SchemaRef::Named(name) => self.get(name).cloned(),
        }
    }
}
