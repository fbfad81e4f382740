// crates/schema-sync-core/src/interfaces/mod.rs
// ============================================================================
// Module: Schema Sync Interfaces
// Description: Persisted key/value interfaces owned by the host editor.
// Purpose: Define the contract surfaces the service layer writes through.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! The host editor persists two things on behalf of Schema Sync: a version
//! cache ("global state" that survives restarts) and a settings document
//! holding the JSON schema association list. Both are modeled here as small
//! traits so the service can run against in-memory or file-backed stores.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Errors returned by persisted stores.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O failed.
    #[error("store io error: {0}")]
    Io(String),
    /// Persisted data could not be decoded.
    #[error("store data invalid: {0}")]
    Invalid(String),
    /// Store-specific failure.
    #[error("store error: {0}")]
    Store(String),
}

// ============================================================================
// SECTION: Version Cache
// ============================================================================

/// Persisted key to version string map.
pub trait VersionCache: Send + Sync {
    /// Returns the cached version for the key.
    fn get(&self, key: &str) -> Option<String>;

    /// Records a new version for the key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the version cannot be persisted. Callers
    /// treat this as non-fatal.
    fn update(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

// ============================================================================
// SECTION: Settings Store
// ============================================================================

/// Generic editor settings document keyed by setting name.
pub trait SettingsStore: Send + Sync {
    /// Reads a setting value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the settings document cannot be read.
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Replaces a setting value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the settings document cannot be written.
    fn update(&self, key: &str, value: Value) -> Result<(), StoreError>;
}
