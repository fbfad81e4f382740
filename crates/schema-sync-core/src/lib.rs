// crates/schema-sync-core/src/lib.rs
// ============================================================================
// Module: Schema Sync Core Library
// Description: Public API surface for the Schema Sync core.
// Purpose: Expose mapping types, ownership rules, interfaces, and stores.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Schema Sync core defines the document-to-schema mapping model, the
//! ownership claim rules that decide which mappings reach a backing store, and
//! the persisted key/value interfaces (version cache, settings store) the
//! service layer writes through. It performs no network I/O.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::SettingsStore;
pub use interfaces::StoreError;
pub use interfaces::VersionCache;
pub use runtime::InMemorySettingsStore;
pub use runtime::InMemoryVersionCache;
pub use runtime::JsonFileSettingsStore;
pub use runtime::JsonFileVersionCache;
