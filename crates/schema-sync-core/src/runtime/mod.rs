// crates/schema-sync-core/src/runtime/mod.rs
// ============================================================================
// Module: Schema Sync Runtime Stores
// Description: In-memory and JSON-file implementations of the store interfaces.
// Purpose: Back the version cache and settings store outside of an editor host.
// Dependencies: crate::interfaces
// ============================================================================

//! ## Overview
//! Store implementations for tests, the CLI, and embedders without a host
//! editor.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::InMemorySettingsStore;
pub use store::InMemoryVersionCache;
pub use store::JsonFileSettingsStore;
pub use store::JsonFileVersionCache;
