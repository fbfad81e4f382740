// crates/schema-sync-config/src/lib.rs
// ============================================================================
// Module: Schema Sync Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for schema-sync.toml semantics.
// Dependencies: serde, toml, url
// ============================================================================

//! ## Overview
//! `schema-sync-config` defines the configuration model for the Schema Sync
//! service: drain period, schema storage, remote schema sources, HTTP client
//! settings, per-handler settings, and the event log sink. Validation is
//! strict and fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
