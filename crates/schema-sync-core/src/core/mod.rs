// crates/schema-sync-core/src/core/mod.rs
// ============================================================================
// Module: Schema Sync Core Types
// Description: Canonical mapping, ownership, and schema table structures.
// Purpose: Provide stable, serializable types shared by every Schema Sync crate.
// Dependencies: serde, url
// ============================================================================

//! ## Overview
//! Core types describe schema mappings requested by editor features, the
//! ownership table that arbitrates between features, and the resolved schema
//! table built at startup.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod hashing;
pub mod identifiers;
pub mod mapping;
pub mod ownership;
pub mod schemas;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use hashing::sha256_hex;
pub use identifiers::DocumentUri;
pub use identifiers::OwnerId;
pub use identifiers::SchemaName;
pub use mapping::SchemaMapping;
pub use mapping::SchemaRef;
pub use mapping::SchemaType;
pub use ownership::OwnershipDecision;
pub use ownership::OwnershipTable;
pub use ownership::evaluate_ownership;
pub use schemas::BUILDSPEC_SCHEMA;
pub use schemas::CFN_SCHEMA;
pub use schemas::ResolvedSchemas;
pub use schemas::SAM_SCHEMA;
pub use schemas::SchemaLocation;
pub use schemas::SchemaLocationError;
