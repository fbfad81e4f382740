// crates/schema-sync-core/src/core/ownership.rs
// ============================================================================
// Module: Schema Sync Ownership
// Description: Exclusive-claim table arbitrating schema mappings per document.
// Purpose: Decide which mappings may reach a backing store.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Several editor features may try to assign a schema to the same document.
//! The [`OwnershipTable`] records the mapping that currently owns each
//! document and only admits later mappings from the same owner.
//! Invariants:
//! - A document is claimed by at most one owner at a time.
//! - A claim is (re)established when the document has no live claim and the
//!   mapping carries an owner and a schema, or when the recorded owner sends a
//!   different schema.
//! - A claim whose recorded schema is absent is released: any owner supplying
//!   a schema may claim the document again.
//! - A mapping is admitted only when its owner equals the recorded owner;
//!   "no owner" equals "no claim".

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::core::identifiers::DocumentUri;
use crate::core::identifiers::OwnerId;
use crate::core::mapping::SchemaMapping;

// ============================================================================
// SECTION: Decisions
// ============================================================================

/// Outcome of applying a mapping to the ownership table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipDecision {
    /// The mapping (re)claimed the document and is admitted.
    Claimed,
    /// The mapping is admitted without changing the claim.
    Admitted,
    /// The mapping conflicts with the recorded owner and must be ignored.
    Ignored,
}

impl OwnershipDecision {
    /// Returns true when the mapping should be queued for dispatch.
    #[must_use]
    pub const fn is_admitted(self) -> bool {
        matches!(self, Self::Claimed | Self::Admitted)
    }
}

/// Evaluates a mapping against the current claim without mutating anything.
#[must_use]
pub fn evaluate_ownership(
    current: Option<&SchemaMapping>,
    incoming: &SchemaMapping,
) -> OwnershipDecision {
    if is_owner_undefined(current, incoming) || is_schema_changed(current, incoming) {
        return OwnershipDecision::Claimed;
    }
    let recorded: Option<&OwnerId> = current.and_then(|claim| claim.owner.as_ref());
    if incoming.owner.as_ref() == recorded {
        OwnershipDecision::Admitted
    } else {
        OwnershipDecision::Ignored
    }
}

/// Returns true when the document has no live claim and the mapping can claim it.
fn is_owner_undefined(current: Option<&SchemaMapping>, incoming: &SchemaMapping) -> bool {
    let vacant = current.is_none_or(|claim| claim.schema.is_none());
    vacant && incoming.owner.is_some() && incoming.schema.is_some()
}

/// Returns true when the recorded owner changes the schema it assigned.
fn is_schema_changed(current: Option<&SchemaMapping>, incoming: &SchemaMapping) -> bool {
    let Some(claim) = current else {
        return false;
    };
    incoming.owner.is_some() && claim.owner == incoming.owner && claim.schema != incoming.schema
}

// ============================================================================
// SECTION: Ownership Table
// ============================================================================

/// Document to owning mapping table.
#[derive(Debug, Clone, Default)]
pub struct OwnershipTable {
    /// Current claims keyed by document.
    claims: BTreeMap<DocumentUri, SchemaMapping>,
}

impl OwnershipTable {
    /// Creates an empty ownership table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a mapping, recording a claim when the rules allow it.
    pub fn apply(&mut self, incoming: &SchemaMapping) -> OwnershipDecision {
        let decision = evaluate_ownership(self.claims.get(&incoming.uri), incoming);
        if decision == OwnershipDecision::Claimed {
            self.claims.insert(incoming.uri.clone(), incoming.clone());
        }
        decision
    }

    /// Returns the mapping that currently owns the document.
    #[must_use]
    pub fn claim(&self, uri: &DocumentUri) -> Option<&SchemaMapping> {
        self.claims.get(uri)
    }

    /// Returns the recorded owner of the document.
    #[must_use]
    pub fn owner(&self, uri: &DocumentUri) -> Option<&OwnerId> {
        self.claims.get(uri).and_then(|claim| claim.owner.as_ref())
    }

    /// Returns the number of claimed documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Returns true when no document is claimed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use super::*;
    use crate::core::mapping::SchemaRef;
    use crate::core::mapping::SchemaType;

    fn mapping(owner: Option<&str>, schema: Option<&str>) -> SchemaMapping {
        let mut mapping = SchemaMapping::new("doc1", SchemaType::Json);
        if let Some(owner) = owner {
            mapping = mapping.with_owner(owner);
        }
        if let Some(schema) = schema {
            mapping = mapping.with_schema(SchemaRef::named(schema));
        }
        mapping
    }

    #[test]
    fn unowned_mapping_on_unclaimed_document_is_admitted() {
        let mut table = OwnershipTable::new();
        let decision = table.apply(&mapping(None, Some("cfn")));
        assert_eq!(decision, OwnershipDecision::Admitted);
        assert!(table.is_empty());
    }

    #[test]
    fn owned_mapping_claims_unclaimed_document() {
        let mut table = OwnershipTable::new();
        let decision = table.apply(&mapping(Some("featureA"), Some("cfn")));
        assert_eq!(decision, OwnershipDecision::Claimed);
        assert_eq!(table.owner(&DocumentUri::new("doc1")).map(OwnerId::as_str), Some("featureA"));
    }

    #[test]
    fn owned_removal_without_claim_is_ignored() {
        let mut table = OwnershipTable::new();
        let decision = table.apply(&mapping(Some("featureA"), None));
        assert_eq!(decision, OwnershipDecision::Ignored);
        assert!(table.is_empty());
    }

    #[test]
    fn other_owner_cannot_take_live_claim() {
        let mut table = OwnershipTable::new();
        table.apply(&mapping(Some("featureA"), Some("cfn")));
        let decision = table.apply(&mapping(Some("featureB"), Some("sam")));
        assert_eq!(decision, OwnershipDecision::Ignored);
        let claim = table.claim(&DocumentUri::new("doc1")).unwrap();
        assert_eq!(claim.schema, Some(SchemaRef::named("cfn")));
    }

    #[test]
    fn owner_release_lets_other_owner_claim() {
        let mut table = OwnershipTable::new();
        table.apply(&mapping(Some("featureA"), Some("cfn")));
        assert_eq!(table.apply(&mapping(Some("featureA"), None)), OwnershipDecision::Claimed);
        assert_eq!(table.apply(&mapping(Some("featureB"), Some("sam"))), OwnershipDecision::Claimed);
        assert_eq!(table.owner(&DocumentUri::new("doc1")).map(OwnerId::as_str), Some("featureB"));
    }
}
