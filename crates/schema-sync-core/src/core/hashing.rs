// crates/schema-sync-core/src/core/hashing.rs
// ============================================================================
// Module: Schema Sync Content Hashing
// Description: Content hashing used to version schemas without a manifest.
// Purpose: Provide deterministic digests for downloaded schema bytes.
// Dependencies: sha2
// ============================================================================

//! ## Overview
//! Some schema sources publish no version manifest. Their cached version is
//! the lowercase hex SHA-256 digest of the fetched bytes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write;

use sha2::Digest;
use sha2::Sha256;

// ============================================================================
// SECTION: Digests
// ============================================================================

/// Returns the lowercase hex SHA-256 digest of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digests_match_known_vectors() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
