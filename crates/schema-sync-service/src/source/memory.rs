// crates/schema-sync-service/src/source/memory.rs
// ============================================================================
// Module: Schema Sync In-Memory Source
// Description: Map-backed source for bundled and test content.
// Purpose: Serve fixed payloads without touching disk or network.
// Dependencies: std
// ============================================================================

//! ## Overview
//! [`InMemorySource`] serves payloads registered by exact location string and
//! counts every fetch it receives. Unknown locations resolve to
//! [`SourceError::NotFound`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;

use crate::source::FetchRequest;
use crate::source::Source;
use crate::source::SourceError;
use crate::source::SourcePayload;
use crate::source::enforce_max_bytes;

// ============================================================================
// SECTION: In-Memory Source
// ============================================================================

/// Map-backed payload source.
///
/// # Invariants
/// - Clones share the same resources and fetch counter.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    /// Payload bytes keyed by location.
    resources: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
    /// Total fetch attempts, including failed ones.
    fetches: Arc<AtomicUsize>,
}

impl InMemorySource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a payload for a location.
    #[must_use]
    pub fn with_resource(self, location: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(location, bytes);
        self
    }

    /// Registers or replaces a payload for a location.
    pub fn insert(&self, location: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        if let Ok(mut guard) = self.resources.lock() {
            guard.insert(location.into(), bytes.into());
        }
    }

    /// Removes the payload for a location.
    pub fn remove(&self, location: &str) {
        if let Ok(mut guard) = self.resources.lock() {
            guard.remove(location);
        }
    }

    /// Returns how many fetches this source has served or refused.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Source for InMemorySource {
    async fn fetch(&self, request: &FetchRequest) -> Result<SourcePayload, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let bytes = self
            .resources
            .lock()
            .map_err(|_| SourceError::Io("mutex poisoned".to_string()))?
            .get(&request.location)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(request.label().to_string()))?;
        enforce_max_bytes(bytes.len())?;
        Ok(SourcePayload {
            bytes,
            content_type: None,
        })
    }
}
