// crates/schema-sync-service/src/source/mod.rs
// ============================================================================
// Module: Schema Sync Sources
// Description: Source trait and reference implementations for schema fetches.
// Purpose: Resolve local paths and remote URLs into schema bytes.
// Dependencies: async-trait, thiserror
// ============================================================================

//! ## Overview
//! Sources fetch the bytes behind a schema location or manifest URL. A fetch
//! either yields a [`SourcePayload`] or a [`SourceError`]; callers treat any
//! error as "no content". The [`SourceRouter`] dispatches by URI scheme.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Fetch Request
// ============================================================================

/// A request to fetch one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Local path or absolute URL to fetch.
    pub location: String,
    /// Human-readable URL used in diagnostics instead of `location`.
    pub display_url: Option<String>,
}

impl FetchRequest {
    /// Creates a request for the provided location.
    #[must_use]
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            display_url: None,
        }
    }

    /// Sets the display URL reported in diagnostics.
    #[must_use]
    pub fn with_display_url(mut self, display_url: impl Into<String>) -> Self {
        self.display_url = Some(display_url.into());
        self
    }

    /// Returns the label used when reporting this request.
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_url.as_deref().unwrap_or(&self.location)
    }
}

// ============================================================================
// SECTION: Source Payload
// ============================================================================

/// Payload bytes resolved from a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePayload {
    /// Raw payload bytes.
    pub bytes: Vec<u8>,
    /// Optional content type hint.
    pub content_type: Option<String>,
}

/// Maximum payload size accepted by schema sources.
pub const MAX_SOURCE_BYTES: usize = 32 * 1024 * 1024;

// ============================================================================
// SECTION: Source Errors
// ============================================================================

/// Errors emitted by schema sources.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Unsupported or missing URI scheme.
    #[error("unsupported uri scheme: {0}")]
    UnsupportedScheme(String),
    /// URI failed to parse or resolve.
    #[error("invalid uri: {0}")]
    InvalidUri(String),
    /// Resource was not found.
    #[error("resource not found: {0}")]
    NotFound(String),
    /// Source reported an I/O failure.
    #[error("io failure: {0}")]
    Io(String),
    /// HTTP source failed.
    #[error("http failure: {0}")]
    Http(String),
    /// Payload exceeded the configured byte limit.
    #[error("payload exceeds size limit: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual payload size in bytes.
        actual_bytes: usize,
    },
}

/// Returns an error when a payload exceeds the configured size cap.
pub(crate) const fn enforce_max_bytes(actual_bytes: usize) -> Result<(), SourceError> {
    if actual_bytes > MAX_SOURCE_BYTES {
        return Err(SourceError::TooLarge {
            max_bytes: MAX_SOURCE_BYTES,
            actual_bytes,
        });
    }
    Ok(())
}

// ============================================================================
// SECTION: Source Trait
// ============================================================================

/// Resolves a location into payload bytes.
#[async_trait]
pub trait Source: Send + Sync {
    /// Fetches payload bytes for the provided request.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the content cannot be resolved.
    async fn fetch(&self, request: &FetchRequest) -> Result<SourcePayload, SourceError>;
}

// ============================================================================
// SECTION: Source Router
// ============================================================================

/// Source that dispatches requests by URI scheme.
///
/// # Invariants
/// - Registrations are keyed by scheme; later registrations overwrite earlier ones.
/// - Locations that do not parse as URLs are routed to the `file` source.
#[derive(Clone, Default)]
pub struct SourceRouter {
    /// Source registry keyed by URI scheme.
    sources: BTreeMap<String, Arc<dyn Source>>,
}

impl SourceRouter {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a source for the provided URI scheme.
    #[must_use]
    pub fn source(mut self, scheme: impl Into<String>, source: Arc<dyn Source>) -> Self {
        self.sources.insert(scheme.into(), source);
        self
    }

    /// Builds the standard router: local files plus `http`/`https`.
    #[must_use]
    pub fn standard(http: HttpSource) -> Self {
        let http: Arc<dyn Source> = Arc::new(http);
        Self::new()
            .source("file", Arc::new(FileSource::new()))
            .source("http", Arc::clone(&http))
            .source("https", http)
    }

    /// Resolves the scheme used for a location.
    fn scheme_of(location: &str) -> String {
        match Url::parse(location) {
            Ok(url) if url.scheme().len() > 1 => url.scheme().to_string(),
            // Bare paths and drive-letter paths parse as relative or one-letter schemes.
            _ => "file".to_string(),
        }
    }
}

#[async_trait]
impl Source for SourceRouter {
    async fn fetch(&self, request: &FetchRequest) -> Result<SourcePayload, SourceError> {
        let scheme = Self::scheme_of(&request.location);
        let source = self
            .sources
            .get(&scheme)
            .ok_or_else(|| SourceError::UnsupportedScheme(scheme.clone()))?;
        source.fetch(request).await
    }
}

// ============================================================================
// SECTION: Implementations
// ============================================================================

pub mod file;
pub mod http;
pub mod memory;

pub use file::FileSource;
pub use http::HttpSource;
pub use memory::InMemorySource;
