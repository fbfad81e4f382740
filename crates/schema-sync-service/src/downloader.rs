// crates/schema-sync-service/src/downloader.rs
// ============================================================================
// Module: Schema Sync Downloader
// Description: Versioned download and caching of the default schemas.
// Purpose: Produce the resolved schema table from remote sources and disk.
// Dependencies: schema-sync-core, schema-sync-config, serde_json, tokio
// ============================================================================

//! ## Overview
//! [`SchemaDownloader`] keeps local copies of the CloudFormation, SAM, and
//! buildspec schemas current. CloudFormation and SAM are versioned by the
//! release manifest tag; buildspec has no manifest and is versioned by the
//! SHA-256 of its content.
//! Invariants:
//! - A schema whose cached version matches and whose file exists is never
//!   fetched.
//! - A failed fetch keeps existing cached content in place.
//! - Version cache write failures are reported and otherwise ignored.
//! - [`SchemaDownloader::get_default_schemas`] never fails; kinds that cannot
//!   be resolved are omitted from the table.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use schema_sync_config::SchemaSyncConfig;
use schema_sync_config::SourcesConfig;
use schema_sync_core::BUILDSPEC_SCHEMA;
use schema_sync_core::CFN_SCHEMA;
use schema_sync_core::JsonFileVersionCache;
use schema_sync_core::ResolvedSchemas;
use schema_sync_core::SAM_SCHEMA;
use schema_sync_core::SchemaLocation;
use schema_sync_core::VersionCache;
use schema_sync_core::sha256_hex;
use serde_json::Value;
use thiserror::Error;

use crate::events::NoopEventSink;
use crate::events::SchemaEventSink;
use crate::events::SchemaSyncEvent;
use crate::source::FetchRequest;
use crate::source::HttpSource;
use crate::source::Source;
use crate::source::SourceError;
use crate::source::SourceRouter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Version cache key for the CloudFormation schema.
pub const CFN_CACHE_KEY: &str = "cfnSchemaVersion";
/// Version cache key for the SAM schema.
pub const SAM_CACHE_KEY: &str = "samSchemaVersion";
/// Version cache key for the buildspec schema.
pub const BUILDSPEC_CACHE_KEY: &str = "buildspecSchemaVersion";
/// File name of the downloaded CloudFormation schema.
pub const CFN_FILE_NAME: &str = "cloudformation.schema.json";
/// File name of the downloaded SAM schema.
pub const SAM_FILE_NAME: &str = "sam.schema.json";
/// File name of the downloaded buildspec schema.
pub const BUILDSPEC_FILE_NAME: &str = "buildspec.schema.json";
/// Title written into the CloudFormation schema.
const CFN_TITLE: &str = "CloudFormation Template";
/// Title written into the SAM schema.
const SAM_TITLE: &str = "SAM Template";
/// Title written into the buildspec schema.
const BUILDSPEC_TITLE: &str = "AWS CodeBuild BuildSpec";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors returned by schema downloads.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Source failed to fetch content.
    #[error("source failure: {0}")]
    Source(#[from] SourceError),
    /// Fetch succeeded but returned no content.
    #[error("no content returned from {0}")]
    MissingContent(String),
    /// Fetched content is not a JSON object schema.
    #[error("schema parse failure: {0}")]
    Parse(String),
    /// Release manifest could not be interpreted.
    #[error("manifest failure: {0}")]
    Manifest(String),
    /// Local schema storage failed.
    #[error("schema storage failure: {0}")]
    Io(String),
}

// ============================================================================
// SECTION: Update Parameters
// ============================================================================

/// Parameters for one schema update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaUpdateParams {
    /// Local file receiving the schema.
    pub destination: PathBuf,
    /// Expected version; `None` forces a fetch only when nothing is cached.
    pub version: Option<String>,
    /// Remote URL (or local path) to fetch from.
    pub url: String,
    /// Version cache key recording the stored version.
    pub cache_key: String,
    /// Title written into the stored schema.
    pub title: String,
}

// ============================================================================
// SECTION: Downloader
// ============================================================================

/// Downloads and caches the default schemas.
pub struct SchemaDownloader {
    /// Source used for manifest and schema fetches.
    source: Arc<dyn Source>,
    /// Persisted schema versions.
    cache: Arc<dyn VersionCache>,
    /// Directory receiving downloaded schema files.
    storage_dir: PathBuf,
    /// Remote schema URLs.
    sources: SourcesConfig,
    /// Diagnostic event sink.
    events: Arc<dyn SchemaEventSink>,
}

impl SchemaDownloader {
    /// Creates a downloader over explicit collaborators.
    #[must_use]
    pub fn new(
        source: Arc<dyn Source>,
        cache: Arc<dyn VersionCache>,
        storage_dir: impl Into<PathBuf>,
        sources: SourcesConfig,
    ) -> Self {
        Self {
            source,
            cache,
            storage_dir: storage_dir.into(),
            sources,
            events: Arc::new(NoopEventSink),
        }
    }

    /// Builds a downloader from configuration: HTTP and file sources, a
    /// JSON-file version cache, and an absolute storage directory.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] when the HTTP client cannot be built or the
    /// storage directory cannot be made absolute.
    pub fn from_config(config: &SchemaSyncConfig) -> Result<Self, DownloadError> {
        let http = HttpSource::from_config(&config.http)?;
        let storage_dir = std::path::absolute(&config.storage.dir)
            .map_err(|err| DownloadError::Io(err.to_string()))?;
        let cache = JsonFileVersionCache::new(storage_dir.join(&config.storage.version_cache));
        Ok(Self::new(
            Arc::new(SourceRouter::standard(http)),
            Arc::new(cache),
            storage_dir,
            config.sources.clone(),
        ))
    }

    /// Replaces the diagnostic event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn SchemaEventSink>) -> Self {
        self.events = events;
        self
    }

    /// Returns the schema storage directory.
    #[must_use]
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Resolves the default schema table.
    ///
    /// CloudFormation and SAM depend on the release manifest; when it cannot
    /// be fetched both are omitted. Buildspec is tried against the primary URL
    /// and then the fallback URL.
    pub async fn get_default_schemas(&self) -> ResolvedSchemas {
        let mut schemas = ResolvedSchemas::new();

        match self.fetch_manifest_tag().await {
            Ok(tag) => {
                let versioned = [
                    (CFN_SCHEMA, self.sources.cfn_url(&tag), CFN_FILE_NAME, CFN_CACHE_KEY, CFN_TITLE),
                    (SAM_SCHEMA, self.sources.sam_url(&tag), SAM_FILE_NAME, SAM_CACHE_KEY, SAM_TITLE),
                ];
                for (name, url, file_name, cache_key, title) in versioned {
                    let params = SchemaUpdateParams {
                        destination: self.storage_dir.join(file_name),
                        version: Some(tag.clone()),
                        url,
                        cache_key: cache_key.to_string(),
                        title: title.to_string(),
                    };
                    match self.update_schema_from_remote(&params).await {
                        Ok(()) => self.insert_location(&mut schemas, name, &params),
                        Err(err) => self.events.record(
                            &SchemaSyncEvent::error("schema_download_failed", "schema unavailable")
                                .with_schema(name)
                                .with_title(title)
                                .with_error(err),
                        ),
                    }
                }
            }
            Err(err) => self.events.record(
                &SchemaSyncEvent::error(
                    "manifest_failed",
                    "release manifest unavailable; cfn and sam schemas omitted",
                )
                .with_error(err),
            ),
        }

        let mut params = SchemaUpdateParams {
            destination: self.storage_dir.join(BUILDSPEC_FILE_NAME),
            version: None,
            url: self.sources.buildspec_primary_url.clone(),
            cache_key: BUILDSPEC_CACHE_KEY.to_string(),
            title: BUILDSPEC_TITLE.to_string(),
        };
        match self.update_buildspec(&mut params).await {
            Ok(()) => self.insert_location(&mut schemas, BUILDSPEC_SCHEMA, &params),
            Err(err) => self.events.record(
                &SchemaSyncEvent::error("schema_download_failed", "schema unavailable")
                    .with_schema(BUILDSPEC_SCHEMA)
                    .with_title(BUILDSPEC_TITLE)
                    .with_error(err),
            ),
        }

        schemas
    }

    /// Fetches the release manifest and returns its `tag_name`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] when the manifest cannot be fetched or has no
    /// tag.
    pub async fn fetch_manifest_tag(&self) -> Result<String, DownloadError> {
        let url = &self.sources.manifest_url;
        let payload = self.source.fetch(&FetchRequest::new(url.as_str())).await?;
        let manifest: Value = serde_json::from_slice(&payload.bytes)
            .map_err(|err| DownloadError::Manifest(err.to_string()))?;
        manifest
            .get("tag_name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .ok_or_else(|| DownloadError::Manifest(format!("{url} has no tag_name")))
    }

    /// Ensures the destination holds the requested schema version.
    ///
    /// Fetches only when the supplied version differs from the cached one or
    /// no cached file exists. On fetch failure existing content is kept.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] when the schema cannot be fetched and nothing
    /// is cached.
    pub async fn update_schema_from_remote(
        &self,
        params: &SchemaUpdateParams,
    ) -> Result<(), DownloadError> {
        let cached = read_cached(&params.destination).await;
        let cached_version = self.cache.get(&params.cache_key);
        let outdated = params
            .version
            .as_deref()
            .is_some_and(|version| cached_version.as_deref() != Some(version));
        if !outdated && cached.is_some() {
            return Ok(());
        }

        match self.store_schema(params).await {
            Ok(()) => {
                self.events.record(
                    &SchemaSyncEvent::info("schema_downloaded", "schema stored")
                        .with_title(params.title.as_str())
                        .with_schema(params.destination.display().to_string()),
                );
                if let Some(version) = &params.version {
                    self.record_version(&params.cache_key, version);
                }
                Ok(())
            }
            Err(err) => self.fall_back(params, cached.is_some(), err),
        }
    }

    /// Ensures the destination holds the latest content, versioned by hash.
    ///
    /// Always fetches; an unchanged hash with an existing file skips the write.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] when the schema cannot be fetched and nothing
    /// is cached.
    pub async fn update_schema_from_remote_hashed(
        &self,
        params: &SchemaUpdateParams,
    ) -> Result<(), DownloadError> {
        let cached = read_cached(&params.destination).await;
        let stored = self.store_schema_hashed(params, cached.is_some()).await;
        self.finish_hashed(params, cached.is_some(), stored)
    }

    /// Updates the buildspec schema from the primary URL, then the fallback
    /// URL, and only then falls back to cached content.
    ///
    /// `params.url` is left pointing at the last URL tried.
    async fn update_buildspec(&self, params: &mut SchemaUpdateParams) -> Result<(), DownloadError> {
        let cached = read_cached(&params.destination).await;
        let mut stored = self.store_schema_hashed(params, cached.is_some()).await;
        if let Err(err) = &stored {
            self.events.record(
                &SchemaSyncEvent::warn("buildspec_primary_failed", "retrying fallback url")
                    .with_schema(BUILDSPEC_SCHEMA)
                    .with_error(err),
            );
            params.url.clone_from(&self.sources.buildspec_fallback_url);
            stored = self.store_schema_hashed(params, cached.is_some()).await;
        }
        self.finish_hashed(params, cached.is_some(), stored)
    }

    /// Records the outcome of a hashed update.
    fn finish_hashed(
        &self,
        params: &SchemaUpdateParams,
        has_cached: bool,
        stored: Result<Option<String>, DownloadError>,
    ) -> Result<(), DownloadError> {
        match stored {
            Ok(Some(digest)) => {
                self.events.record(
                    &SchemaSyncEvent::info("schema_downloaded", "schema stored")
                        .with_title(params.title.as_str())
                        .with_schema(params.destination.display().to_string()),
                );
                self.record_version(&params.cache_key, &digest);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) => self.fall_back(params, has_cached, err),
        }
    }

    /// Fetches, retitles, and writes one schema.
    async fn store_schema(&self, params: &SchemaUpdateParams) -> Result<(), DownloadError> {
        let bytes = self.fetch_bytes(&params.url).await?;
        let document = retitle(&bytes, &params.title)?;
        write_schema(&params.destination, &document).await
    }

    /// Fetches one schema and writes it unless its hash is already recorded.
    ///
    /// Returns the new hash when the file was written.
    async fn store_schema_hashed(
        &self,
        params: &SchemaUpdateParams,
        has_cached: bool,
    ) -> Result<Option<String>, DownloadError> {
        let bytes = self.fetch_bytes(&params.url).await?;
        let digest = sha256_hex(&bytes);
        if has_cached && self.cache.get(&params.cache_key).as_deref() == Some(digest.as_str()) {
            return Ok(None);
        }
        let document = retitle(&bytes, &params.title)?;
        write_schema(&params.destination, &document).await?;
        Ok(Some(digest))
    }

    /// Fetches non-empty bytes from a location.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        let payload = self.source.fetch(&FetchRequest::new(url)).await?;
        if payload.bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(DownloadError::MissingContent(url.to_string()));
        }
        Ok(payload.bytes)
    }

    /// Keeps cached content after a failed update, or surfaces the error.
    fn fall_back(
        &self,
        params: &SchemaUpdateParams,
        has_cached: bool,
        err: DownloadError,
    ) -> Result<(), DownloadError> {
        if !has_cached {
            return Err(err);
        }
        self.events.record(
            &SchemaSyncEvent::warn("schema_fallback_cached", "using cached schema")
                .with_title(params.title.as_str())
                .with_cache_key(params.cache_key.as_str())
                .with_error(err),
        );
        Ok(())
    }

    /// Records a stored version; failures are reported only.
    fn record_version(&self, cache_key: &str, version: &str) {
        if let Err(err) = self.cache.update(cache_key, version) {
            self.events.record(
                &SchemaSyncEvent::warn("version_cache_write_failed", "schema version not recorded")
                    .with_cache_key(cache_key)
                    .with_error(err),
            );
        }
    }

    /// Adds the stored file for `name` to the table.
    fn insert_location(
        &self,
        schemas: &mut ResolvedSchemas,
        name: &str,
        params: &SchemaUpdateParams,
    ) {
        match SchemaLocation::from_file_path(&params.destination) {
            Ok(location) => schemas.insert(name, location),
            Err(err) => self.events.record(
                &SchemaSyncEvent::error("schema_location_invalid", "schema path not addressable")
                    .with_schema(name)
                    .with_error(err),
            ),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads cached schema content; unreadable or blank files count as absent.
async fn read_cached(path: &Path) -> Option<String> {
    tokio::fs::read_to_string(path).await.ok().filter(|content| !content.trim().is_empty())
}

/// Parses a schema document and overwrites its `title`.
fn retitle(bytes: &[u8], title: &str) -> Result<Vec<u8>, DownloadError> {
    let mut document: Value =
        serde_json::from_slice(bytes).map_err(|err| DownloadError::Parse(err.to_string()))?;
    let Value::Object(fields) = &mut document else {
        return Err(DownloadError::Parse("schema document must be a JSON object".to_string()));
    };
    fields.insert("title".to_string(), Value::String(title.to_string()));
    let mut encoded =
        serde_json::to_vec_pretty(&document).map_err(|err| DownloadError::Parse(err.to_string()))?;
    encoded.push(b'\n');
    Ok(encoded)
}

/// Writes a schema file, creating parent directories.
async fn write_schema(path: &Path, bytes: &[u8]) -> Result<(), DownloadError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|err| DownloadError::Io(err.to_string()))?;
    }
    tokio::fs::write(path, bytes).await.map_err(|err| DownloadError::Io(err.to_string()))
}
