// crates/schema-sync-service/src/lib.rs
// ============================================================================
// Module: Schema Sync Service Library
// Description: Schema download, ownership-gated mapping queue, and handlers.
// Purpose: Keep editor schema associations in sync with published schemas.
// Dependencies: schema-sync-core, schema-sync-config, reqwest, tokio
// ============================================================================

//! ## Overview
//! This crate wires the pieces that keep schema associations current:
//! [`Source`] implementations fetch bytes, the [`SchemaDownloader`] resolves
//! and caches the default schemas, [`SchemaHandler`] implementations write
//! associations into JSON settings or a YAML language service, and the
//! [`SchemaService`] arbitrates ownership and drains queued mappings.
//! Invariants:
//! - Fetch failures never escape [`SchemaDownloader::get_default_schemas`].
//! - Queued mappings are dispatched in registration order.
//! - Source payloads are capped at [`MAX_SOURCE_BYTES`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod downloader;
pub mod events;
pub mod handler;
pub mod service;
pub mod source;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use downloader::BUILDSPEC_CACHE_KEY;
pub use downloader::BUILDSPEC_FILE_NAME;
pub use downloader::CFN_CACHE_KEY;
pub use downloader::CFN_FILE_NAME;
pub use downloader::DownloadError;
pub use downloader::SAM_CACHE_KEY;
pub use downloader::SAM_FILE_NAME;
pub use downloader::SchemaDownloader;
pub use downloader::SchemaUpdateParams;
pub use events::EventLevel;
pub use events::FileEventSink;
pub use events::MemoryEventSink;
pub use events::NoopEventSink;
pub use events::SchemaEventSink;
pub use events::SchemaSyncEvent;
pub use events::StderrEventSink;
pub use events::event_sink_from_config;
pub use handler::HandlerError;
pub use handler::JsonSchemaHandler;
pub use handler::SchemaContributor;
pub use handler::SchemaHandler;
pub use handler::YamlLanguageService;
pub use handler::YamlSchemaHandler;
pub use handler::YamlSchemaRegistry;
pub use handler::resolve_schema;
pub use service::SchemaService;
pub use service::SchemaServiceBuilder;
pub use service::ServiceError;
pub use source::FetchRequest;
pub use source::FileSource;
pub use source::HttpSource;
pub use source::InMemorySource;
pub use source::MAX_SOURCE_BYTES;
pub use source::Source;
pub use source::SourceError;
pub use source::SourcePayload;
pub use source::SourceRouter;
