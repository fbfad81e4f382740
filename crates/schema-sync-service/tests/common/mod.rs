// crates/schema-sync-service/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared helpers for schema-sync-service tests.
// Purpose: Provide fake collaborators and fixture builders.
// Dependencies: schema-sync-service, schema-sync-core, tiny_http
// ============================================================================

//! ## Overview
//! Provides fixture sources, a scriptable YAML language service, a failing
//! version cache, and a one-shot HTTP server.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread;
use std::thread::JoinHandle;

use async_trait::async_trait;
use schema_sync_config::SourcesConfig;
use schema_sync_core::ResolvedSchemas;
use schema_sync_core::SchemaLocation;
use schema_sync_core::StoreError;
use schema_sync_core::VersionCache;
use schema_sync_service::HandlerError;
use schema_sync_service::SchemaContributor;
use schema_sync_service::YamlLanguageService;
use serde_json::Value;
use serde_json::json;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Manifest URL used by fixture sources.
pub const MANIFEST_URL: &str = "https://schemas.test/releases/latest";
/// Buildspec primary URL used by fixture sources.
pub const BUILDSPEC_PRIMARY_URL: &str = "https://cdn.schemas.test/buildspec.json";
/// Buildspec fallback URL used by fixture sources.
pub const BUILDSPEC_FALLBACK_URL: &str = "https://bucket.schemas.test/buildspec.json";

/// Sources config pointing at fixture URLs.
pub fn test_sources() -> SourcesConfig {
    SourcesConfig {
        manifest_url: MANIFEST_URL.to_string(),
        cfn_url_template: "https://raw.schemas.test/{version}/cloudformation.schema.json"
            .to_string(),
        sam_url_template: "https://raw.schemas.test/{version}/sam.schema.json".to_string(),
        buildspec_primary_url: BUILDSPEC_PRIMARY_URL.to_string(),
        buildspec_fallback_url: BUILDSPEC_FALLBACK_URL.to_string(),
    }
}

/// Fixture CloudFormation URL for a tag.
pub fn cfn_url(tag: &str) -> String {
    format!("https://raw.schemas.test/{tag}/cloudformation.schema.json")
}

/// Fixture SAM URL for a tag.
pub fn sam_url(tag: &str) -> String {
    format!("https://raw.schemas.test/{tag}/sam.schema.json")
}

/// Release manifest body for a tag.
pub fn manifest(tag: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({"tag_name": tag, "name": "release"})).unwrap()
}

/// Minimal schema document body.
pub fn schema_body(id: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({"$schema": "http://json-schema.org/draft-07/schema#", "$id": id}))
        .unwrap()
}

/// Reads a stored schema file as JSON.
pub fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

/// Resolved table with `cfn` and `sam` under `/storage`.
pub fn storage_schemas() -> ResolvedSchemas {
    ResolvedSchemas::new()
        .with("cfn", SchemaLocation::parse("file:///storage/cloudformation.schema.json").unwrap())
        .with("sam", SchemaLocation::parse("file:///storage/sam.schema.json").unwrap())
}

// ============================================================================
// SECTION: Fake Collaborators
// ============================================================================

/// Version cache whose writes always fail.
#[derive(Debug, Default)]
pub struct FailingVersionCache;

impl VersionCache for FailingVersionCache {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn update(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Io("read-only state".to_string()))
    }
}

/// YAML language service that fails the first `failures` activations.
#[derive(Default)]
pub struct FakeYamlService {
    /// Remaining activation failures.
    failures: AtomicUsize,
    /// Activation attempts.
    pub activations: AtomicUsize,
    /// Registered contributors by scheme.
    pub contributors: Mutex<Vec<(String, Arc<dyn SchemaContributor>)>>,
}

impl FakeYamlService {
    /// Creates a service failing the first `failures` activations.
    pub fn failing(failures: usize) -> Self {
        Self {
            failures: AtomicUsize::new(failures),
            ..Self::default()
        }
    }

    /// Returns the number of activation attempts.
    pub fn activation_count(&self) -> usize {
        self.activations.load(Ordering::SeqCst)
    }

    /// Returns the registered scheme names.
    pub fn schemes(&self) -> Vec<String> {
        self.contributors.lock().unwrap().iter().map(|(scheme, _)| scheme.clone()).collect()
    }
}

#[async_trait]
impl YamlLanguageService for FakeYamlService {
    async fn activate(&self) -> Result<(), HandlerError> {
        self.activations.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(HandlerError::Activation("extension not installed".to_string()));
        }
        Ok(())
    }

    fn register_contributor(
        &self,
        scheme: &str,
        contributor: Arc<dyn SchemaContributor>,
    ) -> Result<(), HandlerError> {
        self.contributors.lock().unwrap().push((scheme.to_string(), contributor));
        Ok(())
    }
}

// ============================================================================
// SECTION: HTTP Server
// ============================================================================

/// Serves `responses` in order, one per request, then exits.
pub fn serve(responses: Vec<(u16, Vec<u8>)>) -> (String, JoinHandle<Vec<String>>) {
    let server = Server::http("127.0.0.1:0").expect("http server");
    let addr = format!("http://{}", server.server_addr());
    let handle = thread::spawn(move || {
        let mut agents = Vec::new();
        for (status, body) in responses {
            let Ok(request) = server.recv() else {
                break;
            };
            let agent = request
                .headers()
                .iter()
                .find(|header| header.field.equiv("User-Agent"))
                .map(|header| header.value.to_string())
                .unwrap_or_default();
            agents.push(agent);
            request.respond(Response::from_data(body).with_status_code(status)).expect("respond");
        }
        agents
    });
    (addr, handle)
}
