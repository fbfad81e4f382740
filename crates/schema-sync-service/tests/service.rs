// crates/schema-sync-service/tests/service.rs
// ============================================================================
// Module: Schema Service Tests
// Description: End-to-end mapping flows through the service and JSON handler.
// Purpose: Ensure ownership, queueing, and draining behave as documented.
// Dependencies: schema-sync-service, schema-sync-core, serde_json, tokio
// ============================================================================

//! ## Overview
//! Drives [`schema_sync_service::SchemaService`] with an in-memory settings
//! store and checks the resulting `json.schemas` list.

#![allow(dead_code, reason = "Common module may have unused helpers.")]
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

mod common;

use std::sync::Arc;
use std::time::Duration;

use schema_sync_core::DocumentUri;
use schema_sync_core::InMemorySettingsStore;
use schema_sync_core::InMemoryVersionCache;
use schema_sync_core::OwnershipDecision;
use schema_sync_core::SchemaMapping;
use schema_sync_core::SchemaRef;
use schema_sync_core::SchemaType;
use schema_sync_core::SettingsStore;
use schema_sync_service::InMemorySource;
use schema_sync_service::JsonSchemaHandler;
use schema_sync_service::MemoryEventSink;
use schema_sync_service::SchemaDownloader;
use schema_sync_service::SchemaService;
use schema_sync_service::ServiceError;
use serde_json::Value;
use serde_json::json;

use crate::common::BUILDSPEC_PRIMARY_URL;
use crate::common::storage_schemas;
use crate::common::test_sources;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const CFN_URL: &str = "file:///storage/cloudformation.schema.json";
const SAM_URL: &str = "file:///storage/sam.schema.json";

struct Fixture {
    service: Arc<SchemaService>,
    store: InMemorySettingsStore,
    events: MemoryEventSink,
}

fn fixture_with(resolved: bool) -> Fixture {
    let store = InMemorySettingsStore::new();
    let events = MemoryEventSink::new();
    let handler = JsonSchemaHandler::new(Arc::new(store.clone()), "json.schemas", Vec::new());
    let mut builder = SchemaService::builder()
        .handler(SchemaType::Json, Arc::new(handler))
        .event_sink(Arc::new(events.clone()));
    if resolved {
        builder = builder.schemas(storage_schemas());
    }
    Fixture {
        service: Arc::new(builder.build()),
        store,
        events,
    }
}

fn fixture() -> Fixture {
    fixture_with(true)
}

fn json_mapping(uri: &str, owner: Option<&str>, schema: Option<&str>) -> SchemaMapping {
    let mut mapping = SchemaMapping::new(uri, SchemaType::Json);
    if let Some(owner) = owner {
        mapping = mapping.with_owner(owner);
    }
    if let Some(schema) = schema {
        mapping = mapping.with_schema(SchemaRef::named(schema));
    }
    mapping
}

fn settings(store: &InMemorySettingsStore) -> Value {
    store.get("json.schemas").unwrap().unwrap_or(Value::Null)
}

// ============================================================================
// SECTION: Mapping Flows
// ============================================================================

#[tokio::test]
async fn flush_writes_single_association() {
    let fx = fixture();

    let decision = fx
        .service
        .register_mapping(json_mapping("doc1", Some("featureA"), Some("cfn")), true)
        .await
        .unwrap();

    assert_eq!(decision, OwnershipDecision::Claimed);
    assert_eq!(settings(&fx.store), json!([{"fileMatch": ["doc1"], "url": CFN_URL}]));
    assert_eq!(fx.service.pending(), 0);
}

#[tokio::test]
async fn removal_by_owner_clears_association() {
    let fx = fixture();
    fx.service
        .register_mapping(json_mapping("doc1", Some("featureA"), Some("cfn")), true)
        .await
        .unwrap();

    fx.service.register_mapping(json_mapping("doc1", Some("featureA"), None), true).await.unwrap();

    assert_eq!(settings(&fx.store), json!([]));
    assert!(!fx.service.is_mapped(&DocumentUri::new("doc1")));
}

#[tokio::test]
async fn documents_sharing_schema_share_one_entry() {
    let fx = fixture();
    fx.service.register_mapping(json_mapping("doc1", None, Some("cfn")), false).await.unwrap();
    fx.service.register_mapping(json_mapping("doc2", None, Some("cfn")), false).await.unwrap();

    let applied = fx.service.process_updates().await.unwrap();

    assert_eq!(applied, 2);
    assert_eq!(settings(&fx.store), json!([{"fileMatch": ["doc1", "doc2"], "url": CFN_URL}]));
}

#[tokio::test]
async fn repeated_mapping_does_not_duplicate_paths() {
    let fx = fixture();
    let mapping = json_mapping("doc1", Some("featureA"), Some("cfn"));

    fx.service.register_mapping(mapping.clone(), true).await.unwrap();
    let decision = fx.service.register_mapping(mapping, true).await.unwrap();

    assert_eq!(decision, OwnershipDecision::Admitted);
    assert_eq!(settings(&fx.store), json!([{"fileMatch": ["doc1"], "url": CFN_URL}]));
}

#[tokio::test]
async fn duplicate_mappings_in_one_batch_share_one_path() {
    let fx = fixture();
    let mapping = json_mapping("doc1", Some("featureA"), Some("cfn"));

    fx.service.register_mapping(mapping.clone(), false).await.unwrap();
    fx.service.register_mapping(mapping, false).await.unwrap();
    assert_eq!(fx.service.pending(), 2);

    let applied = fx.service.process_updates().await.unwrap();

    assert_eq!(applied, 2);
    assert_eq!(settings(&fx.store), json!([{"fileMatch": ["doc1"], "url": CFN_URL}]));
}

#[tokio::test]
async fn switching_schema_moves_document() {
    let fx = fixture();
    fx.service
        .register_mapping(json_mapping("doc1", Some("featureA"), Some("cfn")), true)
        .await
        .unwrap();

    fx.service
        .register_mapping(json_mapping("doc1", Some("featureA"), Some("sam")), true)
        .await
        .unwrap();

    assert_eq!(settings(&fx.store), json!([{"fileMatch": ["doc1"], "url": SAM_URL}]));
}

#[tokio::test]
async fn competing_owner_is_ignored() {
    let fx = fixture();
    fx.service
        .register_mapping(json_mapping("doc1", Some("featureA"), Some("cfn")), true)
        .await
        .unwrap();

    let decision = fx
        .service
        .register_mapping(json_mapping("doc1", Some("featureB"), Some("sam")), true)
        .await
        .unwrap();

    assert_eq!(decision, OwnershipDecision::Ignored);
    assert_eq!(settings(&fx.store), json!([{"fileMatch": ["doc1"], "url": CFN_URL}]));
    assert!(fx.events.contains("mapping_ignored"));
}

#[tokio::test]
async fn released_claim_can_be_taken_by_another_owner() {
    let fx = fixture();
    fx.service
        .register_mapping(json_mapping("doc1", Some("featureA"), Some("cfn")), true)
        .await
        .unwrap();
    fx.service.register_mapping(json_mapping("doc1", Some("featureA"), None), true).await.unwrap();

    let decision = fx
        .service
        .register_mapping(json_mapping("doc1", Some("featureB"), Some("sam")), true)
        .await
        .unwrap();

    assert_eq!(decision, OwnershipDecision::Claimed);
    assert_eq!(settings(&fx.store), json!([{"fileMatch": ["doc1"], "url": SAM_URL}]));
}

// ============================================================================
// SECTION: Drain Policy
// ============================================================================

#[tokio::test]
async fn queue_is_kept_until_schemas_are_installed() {
    let fx = fixture_with(false);

    fx.service.register_mapping(json_mapping("doc1", None, Some("cfn")), true).await.unwrap();

    assert_eq!(fx.service.pending(), 1);
    assert_eq!(settings(&fx.store), Value::Null);

    fx.service.set_schemas(storage_schemas()).unwrap();
    let applied = fx.service.process_updates().await.unwrap();

    assert_eq!(applied, 1);
    assert_eq!(settings(&fx.store), json!([{"fileMatch": ["doc1"], "url": CFN_URL}]));
}

#[tokio::test]
async fn missing_handler_aborts_rest_of_batch() {
    let fx = fixture();
    fx.service
        .register_mapping(
            SchemaMapping::new("template.yaml", SchemaType::Yaml).with_schema(SchemaRef::named("cfn")),
            false,
        )
        .await
        .unwrap();
    fx.service.register_mapping(json_mapping("doc1", None, Some("cfn")), false).await.unwrap();

    let result = fx.service.process_updates().await;

    assert!(matches!(result, Err(ServiceError::MissingHandler(SchemaType::Yaml))));
    assert_eq!(fx.service.pending(), 0);
    assert_eq!(settings(&fx.store), Value::Null);
    assert!(fx.events.contains("handler_missing"));
}

#[tokio::test]
async fn handler_failure_only_drops_its_mapping() {
    let fx = fixture();
    fx.service.register_mapping(json_mapping("doc1", None, Some("unknown")), false).await.unwrap();
    fx.service.register_mapping(json_mapping("doc2", None, Some("sam")), false).await.unwrap();

    let applied = fx.service.process_updates().await.unwrap();

    assert_eq!(applied, 1);
    assert_eq!(settings(&fx.store), json!([{"fileMatch": ["doc2"], "url": SAM_URL}]));
    let failure = fx.events.events().into_iter().find(|event| event.event == "mapping_failed");
    assert_eq!(failure.unwrap().uri.as_deref(), Some("doc1"));
}

#[tokio::test]
async fn is_mapped_reflects_handler_state() {
    let fx = fixture();
    fx.service.register_mapping(json_mapping("doc1", None, Some("cfn")), true).await.unwrap();

    assert!(fx.service.is_mapped(&DocumentUri::new("doc1")));
    assert!(!fx.service.is_mapped(&DocumentUri::new("doc2")));
}

// ============================================================================
// SECTION: Timer and Startup
// ============================================================================

#[tokio::test(start_paused = true)]
async fn timer_drains_without_flush() {
    let fx = fixture();
    assert!(fx.service.start_timer().unwrap());
    assert!(!fx.service.start_timer().unwrap());

    fx.service.register_mapping(json_mapping("doc1", None, Some("cfn")), false).await.unwrap();
    assert_eq!(fx.service.pending(), 1);

    tokio::time::sleep(fx.service.update_period() + Duration::from_millis(50)).await;

    assert_eq!(fx.service.pending(), 0);
    assert_eq!(settings(&fx.store), json!([{"fileMatch": ["doc1"], "url": CFN_URL}]));
}

#[tokio::test(start_paused = true)]
async fn timer_records_failed_drains() {
    let fx = fixture();
    fx.service.start_timer().unwrap();
    fx.service
        .register_mapping(
            SchemaMapping::new("template.yaml", SchemaType::Yaml).with_schema(SchemaRef::named("cfn")),
            false,
        )
        .await
        .unwrap();

    tokio::time::sleep(fx.service.update_period() + Duration::from_millis(50)).await;

    let failure = fx.events.events().into_iter().find(|event| event.event == "drain_failed");
    assert!(failure.unwrap().error.unwrap().contains("yaml"));
}

#[test]
fn timer_requires_runtime() {
    let fx = fixture();

    assert!(matches!(fx.service.start_timer(), Err(ServiceError::Runtime(_))));
}

#[tokio::test]
async fn start_installs_resolved_schemas() {
    let storage = tempfile::tempdir().unwrap();
    let source = InMemorySource::new()
        .with_resource(BUILDSPEC_PRIMARY_URL, crate::common::schema_body("buildspec"));
    let downloader = SchemaDownloader::new(
        Arc::new(source),
        Arc::new(InMemoryVersionCache::new()),
        storage.path(),
        test_sources(),
    );
    let fx = fixture_with(false);

    fx.service.start(Arc::new(downloader)).unwrap().await.unwrap();

    let schemas = fx.service.schemas().unwrap();
    assert!(schemas.contains("buildspec"));
    assert!(!schemas.contains("cfn"));

    fx.service
        .register_mapping(
            SchemaMapping::new("buildspec.yml", SchemaType::Json)
                .with_schema(SchemaRef::named("buildspec")),
            true,
        )
        .await
        .unwrap();
    assert!(fx.service.is_mapped(&DocumentUri::new("buildspec.yml")));
}
