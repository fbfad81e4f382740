// crates/schema-sync-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and mapping workflows.
// Purpose: Ensure CLI commands edit the settings file as documented.
// Dependencies: schema-sync-cli main helpers, tempfile, tokio
// ============================================================================

//! ## Overview
//! Validates argument parsing, schema argument handling, and the map/unmap
//! workflows against a temporary settings file.

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

// ============================================================================
// SECTION: Imports
// ============================================================================

use clap::Parser;
use schema_sync_config::LogSinkKind;
use schema_sync_config::SchemaSyncConfig;
use schema_sync_core::ResolvedSchemas;
use schema_sync_core::SchemaLocation;
use schema_sync_core::SchemaMapping;
use schema_sync_core::SchemaRef;
use schema_sync_core::SchemaType;
use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;

use super::Cli;
use super::Commands;
use super::apply_mapping;
use super::map_document;
use super::parse_schema_ref;
use super::resolved_table_json;
use super::status_report;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const CFN_URL: &str = "file:///storage/cloudformation.schema.json";

fn temp_config() -> (TempDir, SchemaSyncConfig) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = SchemaSyncConfig::default();
    config.json.settings_path = dir.path().join("settings.json");
    config.logging.sink = LogSinkKind::None;
    (dir, config)
}

fn schemas() -> ResolvedSchemas {
    ResolvedSchemas::new().with("cfn", SchemaLocation::parse(CFN_URL).unwrap())
}

fn settings(config: &SchemaSyncConfig) -> Value {
    let bytes = std::fs::read(&config.json.settings_path).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

#[test]
fn parses_map_with_global_config() {
    let cli = Cli::try_parse_from([
        "schema-sync",
        "map",
        "--uri",
        "template.json",
        "--schema",
        "cfn",
        "--owner",
        "featureA",
        "--config",
        "custom.toml",
    ])
    .unwrap();

    assert_eq!(cli.config.unwrap().to_str(), Some("custom.toml"));
    let Some(Commands::Map(command)) = cli.command else {
        panic!("expected map command");
    };
    assert_eq!(command.uri, "template.json");
    assert_eq!(command.schema, "cfn");
    assert_eq!(command.owner.as_deref(), Some("featureA"));
}

#[test]
fn map_requires_schema() {
    assert!(Cli::try_parse_from(["schema-sync", "map", "--uri", "template.json"]).is_err());
}

#[test]
fn schema_argument_accepts_names_and_uris() {
    assert_eq!(parse_schema_ref(" sam ").unwrap(), SchemaRef::named("sam"));
    assert_eq!(
        parse_schema_ref("https://example.com/custom.json").unwrap(),
        SchemaRef::location(SchemaLocation::parse("https://example.com/custom.json").unwrap())
    );
    assert!(parse_schema_ref("   ").is_err());
}

#[test]
fn resolved_table_renders_as_object() {
    assert_eq!(resolved_table_json(&schemas()), json!({"cfn": CFN_URL}));
    assert_eq!(resolved_table_json(&ResolvedSchemas::new()), json!({}));
}

// ============================================================================
// SECTION: Workflows
// ============================================================================

#[tokio::test]
async fn map_then_unmap_edits_settings_file() {
    let (_dir, config) = temp_config();
    let mapping = SchemaMapping::new("template.json", SchemaType::Json)
        .with_owner("featureA")
        .with_schema(SchemaRef::named("cfn"));

    let report = apply_mapping(&config, schemas(), mapping).await.unwrap();

    assert_eq!(report["decision"], "claimed");
    assert_eq!(report["mapped"], true);
    assert_eq!(
        settings(&config)["json.schemas"],
        json!([{"fileMatch": ["template.json"], "url": CFN_URL}])
    );
    assert_eq!(status_report(&config, "template.json")["mapped"], true);

    let removal = SchemaMapping::new("template.json", SchemaType::Json);
    let report = apply_mapping(&config, ResolvedSchemas::new(), removal).await.unwrap();

    assert_eq!(report["decision"], "admitted");
    assert_eq!(report["mapped"], false);
    assert_eq!(settings(&config)["json.schemas"], json!([]));
}

#[tokio::test]
async fn map_fails_when_schema_is_unresolved() {
    let (_dir, config) = temp_config();
    let mapping =
        SchemaMapping::new("template.json", SchemaType::Json).with_schema(SchemaRef::named("sam"));

    let result = map_document(&config, schemas(), mapping).await;

    let err = result.unwrap_err();
    assert!(err.to_string().contains("template.json was not mapped to sam"));
    assert_eq!(status_report(&config, "template.json")["mapped"], false);
}

#[tokio::test]
async fn map_succeeds_when_schema_resolves() {
    let (_dir, config) = temp_config();
    let mapping =
        SchemaMapping::new("template.json", SchemaType::Json).with_schema(SchemaRef::named("cfn"));

    let report = map_document(&config, schemas(), mapping).await.unwrap();

    assert_eq!(report["mapped"], true);
}

#[test]
fn status_without_settings_file_is_unmapped() {
    let (_dir, config) = temp_config();

    let report = status_report(&config, "template.json");

    assert_eq!(report, json!({"uri": "template.json", "mapped": false}));
}
