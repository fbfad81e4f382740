// crates/schema-sync-cli/src/main.rs
// ============================================================================
// Module: Schema Sync CLI Entry Point
// Description: Command dispatcher for schema download and mapping workflows.
// Purpose: Drive the schema downloader and JSON settings handler from a shell.
// Dependencies: clap, schema-sync-config, schema-sync-service, serde_json, tokio
// ============================================================================

//! ## Overview
//! The `schema-sync` binary resolves the default schemas into local storage
//! and edits the JSON schema association list in the configured settings
//! file. Every command loads [`SchemaSyncConfig`] first; failures are printed
//! to stderr with a failing exit code.
//!
//! Ownership claims live only for the duration of one invocation, so `map`
//! and `unmap` always act as the sole owner of the document.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use schema_sync_config::SchemaSyncConfig;
use schema_sync_core::DocumentUri;
use schema_sync_core::OwnershipDecision;
use schema_sync_core::ResolvedSchemas;
use schema_sync_core::SchemaLocation;
use schema_sync_core::SchemaMapping;
use schema_sync_core::SchemaRef;
use schema_sync_core::SchemaType;
use schema_sync_service::JsonSchemaHandler;
use schema_sync_service::SchemaDownloader;
use schema_sync_service::SchemaEventSink;
use schema_sync_service::SchemaHandler;
use schema_sync_service::SchemaService;
use schema_sync_service::event_sink_from_config;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "schema-sync", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Optional config file path (defaults to schema-sync.toml or env override).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Download the default schemas and print the resolved table.
    Download,
    /// Associate a document with a schema in the JSON settings file.
    Map(MapCommand),
    /// Remove a document's schema association.
    Unmap(UnmapCommand),
    /// Report whether a document has a schema association.
    Status(StatusCommand),
}

/// Arguments for the `map` command.
#[derive(Args, Debug)]
struct MapCommand {
    /// Document URI or path to associate.
    #[arg(long, value_name = "URI")]
    uri: String,
    /// Schema name (`cfn`, `sam`, `buildspec`) or schema URI.
    #[arg(long, value_name = "SCHEMA")]
    schema: String,
    /// Optional owner label for the claim.
    #[arg(long, value_name = "OWNER")]
    owner: Option<String>,
}

/// Arguments for the `unmap` command.
#[derive(Args, Debug)]
struct UnmapCommand {
    /// Document URI or path to release.
    #[arg(long, value_name = "URI")]
    uri: String,
}

/// Arguments for the `status` command.
#[derive(Args, Debug)]
struct StatusCommand {
    /// Document URI or path to inspect.
    #[arg(long, value_name = "URI")]
    uri: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("schema-sync {version}"))
            .map_err(|err| CliError::new(output_error(&err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    let config = load_config(cli.config)?;
    match command {
        Commands::Download => command_download(&config).await,
        Commands::Map(command) => command_map(&config, command).await,
        Commands::Unmap(command) => command_unmap(&config, command).await,
        Commands::Status(command) => command_status(&config, &command),
    }
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error(&err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error(&err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `download` command.
async fn command_download(config: &SchemaSyncConfig) -> CliResult<ExitCode> {
    let schemas = resolve_defaults(config).await?;
    write_json_value(&resolved_table_json(&schemas))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `map` command.
async fn command_map(config: &SchemaSyncConfig, command: MapCommand) -> CliResult<ExitCode> {
    let schema = parse_schema_ref(&command.schema)?;
    let schemas = resolve_defaults(config).await?;
    let mut mapping = SchemaMapping::new(command.uri, SchemaType::Json).with_schema(schema);
    if let Some(owner) = command.owner {
        mapping = mapping.with_owner(owner);
    }
    let report = map_document(config, schemas, mapping).await?;
    write_json_value(&report)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `unmap` command.
async fn command_unmap(config: &SchemaSyncConfig, command: UnmapCommand) -> CliResult<ExitCode> {
    let mapping = SchemaMapping::new(command.uri, SchemaType::Json);
    // Removals never consult the table, so nothing is downloaded.
    let report = apply_mapping(config, ResolvedSchemas::new(), mapping).await?;
    write_json_value(&report)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `status` command.
fn command_status(config: &SchemaSyncConfig, command: &StatusCommand) -> CliResult<ExitCode> {
    write_json_value(&status_report(config, &command.uri))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Workflows
// ============================================================================

/// Loads and validates the configuration.
fn load_config(path: Option<PathBuf>) -> CliResult<SchemaSyncConfig> {
    SchemaSyncConfig::load(path.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

/// Builds the event sink selected by the configuration.
fn event_sink(config: &SchemaSyncConfig) -> CliResult<Arc<dyn SchemaEventSink>> {
    event_sink_from_config(&config.logging)
        .map_err(|err| CliError::new(format!("failed to open event log: {err}")))
}

/// Downloads the default schemas into the configured storage directory.
async fn resolve_defaults(config: &SchemaSyncConfig) -> CliResult<ResolvedSchemas> {
    let downloader = SchemaDownloader::from_config(config)
        .map_err(|err| CliError::new(format!("failed to build downloader: {err}")))?
        .with_event_sink(event_sink(config)?);
    Ok(downloader.get_default_schemas().await)
}

/// Registers one mapping with flush and reports the outcome.
async fn apply_mapping(
    config: &SchemaSyncConfig,
    schemas: ResolvedSchemas,
    mapping: SchemaMapping,
) -> CliResult<Value> {
    let uri = mapping.uri.clone();
    let handler = Arc::new(JsonSchemaHandler::from_config(&config.json));
    let service = SchemaService::builder()
        .handler(SchemaType::Json, handler)
        .update_period(config.service.update_period())
        .schemas(schemas)
        .event_sink(event_sink(config)?)
        .build();
    let decision = service
        .register_mapping(mapping, true)
        .await
        .map_err(|err| CliError::new(format!("failed to apply mapping: {err}")))?;
    Ok(json!({
        "uri": uri.as_str(),
        "decision": decision_label(decision),
        "mapped": service.is_mapped(&uri),
    }))
}

/// Applies an assignment and fails unless the document ends up mapped.
async fn map_document(
    config: &SchemaSyncConfig,
    schemas: ResolvedSchemas,
    mapping: SchemaMapping,
) -> CliResult<Value> {
    let schema = mapping.schema.as_ref().map(ToString::to_string).unwrap_or_default();
    let report = apply_mapping(config, schemas, mapping).await?;
    if report["mapped"] != Value::Bool(true) {
        return Err(CliError::new(format!(
            "{} was not mapped to {schema} ({})",
            report["uri"].as_str().unwrap_or_default(),
            report["decision"].as_str().unwrap_or_default(),
        )));
    }
    Ok(report)
}

/// Reports whether a document is listed in the settings file.
fn status_report(config: &SchemaSyncConfig, uri: &str) -> Value {
    let handler = JsonSchemaHandler::from_config(&config.json);
    json!({
        "uri": uri,
        "mapped": handler.is_mapped(&DocumentUri::new(uri)),
    })
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a schema argument: URIs are used directly, anything else is a name.
fn parse_schema_ref(value: &str) -> CliResult<SchemaRef> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CliError::new("schema must be non-empty".to_string()));
    }
    if value.contains("://") {
        let location = SchemaLocation::parse(value)
            .map_err(|err| CliError::new(format!("invalid schema uri: {err}")))?;
        return Ok(SchemaRef::location(location));
    }
    Ok(SchemaRef::named(value))
}

/// Renders the resolved table as a JSON object of name to location.
fn resolved_table_json(schemas: &ResolvedSchemas) -> Value {
    let table: Map<String, Value> = schemas
        .iter()
        .map(|(name, location)| (name.to_string(), Value::String(location.to_string())))
        .collect();
    Value::Object(table)
}

/// Returns the output label for an ownership decision.
const fn decision_label(decision: OwnershipDecision) -> &'static str {
    match decision {
        OwnershipDecision::Claimed => "claimed",
        OwnershipDecision::Admitted => "admitted",
        OwnershipDecision::Ignored => "ignored",
    }
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Writes pretty JSON followed by a newline to stdout.
fn write_json_value(value: &Value) -> CliResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("failed to render json: {err}")))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error(&err)))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(error: &std::io::Error) -> String {
    format!("failed to write stdout: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
