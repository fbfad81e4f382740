// crates/schema-sync-service/src/events.rs
// ============================================================================
// Module: Schema Sync Events
// Description: Structured events for schema download and mapping activity.
// Purpose: Emit JSON-line diagnostics without a hard logging dependency.
// Dependencies: schema-sync-config, serde, serde_json
// ============================================================================

//! ## Overview
//! Every notable step (manifest resolution, downloads, cache fallbacks,
//! ignored mappings, handler failures) is recorded as a [`SchemaSyncEvent`]
//! through a [`SchemaEventSink`]. Sinks are cheap to share and never fail the
//! caller; write errors are swallowed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use schema_sync_config::LogSinkKind;
use schema_sync_config::LoggingConfig;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Severity of a schema sync event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    /// Routine progress.
    Info,
    /// Recoverable problem; a fallback was used.
    Warn,
    /// Operation failed; its result was dropped.
    Error,
}

/// Schema sync event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaSyncEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event severity.
    pub level: EventLevel,
    /// Human-readable summary.
    pub message: String,
    /// Document URI when the event concerns a mapping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Schema name or location involved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Schema title when the event concerns a download.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Version cache key involved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<String>,
    /// Error text for failures and fallbacks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SchemaSyncEvent {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn new(event: &'static str, level: EventLevel, message: impl Into<String>) -> Self {
        Self {
            event,
            timestamp_ms: now_ms(),
            level,
            message: message.into(),
            uri: None,
            schema: None,
            title: None,
            cache_key: None,
            error: None,
        }
    }

    /// Creates an info-level event.
    #[must_use]
    pub fn info(event: &'static str, message: impl Into<String>) -> Self {
        Self::new(event, EventLevel::Info, message)
    }

    /// Creates a warn-level event.
    #[must_use]
    pub fn warn(event: &'static str, message: impl Into<String>) -> Self {
        Self::new(event, EventLevel::Warn, message)
    }

    /// Creates an error-level event.
    #[must_use]
    pub fn error(event: &'static str, message: impl Into<String>) -> Self {
        Self::new(event, EventLevel::Error, message)
    }

    /// Attaches a document URI.
    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Attaches a schema name or location.
    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Attaches a schema title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Attaches a version cache key.
    #[must_use]
    pub fn with_cache_key(mut self, cache_key: impl Into<String>) -> Self {
        self.cache_key = Some(cache_key.into());
        self
    }

    /// Attaches error text.
    #[must_use]
    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }
}

/// Returns the current wall-clock time in milliseconds.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |duration| duration.as_millis())
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Event sink for schema sync diagnostics.
pub trait SchemaEventSink: Send + Sync {
    /// Record an event.
    fn record(&self, event: &SchemaSyncEvent);
}

/// Event sink that logs JSON lines to stderr.
pub struct StderrEventSink;

impl SchemaEventSink for StderrEventSink {
    fn record(&self, event: &SchemaSyncEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Event sink that logs JSON lines to a file.
pub struct FileEventSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileEventSink {
    /// Opens the event log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl SchemaEventSink for FileEventSink {
    fn record(&self, event: &SchemaSyncEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op event sink.
pub struct NoopEventSink;

impl SchemaEventSink for NoopEventSink {
    fn record(&self, _event: &SchemaSyncEvent) {}
}

/// Event sink that keeps events in memory for inspection.
///
/// # Invariants
/// - Clones share the same event buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventSink {
    /// Recorded events in arrival order.
    events: Arc<Mutex<Vec<SchemaSyncEvent>>>,
}

impl MemoryEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<SchemaSyncEvent> {
        self.events.lock().map(|guard| guard.clone()).unwrap_or_default()
    }

    /// Returns true when an event with the given identifier was recorded.
    #[must_use]
    pub fn contains(&self, event: &str) -> bool {
        self.events().iter().any(|recorded| recorded.event == event)
    }
}

impl SchemaEventSink for MemoryEventSink {
    fn record(&self, event: &SchemaSyncEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event.clone());
        }
    }
}

// ============================================================================
// SECTION: Construction
// ============================================================================

/// Builds the sink selected by the `[logging]` config section.
///
/// # Errors
///
/// Returns an error when the file sink cannot open its log file.
pub fn event_sink_from_config(config: &LoggingConfig) -> io::Result<Arc<dyn SchemaEventSink>> {
    match (config.sink, config.path.as_deref()) {
        (LogSinkKind::Stderr, _) => Ok(Arc::new(StderrEventSink)),
        (LogSinkKind::None, _) => Ok(Arc::new(NoopEventSink)),
        (LogSinkKind::File, Some(path)) => Ok(Arc::new(FileEventSink::new(path)?)),
        (LogSinkKind::File, None) => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "logging.sink=file requires logging.path",
        )),
    }
}
