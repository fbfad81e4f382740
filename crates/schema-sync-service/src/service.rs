// crates/schema-sync-service/src/service.rs
// ============================================================================
// Module: Schema Service
// Description: Ownership-gated mapping queue drained into schema handlers.
// Purpose: Coordinate schema mappings from competing editor features.
// Dependencies: schema-sync-core, tokio
// ============================================================================

//! ## Overview
//! Editor features call [`SchemaService::register_mapping`] to associate a
//! document with a schema. Mappings pass the ownership table, wait in an
//! ordered queue, and are drained into the [`SchemaHandler`] registered for
//! their [`SchemaType`] either immediately (flush) or by a periodic timer.
//! Invariants:
//! - The queue and ownership table are never locked across an await.
//! - Each drain takes the whole queue; items dispatch in registration order.
//! - Nothing drains until the resolved schema table is installed; the queue is
//!   kept intact meanwhile.
//! - A missing handler aborts the rest of its batch; a failing handler only
//!   drops its own mapping.
//! - The drain timer holds a weak reference and stops when the service drops.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::mem;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::RwLock;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use schema_sync_config::DEFAULT_UPDATE_PERIOD_MS;
use schema_sync_core::DocumentUri;
use schema_sync_core::OwnershipDecision;
use schema_sync_core::OwnershipTable;
use schema_sync_core::ResolvedSchemas;
use schema_sync_core::SchemaMapping;
use schema_sync_core::SchemaType;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::downloader::SchemaDownloader;
use crate::events::NoopEventSink;
use crate::events::SchemaEventSink;
use crate::events::SchemaSyncEvent;
use crate::handler::SchemaHandler;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors returned by the schema service.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No handler is registered for a mapping's schema type.
    #[error("no handler registered for schema type: {0}")]
    MissingHandler(SchemaType),
    /// Internal state lock was poisoned.
    #[error("schema service state poisoned")]
    Poisoned,
    /// Background work requires a running tokio runtime.
    #[error("no tokio runtime available: {0}")]
    Runtime(String),
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builder for a schema service.
///
/// # Invariants
/// - Handler registrations are keyed by schema type; later registrations
///   overwrite earlier ones.
pub struct SchemaServiceBuilder {
    /// Handler registry keyed by schema type.
    handlers: BTreeMap<SchemaType, Arc<dyn SchemaHandler>>,
    /// Delay between timer drains.
    update_period: Duration,
    /// Resolved table installed at build time.
    schemas: Option<ResolvedSchemas>,
    /// Diagnostic event sink.
    events: Arc<dyn SchemaEventSink>,
}

impl Default for SchemaServiceBuilder {
    fn default() -> Self {
        Self {
            handlers: BTreeMap::new(),
            update_period: Duration::from_millis(DEFAULT_UPDATE_PERIOD_MS),
            schemas: None,
            events: Arc::new(NoopEventSink),
        }
    }
}

impl SchemaServiceBuilder {
    /// Registers the handler for a schema type.
    #[must_use]
    pub fn handler(mut self, schema_type: SchemaType, handler: Arc<dyn SchemaHandler>) -> Self {
        self.handlers.insert(schema_type, handler);
        self
    }

    /// Sets the delay between timer drains.
    #[must_use]
    pub const fn update_period(mut self, period: Duration) -> Self {
        self.update_period = period;
        self
    }

    /// Installs a resolved schema table up front.
    #[must_use]
    pub fn schemas(mut self, schemas: ResolvedSchemas) -> Self {
        self.schemas = Some(schemas);
        self
    }

    /// Sets the diagnostic event sink.
    #[must_use]
    pub fn event_sink(mut self, events: Arc<dyn SchemaEventSink>) -> Self {
        self.events = events;
        self
    }

    /// Builds the service.
    #[must_use]
    pub fn build(self) -> SchemaService {
        SchemaService {
            handlers: self.handlers,
            update_period: self.update_period,
            events: self.events,
            state: Mutex::new(QueueState::default()),
            schemas: RwLock::new(self.schemas.map(Arc::new)),
            timer_started: AtomicBool::new(false),
        }
    }
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Mutable queue state guarded by one lock.
#[derive(Debug, Default)]
struct QueueState {
    /// Admitted mappings awaiting dispatch.
    queue: Vec<SchemaMapping>,
    /// Current owner claim per document.
    ownership: OwnershipTable,
}

/// Schema mapping coordinator.
pub struct SchemaService {
    /// Handler registry keyed by schema type.
    handlers: BTreeMap<SchemaType, Arc<dyn SchemaHandler>>,
    /// Delay between timer drains.
    update_period: Duration,
    /// Diagnostic event sink.
    events: Arc<dyn SchemaEventSink>,
    /// Update queue and ownership table.
    state: Mutex<QueueState>,
    /// Resolved schema table; unset until resolution completes.
    schemas: RwLock<Option<Arc<ResolvedSchemas>>>,
    /// Set once the drain timer is spawned.
    timer_started: AtomicBool,
}

impl SchemaService {
    /// Returns a builder for the schema service.
    #[must_use]
    pub fn builder() -> SchemaServiceBuilder {
        SchemaServiceBuilder::default()
    }

    /// Returns the delay between timer drains.
    #[must_use]
    pub const fn update_period(&self) -> Duration {
        self.update_period
    }

    /// Registers a mapping request.
    ///
    /// The mapping is checked against the ownership table and enqueued only
    /// when admitted. With `flush` the queue is drained before returning.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the state lock is poisoned or the flush
    /// drain hits a missing handler.
    pub async fn register_mapping(
        &self,
        mapping: SchemaMapping,
        flush: bool,
    ) -> Result<OwnershipDecision, ServiceError> {
        let decision = {
            let mut state = self.state.lock().map_err(|_| ServiceError::Poisoned)?;
            let decision = state.ownership.apply(&mapping);
            if decision.is_admitted() {
                state.queue.push(mapping.clone());
            }
            decision
        };
        if decision == OwnershipDecision::Ignored {
            let mut event = SchemaSyncEvent::info(
                "mapping_ignored",
                "document is claimed by another owner",
            )
            .with_uri(mapping.uri.as_str());
            if let Some(schema) = &mapping.schema {
                event = event.with_schema(schema.to_string());
            }
            self.events.record(&event);
        }
        if flush {
            self.process_updates().await?;
        }
        Ok(decision)
    }

    /// Drains the queue into handlers.
    ///
    /// Returns the number of mappings applied. Does nothing while the queue is
    /// empty or the resolved table is unset.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::MissingHandler`] when a mapping's type has no
    /// handler; the remainder of that batch is dropped.
    pub async fn process_updates(&self) -> Result<usize, ServiceError> {
        let Some(schemas) = self.schemas() else {
            return Ok(0);
        };
        let batch = {
            let mut state = self.state.lock().map_err(|_| ServiceError::Poisoned)?;
            mem::take(&mut state.queue)
        };

        let mut applied = 0;
        for mapping in batch {
            let Some(handler) = self.handlers.get(&mapping.schema_type) else {
                self.events.record(
                    &SchemaSyncEvent::error("handler_missing", "batch aborted")
                        .with_uri(mapping.uri.as_str())
                        .with_error(format!("no handler for {}", mapping.schema_type)),
                );
                return Err(ServiceError::MissingHandler(mapping.schema_type));
            };
            match handler.handle_update(&mapping, &schemas).await {
                Ok(()) => applied += 1,
                Err(err) => {
                    let mut event = SchemaSyncEvent::warn("mapping_failed", "mapping not applied")
                        .with_uri(mapping.uri.as_str())
                        .with_error(err);
                    if let Some(schema) = &mapping.schema {
                        event = event.with_schema(schema.to_string());
                    }
                    self.events.record(&event);
                }
            }
        }
        Ok(applied)
    }

    /// Starts the recurring drain timer.
    ///
    /// Each cycle sleeps for the update period and then awaits a full drain,
    /// so drains never overlap. Returns false when the timer already runs.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Runtime`] outside a tokio runtime.
    pub fn start_timer(self: &Arc<Self>) -> Result<bool, ServiceError> {
        let runtime = Handle::try_current().map_err(|err| ServiceError::Runtime(err.to_string()))?;
        if self.timer_started.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }
        let weak = Arc::downgrade(self);
        let period = self.update_period;
        runtime.spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                let Some(service) = weak.upgrade() else {
                    break;
                };
                if let Err(err) = service.process_updates().await {
                    service.events.record(
                        &SchemaSyncEvent::error("drain_failed", "timer drain failed")
                            .with_error(err),
                    );
                }
            }
        });
        Ok(true)
    }

    /// Resolves the default schemas in the background and starts the timer.
    ///
    /// The returned handle completes once the table is installed.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Runtime`] outside a tokio runtime.
    pub fn start(
        self: &Arc<Self>,
        downloader: Arc<SchemaDownloader>,
    ) -> Result<JoinHandle<()>, ServiceError> {
        let runtime = Handle::try_current().map_err(|err| ServiceError::Runtime(err.to_string()))?;
        let weak = Arc::downgrade(self);
        let events = Arc::clone(&self.events);
        let resolution = runtime.spawn(async move {
            let schemas = downloader.get_default_schemas().await;
            let count = schemas.len();
            let Some(service) = weak.upgrade() else {
                return;
            };
            match service.set_schemas(schemas) {
                Ok(()) => events.record(&SchemaSyncEvent::info(
                    "schemas_resolved",
                    format!("{count} default schemas available"),
                )),
                Err(err) => events.record(
                    &SchemaSyncEvent::error("schemas_resolved", "schema table not installed")
                        .with_error(err),
                ),
            }
        });
        self.start_timer()?;
        Ok(resolution)
    }

    /// Returns true when any handler reports `uri` as mapped.
    #[must_use]
    pub fn is_mapped(&self, uri: &DocumentUri) -> bool {
        self.handlers.values().any(|handler| handler.is_mapped(uri))
    }

    /// Installs the resolved schema table.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Poisoned`] when the table lock is poisoned.
    pub fn set_schemas(&self, schemas: ResolvedSchemas) -> Result<(), ServiceError> {
        *self.schemas.write().map_err(|_| ServiceError::Poisoned)? = Some(Arc::new(schemas));
        Ok(())
    }

    /// Returns the resolved schema table, if installed.
    #[must_use]
    pub fn schemas(&self) -> Option<Arc<ResolvedSchemas>> {
        self.schemas.read().ok().and_then(|guard| guard.clone())
    }

    /// Returns the number of queued mappings.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.lock().map_or(0, |state| state.queue.len())
    }
}
