//! Session-scoped context
//!
//! The control values and built figures of one viewer hang off a
//! [`Session`]. Two sessions never share a control store.

use std::sync::Arc;

use ahash::AHashMap;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use pd_core::{ControlId, ControlSnapshot, ControlValue, EventBus};
use pd_data::QueryLayer;
use pd_views::Artifact;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::InitialControls;
use crate::dispatcher::{DispatchReport, Dispatcher, OutputSlot, SlotState};
use crate::{DispatchError, OutputId, SessionConfig};

/// One viewer's dashboard
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    bus: Arc<EventBus>,
    /// Serializes overlapping events for this session
    dispatcher: Mutex<Dispatcher>,
}

impl Session {
    /// Open a session on the configured data and build every output once
    pub fn open(config: &SessionConfig) -> Result<Self, DispatchError> {
        Self::with_queries(QueryLayer::from_config(&config.source), &config.initial)
    }

    pub fn with_queries(
        queries: QueryLayer,
        initial: &InitialControls,
    ) -> Result<Self, DispatchError> {
        let id = Uuid::new_v4();
        if let Err(e) = queries.check_source() {
            warn!("Session {}: data source '{}' failed its check: {}", id, queries.source_name(), e);
        }
        let bus = Arc::new(EventBus::new());
        let mut dispatcher = Dispatcher::new(queries, Arc::clone(&bus));
        for value in initial.values() {
            dispatcher.preset(value)?;
        }

        let report = dispatcher.prime();
        for (output, message) in report.failed() {
            warn!("Session {}: output '{}' unavailable at startup: {}", id, output, message);
        }
        info!(
            "Session {} opened on '{}' ({} outputs)",
            id,
            dispatcher.queries().source_name(),
            report.outcomes.len()
        );

        Ok(Self {
            id,
            created_at: Utc::now(),
            bus,
            dispatcher: Mutex::new(dispatcher),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Bus carrying control and output events for this session
    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn notify(&self, value: ControlValue) -> Result<DispatchReport, DispatchError> {
        self.dispatcher.lock().notify(value)
    }

    pub fn notify_raw(
        &self,
        control: ControlId,
        args: &[&str],
    ) -> Result<DispatchReport, DispatchError> {
        self.dispatcher.lock().notify_raw(control, args)
    }

    pub fn refresh(&self, output: OutputId) -> Result<DispatchReport, DispatchError> {
        self.dispatcher.lock().refresh(output)
    }

    pub fn controls(&self) -> ControlSnapshot {
        self.dispatcher.lock().controls()
    }

    pub fn artifact(&self, output: OutputId) -> Option<Artifact> {
        self.dispatcher.lock().artifact(output).cloned()
    }

    pub fn slot(&self, output: OutputId) -> Option<OutputSlot> {
        self.dispatcher.lock().slot(output).cloned()
    }

    pub fn state(&self, output: OutputId) -> Option<SlotState> {
        self.dispatcher.lock().slot(output).map(OutputSlot::state)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.bus.clear();
        info!("Session {} closed", self.id);
    }
}

/// Open sessions keyed by id
pub struct SessionManager {
    config: SessionConfig,
    sessions: RwLock<AHashMap<Uuid, Arc<Session>>>,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(AHashMap::new()),
        }
    }

    pub fn open(&self) -> Result<Arc<Session>, DispatchError> {
        let session = Arc::new(Session::open(&self.config)?);
        self.sessions
            .write()
            .insert(session.id(), Arc::clone(&session));
        Ok(session)
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<Session>> {
        self.sessions.read().get(&id).cloned()
    }

    /// Forget a session. It is torn down once the last handle is dropped.
    pub fn close(&self, id: Uuid) -> bool {
        self.sessions.write().remove(&id).is_some()
    }

    pub fn notify(&self, id: Uuid, value: ControlValue) -> Result<DispatchReport, DispatchError> {
        let session = self.get(id).ok_or(DispatchError::SessionNotFound(id))?;
        session.notify(value)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}
