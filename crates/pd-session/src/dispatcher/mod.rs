//! Reactive dispatcher
//!
//! The dispatcher owns the session's control store and one slot per output.
//! A control event updates the store and then rebuilds every slot whose
//! dependency set names that control, in registration order. Slots that do
//! not depend on the control are not touched.
//!
//! A slot moves `Stale -> Computing -> Fresh | Error`. A failed build keeps
//! whatever artifact the slot held before, so the page keeps showing the last
//! good chart next to the error.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use pd_core::events::events::{ControlChanged, ControlRejected};
use pd_core::{ControlError, ControlId, ControlSnapshot, ControlStateStore, ControlValue, EventBus};
use pd_data::{ErrorKind, QueryLayer};
use pd_views::Artifact;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::events::{OutputFailed, OutputUpdated};
use crate::outputs::{default_outputs, BuildContext, BuilderFn, OutputId, OutputRegistration};
use crate::DispatchError;

/// Lifecycle of one output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotState {
    /// Inputs changed, nothing built yet
    Stale,
    Computing,
    Fresh,
    /// Last build failed; the previous artifact, if any, is still held
    Error,
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SlotState::Stale => "stale",
            SlotState::Computing => "computing",
            SlotState::Fresh => "fresh",
            SlotState::Error => "error",
        };
        f.write_str(s)
    }
}

/// Current state of one output
#[derive(Clone)]
pub struct OutputSlot {
    id: OutputId,
    dependencies: &'static [ControlId],
    builder: BuilderFn,
    state: SlotState,
    artifact: Option<Artifact>,
    last_error: Option<String>,
    updated_at: Option<DateTime<Utc>>,
    builds: u64,
}

impl OutputSlot {
    fn new(registration: OutputRegistration) -> Self {
        Self {
            id: registration.id,
            dependencies: registration.dependencies,
            builder: registration.builder,
            state: SlotState::Stale,
            artifact: None,
            last_error: None,
            updated_at: None,
            builds: 0,
        }
    }

    pub fn id(&self) -> OutputId {
        self.id
    }

    pub fn dependencies(&self) -> &'static [ControlId] {
        self.dependencies
    }

    pub fn depends_on(&self, control: ControlId) -> bool {
        self.dependencies.contains(&control)
    }

    pub fn state(&self) -> SlotState {
        self.state
    }

    /// Last successfully built artifact
    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// When the held artifact was built
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Number of build attempts, successful or not
    pub fn builds(&self) -> u64 {
        self.builds
    }

    fn build(&mut self, ctx: &BuildContext<'_>, bus: &EventBus) -> OutputOutcome {
        self.state = SlotState::Computing;
        self.builds += 1;

        match (self.builder)(ctx) {
            Ok(artifact) => {
                self.state = SlotState::Fresh;
                self.last_error = None;
                self.updated_at = Some(Utc::now());
                self.artifact = Some(artifact.clone());
                bus.publish(OutputUpdated {
                    output: self.id,
                    artifact,
                });
                OutputOutcome::Updated
            }
            Err(e) => {
                let kind = e.kind();
                let message = e.to_string();
                error!("Output '{}' failed to build: {}", self.id, message);
                self.state = SlotState::Error;
                self.last_error = Some(message.clone());
                bus.publish(OutputFailed {
                    output: self.id,
                    kind,
                    message: message.clone(),
                    retained: self.artifact.clone(),
                });
                OutputOutcome::Failed { kind, message }
            }
        }
    }
}

impl fmt::Debug for OutputSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSlot")
            .field("id", &self.id)
            .field("dependencies", &self.dependencies)
            .field("state", &self.state)
            .field("last_error", &self.last_error)
            .field("builds", &self.builds)
            .finish()
    }
}

/// Result of rebuilding one output
#[derive(Debug, Clone, PartialEq)]
pub enum OutputOutcome {
    Updated,
    Failed { kind: ErrorKind, message: String },
}

/// What one dispatch cycle did
#[derive(Debug, Clone)]
pub struct DispatchReport {
    /// Control that triggered the cycle; `None` for priming and refreshes
    pub control: Option<ControlId>,
    pub outcomes: Vec<(OutputId, OutputOutcome)>,
    pub elapsed: Duration,
}

impl DispatchReport {
    /// Outputs rebuilt this cycle, in build order
    pub fn recomputed(&self) -> Vec<OutputId> {
        self.outcomes.iter().map(|(id, _)| *id).collect()
    }

    pub fn failed(&self) -> impl Iterator<Item = (OutputId, &str)> + '_ {
        self.outcomes.iter().filter_map(|(id, outcome)| match outcome {
            OutputOutcome::Failed { message, .. } => Some((*id, message.as_str())),
            OutputOutcome::Updated => None,
        })
    }

    pub fn is_clean(&self) -> bool {
        self.failed().next().is_none()
    }
}

/// Routes control events to the outputs that depend on them
pub struct Dispatcher {
    store: ControlStateStore,
    slots: IndexMap<OutputId, OutputSlot>,
    queries: QueryLayer,
    bus: Arc<EventBus>,
}

impl Dispatcher {
    /// Dispatcher with the dashboard's standard outputs
    pub fn new(queries: QueryLayer, bus: Arc<EventBus>) -> Self {
        Self::with_outputs(queries, bus, default_outputs())
    }

    pub fn with_outputs(
        queries: QueryLayer,
        bus: Arc<EventBus>,
        outputs: Vec<OutputRegistration>,
    ) -> Self {
        let slots = outputs
            .into_iter()
            .map(|registration| (registration.id, OutputSlot::new(registration)))
            .collect();
        Self {
            store: ControlStateStore::new(),
            slots,
            queries,
            bus,
        }
    }

    /// Set a control without rebuilding anything. Used before [`Self::prime`].
    pub fn preset(&mut self, value: ControlValue) -> Result<(), ControlError> {
        self.store.set(value).map(|_| ())
    }

    /// Build every output from the current control state
    pub fn prime(&mut self) -> DispatchReport {
        let started = Instant::now();
        let snapshot = self.store.snapshot();
        let ctx = BuildContext {
            controls: &snapshot,
            queries: &self.queries,
        };

        let mut outcomes = Vec::with_capacity(self.slots.len());
        for slot in self.slots.values_mut() {
            slot.state = SlotState::Stale;
            outcomes.push((slot.id, slot.build(&ctx, &self.bus)));
        }

        let report = DispatchReport {
            control: None,
            outcomes,
            elapsed: started.elapsed(),
        };
        debug!(
            "Primed {} outputs in {:?} ({} failed)",
            report.outcomes.len(),
            report.elapsed,
            report.failed().count()
        );
        report
    }

    /// Apply a control event and rebuild its dependents.
    ///
    /// A rejected value returns an error and leaves the store and every
    /// output as they were. Build failures do not fail the call; they show
    /// up in the report and on the slot.
    pub fn notify(&mut self, value: ControlValue) -> Result<DispatchReport, DispatchError> {
        let started = Instant::now();
        let control = value.control_id();

        if let Err(e) = self.store.set(value.clone()) {
            return Err(self.reject(control, e));
        }
        self.bus.publish(ControlChanged { value });

        let snapshot = self.store.snapshot();
        let ctx = BuildContext {
            controls: &snapshot,
            queries: &self.queries,
        };

        for slot in self.slots.values_mut().filter(|s| s.depends_on(control)) {
            slot.state = SlotState::Stale;
        }
        let mut outcomes = Vec::new();
        for slot in self.slots.values_mut().filter(|s| s.depends_on(control)) {
            outcomes.push((slot.id, slot.build(&ctx, &self.bus)));
        }

        let report = DispatchReport {
            control: Some(control),
            outcomes,
            elapsed: started.elapsed(),
        };
        debug!(
            "Control '{}' rebuilt {:?} in {:?}",
            control,
            report.recomputed(),
            report.elapsed
        );
        Ok(report)
    }

    /// Parse a string payload for `control` and dispatch it
    pub fn notify_raw(
        &mut self,
        control: ControlId,
        args: &[&str],
    ) -> Result<DispatchReport, DispatchError> {
        match ControlValue::parse(control, args) {
            Ok(value) => self.notify(value),
            Err(e) => Err(self.reject(control, e)),
        }
    }

    /// Rebuild one output with the current control state
    pub fn refresh(&mut self, id: OutputId) -> Result<DispatchReport, DispatchError> {
        let started = Instant::now();
        let snapshot = self.store.snapshot();
        let ctx = BuildContext {
            controls: &snapshot,
            queries: &self.queries,
        };
        let slot = self
            .slots
            .get_mut(&id)
            .ok_or_else(|| DispatchError::UnknownOutput(id.to_string()))?;

        slot.state = SlotState::Stale;
        let outcome = slot.build(&ctx, &self.bus);
        Ok(DispatchReport {
            control: None,
            outcomes: vec![(id, outcome)],
            elapsed: started.elapsed(),
        })
    }

    pub fn controls(&self) -> ControlSnapshot {
        self.store.snapshot()
    }

    pub fn slot(&self, id: OutputId) -> Option<&OutputSlot> {
        self.slots.get(&id)
    }

    /// Slots in registration order
    pub fn slots(&self) -> impl Iterator<Item = &OutputSlot> + '_ {
        self.slots.values()
    }

    pub fn artifact(&self, id: OutputId) -> Option<&Artifact> {
        self.slots.get(&id).and_then(OutputSlot::artifact)
    }

    /// Outputs rebuilt when `control` changes
    pub fn dependents(&self, control: ControlId) -> Vec<OutputId> {
        self.slots
            .values()
            .filter(|s| s.depends_on(control))
            .map(|s| s.id)
            .collect()
    }

    pub fn queries(&self) -> &QueryLayer {
        &self.queries
    }

    fn reject(&self, control: ControlId, e: ControlError) -> DispatchError {
        warn!("Rejected event for control '{}': {}", control, e);
        self.bus.publish(ControlRejected {
            control,
            reason: e.to_string(),
        });
        DispatchError::Control(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use pd_core::{Feature, GamesType, HostYear, TypeChecklist};
    use pd_data::{sample, SourceConfig};
    use pd_views::DetailCard;

    fn primed(dir: &std::path::Path) -> (Dispatcher, SourceConfig) {
        let config = sample::write_sample(dir).unwrap();
        let mut dispatcher = Dispatcher::new(QueryLayer::from_config(&config), Arc::new(EventBus::new()));
        let report = dispatcher.prime();
        assert!(report.is_clean(), "{:?}", report);
        (dispatcher, config)
    }

    fn bar_ids(dispatcher: &Dispatcher) -> Vec<String> {
        match dispatcher.artifact(OutputId::BarCharts) {
            Some(Artifact::BarCharts(charts)) => charts.iter().map(|c| c.id.clone()).collect(),
            other => panic!("expected bar charts, got {:?}", other),
        }
    }

    #[test]
    fn test_prime_builds_every_output_from_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, _) = primed(dir.path());

        for slot in dispatcher.slots() {
            assert_eq!(slot.state(), SlotState::Fresh, "{}", slot.id());
            assert_eq!(slot.builds(), 1);
            assert!(slot.updated_at().is_some());
        }
        match dispatcher.artifact(OutputId::LineChart) {
            Some(Artifact::LineChart(chart)) => {
                assert_eq!(chart.title, "How has the number of events changed over time?")
            }
            other => panic!("expected a line chart, got {:?}", other),
        }
        assert_eq!(bar_ids(&dispatcher), vec!["bar-chart-summer"]);
        assert_eq!(
            dispatcher.artifact(OutputId::Card),
            Some(&Artifact::Card(DetailCard::NoSelection))
        );
        match dispatcher.artifact(OutputId::Map) {
            Some(Artifact::GeoScatter(map)) => assert!(!map.points.is_empty()),
            other => panic!("expected a map, got {:?}", other),
        }
    }

    #[test]
    fn test_category_change_rebuilds_only_line_chart() {
        let dir = tempfile::tempdir().unwrap();
        let (mut dispatcher, _) = primed(dir.path());
        assert_eq!(dispatcher.dependents(ControlId::Category), vec![OutputId::LineChart]);

        let report = dispatcher
            .notify(ControlValue::Category(Feature::Sports))
            .unwrap();
        assert_eq!(report.control, Some(ControlId::Category));
        assert_eq!(report.recomputed(), vec![OutputId::LineChart]);

        assert_eq!(dispatcher.slot(OutputId::LineChart).unwrap().builds(), 2);
        for id in [OutputId::BarCharts, OutputId::Map, OutputId::Card] {
            assert_eq!(dispatcher.slot(id).unwrap().builds(), 1, "{}", id);
        }
    }

    #[test]
    fn test_same_category_twice_gives_identical_chart() {
        let dir = tempfile::tempdir().unwrap();
        let (mut dispatcher, _) = primed(dir.path());

        for feature in Feature::ALL {
            dispatcher.notify(ControlValue::Category(feature)).unwrap();
            let first = dispatcher.artifact(OutputId::LineChart).cloned();
            dispatcher.notify(ControlValue::Category(feature)).unwrap();
            assert_eq!(dispatcher.artifact(OutputId::LineChart).cloned(), first, "{}", feature);
        }
    }

    #[test]
    fn test_bar_charts_follow_checklist_order() {
        let dir = tempfile::tempdir().unwrap();
        let (mut dispatcher, _) = primed(dir.path());

        let winter_first =
            TypeChecklist::new(vec![GamesType::Winter, GamesType::Summer]).unwrap();
        let report = dispatcher.notify(ControlValue::Types(winter_first)).unwrap();
        assert_eq!(report.recomputed(), vec![OutputId::BarCharts]);
        assert_eq!(bar_ids(&dispatcher), vec!["bar-chart-winter", "bar-chart-summer"]);

        dispatcher
            .notify_raw(ControlId::Types, &["summer", "winter"])
            .unwrap();
        assert_eq!(bar_ids(&dispatcher), vec!["bar-chart-summer", "bar-chart-winter"]);
    }

    #[test]
    fn test_invalid_category_leaves_everything_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let (mut dispatcher, _) = primed(dir.path());
        let before = dispatcher.artifact(OutputId::LineChart).cloned();

        let err = dispatcher
            .notify_raw(ControlId::Category, &["medals"])
            .unwrap_err();
        assert!(matches!(err, DispatchError::Control(ControlError::InvalidParameter { .. })));

        assert_eq!(dispatcher.artifact(OutputId::LineChart).cloned(), before);
        assert_eq!(dispatcher.slot(OutputId::LineChart).unwrap().builds(), 1);
        assert_eq!(dispatcher.controls().category, Feature::Events);
    }

    #[test]
    fn test_empty_checklist_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (mut dispatcher, _) = primed(dir.path());
        dispatcher
            .notify_raw(ControlId::Types, &["winter"])
            .unwrap();

        let err = dispatcher.notify_raw(ControlId::Types, &[]).unwrap_err();
        assert!(matches!(err, DispatchError::Control(ControlError::EmptyChecklist)));
        assert_eq!(dispatcher.controls().types.as_slice(), &[GamesType::Winter]);
        assert_eq!(bar_ids(&dispatcher), vec!["bar-chart-winter"]);
    }

    #[test]
    fn test_hover_builds_card() {
        let dir = tempfile::tempdir().unwrap();
        let (mut dispatcher, _) = primed(dir.path());

        let report = dispatcher
            .notify_raw(ControlId::Hover, &["Salt Lake City 2002"])
            .unwrap();
        assert_eq!(report.recomputed(), vec![OutputId::Card]);
        match dispatcher.artifact(OutputId::Card) {
            Some(Artifact::Card(DetailCard::Edition(card))) => {
                assert_eq!(card.host, "Salt Lake City");
                assert_eq!(card.year, 2002);
            }
            other => panic!("expected an edition card, got {:?}", other),
        }

        dispatcher
            .notify(ControlValue::Hover(Some(HostYear::new("Nowhereland", 1899))))
            .unwrap();
        assert!(matches!(
            dispatcher.artifact(OutputId::Card),
            Some(Artifact::Card(DetailCard::NotFound { .. }))
        ));

        dispatcher.notify(ControlValue::Hover(None)).unwrap();
        assert_eq!(
            dispatcher.artifact(OutputId::Card),
            Some(&Artifact::Card(DetailCard::NoSelection))
        );
    }

    #[test]
    fn test_unavailable_source_keeps_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let (mut dispatcher, config) = primed(dir.path());
        let before = dispatcher.artifact(OutputId::LineChart).cloned();

        std::fs::remove_file(&config.csv_path).unwrap();
        let report = dispatcher
            .notify(ControlValue::Category(Feature::Countries))
            .unwrap();
        assert!(!report.is_clean());

        let slot = dispatcher.slot(OutputId::LineChart).unwrap();
        assert_eq!(slot.state(), SlotState::Error);
        assert!(slot.last_error().is_some());
        assert_eq!(slot.artifact().cloned(), before);
        assert!(matches!(
            &report.outcomes[0].1,
            OutputOutcome::Failed { kind: ErrorKind::SourceUnavailable, .. }
        ));

        // The stored control value still moved on
        assert_eq!(dispatcher.controls().category, Feature::Countries);
        assert_eq!(dispatcher.slot(OutputId::Map).unwrap().state(), SlotState::Fresh);

        sample::write_sample(dir.path()).unwrap();
        let report = dispatcher.refresh(OutputId::LineChart).unwrap();
        assert!(report.is_clean());
        assert_eq!(
            dispatcher.slot(OutputId::LineChart).unwrap().state(),
            SlotState::Fresh
        );
    }

    #[test]
    fn test_events_published_per_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = sample::write_sample(dir.path()).unwrap();
        let bus = Arc::new(EventBus::new());

        let updated = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&updated);
        bus.subscribe_fn::<OutputUpdated, _>(move |event| sink.lock().push(event.output));

        let rejected = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&rejected);
        bus.subscribe_fn::<ControlRejected, _>(move |event| sink.lock().push(event.control));

        let mut dispatcher = Dispatcher::new(QueryLayer::from_config(&config), Arc::clone(&bus));
        dispatcher.prime();
        assert_eq!(updated.lock().as_slice(), &OutputId::ALL);

        updated.lock().clear();
        dispatcher.notify_raw(ControlId::Category, &["participants"]).unwrap();
        let _ = dispatcher.notify_raw(ControlId::Category, &["medals"]);
        assert_eq!(updated.lock().as_slice(), &[OutputId::LineChart]);
        assert_eq!(rejected.lock().as_slice(), &[ControlId::Category]);
    }

    #[test]
    fn test_preset_applies_before_prime() {
        let dir = tempfile::tempdir().unwrap();
        let config = sample::write_sample(dir.path()).unwrap();
        let mut dispatcher =
            Dispatcher::new(QueryLayer::from_config(&config), Arc::new(EventBus::new()));
        dispatcher
            .preset(ControlValue::Category(Feature::Countries))
            .unwrap();
        assert_eq!(dispatcher.slot(OutputId::LineChart).unwrap().state(), SlotState::Stale);
        assert!(dispatcher.artifact(OutputId::LineChart).is_none());

        dispatcher.prime();
        match dispatcher.artifact(OutputId::LineChart) {
            Some(Artifact::LineChart(chart)) => assert_eq!(chart.y_label, "Countries"),
            other => panic!("expected a line chart, got {:?}", other),
        }
    }
}
