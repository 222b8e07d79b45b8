/// Analyzer engine: resolves the registered modules, replays the event log
/// through them and collects their output.
///
/// A run goes through four phases, strictly in order:
///   1. resolve   dependency order, bindings, module construction
///   2. initialize   each module decides once whether it is active
///   3. dispatch   primary events in log order, with fabricated events merged in
///   4. finish + report   buffs closed at fight end, `on_finished`, then
///      suggestions and statistics
///
/// Fabricated events wait in a min-heap keyed by (timestamp, emission order).
/// Before a primary event at `t` is dispatched, every queued event earlier
/// than `t` is delivered, so a fabricated event always follows every primary
/// event sharing its timestamp. A fabricated event only reaches modules later
/// in the order than the one that emitted it.
///
/// Handler failures are isolated per module: an `Err` or a caught panic is
/// recorded as a diagnostic and the run continues. Too many errors (or any
/// panic) during dispatch degrade the module: it gets no further events but
/// is still finished and still reports.
use crate::{
    combatant::Combatants,
    config::AnalyzerConfig,
    context::{AnalysisContext, Fight},
    error::{AnalysisError, HandlerError, Phase},
    event::{Event, EventType},
    input::AnalysisInput,
    module::{downcast, Analyzer, Binding, Module, ModuleKind, Registration, Scope},
    resolver::{self, Declaration},
    statistic::Statistic,
    suggestion::{Suggestion, When},
};
use serde::Serialize;
use std::any::Any;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::panic::{self, AssertUnwindSafe};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    Active,
    Inactive,
    Failed,
    Degraded,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleReport {
    pub kind:          ModuleKind,
    pub status:        ModuleStatus,
    pub suggestions:   Vec<Suggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistic:     Option<Statistic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_statistic: Option<Statistic>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerSummary {
    pub id:   u64,
    pub name: String,
    /// "CLASS/Spec", when the spec is known.
    pub spec: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub fight:       Fight,
    pub player:      PlayerSummary,
    /// In instantiation order.
    pub modules:     Vec<ModuleReport>,
    pub diagnostics: Vec<HandlerError>,
}

impl AnalysisReport {
    pub fn module(&self, kind: ModuleKind) -> Option<&ModuleReport> {
        self.modules.iter().find(|m| m.kind == kind)
    }

    pub fn suggestions(&self) -> impl Iterator<Item = &Suggestion> + '_ {
        self.modules.iter().flat_map(|m| m.suggestions.iter())
    }
}

/// Result of a completed run: the report plus the finished modules, which
/// stay readable through `module::<M>()`.
pub struct Analysis {
    report:  AnalysisReport,
    ctx:     AnalysisContext,
    modules: Vec<Box<dyn Module>>,
}

impl Analysis {
    pub fn report(&self) -> &AnalysisReport {
        &self.report
    }

    pub fn into_report(self) -> AnalysisReport {
        self.report
    }

    pub fn context(&self) -> &AnalysisContext {
        &self.ctx
    }

    pub fn module<M: Analyzer>(&self) -> Option<&M> {
        self.modules.iter().find_map(|m| downcast::<M>(m.as_ref()))
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Engine {
    registrations: Vec<Registration>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, registration: Registration) -> Self {
        self.registrations.push(registration);
        self
    }

    pub fn kinds(&self) -> Vec<ModuleKind> {
        self.registrations.iter().map(Registration::kind).collect()
    }

    pub fn run(self, input: AnalysisInput, config: AnalyzerConfig) -> Result<Analysis, AnalysisError> {
        let declarations: Vec<Declaration> = self
            .registrations
            .iter()
            .map(|r| Declaration { kind: r.kind(), dependencies: r.dependencies() })
            .collect();
        let resolution = resolver::resolve(&declarations)?;

        let combatants =
            Combatants::from_roster(&input.roster, input.player_id, input.fight.start_time)?;
        let ctx = AnalysisContext::new(input.fight, combatants, config);

        let mut pending: Vec<Option<Registration>> =
            self.registrations.into_iter().map(Some).collect();
        let mut modules = Vec::with_capacity(pending.len());
        let mut slots   = Vec::with_capacity(pending.len());
        for &idx in &resolution.order {
            if let Some(registration) = pending[idx].take() {
                slots.push(Slot::new(registration.kind()));
                modules.push(registration.construct());
            }
        }

        tracing::info!(
            "Analyzing {}ms fight for player {} ({} events, modules: {})",
            ctx.fight.duration(),
            ctx.player_id(),
            input.events.len(),
            slots.iter().map(|s| s.kind.name()).collect::<Vec<_>>().join(", ")
        );

        let mut run = Run {
            ctx,
            modules,
            slots,
            bindings: resolution.bindings,
            queue: BinaryHeap::new(),
            seq: 0,
            diagnostics: Vec::new(),
            delivered: 0,
        };
        run.initialize();
        run.dispatch(&input.events)?;
        run.finish();
        Ok(run.report())
    }
}

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activation {
    Pending,
    Active,
    Inactive,
    Failed,
}

struct Slot {
    kind:       ModuleKind,
    activation: Activation,
    failures:   u32,
    degraded:   bool,
}

impl Slot {
    fn new(kind: ModuleKind) -> Self {
        Self { kind, activation: Activation::Pending, failures: 0, degraded: false }
    }

    fn receives_events(&self) -> bool {
        self.activation == Activation::Active && !self.degraded
    }

    fn status(&self) -> ModuleStatus {
        match self.activation {
            Activation::Active if self.degraded => ModuleStatus::Degraded,
            Activation::Active                  => ModuleStatus::Active,
            Activation::Failed                  => ModuleStatus::Failed,
            Activation::Pending | Activation::Inactive => ModuleStatus::Inactive,
        }
    }
}

/// A fabricated event waiting for delivery.
struct Queued {
    timestamp: u64,
    seq:       u64,
    /// Slot of the module that emitted it.
    emitter:   usize,
    event:     Event,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.timestamp, self.seq).cmp(&(other.timestamp, other.seq))
    }
}

enum Fault {
    Error(String),
    Panic(String),
}

struct Run {
    ctx:         AnalysisContext,
    modules:     Vec<Box<dyn Module>>,
    slots:       Vec<Slot>,
    bindings:    Vec<Vec<Binding>>,
    queue:       BinaryHeap<Reverse<Queued>>,
    seq:         u64,
    diagnostics: Vec<HandlerError>,
    delivered:   usize,
}

impl Run {
    fn initialize(&mut self) {
        for idx in 0..self.modules.len() {
            let kind = self.slots[idx].kind;
            let (earlier, rest) = self.modules.split_at_mut(idx);
            let scope  = Scope::new(&self.ctx, &*earlier, &self.bindings[idx], kind);
            let module = &mut rest[0];
            let outcome = guarded(|| module.initialize(&scope));
            match outcome {
                Ok(active) => {
                    tracing::debug!("{} is {}", kind, if active { "active" } else { "inactive" });
                    self.slots[idx].activation =
                        if active { Activation::Active } else { Activation::Inactive };
                }
                Err(fault) => self.record_fault(idx, Phase::Initialize, None, fault),
            }
        }
    }

    fn dispatch(&mut self, events: &[Event]) -> Result<(), AnalysisError> {
        for event in events {
            self.flush_before(Some(event.timestamp))?;
            self.ctx.combatants.track(event);
            if event.event_type == EventType::Unknown {
                continue;
            }
            self.deliver(event, 0)?;
        }
        self.flush_before(None)?;
        tracing::debug!("Delivered {} handler calls", self.delivered);
        Ok(())
    }

    /// Deliver queued fabricated events earlier than `until` (all when `None`).
    fn flush_before(&mut self, until: Option<u64>) -> Result<(), AnalysisError> {
        loop {
            let due = match (self.queue.peek(), until) {
                (Some(Reverse(next)), Some(t)) => next.timestamp < t,
                (Some(_), None)                => true,
                (None, _)                      => false,
            };
            if !due {
                return Ok(());
            }
            if let Some(Reverse(queued)) = self.queue.pop() {
                self.deliver(&queued.event, queued.emitter + 1)?;
            }
        }
    }

    fn deliver(&mut self, event: &Event, first_slot: usize) -> Result<(), AnalysisError> {
        for idx in first_slot..self.modules.len() {
            if self.slots[idx].receives_events() && self.modules[idx].handles(event) {
                self.invoke(idx, event)?;
            }
        }
        Ok(())
    }

    fn invoke(&mut self, idx: usize, event: &Event) -> Result<(), AnalysisError> {
        let kind = self.slots[idx].kind;
        let (earlier, rest) = self.modules.split_at_mut(idx);
        let module = &mut rest[0];
        let mut scope = Scope::new(&self.ctx, &*earlier, &self.bindings[idx], kind);
        let outcome = guarded(|| module.dispatch(event, &mut scope));
        let (fabricated, abort) = scope.into_outcome();

        if let Some(reason) = abort {
            tracing::warn!("{} aborted the run at {}ms: {}", kind, event.timestamp, reason);
            return Err(AnalysisError::Aborted { module: kind, reason });
        }
        match outcome {
            Ok(invoked) => {
                self.delivered += invoked;
                for synthetic in fabricated {
                    self.enqueue(idx, event.timestamp, synthetic);
                }
            }
            Err(fault) => self.record_fault(idx, Phase::Dispatch, Some(event.timestamp), fault),
        }
        Ok(())
    }

    fn enqueue(&mut self, emitter: usize, cause_ts: u64, mut event: Event) {
        event.timestamp = event.timestamp.max(cause_ts);
        self.seq += 1;
        self.queue.push(Reverse(Queued {
            timestamp: event.timestamp,
            seq: self.seq,
            emitter,
            event,
        }));
    }

    fn finish(&mut self) {
        let end = self.ctx.fight.end_time;
        self.ctx.combatants.close_all(end);

        for idx in 0..self.modules.len() {
            if self.slots[idx].activation != Activation::Active {
                continue;
            }
            let kind = self.slots[idx].kind;
            let (earlier, rest) = self.modules.split_at_mut(idx);
            let scope  = Scope::new(&self.ctx, &*earlier, &self.bindings[idx], kind);
            let module = &mut rest[0];
            if let Err(fault) = guarded(|| module.finish(&scope)) {
                self.record_fault(idx, Phase::Finish, None, fault);
            }
        }
    }

    fn report(mut self) -> Analysis {
        let mut reports = Vec::with_capacity(self.modules.len());
        for idx in 0..self.modules.len() {
            let slot   = &self.slots[idx];
            let status = slot.status();
            let kind   = slot.kind;
            let mut report = ModuleReport {
                kind,
                status,
                suggestions:   Vec::new(),
                statistic:     None,
                sub_statistic: None,
            };
            if matches!(status, ModuleStatus::Active | ModuleStatus::Degraded) {
                let scope  = Scope::new(&self.ctx, &self.modules[..idx], &self.bindings[idx], kind);
                let module = self.modules[idx].as_ref();
                let mut faults = Vec::new();

                let mut when = When::new(kind);
                match guarded(|| {
                    module.suggestions(&mut when, &scope);
                    Ok(())
                }) {
                    Ok(()) => report.suggestions = when.into_suggestions(),
                    Err(fault) => faults.push(fault),
                }
                match guarded(|| Ok(module.statistic(&scope))) {
                    Ok(stat) => report.statistic = stat,
                    Err(fault) => faults.push(fault),
                }
                match guarded(|| Ok(module.sub_statistic(&scope))) {
                    Ok(stat) => report.sub_statistic = stat,
                    Err(fault) => faults.push(fault),
                }
                for fault in faults {
                    self.record_fault(idx, Phase::Report, None, fault);
                }
            }
            reports.push(report);
        }

        let selected = self.ctx.selected();
        let player = PlayerSummary {
            id:   selected.id,
            name: selected.name.clone(),
            spec: selected.spec_id.and_then(crate::specs::by_id).map(|s| s.key()),
        };
        let suggestion_count: usize = reports.iter().map(|r| r.suggestions.len()).sum();
        tracing::info!(
            "Analysis finished: {} suggestions, {} diagnostics",
            suggestion_count,
            self.diagnostics.len()
        );

        Analysis {
            report: AnalysisReport {
                fight: self.ctx.fight,
                player,
                modules: reports,
                diagnostics: self.diagnostics,
            },
            ctx:     self.ctx,
            modules: self.modules,
        }
    }

    fn record_fault(&mut self, idx: usize, phase: Phase, timestamp: Option<u64>, fault: Fault) {
        let max  = self.ctx.config.max_handler_failures.max(1);
        let slot = &mut self.slots[idx];
        let (message, panicked) = match fault {
            Fault::Error(message) => (message, false),
            Fault::Panic(message) => (format!("panicked: {message}"), true),
        };
        let error = HandlerError { module: slot.kind, phase, timestamp, message };
        tracing::warn!("Handler error in {}", error);

        match phase {
            Phase::Initialize | Phase::Finish => slot.activation = Activation::Failed,
            Phase::Dispatch => {
                slot.failures += 1;
                if !slot.degraded && (panicked || slot.failures >= max) {
                    slot.degraded = true;
                    tracing::warn!(
                        "{} degraded after {} error(s); it receives no further events",
                        slot.kind, slot.failures
                    );
                }
            }
            Phase::Report => {}
        }
        self.diagnostics.push(error);
    }
}

/// Run a module hook, turning both `Err` and panics into a `Fault`.
fn guarded<T>(hook: impl FnOnce() -> anyhow::Result<T>) -> Result<T, Fault> {
    match panic::catch_unwind(AssertUnwindSafe(hook)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e))    => Err(Fault::Error(format!("{e:#}"))),
        Err(payload)  => Err(Fault::Panic(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
