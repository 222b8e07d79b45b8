/// Module abstraction: the unit of analysis the engine drives.
///
/// An analyzer declares, statically:
///   - its `KIND` and the `DEPENDENCIES` it reads from (name + kind)
///   - a `HandlerTable` mapping (direction filter, event type) to a handler,
///     built once when the module is constructed
///
/// and implements the lifecycle hooks it needs (`on_initialized`,
/// `on_finished`, `suggestions`, `statistic`, `sub_statistic`).
///
/// The engine stores analyzers behind the object-safe `Module` trait. Every
/// hook receives a `Scope`, which exposes the shared run context and typed
/// read access to the module's declared dependencies. Dependencies always sit
/// earlier in the instantiation order, which is what lets a handler read them
/// while the engine holds the handler's own module mutably.
use crate::{
    combatant::{Combatant, Combatants},
    config::AnalyzerConfig,
    context::{AnalysisContext, Fight},
    event::{Direction, Event, EventType, Provenance},
    statistic::Statistic,
    suggestion::When,
};
use anyhow::{anyhow, Result};
use serde::{Serialize, Serializer};
use std::any::Any;
use std::fmt;

// ---------------------------------------------------------------------------
// ModuleKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModuleKind {
    DamageDone,
    PrePotion,
    AgonyUptime,
    EmpoweredLifeTap,
    SoulShardTracker,
    SoulConduit,
    CosmicRipple,
    StaggerFabricator,
    StaggeringStrikes,
    /// Analyzers defined outside this crate.
    Custom(&'static str),
}

impl ModuleKind {
    pub const BUILT_IN: [ModuleKind; 9] = [
        Self::DamageDone,
        Self::PrePotion,
        Self::AgonyUptime,
        Self::EmpoweredLifeTap,
        Self::SoulShardTracker,
        Self::SoulConduit,
        Self::CosmicRipple,
        Self::StaggerFabricator,
        Self::StaggeringStrikes,
    ];

    pub fn name(&self) -> &'static str {
        match *self {
            Self::DamageDone        => "damage_done",
            Self::PrePotion         => "pre_potion",
            Self::AgonyUptime       => "agony_uptime",
            Self::EmpoweredLifeTap  => "empowered_life_tap",
            Self::SoulShardTracker  => "soul_shard_tracker",
            Self::SoulConduit       => "soul_conduit",
            Self::CosmicRipple      => "cosmic_ripple",
            Self::StaggerFabricator => "stagger_fabricator",
            Self::StaggeringStrikes => "staggering_strikes",
            Self::Custom(name)      => name,
        }
    }

    /// Built-in kind by its snake_case name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::BUILT_IN.into_iter().find(|k| k.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for ModuleKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// A named dependency on another module kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub name: &'static str,
    pub kind: ModuleKind,
}

pub const fn dependency(name: &'static str, kind: ModuleKind) -> Dependency {
    Dependency { name, kind }
}

// ---------------------------------------------------------------------------
// Handler table
// ---------------------------------------------------------------------------

/// Which events a handler wants, relative to the analyzed player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    ByPlayer,
    ToPlayer,
    Other,
    All,
}

impl Filter {
    pub fn admits(self, direction: Direction) -> bool {
        match self {
            Self::ByPlayer => direction.by_player(),
            Self::ToPlayer => direction.to_player(),
            Self::Other    => direction == Direction::Other,
            Self::All      => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerKey {
    pub filter:     Filter,
    pub event_type: EventType,
}

impl HandlerKey {
    pub fn matches(&self, event: &Event) -> bool {
        self.event_type == event.event_type && self.filter.admits(event.direction)
    }
}

impl fmt::Display for HandlerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filter = match self.filter {
            Filter::ByPlayer => "byPlayer",
            Filter::ToPlayer => "toPlayer",
            Filter::Other    => "other",
            Filter::All      => "all",
        };
        write!(f, "{}:{:?}", filter, self.event_type)
    }
}

pub type Handler<M> = fn(&mut M, &Event, &mut Scope<'_>) -> Result<()>;

pub struct HandlerTable<M> {
    entries: Vec<(HandlerKey, Handler<M>)>,
}

impl<M> HandlerTable<M> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn on(mut self, filter: Filter, event_type: EventType, handler: Handler<M>) -> Self {
        self.entries.push((HandlerKey { filter, event_type }, handler));
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = HandlerKey> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    pub fn handles(&self, event: &Event) -> bool {
        self.entries.iter().any(|(key, _)| key.matches(event))
    }
}

impl<M> Default for HandlerTable<M> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Analyzer (implemented by modules)
// ---------------------------------------------------------------------------

pub trait Analyzer: Sized + 'static {
    const KIND: ModuleKind;
    const DEPENDENCIES: &'static [Dependency] = &[];

    fn handlers() -> HandlerTable<Self> {
        HandlerTable::new()
    }

    /// Decide, once, whether this module takes part in the run.
    fn on_initialized(&mut self, _scope: &Scope<'_>) -> Result<bool> {
        Ok(true)
    }

    fn on_finished(&mut self, _scope: &Scope<'_>) -> Result<()> {
        Ok(())
    }

    fn suggestions(&self, _when: &mut When, _scope: &Scope<'_>) {}

    fn statistic(&self, _scope: &Scope<'_>) -> Option<Statistic> {
        None
    }

    fn sub_statistic(&self, _scope: &Scope<'_>) -> Option<Statistic> {
        None
    }
}

// ---------------------------------------------------------------------------
// Module (object-safe, engine-facing)
// ---------------------------------------------------------------------------

pub trait Module {
    fn kind(&self) -> ModuleKind;
    fn handler_keys(&self) -> Vec<HandlerKey>;
    fn handles(&self, event: &Event) -> bool;
    /// Run every handler matching `event`; returns how many ran.
    fn dispatch(&mut self, event: &Event, scope: &mut Scope<'_>) -> Result<usize>;
    fn initialize(&mut self, scope: &Scope<'_>) -> Result<bool>;
    fn finish(&mut self, scope: &Scope<'_>) -> Result<()>;
    fn suggestions(&self, when: &mut When, scope: &Scope<'_>);
    fn statistic(&self, scope: &Scope<'_>) -> Option<Statistic>;
    fn sub_statistic(&self, scope: &Scope<'_>) -> Option<Statistic>;
    fn as_any(&self) -> &dyn Any;
}

/// An analyzer together with its handler table.
pub(crate) struct Mounted<M> {
    pub(crate) inner: M,
    table:            HandlerTable<M>,
}

impl<M: Analyzer> Mounted<M> {
    pub(crate) fn new(inner: M) -> Self {
        Self { inner, table: M::handlers() }
    }
}

impl<M: Analyzer> Module for Mounted<M> {
    fn kind(&self) -> ModuleKind {
        M::KIND
    }

    fn handler_keys(&self) -> Vec<HandlerKey> {
        self.table.keys().collect()
    }

    fn handles(&self, event: &Event) -> bool {
        self.table.handles(event)
    }

    fn dispatch(&mut self, event: &Event, scope: &mut Scope<'_>) -> Result<usize> {
        let mut invoked = 0;
        for idx in 0..self.table.entries.len() {
            let (key, handler) = self.table.entries[idx];
            if key.matches(event) {
                handler(&mut self.inner, event, scope)?;
                invoked += 1;
            }
        }
        Ok(invoked)
    }

    fn initialize(&mut self, scope: &Scope<'_>) -> Result<bool> {
        self.inner.on_initialized(scope)
    }

    fn finish(&mut self, scope: &Scope<'_>) -> Result<()> {
        self.inner.on_finished(scope)
    }

    fn suggestions(&self, when: &mut When, scope: &Scope<'_>) {
        self.inner.suggestions(when, scope)
    }

    fn statistic(&self, scope: &Scope<'_>) -> Option<Statistic> {
        self.inner.statistic(scope)
    }

    fn sub_statistic(&self, scope: &Scope<'_>) -> Option<Statistic> {
        self.inner.sub_statistic(scope)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Typed view of a mounted module.
pub fn downcast<M: Analyzer>(module: &dyn Module) -> Option<&M> {
    module.as_any().downcast_ref::<Mounted<M>>().map(|m| &m.inner)
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// A module waiting to be constructed by the engine.
pub struct Registration {
    kind:         ModuleKind,
    dependencies: &'static [Dependency],
    factory:      Box<dyn FnOnce() -> Box<dyn Module>>,
}

impl Registration {
    pub fn of<M: Analyzer + Default>() -> Self {
        Self::with(M::default)
    }

    pub fn with<M: Analyzer>(factory: impl FnOnce() -> M + 'static) -> Self {
        Self {
            kind:         M::KIND,
            dependencies: M::DEPENDENCIES,
            factory:      Box::new(move || Box::new(Mounted::new(factory())) as Box<dyn Module>),
        }
    }

    pub fn kind(&self) -> ModuleKind {
        self.kind
    }

    pub fn dependencies(&self) -> &'static [Dependency] {
        self.dependencies
    }

    pub(crate) fn construct(self) -> Box<dyn Module> {
        (self.factory)()
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("kind", &self.kind)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// Resolved binding of one declared dependency to a constructed module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub dependency: Dependency,
    /// Position of the dependency in the instantiation order.
    pub index:      usize,
}

/// Everything a module hook may touch.
pub struct Scope<'a> {
    ctx:        &'a AnalysisContext,
    earlier:    &'a [Box<dyn Module>],
    bindings:   &'a [Binding],
    module:     ModuleKind,
    fabricated: Vec<Event>,
    abort:      Option<String>,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(
        ctx:      &'a AnalysisContext,
        earlier:  &'a [Box<dyn Module>],
        bindings: &'a [Binding],
        module:   ModuleKind,
    ) -> Self {
        Self { ctx, earlier, bindings, module, fabricated: Vec::new(), abort: None }
    }

    pub fn module(&self) -> ModuleKind {
        self.module
    }

    pub fn fight(&self) -> &'a Fight {
        &self.ctx.fight
    }

    pub fn config(&self) -> &'a AnalyzerConfig {
        &self.ctx.config
    }

    pub fn combatants(&self) -> &'a Combatants {
        &self.ctx.combatants
    }

    pub fn selected(&self) -> &'a Combatant {
        self.ctx.selected()
    }

    pub fn player_id(&self) -> u64 {
        self.ctx.player_id()
    }

    /// Uptime of a buff on the selected player over the whole fight.
    pub fn buff_uptime(&self, spell_id: u32) -> u64 {
        let fight = self.fight();
        self.selected().buff_uptime(spell_id, fight.start_time, fight.end_time)
    }

    /// A declared dependency, typed. Inactive dependencies are returned as
    /// well; they simply hold their default state.
    pub fn dependency<M: Analyzer>(&self) -> Result<&'a M> {
        let binding = self
            .bindings
            .iter()
            .find(|b| b.dependency.kind == M::KIND)
            .ok_or_else(|| anyhow!("{} did not declare a dependency on {}", self.module, M::KIND))?;
        self.earlier
            .get(binding.index)
            .and_then(|module| downcast::<M>(module.as_ref()))
            .ok_or_else(|| {
                anyhow!(
                    "dependency `{}` of {} is not bound to a {}",
                    binding.dependency.name, self.module, M::KIND
                )
            })
    }

    /// Queue a synthetic event. It is delivered after every primary event
    /// sharing its timestamp, to modules later in the order than this one.
    pub fn fabricate(&mut self, mut event: Event) {
        event.provenance = Provenance::Fabricated(self.module);
        self.fabricated.push(event);
    }

    /// Abandon the whole run (incompatible or corrupt stream).
    pub fn abort(&mut self, reason: impl Into<String>) {
        self.abort.get_or_insert_with(|| reason.into());
    }

    pub(crate) fn into_outcome(self) -> (Vec<Event>, Option<String>) {
        (self.fabricated, self.abort)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Ability;

    #[derive(Default)]
    struct Counter {
        casts:   u32,
        damage:  u32,
    }

    impl Counter {
        fn on_cast(&mut self, _event: &Event, _scope: &mut Scope<'_>) -> Result<()> {
            self.casts += 1;
            Ok(())
        }

        fn on_damage(&mut self, _event: &Event, _scope: &mut Scope<'_>) -> Result<()> {
            self.damage += 1;
            Ok(())
        }
    }

    impl Analyzer for Counter {
        const KIND: ModuleKind = ModuleKind::Custom("counter");

        fn handlers() -> HandlerTable<Self> {
            HandlerTable::new()
                .on(Filter::ByPlayer, EventType::Cast, Self::on_cast)
                .on(Filter::ToPlayer, EventType::Damage, Self::on_damage)
                .on(Filter::ByPlayer, EventType::Damage, Self::on_damage)
        }
    }

    fn event(event_type: EventType, direction: Direction) -> Event {
        let mut e = Event::new(0, event_type, Some(1), Some(1), Ability::id(1));
        e.direction = direction;
        e
    }

    #[test]
    fn names_round_trip() {
        for kind in ModuleKind::BUILT_IN {
            assert_eq!(ModuleKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ModuleKind::from_name("nope"), None);
        assert_eq!(ModuleKind::Custom("external").to_string(), "external");
    }

    #[test]
    fn filters_admit_directions() {
        assert!(Filter::ByPlayer.admits(Direction::SelfTargeted));
        assert!(Filter::ToPlayer.admits(Direction::SelfTargeted));
        assert!(!Filter::ToPlayer.admits(Direction::ByPlayer));
        assert!(Filter::Other.admits(Direction::Other));
        assert!(!Filter::Other.admits(Direction::ByPlayer));
        assert!(Filter::All.admits(Direction::ToPlayer));
    }

    #[test]
    fn table_is_enumerable() {
        let mounted = Mounted::new(Counter::default());
        let keys = mounted.handler_keys();
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[0].to_string(), "byPlayer:Cast");
        assert!(mounted.handles(&event(EventType::Cast, Direction::ByPlayer)));
        assert!(!mounted.handles(&event(EventType::Cast, Direction::ToPlayer)));
        assert!(!mounted.handles(&event(EventType::Heal, Direction::ByPlayer)));
    }

    #[test]
    fn downcast_reaches_inner_state() {
        let module: Box<dyn Module> = Box::new(Mounted::new(Counter { casts: 3, damage: 0 }));
        assert_eq!(downcast::<Counter>(module.as_ref()).map(|c| c.casts), Some(3));
        assert_eq!(module.kind(), ModuleKind::Custom("counter"));
    }
}
