/// Stagger pool model.
///
/// The log only shows the damage Stagger absorbs and the ticks the player
/// takes from it; the pool itself is implicit. This module rebuilds it and
/// publishes every change as a fabricated event on the player:
///   - `addstagger`     absorbed by Stagger, added to the pool
///   - `removestagger`  drained by a tick (trigger = the tick ability) or
///     purified by Blackout Strike with Staggering Strikes (trigger = Blackout
///     Strike; `overflow` is the part of the per-cast amount the pool could
///     not cover)
use crate::{
    event::{Ability, Direction, Event, EventType},
    module::{Analyzer, Filter, HandlerTable, ModuleKind, Scope},
    specs,
    spells,
};
use anyhow::Result;

#[derive(Debug, Default)]
pub struct StaggerFabricator {
    pool:     u64,
    per_cast: u64,
    added:    u64,
    removed:  u64,
}

impl StaggerFabricator {
    pub fn pool(&self) -> u64 {
        self.pool
    }

    /// Stagger removed by each Blackout Strike (0 without the trait).
    pub fn per_cast(&self) -> u64 {
        self.per_cast
    }

    pub fn total_added(&self) -> u64 {
        self.added
    }

    pub fn total_removed(&self) -> u64 {
        self.removed
    }

    fn pool_event(cause: &Event, event_type: EventType, amount: u64, scope: &Scope<'_>) -> Event {
        let player = scope.player_id();
        let mut event = Event::derived(cause, event_type, stagger_ability()).with_amount(amount);
        event.source_id = Some(player);
        event.target_id = Some(player);
        event.direction = Direction::SelfTargeted;
        event
    }

    fn on_absorbed(&mut self, event: &Event, scope: &mut Scope<'_>) -> Result<()> {
        if event.ability.id != spells::STAGGER.id {
            return Ok(());
        }
        let amount = event.amount.unwrap_or(0);
        self.pool  += amount;
        self.added += amount;
        let add = Self::pool_event(event, EventType::AddStagger, amount, scope);
        scope.fabricate(add);
        Ok(())
    }

    fn on_tick(&mut self, event: &Event, scope: &mut Scope<'_>) -> Result<()> {
        if event.ability.id != spells::STAGGER_TAKEN.id {
            return Ok(());
        }
        let removed = event.raw_amount().min(self.pool);
        self.drain(removed);
        let remove = Self::pool_event(event, EventType::RemoveStagger, removed, scope)
            .with_trigger(spells::STAGGER_TAKEN.id);
        scope.fabricate(remove);
        Ok(())
    }

    fn on_cast(&mut self, event: &Event, scope: &mut Scope<'_>) -> Result<()> {
        if event.ability.id != spells::BLACKOUT_STRIKE.id || self.per_cast == 0 {
            return Ok(());
        }
        let removed = self.per_cast.min(self.pool);
        self.drain(removed);
        let remove = Self::pool_event(event, EventType::RemoveStagger, removed, scope)
            .with_overflow(self.per_cast - removed)
            .with_trigger(spells::BLACKOUT_STRIKE.id);
        scope.fabricate(remove);
        Ok(())
    }

    fn drain(&mut self, amount: u64) {
        self.pool    -= amount;
        self.removed += amount;
    }
}

fn stagger_ability() -> Ability {
    Ability {
        id:   spells::STAGGER.id,
        name: spells::STAGGER.name.to_owned(),
        icon: spells::STAGGER.icon.to_owned(),
    }
}

impl Analyzer for StaggerFabricator {
    const KIND: ModuleKind = ModuleKind::StaggerFabricator;

    fn handlers() -> HandlerTable<Self> {
        HandlerTable::new()
            .on(Filter::ToPlayer, EventType::Absorbed, Self::on_absorbed)
            .on(Filter::ToPlayer, EventType::Damage, Self::on_tick)
            .on(Filter::ByPlayer, EventType::Cast, Self::on_cast)
    }

    fn on_initialized(&mut self, scope: &Scope<'_>) -> Result<bool> {
        let ranks = scope.selected().trait_ranks(spells::STAGGERING_STRIKES.id);
        self.per_cast = specs::trait_total(spells::STAGGERING_STRIKES.id, ranks);
        tracing::debug!("Staggering Strikes removes {} per Blackout Strike", self.per_cast);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        event::Provenance,
        module::Registration,
        testing::{analyze, by_player, on_self, player, to_player, with_trait},
    };

    const BREWMASTER: u32 = 268;

    #[test]
    fn pool_follows_absorbs_ticks_and_purifies() {
        let info = with_trait(player(BREWMASTER), spells::STAGGERING_STRIKES.id, &[300]);
        let events = vec![
            on_self(0, EventType::Absorbed, spells::STAGGER.id).with_amount(5000),
            to_player(500, EventType::Damage, spells::STAGGER_TAKEN.id).with_amount(400).with_absorbed(100),
            by_player(1000, EventType::Cast, spells::BLACKOUT_STRIKE.id),
            // more than is left in the pool
            to_player(1500, EventType::Damage, spells::STAGGER_TAKEN.id).with_amount(9000),
        ];
        let analysis = analyze(info, events, vec![Registration::of::<StaggerFabricator>()]);
        let fab = analysis.module::<StaggerFabricator>().unwrap();

        assert_eq!(fab.per_cast(), 1288);
        assert_eq!(fab.total_added(), 5000);
        // 500 by the first tick, 1288 by the cast, the remaining 3212 by the last tick
        assert_eq!(fab.total_removed(), 5000);
        assert_eq!(fab.pool(), 0);
    }

    #[test]
    fn fabricated_events_carry_provenance_and_trigger() {
        let info = with_trait(player(BREWMASTER), spells::STAGGERING_STRIKES.id, &[300]);
        // an empty run supplies the context
        let analysis = analyze(info, vec![], vec![]);
        let mut scope = Scope::new(analysis.context(), &[], &[], StaggerFabricator::KIND);

        let mut fab = StaggerFabricator::default();
        fab.on_initialized(&scope).unwrap();
        fab.on_absorbed(&on_self(0, EventType::Absorbed, spells::STAGGER.id).with_amount(1000), &mut scope)
            .unwrap();
        fab.on_cast(&by_player(1000, EventType::Cast, spells::BLACKOUT_STRIKE.id), &mut scope).unwrap();
        let (fabricated, abort) = scope.into_outcome();

        assert!(abort.is_none());
        assert_eq!(fabricated.len(), 2);
        assert_eq!(fabricated[0].event_type, EventType::AddStagger);
        assert_eq!(fabricated[0].amount, Some(1000));
        assert_eq!(fabricated[0].direction, Direction::SelfTargeted);
        assert_eq!(fabricated[1].event_type, EventType::RemoveStagger);
        assert_eq!(fabricated[1].amount, Some(1000));
        assert_eq!(fabricated[1].overflow, Some(288));
        assert_eq!(fabricated[1].trigger, Some(spells::BLACKOUT_STRIKE.id));
        assert!(fabricated
            .iter()
            .all(|e| e.provenance == Provenance::Fabricated(ModuleKind::StaggerFabricator)));
    }

    #[test]
    fn no_trait_means_no_purify() {
        let events = vec![
            on_self(0, EventType::Absorbed, spells::STAGGER.id).with_amount(1000),
            by_player(1000, EventType::Cast, spells::BLACKOUT_STRIKE.id),
        ];
        let analysis = analyze(player(BREWMASTER), events, vec![Registration::of::<StaggerFabricator>()]);
        let fab = analysis.module::<StaggerFabricator>().unwrap();
        assert_eq!(fab.per_cast(), 0);
        assert_eq!(fab.pool(), 1000);
    }
}
