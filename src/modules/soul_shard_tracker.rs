/// Soul Shard bookkeeping, in fragments (10 fragments = 1 shard).
///
/// Generation comes from energize events of the shard resource type, keyed by
/// the spell that generated them; spending comes from the shard cost carried
/// by the player's casts.
use crate::{
    event::{Event, EventType},
    module::{Analyzer, Filter, HandlerTable, ModuleKind, Scope},
    spells::RESOURCE_SOUL_SHARDS,
};
use anyhow::Result;
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ShardGain {
    pub generated: u64,
    pub wasted:    u64,
}

#[derive(Debug, Default)]
pub struct SoulShardTracker {
    by_spell: BTreeMap<u32, ShardGain>,
    spent:    u64,
}

impl SoulShardTracker {
    pub fn generated(&self) -> u64 {
        self.by_spell.values().map(|g| g.generated).sum()
    }

    pub fn wasted(&self) -> u64 {
        self.by_spell.values().map(|g| g.wasted).sum()
    }

    pub fn spent(&self) -> u64 {
        self.spent
    }

    pub fn generated_by_spell(&self, spell_id: u32) -> u64 {
        self.by_spell.get(&spell_id).map_or(0, |g| g.generated)
    }

    pub fn wasted_by_spell(&self, spell_id: u32) -> u64 {
        self.by_spell.get(&spell_id).map_or(0, |g| g.wasted)
    }

    fn on_energize(&mut self, event: &Event, _scope: &mut Scope<'_>) -> Result<()> {
        if event.resource_change_type != Some(RESOURCE_SOUL_SHARDS) {
            return Ok(());
        }
        let change = event.resource_change.unwrap_or(0).max(0) as u64;
        let waste  = (event.waste.unwrap_or(0).max(0) as u64).min(change);
        let entry  = self.by_spell.entry(event.ability.id).or_default();
        entry.generated += change - waste;
        entry.wasted    += waste;
        Ok(())
    }

    fn on_cast(&mut self, event: &Event, _scope: &mut Scope<'_>) -> Result<()> {
        if let Some(resource) = event.class_resource(RESOURCE_SOUL_SHARDS) {
            self.spent += resource.cost.max(0) as u64;
        }
        Ok(())
    }
}

impl Analyzer for SoulShardTracker {
    const KIND: ModuleKind = ModuleKind::SoulShardTracker;

    fn handlers() -> HandlerTable<Self> {
        HandlerTable::new()
            .on(Filter::ToPlayer, EventType::Energize, Self::on_energize)
            .on(Filter::ByPlayer, EventType::Cast, Self::on_cast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        event::ClassResource,
        module::Registration,
        spells::{self, RESOURCE_MANA},
        testing::{analyze, by_player, on_self, player},
    };

    const DESTRUCTION: u32 = 267;
    const INCINERATE: u32 = 29722;
    const CHAOS_BOLT: u32 = 116858;

    fn shards(ts: u64, spell: u32, change: i64, waste: i64) -> Event {
        on_self(ts, EventType::Energize, spell).with_energize(change, RESOURCE_SOUL_SHARDS, waste)
    }

    fn cast(ts: u64, spell: u32, resource_type: u32, cost: i64) -> Event {
        by_player(ts, EventType::Cast, spell).with_resource(ClassResource { resource_type, amount: 50, cost })
    }

    #[test]
    fn tracks_generation_per_spell_and_spending() {
        let events = vec![
            shards(1000, INCINERATE, 2, 0),
            shards(2000, INCINERATE, 2, 1),
            shards(3000, spells::SOUL_CONDUIT_SHARD_GEN.id, 10, 0),
            on_self(3500, EventType::Energize, INCINERATE).with_energize(500, RESOURCE_MANA, 0),
            cast(4000, CHAOS_BOLT, RESOURCE_SOUL_SHARDS, 20),
            cast(5000, INCINERATE, RESOURCE_MANA, 300),
        ];
        let analysis = analyze(player(DESTRUCTION), events, vec![Registration::of::<SoulShardTracker>()]);
        let tracker = analysis.module::<SoulShardTracker>().unwrap();

        assert_eq!(tracker.generated_by_spell(INCINERATE), 3);
        assert_eq!(tracker.wasted_by_spell(INCINERATE), 1);
        assert_eq!(tracker.generated_by_spell(spells::SOUL_CONDUIT_SHARD_GEN.id), 10);
        assert_eq!(tracker.generated(), 13);
        assert_eq!(tracker.wasted(), 1);
        assert_eq!(tracker.spent(), 20);
        assert_eq!(tracker.generated_by_spell(CHAOS_BOLT), 0);
    }
}
