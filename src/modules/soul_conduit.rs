/// Soul Conduit: shards refunded by the talent, against shards spent.
use crate::{
    module::{dependency, Analyzer, Dependency, ModuleKind, Scope},
    modules::soul_shard_tracker::SoulShardTracker,
    spells,
    statistic::{format_percentage, Category, Statistic},
};
use anyhow::Result;

const FRAGMENTS_PER_SHARD: f64 = 10.0;

#[derive(Debug, Default)]
pub struct SoulConduit;

impl SoulConduit {
    /// (shards refunded, shards spent)
    pub fn shards(scope: &Scope<'_>) -> Result<(f64, f64)> {
        let tracker = scope.dependency::<SoulShardTracker>()?;
        let gained  = tracker.generated_by_spell(spells::SOUL_CONDUIT_SHARD_GEN.id) as f64;
        Ok((gained / FRAGMENTS_PER_SHARD, tracker.spent() as f64 / FRAGMENTS_PER_SHARD))
    }
}

impl Analyzer for SoulConduit {
    const KIND: ModuleKind = ModuleKind::SoulConduit;
    const DEPENDENCIES: &'static [Dependency] =
        &[dependency("soul_shard_tracker", ModuleKind::SoulShardTracker)];

    fn on_initialized(&mut self, scope: &Scope<'_>) -> Result<bool> {
        Ok(scope.selected().has_talent(spells::SOUL_CONDUIT_TALENT.id))
    }

    fn sub_statistic(&self, scope: &Scope<'_>) -> Option<Statistic> {
        let (gained, spent) = Self::shards(scope).ok()?;
        let refunded = if spent > 0.0 { gained / spent } else { 0.0 };
        Some(
            Statistic::new(Category::Talents, "Shards generated with Soul Conduit", format!("{gained}"))
                .icon(spells::SOUL_CONDUIT_TALENT.id)
                .tooltip(format!(
                    "Your Soul Conduit refunded {} % of soul shards spent",
                    format_percentage(refunded)
                )),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::ModuleStatus,
        event::{ClassResource, EventType},
        module::Registration,
        spells::RESOURCE_SOUL_SHARDS,
        testing::{analyze, by_player, on_self, player, with_talent},
    };

    const AFFLICTION: u32 = 265;

    fn registrations() -> Vec<Registration> {
        vec![Registration::of::<SoulShardTracker>(), Registration::of::<SoulConduit>()]
    }

    #[test]
    fn reports_refund_ratio() {
        let info = with_talent(player(AFFLICTION), spells::SOUL_CONDUIT_TALENT.id);
        let spend = |ts| {
            by_player(ts, EventType::Cast, 30108).with_resource(ClassResource {
                resource_type: RESOURCE_SOUL_SHARDS,
                amount:        40,
                cost:          10,
            })
        };
        let events = vec![
            spend(1000),
            spend(2000),
            spend(3000),
            spend(4000),
            on_self(4500, EventType::Energize, spells::SOUL_CONDUIT_SHARD_GEN.id)
                .with_energize(10, RESOURCE_SOUL_SHARDS, 0),
        ];
        let analysis = analyze(info, events, registrations());
        let stat = analysis
            .report()
            .module(ModuleKind::SoulConduit)
            .and_then(|m| m.sub_statistic.clone())
            .unwrap();

        assert_eq!(stat.value, "1");
        assert_eq!(stat.tooltip.as_deref(), Some("Your Soul Conduit refunded 25.00 % of soul shards spent"));
    }

    #[test]
    fn inactive_without_talent_but_tracker_still_runs() {
        let analysis = analyze(player(AFFLICTION), vec![], registrations());
        let report = analysis.report();
        assert_eq!(report.module(ModuleKind::SoulConduit).unwrap().status, ModuleStatus::Inactive);
        assert_eq!(report.module(ModuleKind::SoulShardTracker).unwrap().status, ModuleStatus::Active);
    }
}
