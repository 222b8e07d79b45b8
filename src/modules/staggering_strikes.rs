/// Staggering Strikes: stagger purified by Blackout Strike, and the part of
/// each purify that found an empty pool.
use crate::{
    event::{Event, EventType},
    module::{dependency, Analyzer, Dependency, Filter, HandlerTable, ModuleKind, Scope},
    modules::stagger_fabricator::StaggerFabricator,
    spells,
    statistic::{format_number, format_percentage, Category, Statistic},
};
use anyhow::Result;

#[derive(Debug, Default)]
pub struct StaggeringStrikes {
    removed:  u64,
    overflow: u64,
}

impl StaggeringStrikes {
    pub fn removed(&self) -> u64 {
        self.removed
    }

    /// Purify amount wasted because the pool held less than a full cast's worth.
    pub fn overflow(&self) -> u64 {
        self.overflow
    }

    fn on_remove(&mut self, event: &Event, _scope: &mut Scope<'_>) -> Result<()> {
        if event.trigger != Some(spells::BLACKOUT_STRIKE.id) {
            return Ok(());
        }
        self.removed  += event.amount.unwrap_or(0);
        self.overflow += event.overflow.unwrap_or(0);
        Ok(())
    }
}

impl Analyzer for StaggeringStrikes {
    const KIND: ModuleKind = ModuleKind::StaggeringStrikes;
    const DEPENDENCIES: &'static [Dependency] =
        &[dependency("stagger_fabricator", ModuleKind::StaggerFabricator)];

    fn handlers() -> HandlerTable<Self> {
        HandlerTable::new().on(Filter::ByPlayer, EventType::RemoveStagger, Self::on_remove)
    }

    fn on_initialized(&mut self, scope: &Scope<'_>) -> Result<bool> {
        Ok(scope.selected().has_trait(spells::STAGGERING_STRIKES.id))
    }

    fn statistic(&self, scope: &Scope<'_>) -> Option<Statistic> {
        let per_cast = scope.dependency::<StaggerFabricator>().map(|f| f.per_cast()).unwrap_or(0);
        let gross = self.removed + self.overflow;
        let wasted = if gross == 0 { 0.0 } else { self.overflow as f64 / gross as f64 };
        Some(
            Statistic::new(Category::Traits, "Stagger purified by Staggering Strikes", format_number(self.removed))
                .icon(spells::STAGGERING_STRIKES.id)
                .tooltip(format!(
                    "Each Blackout Strike purifies up to {}. {} ({} %) was wasted on an empty pool.",
                    format_number(per_cast),
                    format_number(self.overflow),
                    format_percentage(wasted)
                )),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::ModuleStatus,
        module::Registration,
        testing::{analyze, by_player, on_self, player, with_trait},
    };

    const BREWMASTER: u32 = 268;
    const INITIAL_STAGGER: u64 = 25_000;
    const RANKS: [u32; 3] = [300, 325, 375];
    const PER_CAST: u64 = 1288 + 1638 + 2613;

    fn run(casts: u64) -> (u64, u64) {
        let info = with_trait(player(BREWMASTER), spells::STAGGERING_STRIKES.id, &RANKS);
        let mut events =
            vec![on_self(0, EventType::Absorbed, spells::STAGGER.id).with_amount(INITIAL_STAGGER)];
        events.extend((0..casts).map(|n| by_player(1000 + n * 2000, EventType::Cast, spells::BLACKOUT_STRIKE.id)));

        let analysis = analyze(
            info,
            events,
            vec![Registration::of::<StaggerFabricator>(), Registration::of::<StaggeringStrikes>()],
        );
        let ss = analysis.module::<StaggeringStrikes>().unwrap();
        (ss.removed(), ss.overflow())
    }

    #[test]
    fn per_cast_amount_sums_every_rank() {
        let info = with_trait(player(BREWMASTER), spells::STAGGERING_STRIKES.id, &RANKS);
        let analysis = analyze(info, vec![], vec![Registration::of::<StaggerFabricator>()]);
        assert_eq!(analysis.module::<StaggerFabricator>().unwrap().per_cast(), PER_CAST);
    }

    #[test]
    fn counts_each_cast_while_the_pool_lasts() {
        assert_eq!(run(4), (4 * PER_CAST, 0));
        assert_eq!(run(4).0, 22_156);
    }

    #[test]
    fn overflow_once_the_pool_runs_dry() {
        let (removed, overflow) = run(5);
        assert_eq!(removed, INITIAL_STAGGER);
        assert_eq!(overflow, 5 * PER_CAST - INITIAL_STAGGER);
        assert_eq!(overflow, 2_695);
    }

    #[test]
    fn inactive_without_the_trait() {
        let analysis = analyze(
            player(BREWMASTER),
            vec![by_player(1000, EventType::Cast, spells::BLACKOUT_STRIKE.id)],
            vec![Registration::of::<StaggerFabricator>(), Registration::of::<StaggeringStrikes>()],
        );
        let report = analysis.report().module(ModuleKind::StaggeringStrikes).unwrap();
        assert_eq!(report.status, ModuleStatus::Inactive);
        assert!(report.statistic.is_none());
    }
}
