/// Cosmic Ripple healing. Hits landing within a second of the last counted
/// ripple belong to the same ripple.
use crate::{
    event::{Event, EventType},
    module::{Analyzer, Filter, HandlerTable, ModuleKind, Scope},
    spells,
    statistic::{format_number, format_percentage, Category, Statistic},
};
use anyhow::Result;

const RIPPLE_WINDOW_MS: u64 = 1000;

#[derive(Debug, Default)]
pub struct CosmicRipple {
    pub healing:     u64,
    pub overhealing: u64,
    pub hits:        u32,
    pub ripples:     u32,
    last_ripple:     Option<u64>,
}

impl CosmicRipple {
    fn on_heal(&mut self, event: &Event, _scope: &mut Scope<'_>) -> Result<()> {
        if event.ability.id != spells::COSMIC_RIPPLE_HEAL.id {
            return Ok(());
        }
        self.healing     += event.raw_amount();
        self.overhealing += event.overheal.unwrap_or(0);
        self.hits        += 1;

        let new_ripple = self
            .last_ripple
            .map_or(true, |last| event.timestamp.saturating_sub(last) > RIPPLE_WINDOW_MS);
        if new_ripple {
            self.ripples    += 1;
            self.last_ripple = Some(event.timestamp);
        }
        Ok(())
    }
}

impl Analyzer for CosmicRipple {
    const KIND: ModuleKind = ModuleKind::CosmicRipple;

    fn handlers() -> HandlerTable<Self> {
        HandlerTable::new().on(Filter::ByPlayer, EventType::Heal, Self::on_heal)
    }

    fn on_initialized(&mut self, scope: &Scope<'_>) -> Result<bool> {
        Ok(scope.selected().has_talent(spells::COSMIC_RIPPLE_TALENT.id))
    }

    fn statistic(&self, _scope: &Scope<'_>) -> Option<Statistic> {
        let gross = self.healing + self.overhealing;
        let overheal = if gross == 0 { 0.0 } else { self.overhealing as f64 / gross as f64 };
        Some(
            Statistic::new(Category::Talents, "Cosmic Ripple", format!("{} healing", format_number(self.healing)))
                .icon(spells::COSMIC_RIPPLE_HEAL.id)
                .tooltip(format!(
                    "{} hits over {} ripples, {} % overhealing",
                    self.hits,
                    self.ripples,
                    format_percentage(overheal)
                ))
                .position(3),
        )
    }
}
