/// Total damage done by the selected player.
///
/// Other analyzers read it to express their own contribution as a share of
/// the player's damage.
use crate::{
    event::{Event, EventType},
    module::{Analyzer, Filter, HandlerTable, ModuleKind, Scope},
    statistic::{format_number, format_thousands, Category, Statistic},
};
use anyhow::Result;

#[derive(Debug, Default)]
pub struct DamageDone {
    total: u64,
    hits:  u32,
}

impl DamageDone {
    pub fn total(&self) -> u64 {
        self.total
    }

    /// `amount` as a fraction of the player's total damage; 0 without damage.
    pub fn percentage_of_total(&self, amount: u64) -> f64 {
        match self.total {
            0 => 0.0,
            total => amount as f64 / total as f64,
        }
    }

    fn on_damage(&mut self, event: &Event, _scope: &mut Scope<'_>) -> Result<()> {
        self.total += event.raw_amount();
        self.hits  += 1;
        Ok(())
    }
}

impl Analyzer for DamageDone {
    const KIND: ModuleKind = ModuleKind::DamageDone;

    fn handlers() -> HandlerTable<Self> {
        HandlerTable::new().on(Filter::ByPlayer, EventType::Damage, Self::on_damage)
    }

    fn statistic(&self, scope: &Scope<'_>) -> Option<Statistic> {
        let seconds = scope.fight().duration() / 1000;
        let dps = if seconds == 0 { 0 } else { self.total / seconds };
        Some(
            Statistic::new(Category::General, "Damage done", format_number(self.total))
                .tooltip(format!("{} DPS over {} hits", format_thousands(dps), self.hits))
                .position(0),
        )
    }
}
