/// Empowered Life Tap: buff uptime and the damage the buff added.
use crate::{
    event::{Event, EventType},
    module::{dependency, Analyzer, Dependency, Filter, HandlerTable, ModuleKind, Scope},
    modules::damage_done::DamageDone,
    spells,
    statistic::{format_number, format_percentage, Category, Statistic},
    suggestion::{Actual, When},
};
use anyhow::Result;

const DAMAGE_BONUS: f64 = 0.1;

/// Share of a hit's raw damage caused by a `bonus` multiplier.
pub fn damage_bonus(event: &Event, bonus: f64) -> f64 {
    event.raw_amount() as f64 / (1.0 + bonus) * bonus
}

#[derive(Debug, Default)]
pub struct EmpoweredLifeTap {
    bonus_damage: f64,
    uptime:       f64,
}

impl EmpoweredLifeTap {
    pub fn bonus_damage(&self) -> u64 {
        self.bonus_damage.round() as u64
    }

    pub fn uptime(&self) -> f64 {
        self.uptime
    }

    fn on_damage(&mut self, event: &Event, scope: &mut Scope<'_>) -> Result<()> {
        if scope.selected().has_buff(spells::EMPOWERED_LIFE_TAP_BUFF.id, event.timestamp) {
            self.bonus_damage += damage_bonus(event, DAMAGE_BONUS);
        }
        Ok(())
    }
}

impl Analyzer for EmpoweredLifeTap {
    const KIND: ModuleKind = ModuleKind::EmpoweredLifeTap;
    const DEPENDENCIES: &'static [Dependency] =
        &[dependency("damage_done", ModuleKind::DamageDone)];

    fn handlers() -> HandlerTable<Self> {
        HandlerTable::new().on(Filter::ByPlayer, EventType::Damage, Self::on_damage)
    }

    fn on_initialized(&mut self, scope: &Scope<'_>) -> Result<bool> {
        Ok(scope.selected().has_talent(spells::EMPOWERED_LIFE_TAP_TALENT.id))
    }

    fn on_finished(&mut self, scope: &Scope<'_>) -> Result<()> {
        let uptime = scope.buff_uptime(spells::EMPOWERED_LIFE_TAP_BUFF.id);
        self.uptime = scope.fight().fraction(uptime);
        Ok(())
    }

    fn suggestions(&self, when: &mut When, _scope: &Scope<'_>) {
        when.value(Actual::Percentage(self.uptime))
            .is_less_than(0.9)
            .add_suggestion(|suggest, actual, recommended| {
                suggest
                    .text(
                        "Your uptime on the Empowered Life Tap buff could be improved. You should \
                         cast Life Tap more often.",
                    )
                    .icon(spells::EMPOWERED_LIFE_TAP_TALENT.icon)
                    .actual(format!("{}% Empowered Life Tap uptime", format_percentage(actual)))
                    .recommended(format!(">{}% is recommended", format_percentage(recommended)))
                    .average(recommended - 0.05)
                    .major(recommended - 0.15)
            });
    }

    fn statistic(&self, scope: &Scope<'_>) -> Option<Statistic> {
        let share = scope
            .dependency::<DamageDone>()
            .map(|dd| dd.percentage_of_total(self.bonus_damage()))
            .unwrap_or(0.0);
        Some(
            Statistic::new(
                Category::Talents,
                "Empowered Life Tap uptime",
                format!("{} %", format_percentage(self.uptime)),
            )
            .icon(spells::EMPOWERED_LIFE_TAP_TALENT.id)
            .tooltip(format!(
                "Your Empowered Life Tap talent contributed {} total damage ({} %)",
                format_number(self.bonus_damage()),
                format_percentage(share)
            ))
            .position(2),
        )
    }
}
