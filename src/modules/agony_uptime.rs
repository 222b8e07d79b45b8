/// Agony uptime across enemies, as a share of the fight.
use crate::{
    module::{Analyzer, ModuleKind, Scope},
    spells,
    statistic::{format_percentage, Category, Statistic},
    suggestion::{Actual, Bands, Threshold, When},
};
use anyhow::Result;

#[derive(Debug, Default)]
pub struct AgonyUptime {
    uptime: f64,
}

impl AgonyUptime {
    pub fn uptime(&self) -> f64 {
        self.uptime
    }

    pub fn threshold(&self) -> Threshold {
        Threshold::less_than(Actual::Percentage(self.uptime), Bands::new(0.95, 0.90, 0.80))
    }
}

impl Analyzer for AgonyUptime {
    const KIND: ModuleKind = ModuleKind::AgonyUptime;

    fn on_finished(&mut self, scope: &Scope<'_>) -> Result<()> {
        let fight = scope.fight();
        let covered = scope.combatants().enemy_debuff_uptime(
            spells::AGONY.id,
            fight.start_time,
            fight.end_time,
            Some(scope.player_id()),
        );
        self.uptime = fight.fraction(covered);
        Ok(())
    }

    fn suggestions(&self, when: &mut When, scope: &Scope<'_>) {
        let text = if scope.selected().has_talent(spells::WRITHE_IN_AGONY_TALENT.id) {
            "Your Agony uptime can be improved as it is your main source of Soul Shards. Try to \
             pay more attention to your Agony on the boss, especially since you're using the \
             Writhe in Agony talent."
        } else {
            "Your Agony uptime can be improved as it is your main source of Soul Shards. Try to \
             pay more attention to your Agony on the boss, perhaps use some debuff tracker."
        };
        when.threshold(self.threshold())
            .add_suggestion(|suggest, actual, recommended| {
                suggest
                    .text(text)
                    .icon(spells::AGONY.icon)
                    .actual(format!("{}% Agony uptime", format_percentage(actual)))
                    .recommended(format!("> {}% is recommended", format_percentage(recommended)))
            });
    }

    fn sub_statistic(&self, _scope: &Scope<'_>) -> Option<Statistic> {
        Some(
            Statistic::new(Category::General, "Agony uptime", format!("{} %", format_percentage(self.uptime)))
                .icon(spells::AGONY.id),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        event::{Event, EventType},
        module::Registration,
        suggestion::Importance,
        testing::{analyze, event, player, with_talent, ALLY, ENEMY, PLAYER},
    };

    const AFFLICTION: u32 = 265;
    const SECOND_ENEMY: u64 = 4;

    fn agony(ts: u64, event_type: EventType, target: u64) -> Event {
        event(ts, event_type, PLAYER, target, spells::AGONY.id)
    }

    #[test]
    fn overlapping_targets_count_once() {
        // enemy 2: 0..6000, enemy 4: 4000..9000 -> 9000 of 10000
        let events = vec![
            agony(0, EventType::ApplyDebuff, ENEMY),
            agony(4000, EventType::ApplyDebuff, SECOND_ENEMY),
            agony(6000, EventType::RemoveDebuff, ENEMY),
            agony(9000, EventType::RemoveDebuff, SECOND_ENEMY),
        ];
        let analysis = analyze(player(AFFLICTION), events, vec![Registration::of::<AgonyUptime>()]);
        let module = analysis.module::<AgonyUptime>().unwrap();
        assert!((module.uptime() - 0.9).abs() < 1e-9);

        let fired: Vec<_> = analysis.report().suggestions().cloned().collect();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].importance, Importance::Minor);
        assert_eq!(fired[0].actual.as_deref(), Some("90.00% Agony uptime"));
        assert_eq!(fired[0].recommended.as_deref(), Some("> 95.00% is recommended"));
        assert!(fired[0].text.contains("debuff tracker"));
    }

    #[test]
    fn ignores_agony_from_other_players() {
        let events = vec![
            event(0, EventType::ApplyDebuff, ALLY, SECOND_ENEMY, spells::AGONY.id),
            agony(5000, EventType::ApplyDebuff, ENEMY),
        ];
        let analysis = analyze(player(AFFLICTION), events, vec![Registration::of::<AgonyUptime>()]);
        // open until fight end: 5000 of 10000
        assert!((analysis.module::<AgonyUptime>().unwrap().uptime() - 0.5).abs() < 1e-9);

        let fired: Vec<_> = analysis.report().suggestions().cloned().collect();
        assert_eq!(fired[0].importance, Importance::Major);
    }

    #[test]
    fn another_warlocks_agony_on_the_same_target_does_not_hide_ours() {
        let events = vec![
            event(0, EventType::ApplyDebuff, ALLY, ENEMY, spells::AGONY.id),
            agony(1000, EventType::ApplyDebuff, ENEMY),
            event(2000, EventType::RemoveDebuff, ALLY, ENEMY, spells::AGONY.id),
        ];
        let analysis = analyze(player(AFFLICTION), events, vec![Registration::of::<AgonyUptime>()]);
        assert!((analysis.module::<AgonyUptime>().unwrap().uptime() - 0.9).abs() < 1e-9);

        let fired: Vec<_> = analysis.report().suggestions().cloned().collect();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].importance, Importance::Minor);
    }

    #[test]
    fn full_uptime_is_silent_and_text_follows_talent() {
        let info = with_talent(player(AFFLICTION), spells::WRITHE_IN_AGONY_TALENT.id);
        let full = vec![agony(0, EventType::ApplyDebuff, ENEMY)];
        let analysis = analyze(info.clone(), full, vec![Registration::of::<AgonyUptime>()]);
        assert_eq!(analysis.report().suggestions().count(), 0);

        let partial = vec![agony(1500, EventType::ApplyDebuff, ENEMY)];
        let analysis = analyze(info, partial, vec![Registration::of::<AgonyUptime>()]);
        let fired: Vec<_> = analysis.report().suggestions().cloned().collect();
        assert_eq!(fired[0].importance, Importance::Regular);
        assert!(fired[0].text.contains("Writhe in Agony"));
    }
}
