/// Potion usage: one potion before the pull, a second one during combat.
///
/// Healers that dropped low on mana get a stronger second-potion suggestion.
/// "Low" means a cast left less mana than a common mana potion restores
/// (`second_potion_mana_threshold` in the config).
use crate::{
    event::{Event, EventType},
    module::{Analyzer, Filter, HandlerTable, ModuleKind, Scope},
    specs,
    spells::{self, RESOURCE_MANA},
    suggestion::{Importance, Threshold, When},
};
use anyhow::Result;

const PRE_POTIONS: [u32; 7] = [
    spells::BATTLE_POTION_OF_INTELLECT.id,
    spells::BATTLE_POTION_OF_STRENGTH.id,
    spells::BATTLE_POTION_OF_AGILITY.id,
    spells::BATTLE_POTION_OF_STAMINA.id,
    spells::POTION_OF_RISING_DEATH.id,
    spells::POTION_OF_BURSTING_BLOOD.id,
    spells::STEELSKIN_POTION.id,
];

const SECOND_POTIONS: [u32; 10] = [
    spells::BATTLE_POTION_OF_INTELLECT.id,
    spells::BATTLE_POTION_OF_STRENGTH.id,
    spells::BATTLE_POTION_OF_AGILITY.id,
    spells::BATTLE_POTION_OF_STAMINA.id,
    spells::POTION_OF_RISING_DEATH.id,
    spells::POTION_OF_BURSTING_BLOOD.id,
    spells::STEELSKIN_POTION.id,
    spells::COASTAL_MANA_POTION.id,
    spells::COASTAL_REJUVENATION_POTION.id,
    spells::POTION_OF_REPLENISHMENT.id,
];

#[derive(Debug, Default)]
pub struct PrePotion {
    pub used_pre_potion:    bool,
    pub used_second_potion: bool,
    pub needed_mana:        bool,
}

impl PrePotion {
    fn on_buff(&mut self, event: &Event, _scope: &mut Scope<'_>) -> Result<()> {
        if event.prepull && PRE_POTIONS.contains(&event.ability.id) {
            self.used_pre_potion = true;
        }
        Ok(())
    }

    fn on_cast(&mut self, event: &Event, scope: &mut Scope<'_>) -> Result<()> {
        if SECOND_POTIONS.contains(&event.ability.id) {
            self.used_second_potion = true;
        }
        // only the primary resource of the cast counts
        if let Some(resource) = event.class_resources.first() {
            let left = resource.amount.saturating_sub(resource.cost);
            if resource.resource_type == RESOURCE_MANA
                && left < scope.config().second_potion_mana_threshold
            {
                self.needed_mana = true;
            }
        }
        Ok(())
    }
}

impl Analyzer for PrePotion {
    const KIND: ModuleKind = ModuleKind::PrePotion;

    fn handlers() -> HandlerTable<Self> {
        HandlerTable::new()
            .on(Filter::ToPlayer, EventType::ApplyBuff, Self::on_buff)
            .on(Filter::ByPlayer, EventType::Cast, Self::on_cast)
    }

    fn on_finished(&mut self, scope: &Scope<'_>) -> Result<()> {
        // potions already running at the pull only show up in the roster snapshot
        let pull = scope.fight().start_time;
        let snapshot = PRE_POTIONS.iter().any(|&id| {
            scope
                .selected()
                .intervals(id)
                .any(|b| b.source_id.is_none() && b.start == pull)
        });
        self.used_pre_potion |= snapshot;

        tracing::debug!(
            "pre potion: {}, second potion: {}, needed mana: {}",
            self.used_pre_potion, self.used_second_potion, self.needed_mana
        );
        Ok(())
    }

    fn suggestions(&self, when: &mut When, scope: &Scope<'_>) {
        when.threshold(Threshold::boolean(self.used_pre_potion, false))
            .add_suggestion(|suggest, _, _| {
                suggest
                    .text(
                        "You did not use a potion before combat. Using a potion before combat \
                         allows you the benefit of two potions in a single fight. A potion such as \
                         Battle Potion of Intellect can be very effective (even for healers), \
                         especially during shorter encounters.",
                    )
                    .icon(spells::BATTLE_POTION_OF_INTELLECT.icon)
                    .static_importance(Importance::Minor)
            });

        let healer = scope.selected().spec_id.is_some_and(specs::is_healer);
        let (text, importance) = if !healer {
            (
                "You forgot to use a potion during combat. By using a potion during combat such \
                 as Battle Potion of Intellect you can increase your DPS (especially if lined up \
                 with damage cooldowns) and/or survivability during a fight.",
                Importance::Minor,
            )
        } else if !self.needed_mana {
            (
                "You forgot to use a potion during combat. Using a potion during combat allows \
                 you the benefit of either increasing output through Battle Potion of Intellect \
                 or allowing you to gain mana using Coastal Mana Potion, for example.",
                Importance::Minor,
            )
        } else {
            (
                "You ran out of mana (OOM) during the encounter without using a second potion. \
                 Use a second potion such as Coastal Mana Potion or if the fight allows Potion \
                 of Replenishment to regenerate some mana.",
                Importance::Regular,
            )
        };
        when.threshold(Threshold::boolean(self.used_second_potion, false))
            .add_suggestion(|suggest, _, _| {
                suggest
                    .text(text)
                    .icon(spells::LEYTORRENT_POTION.icon)
                    .static_importance(importance)
            });
    }
}
