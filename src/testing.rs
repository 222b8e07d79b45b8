/// Test-only builders for events, rosters and runs.
use crate::{
    combatant::CombatantInfo,
    config::AnalyzerConfig,
    context::Fight,
    engine::{Analysis, Engine},
    event::{Ability, Event, EventType},
    input::AnalysisInput,
    module::Registration,
};
use std::collections::HashMap;

pub const PLAYER: u64 = 1;
pub const ENEMY:  u64 = 2;
pub const ALLY:   u64 = 3;

/// Brewmaster; any spec in the table works for engine tests.
pub const DEFAULT_SPEC: u32 = 268;

pub const FIGHT_START: u64 = 0;
pub const FIGHT_END:   u64 = 10_000;

pub fn player(spec_id: u32) -> CombatantInfo {
    CombatantInfo {
        id:      PLAYER,
        name:    "Player".to_owned(),
        spec_id,
        talents: Vec::new(),
        traits:  HashMap::new(),
        buffs:   Vec::new(),
    }
}

pub fn with_talent(mut info: CombatantInfo, talent: u32) -> CombatantInfo {
    info.talents.push(talent);
    info
}

pub fn with_trait(mut info: CombatantInfo, trait_id: u32, ranks: &[u32]) -> CombatantInfo {
    info.traits.insert(trait_id, ranks.to_vec());
    info
}

pub fn event(ts: u64, event_type: EventType, source: u64, target: u64, spell: u32) -> Event {
    Event::new(ts, event_type, Some(source), Some(target), Ability::id(spell))
}

pub fn by_player(ts: u64, event_type: EventType, spell: u32) -> Event {
    event(ts, event_type, PLAYER, ENEMY, spell)
}

pub fn to_player(ts: u64, event_type: EventType, spell: u32) -> Event {
    event(ts, event_type, ENEMY, PLAYER, spell)
}

pub fn on_self(ts: u64, event_type: EventType, spell: u32) -> Event {
    event(ts, event_type, PLAYER, PLAYER, spell)
}

/// A 10s fight with the default player alone on the roster.
pub fn input(events: Vec<Event>) -> AnalysisInput {
    input_for(player(DEFAULT_SPEC), events)
}

pub fn input_for(info: CombatantInfo, events: Vec<Event>) -> AnalysisInput {
    let fight = Fight { start_time: FIGHT_START, end_time: FIGHT_END };
    AnalysisInput::new(fight, vec![info], PLAYER, events).unwrap()
}

/// Run `registrations` over a 10s fight with default config.
pub fn analyze(info: CombatantInfo, events: Vec<Event>, registrations: Vec<Registration>) -> Analysis {
    analyze_with(info, events, registrations, AnalyzerConfig::default())
}

pub fn analyze_with(
    info:          CombatantInfo,
    events:        Vec<Event>,
    registrations: Vec<Registration>,
    config:        AnalyzerConfig,
) -> Analysis {
    registrations
        .into_iter()
        .fold(Engine::new(), Engine::register)
        .run(input_for(info, events), config)
        .unwrap()
}
