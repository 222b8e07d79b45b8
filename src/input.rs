/// Run input: the fight window, the roster and the event log.
///
/// The log host delivers events with its own field names (`sourceID`,
/// `targetID`, `ability.guid`, ...). They are mapped onto `Event` here, then
/// sorted by timestamp (stable, so log order breaks ties) and classified
/// relative to the selected player. Loading always completes before a run
/// starts; a malformed file never reaches the engine.
use crate::{
    combatant::CombatantInfo,
    context::Fight,
    error::AnalysisError,
    event::{Ability, ClassResource, Direction, Event, EventType},
    specs,
};
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Wire format (private)
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RawReport {
    fight:      Fight,
    combatants: Vec<CombatantInfo>,
    #[serde(default)]
    events:     Vec<RawEvent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    timestamp:            u64,
    #[serde(rename = "type")]
    event_type:           EventType,
    #[serde(rename = "sourceID")]
    source_id:            Option<u64>,
    #[serde(rename = "targetID")]
    target_id:            Option<u64>,
    ability:              Option<RawAbility>,
    amount:               Option<u64>,
    absorbed:             Option<u64>,
    overheal:             Option<u64>,
    #[serde(default)]
    class_resources:      Vec<ClassResource>,
    resource_change:      Option<i64>,
    resource_change_type: Option<u32>,
    waste:                Option<i64>,
    #[serde(default)]
    prepull:              bool,
}

#[derive(Deserialize)]
struct RawAbility {
    guid: u32,
    #[serde(default)]
    name: String,
    #[serde(default, rename = "abilityIcon")]
    icon: String,
}

impl From<RawEvent> for Event {
    fn from(raw: RawEvent) -> Self {
        let ability = raw
            .ability
            .map(|a| Ability { id: a.guid, name: a.name, icon: a.icon })
            .unwrap_or_default();
        let mut event = Event::new(raw.timestamp, raw.event_type, raw.source_id, raw.target_id, ability);
        event.amount               = raw.amount;
        event.absorbed             = raw.absorbed;
        event.overheal             = raw.overheal;
        event.class_resources      = raw.class_resources;
        event.resource_change      = raw.resource_change;
        event.resource_change_type = raw.resource_change_type;
        event.waste                = raw.waste;
        event.prepull              = raw.prepull;
        event
    }
}

// ---------------------------------------------------------------------------
// Player selection
// ---------------------------------------------------------------------------

/// The player to analyze, by roster id or (case-insensitive) name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerSelector {
    Id(u64),
    Name(String),
}

impl FromStr for PlayerSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().parse::<u64>() {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Name(s.trim().to_owned()),
        })
    }
}

impl PlayerSelector {
    pub fn resolve(&self, roster: &[CombatantInfo]) -> Result<u64, AnalysisError> {
        let found = match self {
            Self::Id(id)     => roster.iter().find(|c| c.id == *id),
            Self::Name(name) => roster.iter().find(|c| c.name.eq_ignore_ascii_case(name)),
        };
        found.map(|c| c.id).ok_or_else(|| {
            AnalysisError::CorruptInput(format!("no roster entry matches player {self:?}"))
        })
    }
}

// ---------------------------------------------------------------------------
// AnalysisInput
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AnalysisInput {
    pub fight:     Fight,
    pub roster:    Vec<CombatantInfo>,
    pub player_id: u64,
    /// Sorted by timestamp, directions classified for `player_id`.
    pub events:    Vec<Event>,
}

impl AnalysisInput {
    pub fn new(
        fight:      Fight,
        roster:     Vec<CombatantInfo>,
        player_id:  u64,
        mut events: Vec<Event>,
    ) -> Result<Self, AnalysisError> {
        let fight = Fight::new(fight.start_time, fight.end_time)?;
        if let Some(bad) = roster.iter().find(|c| specs::by_id(c.spec_id).is_none()) {
            return Err(AnalysisError::CorruptInput(format!(
                "combatant {} ({}) has unknown spec {}",
                bad.id, bad.name, bad.spec_id
            )));
        }
        if !roster.iter().any(|c| c.id == player_id) {
            return Err(AnalysisError::CorruptInput(format!(
                "selected player {player_id} is not in the roster"
            )));
        }

        events.sort_by_key(|e| e.timestamp);
        for event in &mut events {
            event.direction = Direction::classify(event.source_id, event.target_id, player_id);
        }
        Ok(Self { fight, roster, player_id, events })
    }
}

pub fn parse_report(json: &str, selector: &PlayerSelector) -> Result<AnalysisInput, AnalysisError> {
    let raw: RawReport = serde_json::from_str(json)
        .map_err(|e| AnalysisError::CorruptInput(format!("report is not valid JSON: {e}")))?;
    let player_id = selector.resolve(&raw.combatants)?;
    let events = raw.events.into_iter().map(Event::from).collect();
    AnalysisInput::new(raw.fight, raw.combatants, player_id, events)
}

/// Read and parse a report file.
pub async fn load(path: &Path, selector: &PlayerSelector) -> anyhow::Result<AnalysisInput> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let input = parse_report(&json, selector)?;
    tracing::info!(
        "Loaded {} events and {} combatants from {}",
        input.events.len(),
        input.roster.len(),
        path.display()
    );
    Ok(input)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;
    use crate::spells;
    use tempfile::tempdir;

    const REPORT: &str = r#"{
        "fight": { "startTime": 1000, "endTime": 61000 },
        "combatants": [
            { "id": 7, "name": "Brewbro", "specId": 268,
              "traits": { "273464": [340, 340] } },
            { "id": 8, "name": "Healz", "specId": 257, "talents": [238136] }
        ],
        "events": [
            { "timestamp": 3000, "type": "cast", "sourceID": 7, "targetID": 9,
              "ability": { "guid": 205523, "name": "Blackout Strike" } },
            { "timestamp": 2000, "type": "absorbed", "sourceID": 9, "targetID": 7,
              "amount": 4000, "ability": { "guid": 115069 } },
            { "timestamp": 2000, "type": "heal", "sourceID": 8, "targetID": 7,
              "amount": 100, "overheal": 20, "ability": { "guid": 243241 } },
            { "timestamp": 2500, "type": "combatantinfo", "sourceID": 7 },
            { "timestamp": 2600, "type": "cast", "sourceID": 8, "targetID": 8,
              "classResources": [{ "type": 0, "amount": 50000, "cost": 1000 }],
              "ability": { "guid": 2061 } }
        ]
    }"#;

    #[test]
    fn parses_log_host_format() {
        let input = parse_report(REPORT, &PlayerSelector::Id(7)).unwrap();
        assert_eq!(input.fight, Fight { start_time: 1000, end_time: 61000 });
        assert_eq!(input.roster[0].traits[&spells::STAGGERING_STRIKES.id], vec![340, 340]);

        let ts: Vec<u64> = input.events.iter().map(|e| e.timestamp).collect();
        assert_eq!(ts, vec![2000, 2000, 2500, 2600, 3000]);

        // ties keep log order
        assert_eq!(input.events[0].event_type, EventType::Absorbed);
        assert_eq!(input.events[0].ability.id, spells::STAGGER.id);
        assert_eq!(input.events[0].direction, Direction::ToPlayer);
        assert_eq!(input.events[1].event_type, EventType::Heal);
        assert_eq!(input.events[1].overheal, Some(20));

        assert_eq!(input.events[2].event_type, EventType::Unknown);
        assert_eq!(input.events[3].direction, Direction::Other);
        assert_eq!(input.events[3].class_resources[0].cost, 1000);
        assert_eq!(input.events[4].direction, Direction::ByPlayer);
        assert_eq!(input.events[4].ability.name, "Blackout Strike");
    }

    #[test]
    fn selects_player_by_name() {
        let selector: PlayerSelector = "healz".parse().unwrap();
        let input = parse_report(REPORT, &selector).unwrap();
        assert_eq!(input.player_id, 8);
        assert_eq!(input.events[3].direction, Direction::SelfTargeted);

        let err = parse_report(REPORT, &PlayerSelector::Name("nobody".into())).unwrap_err();
        assert!(matches!(err, AnalysisError::CorruptInput(_)));
    }

    #[test]
    fn rejects_unknown_spec() {
        let json = REPORT.replace("\"specId\": 257", "\"specId\": 9999");
        let err = parse_report(&json, &PlayerSelector::Id(7)).unwrap_err();
        assert!(matches!(err, AnalysisError::CorruptInput(m) if m.contains("9999")));
    }

    #[test]
    fn rejects_inverted_fight_and_bad_json() {
        let json = REPORT.replace("\"endTime\": 61000", "\"endTime\": 500");
        assert!(parse_report(&json, &PlayerSelector::Id(7)).is_err());
        assert!(parse_report("{ nope", &PlayerSelector::Id(7)).is_err());
    }

    #[tokio::test]
    async fn loads_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        std::fs::write(&path, REPORT).unwrap();

        let input = load(&path, &PlayerSelector::Id(7)).await.unwrap();
        assert_eq!(input.events.len(), 5);
        assert!(load(&dir.path().join("missing.json"), &PlayerSelector::Id(7)).await.is_err());
    }
}
