/// Canonical combat event model.
///
/// Every occurrence in the log, primary or fabricated, is an `Event`.
/// Events are never mutated once they enter dispatch; the input loader sorts
/// them by timestamp (stable, so log order breaks ties) and classifies each
/// event's `direction` relative to the analyzed player.
///
/// Numeric payload fields are optional because their presence depends on the
/// event type: damage/heal carry `amount`/`absorbed`/`overheal`, energize
/// carries the resource change fields, fabricated pool events carry
/// `overflow` and the `trigger` ability that caused them.
use crate::module::ModuleKind;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Event type / direction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Cast,
    BeginCast,
    Damage,
    Heal,
    Absorbed,
    ApplyBuff,
    ApplyDebuff,
    RefreshBuff,
    RefreshDebuff,
    RemoveBuff,
    RemoveDebuff,
    Energize,
    Death,
    // Fabricated by the stagger pool model
    AddStagger,
    RemoveStagger,
    /// Anything the engine does not model; kept for ordering, never dispatched.
    #[serde(other)]
    Unknown,
}

impl EventType {
    pub fn opens_interval(self) -> bool {
        matches!(
            self,
            Self::ApplyBuff | Self::ApplyDebuff | Self::RefreshBuff | Self::RefreshDebuff
        )
    }

    pub fn closes_interval(self) -> bool {
        matches!(self, Self::RemoveBuff | Self::RemoveDebuff)
    }
}

/// Relation of an event to the analyzed player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    ByPlayer,
    ToPlayer,
    /// Source and target are both the player (self-buffs, stagger, potions).
    SelfTargeted,
    #[default]
    Other,
}

impl Direction {
    pub fn classify(source_id: Option<u64>, target_id: Option<u64>, player_id: u64) -> Self {
        match (source_id == Some(player_id), target_id == Some(player_id)) {
            (true, true)   => Self::SelfTargeted,
            (true, false)  => Self::ByPlayer,
            (false, true)  => Self::ToPlayer,
            (false, false) => Self::Other,
        }
    }

    pub fn by_player(self) -> bool {
        matches!(self, Self::ByPlayer | Self::SelfTargeted)
    }

    pub fn to_player(self) -> bool {
        matches!(self, Self::ToPlayer | Self::SelfTargeted)
    }
}

/// Where an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    #[default]
    Primary,
    Fabricated(ModuleKind),
}

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Ability {
    pub id:   u32,
    pub name: String,
    pub icon: String,
}

impl Ability {
    pub fn id(id: u32) -> Self {
        Self { id, ..Self::default() }
    }
}

/// Resource snapshot attached to casts (`classResources` in the log).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassResource {
    #[serde(rename = "type")]
    pub resource_type: u32,
    #[serde(default)]
    pub amount:        i64,
    #[serde(default)]
    pub cost:          i64,
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub timestamp:            u64,
    #[serde(rename = "type")]
    pub event_type:           EventType,
    pub direction:            Direction,
    pub source_id:            Option<u64>,
    pub target_id:            Option<u64>,
    pub ability:              Ability,
    pub amount:               Option<u64>,
    pub absorbed:             Option<u64>,
    pub overheal:             Option<u64>,
    pub overflow:             Option<u64>,
    pub class_resources:      Vec<ClassResource>,
    pub resource_change:      Option<i64>,
    pub resource_change_type: Option<u32>,
    pub waste:                Option<i64>,
    /// Ability that caused a fabricated event.
    pub trigger:              Option<u32>,
    pub prepull:              bool,
    pub provenance:           Provenance,
}

impl Event {
    pub fn new(
        timestamp:  u64,
        event_type: EventType,
        source_id:  Option<u64>,
        target_id:  Option<u64>,
        ability:    Ability,
    ) -> Self {
        Self {
            timestamp,
            event_type,
            direction: Direction::Other,
            source_id,
            target_id,
            ability,
            amount: None,
            absorbed: None,
            overheal: None,
            overflow: None,
            class_resources: Vec::new(),
            resource_change: None,
            resource_change_type: None,
            waste: None,
            trigger: None,
            prepull: false,
            provenance: Provenance::Primary,
        }
    }

    /// A synthetic event derived from `cause`. It inherits the cause's
    /// timestamp, participants and direction; the engine stamps provenance.
    pub fn derived(cause: &Event, event_type: EventType, ability: Ability) -> Self {
        Self {
            direction: cause.direction,
            ..Self::new(cause.timestamp, event_type, cause.source_id, cause.target_id, ability)
        }
    }

    pub fn with_amount(mut self, amount: u64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_absorbed(mut self, absorbed: u64) -> Self {
        self.absorbed = Some(absorbed);
        self
    }

    pub fn with_overheal(mut self, overheal: u64) -> Self {
        self.overheal = Some(overheal);
        self
    }

    pub fn with_overflow(mut self, overflow: u64) -> Self {
        self.overflow = Some(overflow);
        self
    }

    pub fn with_trigger(mut self, spell_id: u32) -> Self {
        self.trigger = Some(spell_id);
        self
    }

    pub fn with_resource(mut self, resource: ClassResource) -> Self {
        self.class_resources.push(resource);
        self
    }

    pub fn with_energize(mut self, change: i64, resource_type: u32, waste: i64) -> Self {
        self.resource_change      = Some(change);
        self.resource_change_type = Some(resource_type);
        self.waste                = Some(waste);
        self
    }

    pub fn with_prepull(mut self) -> Self {
        self.prepull = true;
        self
    }

    /// `amount + absorbed`: damage or healing before absorbs ate into it.
    pub fn raw_amount(&self) -> u64 {
        self.amount.unwrap_or(0) + self.absorbed.unwrap_or(0)
    }

    pub fn is_fabricated(&self) -> bool {
        matches!(self.provenance, Provenance::Fabricated(_))
    }

    /// First class resource of the given type attached to this event.
    pub fn class_resource(&self, resource_type: u32) -> Option<&ClassResource> {
        self.class_resources.iter().find(|r| r.resource_type == resource_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_direction() {
        assert_eq!(Direction::classify(Some(1), Some(2), 1), Direction::ByPlayer);
        assert_eq!(Direction::classify(Some(2), Some(1), 1), Direction::ToPlayer);
        assert_eq!(Direction::classify(Some(1), Some(1), 1), Direction::SelfTargeted);
        assert_eq!(Direction::classify(Some(2), None, 1), Direction::Other);
        assert!(Direction::SelfTargeted.by_player());
        assert!(Direction::SelfTargeted.to_player());
        assert!(!Direction::ToPlayer.by_player());
    }

    #[test]
    fn event_type_names_match_log_format() {
        let parsed: EventType = serde_json::from_str("\"applybuff\"").unwrap();
        assert_eq!(parsed, EventType::ApplyBuff);
        let parsed: EventType = serde_json::from_str("\"removedebuff\"").unwrap();
        assert_eq!(parsed, EventType::RemoveDebuff);
        let unknown: EventType = serde_json::from_str("\"combatantinfo\"").unwrap();
        assert_eq!(unknown, EventType::Unknown);
    }

    #[test]
    fn derived_event_inherits_cause() {
        let cause = Event::new(4000, EventType::Cast, Some(1), Some(2), Ability::id(205523));
        let derived = Event::derived(&cause, EventType::RemoveStagger, Ability::id(115069))
            .with_amount(500)
            .with_trigger(205523);
        assert_eq!(derived.timestamp, 4000);
        assert_eq!(derived.source_id, Some(1));
        assert_eq!(derived.trigger, Some(205523));
        assert_eq!(derived.provenance, Provenance::Primary);
    }

    #[test]
    fn raw_amount_adds_absorbed() {
        let e = Event::new(0, EventType::Damage, Some(1), Some(2), Ability::id(1))
            .with_amount(900)
            .with_absorbed(100);
        assert_eq!(e.raw_amount(), 1000);
    }
}
