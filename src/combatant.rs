/// Combatant registry: roster metadata plus buff/debuff interval tracking.
///
/// The roster (players with a spec, talents and trait ranks) comes from the
/// input. Anything else an event touches (enemies, pets) is registered lazily
/// so debuffs placed on it are tracked too.
///
/// Interval invariants, per combatant, spell and source:
///   - intervals never overlap and are appended in time order
///   - at most one interval is open
///   - an apply or refresh while open extends the open interval (no double count)
///   - open intervals are closed by the removal from the same source or at
///     fight end; snapshot buffs from the roster carry no source and close on
///     the first removal of the spell
///
/// The same spell from two sources may overlap; uptime queries count the
/// union of the spans.
use crate::{
    error::AnalysisError,
    event::Event,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ---------------------------------------------------------------------------
// Roster input
// ---------------------------------------------------------------------------

/// One roster entry as supplied by the log host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatantInfo {
    pub id:      u64,
    pub name:    String,
    pub spec_id: u32,
    #[serde(default)]
    pub talents: Vec<u32>,
    /// Trait spell id -> item level of every unlocked rank.
    #[serde(default)]
    pub traits:  HashMap<u32, Vec<u32>>,
    /// Buffs already active when the pull started.
    #[serde(default)]
    pub buffs:   Vec<u32>,
}

// ---------------------------------------------------------------------------
// Buff intervals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuffInterval {
    pub spell_id:  u32,
    pub start:     u64,
    /// `None` while the buff is still up.
    pub end:       Option<u64>,
    pub source_id: Option<u64>,
}

impl BuffInterval {
    /// Covered time within `[from, to]`, treating an open interval as ending at `to`.
    pub fn overlap(&self, from: u64, to: u64) -> u64 {
        let start = self.start.max(from);
        let end   = self.end.unwrap_or(to).min(to);
        end.saturating_sub(start)
    }

    pub fn contains(&self, timestamp: u64) -> bool {
        self.start <= timestamp && self.end.map_or(true, |end| timestamp <= end)
    }
}

// ---------------------------------------------------------------------------
// Combatant
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Combatant {
    pub id:      u64,
    pub name:    String,
    /// `None` for combatants that were not on the roster.
    pub spec_id: Option<u32>,
    talents:     HashSet<u32>,
    traits:      HashMap<u32, Vec<u32>>,
    buffs:       Vec<BuffInterval>,
}

impl Combatant {
    pub fn from_info(info: &CombatantInfo, fight_start: u64) -> Self {
        let mut combatant = Self {
            id:      info.id,
            name:    info.name.clone(),
            spec_id: Some(info.spec_id),
            talents: info.talents.iter().copied().collect(),
            traits:  info.traits.clone(),
            buffs:   Vec::new(),
        };
        for &spell_id in &info.buffs {
            combatant.apply_buff(spell_id, fight_start, None);
        }
        combatant
    }

    pub fn unlisted(id: u64) -> Self {
        Self {
            id,
            name:    String::new(),
            spec_id: None,
            talents: HashSet::new(),
            traits:  HashMap::new(),
            buffs:   Vec::new(),
        }
    }

    pub fn in_roster(&self) -> bool {
        self.spec_id.is_some()
    }

    pub fn has_talent(&self, spell_id: u32) -> bool {
        self.talents.contains(&spell_id)
    }

    pub fn has_trait(&self, spell_id: u32) -> bool {
        !self.trait_ranks(spell_id).is_empty()
    }

    /// Item levels of every unlocked rank of a trait.
    pub fn trait_ranks(&self, spell_id: u32) -> &[u32] {
        self.traits.get(&spell_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All intervals of one spell, oldest first.
    pub fn intervals(&self, spell_id: u32) -> impl Iterator<Item = &BuffInterval> + '_ {
        self.buffs.iter().filter(move |b| b.spell_id == spell_id)
    }

    pub fn has_buff(&self, spell_id: u32, timestamp: u64) -> bool {
        self.intervals(spell_id).any(|b| b.contains(timestamp))
    }

    /// Time within `[from, to]` during which `spell_id` was up, from any source.
    pub fn buff_uptime(&self, spell_id: u32, from: u64, to: u64) -> u64 {
        covered(self.intervals(spell_id), from, to)
    }

    fn open_index(&self, spell_id: u32, source_id: Option<u64>) -> Option<usize> {
        self.buffs
            .iter()
            .rposition(|b| b.spell_id == spell_id && b.source_id == source_id && b.end.is_none())
    }

    pub(crate) fn apply_buff(&mut self, spell_id: u32, timestamp: u64, source_id: Option<u64>) {
        if self.open_index(spell_id, source_id).is_some() {
            return; // refresh of a running buff
        }
        self.buffs.push(BuffInterval { spell_id, start: timestamp, end: None, source_id });
    }

    /// Closes the interval opened by `source_id`, falling back to a snapshot
    /// interval (no source). A removal without a source closes the most
    /// recent open interval of the spell.
    pub(crate) fn remove_buff(&mut self, spell_id: u32, timestamp: u64, source_id: Option<u64>) {
        let open = match source_id {
            Some(_) => self
                .open_index(spell_id, source_id)
                .or_else(|| self.open_index(spell_id, None)),
            None => self.buffs.iter().rposition(|b| b.spell_id == spell_id && b.end.is_none()),
        };
        match open {
            Some(idx) => {
                let interval = &mut self.buffs[idx];
                interval.end = Some(timestamp.max(interval.start));
            }
            None => tracing::trace!(
                "removal of {} on {} without an open interval, ignored",
                spell_id, self.id
            ),
        }
    }

    pub(crate) fn close_open(&mut self, timestamp: u64) {
        for interval in self.buffs.iter_mut().filter(|b| b.end.is_none()) {
            interval.end = Some(timestamp.max(interval.start));
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Combatants {
    entries:  Vec<Combatant>,
    by_id:    HashMap<u64, usize>,
    selected: usize,
}

impl Combatants {
    pub fn from_roster(
        roster:      &[CombatantInfo],
        player_id:   u64,
        fight_start: u64,
    ) -> Result<Self, AnalysisError> {
        let mut entries = Vec::with_capacity(roster.len());
        let mut by_id   = HashMap::with_capacity(roster.len());
        for info in roster {
            if by_id.insert(info.id, entries.len()).is_some() {
                return Err(AnalysisError::CorruptInput(format!(
                    "combatant {} appears twice in the roster",
                    info.id
                )));
            }
            entries.push(Combatant::from_info(info, fight_start));
        }
        let selected = *by_id.get(&player_id).ok_or_else(|| {
            AnalysisError::CorruptInput(format!("selected player {player_id} is not in the roster"))
        })?;
        Ok(Self { entries, by_id, selected })
    }

    pub fn selected(&self) -> &Combatant {
        &self.entries[self.selected]
    }

    pub fn get(&self, id: u64) -> Option<&Combatant> {
        self.by_id.get(&id).map(|&idx| &self.entries[idx])
    }

    /// Roster members, in roster order.
    pub fn players(&self) -> impl Iterator<Item = &Combatant> + '_ {
        self.entries.iter().filter(|c| c.in_roster())
    }

    /// Everything referenced by events but not on the roster.
    pub fn enemies(&self) -> impl Iterator<Item = &Combatant> + '_ {
        self.entries.iter().filter(|c| !c.in_roster())
    }

    fn entry(&mut self, id: u64) -> &mut Combatant {
        let idx = match self.by_id.get(&id) {
            Some(&idx) => idx,
            None => {
                self.entries.push(Combatant::unlisted(id));
                self.by_id.insert(id, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx]
    }

    /// Apply a primary event's buff bookkeeping. Called by the engine before
    /// any module handler sees the event.
    pub(crate) fn track(&mut self, event: &Event) {
        let Some(target_id) = event.target_id else {
            return;
        };
        if event.event_type.opens_interval() {
            self.entry(target_id)
                .apply_buff(event.ability.id, event.timestamp, event.source_id);
        } else if event.event_type.closes_interval() {
            self.entry(target_id)
                .remove_buff(event.ability.id, event.timestamp, event.source_id);
        }
    }

    pub(crate) fn close_all(&mut self, timestamp: u64) {
        for combatant in &mut self.entries {
            combatant.close_open(timestamp);
        }
    }

    /// Time within `[from, to]` during which at least one enemy carried the
    /// debuff. Overlapping debuffs on different enemies count once.
    /// `applied_by` restricts to intervals started by one source.
    pub fn enemy_debuff_uptime(
        &self,
        spell_id:   u32,
        from:       u64,
        to:         u64,
        applied_by: Option<u64>,
    ) -> u64 {
        let intervals = self
            .enemies()
            .flat_map(|c| c.intervals(spell_id))
            .filter(|b| applied_by.map_or(true, |src| b.source_id == Some(src)));
        covered(intervals, from, to)
    }
}

/// Length of the union of `intervals` clipped to `[from, to]`.
fn covered<'a>(intervals: impl Iterator<Item = &'a BuffInterval>, from: u64, to: u64) -> u64 {
    let mut spans: Vec<(u64, u64)> = intervals
        .map(|b| (b.start.max(from), b.end.unwrap_or(to).min(to)))
        .filter(|(start, end)| end > start)
        .collect();
    spans.sort_unstable();

    let mut total = 0;
    let mut current: Option<(u64, u64)> = None;
    for (start, end) in spans {
        current = match current {
            Some((s, e)) if start <= e => Some((s, e.max(end))),
            Some((s, e)) => {
                total += e - s;
                Some((start, end))
            }
            None => Some((start, end)),
        };
    }
    total + current.map_or(0, |(s, e)| e - s)
}
