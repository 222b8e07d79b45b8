/// Shared read-only run context: the fight window, the selected player, the
/// combatant registry and the analyzer configuration.
///
/// Built once per run by the engine and handed to every module through its
/// `Scope`. Only the engine mutates the registry (buff bookkeeping) and only
/// between handler invocations.
use crate::{
    combatant::{Combatant, Combatants},
    config::AnalyzerConfig,
    error::AnalysisError,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fight {
    pub start_time: u64,
    pub end_time:   u64,
}

impl Fight {
    pub fn new(start_time: u64, end_time: u64) -> Result<Self, AnalysisError> {
        if end_time < start_time {
            return Err(AnalysisError::CorruptInput(format!(
                "fight ends ({end_time}) before it starts ({start_time})"
            )));
        }
        Ok(Self { start_time, end_time })
    }

    pub fn duration(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time)
    }

    /// `ms` as a fraction of the fight duration; 0 for an empty fight.
    pub fn fraction(&self, ms: u64) -> f64 {
        match self.duration() {
            0 => 0.0,
            d => ms as f64 / d as f64,
        }
    }
}

pub struct AnalysisContext {
    pub fight:      Fight,
    pub combatants: Combatants,
    pub config:     AnalyzerConfig,
}

impl AnalysisContext {
    pub fn new(fight: Fight, combatants: Combatants, config: AnalyzerConfig) -> Self {
        Self { fight, combatants, config }
    }

    pub fn selected(&self) -> &Combatant {
        self.combatants.selected()
    }

    pub fn player_id(&self) -> u64 {
        self.combatants.selected().id
    }
}
