/// Run-level and per-module error types.
///
/// `AnalysisError` is fatal for a run: resolution and input errors are raised
/// before dispatch starts, `Aborted` discards everything accumulated so far.
/// `HandlerError` is per-module and never stops the run; the engine collects
/// them into the report's diagnostics list.
use crate::module::ModuleKind;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("module {module} requires {dependency} (as `{name}`), which is not registered")]
    MissingDependency {
        module:     ModuleKind,
        name:       &'static str,
        dependency: ModuleKind,
    },

    #[error("cyclic module dependencies between {}", format_kinds(.modules))]
    CyclicDependency { modules: Vec<ModuleKind> },

    #[error("module {0} is registered more than once")]
    DuplicateModule(ModuleKind),

    #[error("corrupt input: {0}")]
    CorruptInput(String),

    #[error("run aborted by {module}: {reason}")]
    Aborted { module: ModuleKind, reason: String },
}

fn format_kinds(kinds: &[ModuleKind]) -> String {
    kinds
        .iter()
        .map(ModuleKind::name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Lifecycle phase a handler error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Initialize,
    Dispatch,
    Finish,
    Report,
}

/// A recovered failure inside one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerError {
    pub module:    ModuleKind,
    pub phase:     Phase,
    /// Timestamp of the event being dispatched, for `Phase::Dispatch`.
    pub timestamp: Option<u64>,
    pub message:   String,
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.timestamp {
            Some(ts) => write!(f, "{} ({:?} @ {}ms): {}", self.module, self.phase, ts, self.message),
            None     => write!(f, "{} ({:?}): {}", self.module, self.phase, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_lists_modules() {
        let err = AnalysisError::CyclicDependency {
            modules: vec![ModuleKind::SoulConduit, ModuleKind::SoulShardTracker],
        };
        assert_eq!(
            err.to_string(),
            "cyclic module dependencies between soul_conduit, soul_shard_tracker"
        );
    }

    #[test]
    fn handler_error_display_includes_timestamp() {
        let err = HandlerError {
            module:    ModuleKind::DamageDone,
            phase:     Phase::Dispatch,
            timestamp: Some(1500),
            message:   "boom".to_owned(),
        };
        assert_eq!(err.to_string(), "damage_done (Dispatch @ 1500ms): boom");
    }
}
