pub mod agony_uptime;
pub mod cosmic_ripple;
pub mod damage_done;
pub mod empowered_life_tap;
pub mod pre_potion;
pub mod soul_conduit;
pub mod soul_shard_tracker;
pub mod stagger_fabricator;
pub mod staggering_strikes;

use crate::{
    config::AnalyzerConfig,
    engine::Engine,
    error::AnalysisError,
    module::{ModuleKind, Registration},
    specs::{self, SpecProfile},
};

/// Loaded for every spec.
pub const CORE: [ModuleKind; 2] = [ModuleKind::DamageDone, ModuleKind::PrePotion];

/// Registration for a built-in analyzer. Custom kinds have no factory here.
pub fn registration(kind: ModuleKind) -> Option<Registration> {
    let registration = match kind {
        ModuleKind::DamageDone        => Registration::of::<damage_done::DamageDone>(),
        ModuleKind::PrePotion         => Registration::of::<pre_potion::PrePotion>(),
        ModuleKind::AgonyUptime       => Registration::of::<agony_uptime::AgonyUptime>(),
        ModuleKind::EmpoweredLifeTap  => Registration::of::<empowered_life_tap::EmpoweredLifeTap>(),
        ModuleKind::SoulShardTracker  => Registration::of::<soul_shard_tracker::SoulShardTracker>(),
        ModuleKind::SoulConduit       => Registration::of::<soul_conduit::SoulConduit>(),
        ModuleKind::CosmicRipple      => Registration::of::<cosmic_ripple::CosmicRipple>(),
        ModuleKind::StaggerFabricator => Registration::of::<stagger_fabricator::StaggerFabricator>(),
        ModuleKind::StaggeringStrikes => Registration::of::<staggering_strikes::StaggeringStrikes>(),
        ModuleKind::Custom(_)         => return None,
    };
    Some(registration)
}

/// Default roster for a spec: the core analyzers, then the spec's own.
///
/// Modules disabled in the config are left out, and so is anything that
/// (transitively) depends on a module that was left out.
pub fn roster(spec: &SpecProfile, config: &AnalyzerConfig) -> Vec<Registration> {
    let mut kinds: Vec<ModuleKind> = Vec::new();
    for kind in CORE.iter().chain(spec.modules.iter()).copied() {
        if kinds.contains(&kind) {
            continue;
        }
        if config.is_disabled(kind.name()) {
            tracing::info!("{} disabled by config", kind);
            continue;
        }
        kinds.push(kind);
    }

    let mut roster: Vec<Registration> = kinds.into_iter().filter_map(registration).collect();
    loop {
        let orphan = roster.iter().position(|r| {
            r.dependencies()
                .iter()
                .any(|d| !roster.iter().any(|other| other.kind() == d.kind))
        });
        let Some(idx) = orphan else { break };
        let dropped = roster.remove(idx);
        tracing::warn!("Dropping {}: a module it depends on is not loaded", dropped.kind());
    }
    roster
}

/// Engine loaded with the default roster for `spec_id`.
pub fn engine_for(spec_id: u32, config: &AnalyzerConfig) -> Result<Engine, AnalysisError> {
    let spec = specs::by_id(spec_id)
        .ok_or_else(|| AnalysisError::CorruptInput(format!("unknown spec {spec_id}")))?;
    tracing::debug!("Loading analyzers for {}", spec.key());
    Ok(roster(spec, config)
        .into_iter()
        .fold(Engine::new(), Engine::register))
}
