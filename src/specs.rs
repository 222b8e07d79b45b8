/// Spec table and trait scaling, embedded at compile time from `data/*.toml`.
///
/// The spec table maps the `specId` found on roster entries to class, spec
/// name and role, and lists the analyzers loaded for that spec on top of the
/// core roster. A roster entry whose spec does not resolve here is corrupt
/// input.
///
/// The trait table gives the value one rank of a trait grants at a given
/// item level; fabricators sum it over every unlocked rank.
use crate::module::ModuleKind;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Embedded TOML data
// ---------------------------------------------------------------------------

const SPEC_DATA:  &str = include_str!("../data/specs.toml");
const TRAIT_DATA: &str = include_str!("../data/traits.toml");

static SPECS:  Lazy<Vec<SpecProfile>>  = Lazy::new(|| parse_specs(SPEC_DATA));
static TRAITS: Lazy<Vec<TraitScaling>> = Lazy::new(|| parse_traits(TRAIT_DATA));

// ---------------------------------------------------------------------------
// TOML deserialization structs (private)
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct TomlSpecFile {
    spec: Vec<TomlSpec>,
}

#[derive(Deserialize)]
struct TomlSpec {
    id:      u32,
    class:   String,
    spec:    String,
    role:    Role,
    #[serde(default)]
    modules: Vec<String>,
}

#[derive(Deserialize)]
struct TomlTraitFile {
    #[serde(rename = "trait")]
    traits: Vec<TomlTrait>,
}

#[derive(Deserialize)]
struct TomlTrait {
    spell_id: u32,
    name:     String,
    scaling:  Vec<TomlScalingPoint>,
}

#[derive(Deserialize)]
struct TomlScalingPoint {
    item_level: u32,
    value:      u64,
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Tank,
    Healer,
    Dps,
}

#[derive(Debug, Clone)]
pub struct SpecProfile {
    pub id:        u32,
    pub class:     String,
    pub spec_name: String,
    pub role:      Role,
    /// Analyzers loaded for this spec in addition to the core roster.
    pub modules:   Vec<ModuleKind>,
}

impl SpecProfile {
    /// Canonical "CLASS/Spec" key used for display.
    pub fn key(&self) -> String {
        format!("{}/{}", self.class, self.spec_name)
    }
}

#[derive(Debug, Clone)]
pub struct TraitScaling {
    pub spell_id: u32,
    pub name:     String,
    /// (item level, value), sorted by item level.
    points:       Vec<(u32, u64)>,
}

impl TraitScaling {
    /// Value of one rank at `item_level`: linear between known points,
    /// clamped outside them.
    pub fn value_at(&self, item_level: u32) -> u64 {
        let (Some(&first), Some(&last)) = (self.points.first(), self.points.last()) else {
            return 0;
        };
        if item_level <= first.0 {
            return first.1;
        }
        if item_level >= last.0 {
            return last.1;
        }
        self.points
            .windows(2)
            .find(|w| item_level <= w[1].0)
            .map(|w| {
                let ((il0, v0), (il1, v1)) = (w[0], w[1]);
                let t = f64::from(item_level - il0) / f64::from(il1 - il0);
                (v0 as f64 + (v1 as f64 - v0 as f64) * t).round() as u64
            })
            .unwrap_or(last.1)
    }
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn parse_specs(raw: &str) -> Vec<SpecProfile> {
    let file: TomlSpecFile = match toml::from_str(raw) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!("Failed to parse spec table: {}", e);
            return Vec::new();
        }
    };
    file.spec
        .into_iter()
        .map(|s| SpecProfile {
            id:        s.id,
            modules:   s.modules
                .iter()
                .filter_map(|name| {
                    let kind = ModuleKind::from_name(name);
                    if kind.is_none() {
                        tracing::warn!("Spec {}/{} lists unknown module '{}'", s.class, s.spec, name);
                    }
                    kind
                })
                .collect(),
            class:     s.class,
            spec_name: s.spec,
            role:      s.role,
        })
        .collect()
}

fn parse_traits(raw: &str) -> Vec<TraitScaling> {
    let file: TomlTraitFile = match toml::from_str(raw) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!("Failed to parse trait table: {}", e);
            return Vec::new();
        }
    };
    file.traits
        .into_iter()
        .map(|t| {
            let mut points: Vec<(u32, u64)> =
                t.scaling.iter().map(|p| (p.item_level, p.value)).collect();
            points.sort_unstable();
            TraitScaling { spell_id: t.spell_id, name: t.name, points }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn by_id(spec_id: u32) -> Option<&'static SpecProfile> {
    SPECS.iter().find(|s| s.id == spec_id)
}

pub fn is_healer(spec_id: u32) -> bool {
    by_id(spec_id).is_some_and(|s| s.role == Role::Healer)
}

pub fn trait_scaling(spell_id: u32) -> Option<&'static TraitScaling> {
    TRAITS.iter().find(|t| t.spell_id == spell_id)
}

/// Sum of a trait's value over every unlocked rank (item levels).
/// Unknown traits contribute nothing.
pub fn trait_total(spell_id: u32, ranks: &[u32]) -> u64 {
    trait_scaling(spell_id)
        .map(|t| ranks.iter().map(|&il| t.value_at(il)).sum())
        .unwrap_or(0)
}
