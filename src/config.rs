/// Analyzer configuration, persisted as TOML (`config.toml`) in the
/// directory passed to the CLI.
///
/// First run: if the directory has no `config.toml`, defaults are used and
/// written back so the user has a file to edit.
///
/// Game-content constants that are heuristics rather than log facts (the mana
/// level at which a healer "needed" a mana potion) live here instead of in
/// the analyzers.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.toml";

// ---------------------------------------------------------------------------
// AnalyzerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Handler errors a module may raise before it is marked degraded and
    /// stops receiving events.
    #[serde(default = "default_max_handler_failures")]
    pub max_handler_failures: u32,

    /// Mana left after a cast below which a healer is considered to have
    /// needed a mana potion (amount restored by a common mana potion).
    #[serde(default = "default_second_potion_mana_threshold")]
    pub second_potion_mana_threshold: i64,

    /// Directory for daily rolling log files. Logs go to stderr when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// Module names (e.g. "pre_potion") left out of the roster.
    #[serde(default)]
    pub disabled_modules: Vec<String>,
}

fn default_max_handler_failures() -> u32 { 5 }
fn default_second_potion_mana_threshold() -> i64 { 11_084 }

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_handler_failures:         default_max_handler_failures(),
            second_potion_mana_threshold: default_second_potion_mana_threshold(),
            log_dir:                      None,
            disabled_modules:             Vec::new(),
        }
    }
}

impl AnalyzerConfig {
    pub fn is_disabled(&self, module_name: &str) -> bool {
        self.disabled_modules.iter().any(|m| m.eq_ignore_ascii_case(module_name))
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

pub fn load_or_default(config_dir: &Path) -> Result<AnalyzerConfig> {
    let path = config_dir.join(CONFIG_FILE);
    if path.exists() {
        let raw = std::fs::read_to_string(&path)?;
        let cfg: AnalyzerConfig = toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Config parse error: {}", e))?;
        Ok(cfg)
    } else {
        Ok(AnalyzerConfig::default())
    }
}

pub fn save(config: &AnalyzerConfig, config_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(config_dir)?;
    let raw = toml::to_string_pretty(config)
        .map_err(|e| anyhow::anyhow!("Config serialize error: {}", e))?;
    std::fs::write(config_dir.join(CONFIG_FILE), raw)?;
    Ok(())
}
