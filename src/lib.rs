pub mod combatant;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod event;
pub mod input;
pub mod module;
pub mod modules;
pub mod resolver;
pub mod specs;
pub mod spells;
pub mod statistic;
pub mod suggestion;

#[cfg(test)]
mod testing;

use anyhow::{bail, Context};
use config::AnalyzerConfig;
use input::PlayerSelector;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;

const USAGE: &str = "usage: combat-ledger-analyzer <report.json> <player id|name> [config-dir]";

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Install the global subscriber. Logs go to a daily rolling file when
/// `log_dir` is configured, stderr otherwise.
///
/// The returned guard flushes the writer on drop; keep it alive for the
/// lifetime of the process.
pub fn init_logging(config: &AnalyzerConfig) -> WorkerGuard {
    let (writer, guard) = match &config.log_dir {
        Some(dir) => {
            let _ = std::fs::create_dir_all(dir);
            tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "analyzer.log"))
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("combat_ledger_analyzer=info"));

    // A second install (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();

    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown location".to_string());
        let message = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        tracing::error!("PANIC at {}: {}", location, message);
    }));

    guard
}

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

struct Args {
    report:     PathBuf,
    player:     PlayerSelector,
    config_dir: PathBuf,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Args> {
    let (Some(report), Some(player)) = (args.next(), args.next()) else {
        bail!(USAGE);
    };
    let config_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    if args.next().is_some() {
        bail!(USAGE);
    }
    let player = match player.parse() {
        Ok(selector) => selector,
        Err(never) => match never {},
    };
    Ok(Args { report: PathBuf::from(report), player, config_dir })
}

/// First run writes the defaults so the user has a file to edit.
fn load_config(config_dir: &Path) -> anyhow::Result<AnalyzerConfig> {
    let config = config::load_or_default(config_dir)
        .with_context(|| format!("loading config from {}", config_dir.display()))?;
    if !config_dir.join(config::CONFIG_FILE).exists() {
        config::save(&config, config_dir)
            .with_context(|| format!("writing default config to {}", config_dir.display()))?;
    }
    Ok(config)
}

/// Analyze one report file and print the result as pretty JSON on stdout.
pub fn run() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1))?;
    let config = load_config(&args.config_dir)?;
    let _guard = init_logging(&config);

    tracing::info!("Combat Ledger Analyzer starting, report {}", args.report.display());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting the tokio runtime")?;
    let input = runtime.block_on(input::load(&args.report, &args.player))?;

    let spec_id = input
        .roster
        .iter()
        .find(|c| c.id == input.player_id)
        .map(|c| c.spec_id)
        .context("selected player vanished from the roster")?;
    let engine = modules::engine_for(spec_id, &config)?;
    let analysis = engine.run(input, config)?;

    let report = analysis.into_report();
    for diagnostic in &report.diagnostics {
        tracing::warn!("{}", diagnostic);
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(list: &[&str]) -> anyhow::Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_positional_args() {
        let parsed = args(&["fight.json", "Brewbro", "/tmp/cfg"]).unwrap();
        assert_eq!(parsed.report, PathBuf::from("fight.json"));
        assert_eq!(parsed.player, PlayerSelector::Name("Brewbro".to_owned()));
        assert_eq!(parsed.config_dir, PathBuf::from("/tmp/cfg"));

        let parsed = args(&["fight.json", "7"]).unwrap();
        assert_eq!(parsed.player, PlayerSelector::Id(7));
        assert_eq!(parsed.config_dir, PathBuf::from("."));
    }

    #[test]
    fn rejects_missing_or_extra_args() {
        assert!(args(&["fight.json"]).is_err());
        assert!(args(&["a", "b", "c", "d"]).is_err());
    }

    #[test]
    fn first_run_writes_default_config() {
        let dir = tempdir().unwrap();
        let cfg = load_config(dir.path()).unwrap();
        assert_eq!(cfg, AnalyzerConfig::default());
        assert!(dir.path().join(config::CONFIG_FILE).exists());
    }
}
