// SPDX-FileCopyrightText: 2026 Atlas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Atlas - plugin host command-line interface.
//!
//! Loads the plugins named in configuration, reports their health, and
//! manages the on-disk plugin cache.

mod host;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use atlas_config::AtlasConfig;
use atlas_plugin::{LoadOutcome, LoadReport};

use crate::host::LoggingRegistry;

/// Atlas - plugin host.
#[derive(Parser, Debug)]
#[command(name = "atlas", version, about, long_about = None)]
struct Cli {
    /// Configuration file to use instead of the standard lookup.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Load every configured plugin and report the outcome.
    Load,
    /// Load every configured plugin and print health reports as JSON.
    Health,
    /// Inspect or clear the plugin cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// List cached plugin entries.
    List,
    /// Remove every cached plugin.
    Clear,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => atlas_config::load_and_validate_path(path),
        None => atlas_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            atlas_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.log_level);

    match cli.command {
        Commands::Load => run_load(&config).await,
        Commands::Health => run_health(&config).await,
        Commands::Cache { action } => run_cache(&config, action).await,
    }
}

/// Initialize the tracing subscriber. `RUST_LOG` takes precedence over the
/// configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("atlas={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_load(config: &AtlasConfig) -> ExitCode {
    let registry = Arc::new(LoggingRegistry::default());
    let mut runtime = match host::build_runtime(config, registry.clone()) {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("atlas: {e}");
            return ExitCode::FAILURE;
        }
    };

    let reports = runtime.load_all(&config.plugin_configs()).await;
    for report in &reports {
        println!("{}", describe(report));
    }

    let counts = registry.counts();
    println!(
        "{} of {} plugins loaded ({} sources, {} workflows, {} sinks)",
        runtime.states().len(),
        reports.len(),
        counts.sources,
        counts.workflows,
        counts.sinks
    );

    runtime.shutdown_all().await;

    if reports
        .iter()
        .any(|r| matches!(r.outcome, LoadOutcome::Failed(_)))
    {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn run_health(config: &AtlasConfig) -> ExitCode {
    let mut runtime = match host::build_runtime(config, Arc::new(LoggingRegistry::default())) {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("atlas: {e}");
            return ExitCode::FAILURE;
        }
    };

    runtime.load_all(&config.plugin_configs()).await;
    let health = runtime.health_check_all().await;
    runtime.shutdown_all().await;

    match serde_json::to_string_pretty(&health) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("atlas: failed to encode health report: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_cache(config: &AtlasConfig, action: CacheAction) -> ExitCode {
    let cache = host::plugin_cache(config);
    let result = match action {
        CacheAction::List => cache.list().await.map(|entries| {
            for entry in entries {
                println!("{entry}");
            }
        }),
        CacheAction::Clear => cache.clear().await.map(|()| {
            println!("cleared {}", cache.root().display());
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("atlas: cache at {}: {e}", cache.root().display());
            ExitCode::FAILURE
        }
    }
}

/// One line per configured plugin.
fn describe(report: &LoadReport) -> String {
    match &report.outcome {
        LoadOutcome::Loaded(counts) => format!(
            "ok    {} ({}): {} sources, {} workflows, {} sinks",
            report.id, report.source, counts.sources, counts.workflows, counts.sinks
        ),
        LoadOutcome::Disabled => format!("skip  {} ({}): disabled", report.id, report.source),
        LoadOutcome::Failed(err) => format!("fail  {} ({}): {err}", report.id, report.source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_core::ComponentCounts;
    use atlas_plugin::{ErrorCode, PluginLoadError};
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_cache_subcommands() {
        let cli = Cli::try_parse_from(["atlas", "cache", "clear", "--config", "a.json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Cache {
                action: CacheAction::Clear
            }
        ));
        assert_eq!(cli.config, Some(PathBuf::from("a.json")));
    }

    #[test]
    fn report_lines() {
        let loaded = LoadReport {
            id: "a".into(),
            source: "./a".into(),
            outcome: LoadOutcome::Loaded(ComponentCounts {
                sources: 0,
                workflows: 1,
                sinks: 0,
            }),
        };
        assert_eq!(
            describe(&loaded),
            "ok    a (./a): 0 sources, 1 workflows, 0 sinks"
        );

        let failed = LoadReport {
            id: "b".into(),
            source: "./b".into(),
            outcome: LoadOutcome::Failed(PluginLoadError::new(
                ErrorCode::ManifestNotFound,
                "no atlas.plugin.json",
            )),
        };
        assert_eq!(
            describe(&failed),
            "fail  b (./b): MANIFEST_NOT_FOUND: no atlas.plugin.json"
        );
    }

    #[tokio::test]
    async fn cache_clear_on_missing_root_succeeds() {
        let tmp = tempfile::tempdir().unwrap();
        let json = format!(
            r#"{{ "cache": {{ "dir": {} }} }}"#,
            serde_json::to_string(tmp.path().join("none").to_str().unwrap()).unwrap()
        );
        let config = atlas_config::load_config_from_str(&json).unwrap();
        assert_eq!(run_cache(&config, CacheAction::List).await, ExitCode::SUCCESS);
        assert_eq!(run_cache(&config, CacheAction::Clear).await, ExitCode::SUCCESS);
    }
}
