//! wellness-store CLI - migrate the legacy JSON data and inspect the database

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use wellness_store::config::{self, StoreConfig};
use wellness_store::migrate::{Migration, MigrationReport, SourceLayout};
use wellness_store::storage::Store;
use wellness_store::ui::{self, Icons, MigrationProgress};

#[derive(Parser)]
#[command(name = "wellness-store")]
#[command(version)]
#[command(about = "Relational storage and JSON migration for the wellness center platform")]
#[command(long_about = r#"
Moves the legacy JSON data files into one normalized SQLite database and
checks the result.

Example usage:
  wellness-store init --data-dir ./data --media-root ./public
  wellness-store migrate
  wellness-store stats --json
  wellness-store check
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print machine-readable JSON instead of human output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Location flags shared by every command; they override the config file
#[derive(Args, Clone, Default)]
struct StoreArgs {
    /// Path to the config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the database file
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Directory holding the legacy JSON files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory that web paths such as /uploads/x.jpg resolve against
    #[arg(long)]
    media_root: Option<PathBuf>,
}

impl StoreArgs {
    fn resolve(&self) -> anyhow::Result<StoreConfig> {
        let from_flags = StoreConfig {
            database: self.database.clone(),
            data_dir: self.data_dir.clone(),
            media_root: self.media_root.clone(),
            placeholder_image: None,
        };
        let from_file = config::load_config(self.config.as_deref())
            .context("failed to load config")?
            .unwrap_or_default();
        Ok(from_flags.merged_with(from_file))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file with the given locations
    Init {
        #[command(flatten)]
        store: StoreArgs,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Migrate every JSON source into the database
    Migrate {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Show row counts for every table
    Stats {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Report rows whose foreign keys point nowhere
    Check {
        #[command(flatten)]
        store: StoreArgs,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    fn is_human(self) -> bool {
        self == OutputMode::Human
    }
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    ok: bool,
    command: &'a str,
    data: T,
}

fn emit_success<T: Serialize>(mode: OutputMode, command: &str, data: T) -> anyhow::Result<()> {
    if mode == OutputMode::Json {
        let envelope = Envelope { ok: true, command, data };
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    }
    Ok(())
}

fn emit_failure<T: Serialize>(mode: OutputMode, command: &str, data: T) -> anyhow::Result<()> {
    if mode == OutputMode::Json {
        let envelope = Envelope { ok: false, command, data };
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    }
    Ok(())
}

/// Diagnostics printed in human mode before pointing at `--json`
const DIAGNOSTICS_SHOWN: usize = 20;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mode = if cli.json { OutputMode::Json } else { OutputMode::Human };

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Init { store, force } => run_init(mode, &store, force),
        Commands::Migrate { store } => run_migrate(mode, &store.resolve()?),
        Commands::Stats { store } => run_stats(mode, &store.resolve()?),
        Commands::Check { store } => run_check(mode, &store.resolve()?),
    }
}

fn run_init(mode: OutputMode, args: &StoreArgs, force: bool) -> anyhow::Result<()> {
    let path = args.config.clone().unwrap_or_else(config::default_config_path);
    let resolved = StoreConfig {
        database: Some(args.database.clone().unwrap_or_else(|| StoreConfig::default().database_path())),
        data_dir: Some(args.data_dir.clone().unwrap_or_else(|| StoreConfig::default().data_dir())),
        media_root: Some(args.media_root.clone().unwrap_or_else(|| StoreConfig::default().media_root())),
        placeholder_image: None,
    };
    config::write_config(&path, &resolved, force)?;

    if mode.is_human() {
        ui::success(&format!("Wrote {}", path.display()));
    }
    emit_success(mode, "init", serde_json::json!({ "path": path, "config": resolved }))
}

fn run_migrate(mode: OutputMode, config: &StoreConfig) -> anyhow::Result<()> {
    let database = config.database_path();
    let data_dir = config.data_dir();
    let store = Store::from_config(config)
        .with_context(|| format!("failed to open {}", database.display()))?;

    if mode.is_human() {
        ui::header("Migrating legacy JSON data");
        ui::info("Data", &data_dir.display().to_string());
        ui::info("Database", &database.display().to_string());
        ui::info("Media", &config.media_root().display().to_string());
        println!();
    }

    let report = {
        let migration = Migration::new(&store, SourceLayout::new(&data_dir));
        run_stages(mode, &migration)
    };
    store.close()?;

    match &report.failure {
        None => emit_success(mode, "migrate", &report),
        Some(failure) => {
            emit_failure(mode, "migrate", &report)?;
            if mode.is_human() {
                ui::error(&format!("Stage {} failed: {}", failure.stage, failure.error));
            }
            anyhow::bail!("migration stopped at stage {}", failure.stage)
        }
    }
}

fn run_stages(mode: OutputMode, migration: &Migration<'_>) -> MigrationReport {
    if !mode.is_human() {
        return migration.run();
    }

    let progress = MigrationProgress::new(wellness_store::Stage::all().len());
    let report = migration.run_with_progress(|stage| progress.finish_stage(stage));
    if report.is_success() {
        progress.finish_with_summary(
            Duration::from_millis(report.elapsed_ms),
            report.total_written(),
            report.total_skipped(),
            report.diagnostics().count(),
        );
    } else {
        progress.clear();
    }
    print_schema_failures(&report);
    print_diagnostics(&report);
    report
}

fn print_schema_failures(report: &MigrationReport) {
    for failure in &report.schema.failed {
        ui::warn(&format!("Schema statement failed: {}", failure.error));
        println!("  {}", ui::muted(failure.statement.trim()));
    }
}

fn print_diagnostics(report: &MigrationReport) {
    let total = report.diagnostics().count();
    if total == 0 {
        return;
    }
    ui::section(&format!(" Diagnostics ({}) ", total));
    for diagnostic in report.diagnostics().take(DIAGNOSTICS_SHOWN) {
        println!("  {} {}", Icons::WARN, diagnostic);
    }
    if total > DIAGNOSTICS_SHOWN {
        println!(
            "  {}",
            ui::muted(&format!("... and {} more (use --json for all)", total - DIAGNOSTICS_SHOWN))
        );
    }
}

fn run_stats(mode: OutputMode, config: &StoreConfig) -> anyhow::Result<()> {
    let database = config.database_path();
    let store = Store::from_config(config)?;
    let stats = store.stats()?;
    store.close()?;

    if mode.is_human() {
        println!(
            "{} {}",
            Icons::STATS,
            format!("Statistics ({})", database.display()).style(ui::theme().header.clone())
        );
        println!("{}", ui::stats_table(&stats.tables));
        ui::summary_row("Total rows:", &stats.total_rows().to_string());
    }
    emit_success(mode, "stats", &stats)
}

fn run_check(mode: OutputMode, config: &StoreConfig) -> anyhow::Result<()> {
    let store = Store::from_config(config)?;
    let violations = store.foreign_key_violations()?;
    store.close()?;

    if violations.is_empty() {
        if mode.is_human() {
            ui::success("No foreign key violations");
        }
        return emit_success(mode, "check", &violations);
    }

    emit_failure(mode, "check", &violations)?;
    if mode.is_human() {
        ui::warn(&format!("{} foreign key violations", violations.len()));
        for v in &violations {
            let row = v.rowid.map(|r| r.to_string()).unwrap_or_else(|| "?".to_string());
            println!("  {} {} row {} -> {}", Icons::LINK, v.table, row, v.parent);
        }
    }
    anyhow::bail!("{} foreign key violations", violations.len())
}
