//! JSON to SQLite migration
//!
//! Each stage reads one legacy JSON file, repairs references against the
//! rows already written, and writes its records in a single transaction.
//! Stages run parents first; the first stage that fails stops the run and
//! leaves the earlier stages committed.

mod report;
mod source;
pub mod stages;

pub use report::{Diagnostic, Issue, MigrationReport, StageFailure, StageReport};
pub use source::SourceLayout;

use std::fmt;
use std::path::Path;
use std::time::Instant;

use serde::Serialize;

use crate::config::StoreConfig;
use crate::storage::Store;
use crate::Result;

/// Migration stages in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Users,
    Specialists,
    Services,
    SpecialistServices,
    Articles,
    Reviews,
    Appointments,
    Events,
    Settings,
    Faq,
    PromoCodes,
    BonusTransactions,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Users => "users",
            Stage::Specialists => "specialists",
            Stage::Services => "services",
            Stage::SpecialistServices => "specialist_services",
            Stage::Articles => "articles",
            Stage::Reviews => "reviews",
            Stage::Appointments => "appointments",
            Stage::Events => "events",
            Stage::Settings => "settings",
            Stage::Faq => "faq",
            Stage::PromoCodes => "promo_codes",
            Stage::BonusTransactions => "bonus_transactions",
        }
    }

    pub fn all() -> &'static [Stage] {
        &[
            Stage::Users,
            Stage::Specialists,
            Stage::Services,
            Stage::SpecialistServices,
            Stage::Articles,
            Stage::Reviews,
            Stage::Appointments,
            Stage::Events,
            Stage::Settings,
            Stage::Faq,
            Stage::PromoCodes,
            Stage::BonusTransactions,
        ]
    }

    /// Source file relative to the data directory. Links between
    /// specialists and services come from the specialists file.
    pub fn source_file(&self) -> &'static str {
        match self {
            Stage::Users => "users/users.json",
            Stage::Specialists | Stage::SpecialistServices => "specialists/specialists.json",
            Stage::Services => "services/services.json",
            Stage::Articles => "articles/articles.json",
            Stage::Reviews => "reviews.json",
            Stage::Appointments => "appointments/appointments.json",
            Stage::Events => "events/events.json",
            Stage::Settings => "settings/settings.json",
            Stage::Faq => "faq/faq.json",
            Stage::PromoCodes => "promocodes/promocodes.json",
            Stage::BonusTransactions => "bonuses/transactions.json",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One stage of the migration
pub trait Migrator {
    fn stage(&self) -> Stage;

    /// Read `source` and write its records. Record-level problems go into
    /// `report`; an `Err` means the stage as a whole failed.
    fn migrate(&self, store: &Store, source: &Path, report: &mut StageReport) -> Result<()>;
}

/// Runs the migrators in order against one store
pub struct Migration<'a> {
    store: &'a Store,
    layout: SourceLayout,
    migrators: Vec<Box<dyn Migrator>>,
}

impl<'a> Migration<'a> {
    pub fn new(store: &'a Store, layout: SourceLayout) -> Self {
        Self {
            store,
            layout,
            migrators: stages::default_migrators(),
        }
    }

    /// Replace the stage list (used to run a subset)
    pub fn with_migrators(mut self, migrators: Vec<Box<dyn Migrator>>) -> Self {
        self.migrators = migrators;
        self
    }

    pub fn run(&self) -> MigrationReport {
        self.run_with_progress(|_| {})
    }

    /// Run every stage, calling `on_stage` after each one completes
    pub fn run_with_progress(&self, mut on_stage: impl FnMut(&StageReport)) -> MigrationReport {
        let started = Instant::now();
        // Normally a no-op: opening the store already created the schema
        let mut schema = self.store.initialize_schema();
        if schema.already_initialized {
            schema = self.store.schema_status().clone();
        }
        let mut report = MigrationReport {
            schema,
            ..Default::default()
        };

        for migrator in &self.migrators {
            let stage = migrator.stage();
            let source = self.layout.path_for(stage);
            let mut stage_report = StageReport::new(stage, &source);
            let stage_started = Instant::now();
            tracing::debug!("Migrating {} from {}", stage, source.display());

            let result = migrator.migrate(self.store, &source, &mut stage_report);
            stage_report.elapsed_ms = stage_started.elapsed().as_millis() as u64;

            match result {
                Ok(()) => {
                    tracing::info!(
                        "{}: {} read, {} written, {} skipped",
                        stage,
                        stage_report.read,
                        stage_report.written,
                        stage_report.skipped
                    );
                    on_stage(&stage_report);
                    report.stages.push(stage_report);
                }
                Err(e) => {
                    tracing::error!("Stage {} failed: {}", stage, e);
                    report.stages.push(stage_report);
                    report.failure = Some(StageFailure {
                        stage,
                        error: e.to_string(),
                    });
                    break;
                }
            }
        }

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        report
    }
}

/// Open the configured database, migrate the configured data directory and
/// report whether every stage succeeded
pub fn migrate_data(config: &StoreConfig) -> Result<bool> {
    let store = Store::from_config(config)?;
    let report = Migration::new(&store, SourceLayout::new(config.data_dir())).run();

    let diagnostics = report.diagnostics().count();
    if report.is_success() {
        tracing::info!(
            "Migration finished: {} rows written, {} records skipped, {} diagnostics",
            report.total_written(),
            report.total_skipped(),
            diagnostics
        );
    }
    store.close()?;
    Ok(report.is_success())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Probe {
        stage: Stage,
        fail: bool,
        runs: Rc<Cell<usize>>,
    }

    impl Migrator for Probe {
        fn stage(&self) -> Stage {
            self.stage
        }

        fn migrate(&self, _store: &Store, _source: &Path, report: &mut StageReport) -> Result<()> {
            self.runs.set(self.runs.get() + 1);
            if self.fail {
                return Err(Error::Invalid("boom".into()));
            }
            report.written = 1;
            Ok(())
        }
    }

    #[test]
    fn test_first_failure_stops_the_run() {
        let store = Store::open_in_memory().unwrap();
        let runs = Rc::new(Cell::new(0));
        let probe = |stage, fail| -> Box<dyn Migrator> {
            Box::new(Probe {
                stage,
                fail,
                runs: runs.clone(),
            })
        };
        let migration = Migration::new(&store, SourceLayout::new("unused")).with_migrators(vec![
            probe(Stage::Users, false),
            probe(Stage::Specialists, true),
            probe(Stage::Services, false),
        ]);

        let mut seen = Vec::new();
        let report = migration.run_with_progress(|s| seen.push(s.stage));
        assert!(!report.is_success());
        assert_eq!(runs.get(), 2);
        assert_eq!(seen, vec![Stage::Users]);
        assert_eq!(report.stages.len(), 2);
        let failure = report.failure.unwrap();
        assert_eq!(failure.stage, Stage::Specialists);
        assert!(failure.error.contains("boom"));
    }

    #[test]
    fn test_stage_order_and_sources() {
        let all = Stage::all();
        assert_eq!(all.first(), Some(&Stage::Users));
        assert_eq!(all.last(), Some(&Stage::BonusTransactions));
        assert_eq!(
            Stage::SpecialistServices.source_file(),
            Stage::Specialists.source_file()
        );
        let layout = SourceLayout::new("/data");
        assert_eq!(layout.path_for(Stage::Reviews), Path::new("/data/reviews.json"));

        let order: Vec<Stage> = stages::default_migrators().iter().map(|m| m.stage()).collect();
        assert_eq!(order, all.to_vec());
    }
}
