use crate::migrate::StageReport;
use crate::ui::{Icons, theme};
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;

/// One tick per migration stage. Hidden when stdout is not a terminal.
pub struct MigrationProgress {
    pb: ProgressBar,
}

impl MigrationProgress {
    pub fn new(stages: usize) -> Self {
        let pb = if console::Term::stdout().is_term() {
            let pb = ProgressBar::new(stages as u64);
            if let Ok(style) = ProgressStyle::with_template("{spinner} [{pos}/{len}] {msg}") {
                pb.set_style(style);
            }
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            ProgressBar::hidden()
        };
        Self { pb }
    }

    /// Print the finished stage above the bar and advance
    pub fn finish_stage(&self, report: &StageReport) {
        self.pb.suspend(|| crate::ui::stage_line(report));
        self.pb.inc(1);
        self.pb.set_message(format!("{} done", report.stage));
    }

    pub fn clear(&self) {
        self.pb.finish_and_clear();
    }

    pub fn finish_with_summary(&self, duration: Duration, written: usize, skipped: usize, diagnostics: usize) {
        self.clear();
        println!();
        println!(
            "{} {}",
            Icons::CHECK,
            format!("Complete in {}", HumanDuration(duration)).style(theme().success.clone())
        );
        println!(
            "  {} {} written  {} {} skipped  {} {} diagnostics",
            Icons::DATABASE,
            written,
            Icons::SKIP,
            skipped,
            Icons::WARN,
            diagnostics
        );
    }
}
