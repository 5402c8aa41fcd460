use crate::migrate::StageReport;
use crate::ui::{Icons, theme};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::MIGRATE, text.style(theme().header.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    println!("{} {}: {}", Icons::INFO, label.style(theme().label.clone()), value);
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

pub fn muted(text: &str) -> String {
    text.style(theme().muted.clone()).to_string()
}

/// One line per finished stage: counts, then how long it took
pub fn stage_line(stage: &StageReport) {
    let (icon, name) = if stage.skipped > 0 {
        (Icons::SKIP, format!("{:<20}", stage.stage.as_str()).style(theme().lossy.clone()).to_string())
    } else {
        (Icons::CHECK, format!("{:<20}", stage.stage.as_str()))
    };
    println!(
        "{} {} {} read, {} written, {} skipped  {}",
        icon,
        name,
        stage.read,
        stage.written,
        stage.skipped,
        muted(&format!("{} ms", stage.elapsed_ms))
    );
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(theme().label.clone()), value);
}
