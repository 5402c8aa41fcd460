//! One migrator per source file, plus the reference-repair helpers they share

mod appointments;
mod articles;
mod bonuses;
mod content;
mod reviews;
mod services;
mod specialists;
mod users;

pub use appointments::AppointmentsMigrator;
pub use articles::ArticlesMigrator;
pub use bonuses::BonusTransactionsMigrator;
pub use content::{EventsMigrator, FaqMigrator, PromoCodesMigrator, SettingsMigrator};
pub use reviews::ReviewsMigrator;
pub use services::{ServicesMigrator, SpecialistServicesMigrator};
pub use specialists::SpecialistsMigrator;
pub use users::UsersMigrator;

use std::collections::{HashMap, HashSet};

use rusqlite::Connection;

use super::{Migrator, StageReport};
use crate::Result;

/// Every stage, parents first
pub fn default_migrators() -> Vec<Box<dyn Migrator>> {
    vec![
        Box::new(UsersMigrator),
        Box::new(SpecialistsMigrator),
        Box::new(ServicesMigrator),
        Box::new(SpecialistServicesMigrator),
        Box::new(ArticlesMigrator),
        Box::new(ReviewsMigrator),
        Box::new(AppointmentsMigrator),
        Box::new(EventsMigrator),
        Box::new(SettingsMigrator),
        Box::new(FaqMigrator),
        Box::new(PromoCodesMigrator),
        Box::new(BonusTransactionsMigrator),
    ]
}

/// Clear an optional reference whose target does not exist. Blank strings
/// are cleared silently.
pub(crate) fn null_if_missing(
    report: &mut StageReport,
    record_id: &str,
    field: &str,
    value: &mut Option<String>,
    known: &HashSet<String>,
) {
    if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
        *value = None;
        return;
    }
    if let Some(missing) = value.take_if(|target| !known.contains(target.as_str())) {
        report.nulled(record_id, field, missing);
    }
}

/// Drop every record whose id appears again later in the same file; the
/// last occurrence is the one written.
pub(crate) fn keep_last_occurrence<T>(
    report: &mut StageReport,
    records: Vec<(String, T)>,
) -> Vec<(String, T)> {
    let last: HashMap<String, usize> = records
        .iter()
        .enumerate()
        .map(|(index, (id, _))| (id.clone(), index))
        .collect();
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, (id, record))| {
            if last.get(&id) == Some(&index) {
                Some((id, record))
            } else {
                report.skip(&id, "superseded by a later record with the same id");
                None
            }
        })
        .collect()
}

/// Who holds each value of a unique column.
///
/// Seeded from rows outside the batch being migrated; rows inside the batch
/// claim their values as they are processed, first come first served.
pub(crate) struct UniqueClaims {
    owners: HashMap<String, String>,
    normalize: fn(&str) -> String,
}

impl UniqueClaims {
    pub fn load(
        conn: &Connection,
        table: &str,
        column: &str,
        batch: &HashSet<&str>,
        normalize: fn(&str) -> String,
    ) -> Result<Self> {
        let mut stmt = conn.prepare(&format!(
            "SELECT id, {column} FROM {table} WHERE {column} IS NOT NULL"
        ))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let owners = rows
            .into_iter()
            .filter(|(id, _)| !batch.contains(id.as_str()))
            .map(|(id, value)| (normalize(&value), id))
            .collect();
        Ok(Self { owners, normalize })
    }

    /// Take `value` for `owner`. Returns false when someone else holds it.
    pub fn claim(&mut self, value: &str, owner: &str) -> bool {
        let key = (self.normalize)(value);
        match self.owners.get(&key) {
            Some(current) => current == owner,
            None => {
                self.owners.insert(key, owner.to_string());
                true
            }
        }
    }
}

/// Move the unique values of rows being re-migrated out of the way, so
/// records can trade values within one run without tripping a UNIQUE index.
/// `assignment` is a fixed SQL fragment such as `email = NULL`.
pub(crate) fn release_unique<'a>(
    conn: &Connection,
    table: &str,
    assignment: &str,
    ids: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    let mut stmt = conn.prepare(&format!("UPDATE {table} SET {assignment} WHERE id = ?1"))?;
    for id in ids {
        stmt.execute([id])?;
    }
    Ok(())
}

/// Current values of a unique column for the rows in `batch`
pub(crate) fn stored_values(
    conn: &Connection,
    table: &str,
    column: &str,
    batch: &HashSet<&str>,
) -> Result<HashMap<String, String>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, {column} FROM {table} WHERE {column} IS NOT NULL"
    ))?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows
        .into_iter()
        .filter(|(id, _)| batch.contains(id.as_str()))
        .collect())
}

pub(crate) fn lowercase(value: &str) -> String {
    value.trim().to_lowercase()
}

pub(crate) fn uppercase(value: &str) -> String {
    value.trim().to_uppercase()
}

pub(crate) fn exact(value: &str) -> String {
    value.trim().to_string()
}
