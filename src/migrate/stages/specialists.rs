use std::collections::HashSet;
use std::path::Path;

use super::{keep_last_occurrence, null_if_missing};
use crate::migrate::source::parse_records;
use crate::migrate::{Migrator, Stage, StageReport};
use crate::model::Specialist;
use crate::repo::specialist::{replace_documents, replace_positions, replace_schedule, upsert_row};
use crate::storage::{Store, load_ids};
use crate::Result;

/// `specialists/specialists.json` into `specialists` and the owned
/// collections: positions, documents and the schedule tree. Service links
/// wait for the services stage.
pub struct SpecialistsMigrator;

impl Migrator for SpecialistsMigrator {
    fn stage(&self) -> Stage {
        Stage::Specialists
    }

    fn migrate(&self, store: &Store, source: &Path, report: &mut StageReport) -> Result<()> {
        let parsed = parse_records(source, report, |s: &Specialist| s.id.clone())?;
        let records = keep_last_occurrence(report, parsed);
        if records.is_empty() {
            return Ok(());
        }

        let tx = store.transaction()?;
        let users = load_ids(&tx, "users")?;

        // Schedules are rewritten from scratch, so their old ids are free again
        for (id, _) in &records {
            replace_schedule(&tx, id, None)?;
        }
        let mut schedule_ids: HashSet<String> = load_ids(&tx, "work_schedules")?;

        for (id, mut specialist) in records {
            specialist.id = id;
            null_if_missing(report, &specialist.id, "userId", &mut specialist.user_id, &users);

            if let Some(schedule) = specialist.work_schedule.as_mut() {
                for reason in schedule.repair() {
                    report.child_dropped(&specialist.id, "workDays", reason);
                }
                let wanted = schedule.id_for(&specialist.id);
                if schedule_ids.contains(&wanted) {
                    let derived = format!("schedule-{}", specialist.id);
                    report.duplicate(&specialist.id, "workSchedule.id", wanted);
                    schedule.id = derived;
                }
            }
            if let Some(schedule) = specialist
                .work_schedule
                .take_if(|s| schedule_ids.contains(&s.id_for(&specialist.id)))
            {
                report.child_dropped(
                    &specialist.id,
                    "workSchedule",
                    format!("schedule id {} is already taken", schedule.id),
                );
            }
            if let Some(schedule) = &specialist.work_schedule {
                schedule_ids.insert(schedule.id_for(&specialist.id));
            }

            upsert_row(&tx, &specialist)?;
            replace_positions(&tx, &specialist.id, &specialist.distinct_positions())?;
            replace_documents(&tx, &specialist.id, &specialist.documents)?;
            replace_schedule(&tx, &specialist.id, specialist.work_schedule.as_ref())?;
            report.written += 1;
        }

        tx.commit()?;
        Ok(())
    }
}
