use std::path::Path;

use super::null_if_missing;
use crate::migrate::source::parse_records;
use crate::migrate::{Migrator, Stage, StageReport};
use crate::model::Appointment;
use crate::repo::appointment::upsert_row;
use crate::storage::{Store, load_ids};
use crate::Result;

/// `appointments/appointments.json` into `appointments`. The specialist is
/// required; client and service references are cleared when dangling.
pub struct AppointmentsMigrator;

impl Migrator for AppointmentsMigrator {
    fn stage(&self) -> Stage {
        Stage::Appointments
    }

    fn migrate(&self, store: &Store, source: &Path, report: &mut StageReport) -> Result<()> {
        let records = parse_records(source, report, |a: &Appointment| a.id.clone())?;
        if records.is_empty() {
            return Ok(());
        }

        let tx = store.transaction()?;
        let specialists = load_ids(&tx, "specialists")?;
        let users = load_ids(&tx, "users")?;
        let services = load_ids(&tx, "services")?;

        for (id, mut appointment) in records {
            appointment.id = id;
            if !specialists.contains(&appointment.specialist_id) {
                report.skip(
                    &appointment.id,
                    format!("specialist {} does not exist", appointment.specialist_id),
                );
                continue;
            }
            null_if_missing(report, &appointment.id, "userId", &mut appointment.user_id, &users);
            null_if_missing(report, &appointment.id, "serviceId", &mut appointment.service_id, &services);

            upsert_row(&tx, &appointment)?;
            report.written += 1;
        }

        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AppointmentStatus;
    use crate::repo::Repository;
    use std::fs;

    #[test]
    fn test_required_and_optional_references() {
        let store = Store::open_in_memory().unwrap();
        store
            .conn()
            .execute_batch("INSERT INTO specialists (id, first_name, last_name) VALUES ('s1', 'A', 'A');")
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appointments.json");
        fs::write(
            &path,
            r#"[
                {"id": "a1", "specialistId": "s1", "userId": "u404", "serviceId": 7,
                 "date": "2024-05-20", "startTime": "10:00", "endTime": "11:00", "status": "confirmed"},
                {"id": "a2", "specialistId": "s404", "date": "2024-05-20"}
            ]"#,
        )
        .unwrap();

        let mut report = StageReport::new(Stage::Appointments, &path);
        AppointmentsMigrator.migrate(&store, &path, &mut report).unwrap();

        assert_eq!(report.written, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.for_record("a1").count(), 2);

        let a1 = store.appointments().get_by_id("a1").unwrap().unwrap();
        assert!(a1.user_id.is_none());
        assert!(a1.service_id.is_none());
        assert_eq!(a1.status, AppointmentStatus::Confirmed);
    }
}
