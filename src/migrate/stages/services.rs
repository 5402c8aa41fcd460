use std::path::Path;

use serde::Deserialize;

use crate::migrate::source::parse_records;
use crate::migrate::{Migrator, Stage, StageReport};
use crate::model::{Service, opaque_id, opaque_ids};
use crate::repo::service::upsert_row;
use crate::repo::specialist::replace_service_links;
use crate::storage::{Store, load_ids};
use crate::Result;

/// `services/services.json` into `services`
pub struct ServicesMigrator;

impl Migrator for ServicesMigrator {
    fn stage(&self) -> Stage {
        Stage::Services
    }

    fn migrate(&self, store: &Store, source: &Path, report: &mut StageReport) -> Result<()> {
        let records = parse_records(source, report, |s: &Service| s.id.clone())?;
        if records.is_empty() {
            return Ok(());
        }

        let tx = store.transaction()?;
        for (id, mut service) in records {
            service.id = id;
            upsert_row(&tx, &service)?;
            report.written += 1;
        }
        tx.commit()?;
        Ok(())
    }
}

/// The slice of a specialist record the link stage needs
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ServiceLinks {
    #[serde(deserialize_with = "opaque_id")]
    id: String,
    #[serde(deserialize_with = "opaque_ids")]
    services: Vec<String>,
}

/// Links between specialists and services, read from the `services` array
/// of each specialist record. `written` counts links, not specialists.
pub struct SpecialistServicesMigrator;

impl Migrator for SpecialistServicesMigrator {
    fn stage(&self) -> Stage {
        Stage::SpecialistServices
    }

    fn migrate(&self, store: &Store, source: &Path, report: &mut StageReport) -> Result<()> {
        let records = parse_records(source, report, |s: &ServiceLinks| s.id.clone())?;
        if records.is_empty() {
            return Ok(());
        }

        let tx = store.transaction()?;
        let specialists = load_ids(&tx, "specialists")?;
        let services = load_ids(&tx, "services")?;

        for (id, record) in records {
            if !specialists.contains(&id) {
                report.skip(&id, format!("specialist {} was not migrated", id));
                continue;
            }

            let mut linked: Vec<String> = Vec::with_capacity(record.services.len());
            for service_id in record.services {
                if !services.contains(&service_id) {
                    report.child_dropped(&id, "services", format!("service {} does not exist", service_id));
                } else if !linked.contains(&service_id) {
                    linked.push(service_id);
                }
            }

            replace_service_links(&tx, &id, &linked)?;
            report.written += linked.len();
        }

        tx.commit()?;
        Ok(())
    }
}
