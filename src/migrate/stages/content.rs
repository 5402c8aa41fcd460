//! Site content: events, settings, FAQ and promo codes

use std::collections::HashSet;
use std::path::Path;

use super::{UniqueClaims, null_if_missing, release_unique, stored_values, uppercase};
use crate::migrate::source::{parse_records, read_object};
use crate::migrate::{Migrator, Stage, StageReport};
use crate::model::{Event, Faq, PromoCode};
use crate::repo::content::{upsert_event, upsert_faq, upsert_promo_code};
use crate::repo::settings::upsert_setting;
use crate::storage::{Store, load_ids};
use crate::Result;

/// `events/events.json` into `events`
pub struct EventsMigrator;

impl Migrator for EventsMigrator {
    fn stage(&self) -> Stage {
        Stage::Events
    }

    fn migrate(&self, store: &Store, source: &Path, report: &mut StageReport) -> Result<()> {
        let records = parse_records(source, report, |e: &Event| e.id.clone())?;
        if records.is_empty() {
            return Ok(());
        }

        let tx = store.transaction()?;
        for (id, mut event) in records {
            event.id = id;
            upsert_event(&tx, &event)?;
            report.written += 1;
        }
        tx.commit()?;
        Ok(())
    }
}

/// `settings/settings.json`, an object, into one `settings` row per key
pub struct SettingsMigrator;

impl Migrator for SettingsMigrator {
    fn stage(&self) -> Stage {
        Stage::Settings
    }

    fn migrate(&self, store: &Store, source: &Path, report: &mut StageReport) -> Result<()> {
        let entries = read_object(source)?;
        report.read = entries.len();
        if entries.is_empty() {
            return Ok(());
        }

        let tx = store.transaction()?;
        for (key, value) in &entries {
            upsert_setting(&tx, key, value)?;
            report.written += 1;
        }
        tx.commit()?;
        Ok(())
    }
}

/// `faq/faq.json` into `faq`
pub struct FaqMigrator;

impl Migrator for FaqMigrator {
    fn stage(&self) -> Stage {
        Stage::Faq
    }

    fn migrate(&self, store: &Store, source: &Path, report: &mut StageReport) -> Result<()> {
        let records = parse_records(source, report, |f: &Faq| f.id.clone())?;
        if records.is_empty() {
            return Ok(());
        }

        let tx = store.transaction()?;
        for (id, mut faq) in records {
            faq.id = id;
            upsert_faq(&tx, &faq)?;
            report.written += 1;
        }
        tx.commit()?;
        Ok(())
    }
}

/// `promocodes/promocodes.json` into `promo_codes`.
///
/// Records without an id are keyed by their code. Codes compare
/// case-insensitively; a code already held by another record skips this one.
pub struct PromoCodesMigrator;

impl Migrator for PromoCodesMigrator {
    fn stage(&self) -> Stage {
        Stage::PromoCodes
    }

    fn migrate(&self, store: &Store, source: &Path, report: &mut StageReport) -> Result<()> {
        let records = parse_records(source, report, PromoCode::id_or_code)?;
        if records.is_empty() {
            return Ok(());
        }

        let tx = store.transaction()?;
        let services = load_ids(&tx, "services")?;
        let specialists = load_ids(&tx, "specialists")?;

        let batch: HashSet<&str> = records.iter().map(|(id, _)| id.as_str()).collect();
        let stored_codes = stored_values(&tx, "promo_codes", "code", &batch)?;
        release_unique(&tx, "promo_codes", "code = 'migrating:' || id", batch.iter().copied())?;
        let mut codes = UniqueClaims::load(&tx, "promo_codes", "code", &batch, uppercase)?;

        let mut skipped = Vec::new();
        for (id, mut promo) in records {
            let code = promo.normalized_code();
            if code.is_empty() {
                report.skip(&id, "promo code is empty");
                skipped.push(id);
                continue;
            }
            if !codes.claim(&code, &id) {
                report.skip(&id, format!("code {} is already taken", code));
                skipped.push(id);
                continue;
            }
            null_if_missing(report, &id, "serviceId", &mut promo.service_id, &services);
            null_if_missing(report, &id, "specialistId", &mut promo.specialist_id, &specialists);

            upsert_promo_code(&tx, &id, &promo)?;
            report.written += 1;
        }

        for id in skipped {
            let Some(old) = stored_codes.get(&id) else {
                continue;
            };
            if codes.claim(old, &id) {
                tx.execute("UPDATE promo_codes SET code = ?2 WHERE id = ?1", [&id, old])?;
            } else {
                tracing::warn!("promo code {} keeps placeholder code migrating:{}", id, id);
            }
        }

        tx.commit()?;
        Ok(())
    }
}
