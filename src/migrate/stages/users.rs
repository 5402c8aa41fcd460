use std::collections::HashSet;
use std::path::Path;

use super::{UniqueClaims, lowercase, null_if_missing, release_unique};
use crate::migrate::source::parse_records;
use crate::migrate::{Migrator, Stage, StageReport};
use crate::model::User;
use crate::repo::user::upsert_row;
use crate::storage::{Store, load_ids};
use crate::Result;

/// `users/users.json` into `users`.
///
/// Referrers may appear later in the file than the users they referred, so
/// foreign keys are checked at commit rather than per row.
pub struct UsersMigrator;

impl Migrator for UsersMigrator {
    fn stage(&self) -> Stage {
        Stage::Users
    }

    fn migrate(&self, store: &Store, source: &Path, report: &mut StageReport) -> Result<()> {
        let records = parse_records(source, report, |u: &User| u.id.clone())?;
        if records.is_empty() {
            return Ok(());
        }

        let tx = store.transaction()?;
        tx.pragma_update(None, "defer_foreign_keys", true)?;

        let batch: HashSet<&str> = records.iter().map(|(id, _)| id.as_str()).collect();
        let existing = load_ids(&tx, "users")?;
        let mut known = existing.clone();
        known.extend(batch.iter().map(|id| id.to_string()));

        release_unique(
            &tx,
            "users",
            "email = NULL, referral_code = NULL",
            batch.iter().copied().filter(|id| existing.contains(*id)),
        )?;
        let mut emails = UniqueClaims::load(&tx, "users", "email", &batch, lowercase)?;
        let mut codes = UniqueClaims::load(&tx, "users", "referral_code", &batch, lowercase)?;

        for (id, mut user) in records {
            user.id = id;

            if let Some(email) = user.email.take_if(|e| e.trim().is_empty() || !emails.claim(e, &user.id)) {
                if !email.trim().is_empty() {
                    report.duplicate(&user.id, "email", email);
                }
            }
            if let Some(code) = user
                .referral_code
                .take_if(|c| c.trim().is_empty() || !codes.claim(c, &user.id))
            {
                if !code.trim().is_empty() {
                    report.duplicate(&user.id, "referralCode", code);
                }
            }
            null_if_missing(report, &user.id, "referredBy", &mut user.referred_by, &known);
            user.normalize_roles();

            upsert_row(&tx, &user)?;
            report.written += 1;
        }

        tx.commit()?;
        Ok(())
    }
}
