use std::path::Path;

use super::null_if_missing;
use crate::migrate::source::parse_records;
use crate::migrate::{Migrator, Stage, StageReport};
use crate::model::BonusTransaction;
use crate::repo::bonus::upsert_row;
use crate::storage::{Store, load_ids};
use crate::Result;

/// `bonuses/transactions.json` into `bonus_transactions`
pub struct BonusTransactionsMigrator;

impl Migrator for BonusTransactionsMigrator {
    fn stage(&self) -> Stage {
        Stage::BonusTransactions
    }

    fn migrate(&self, store: &Store, source: &Path, report: &mut StageReport) -> Result<()> {
        let records = parse_records(source, report, |t: &BonusTransaction| t.id.clone())?;
        if records.is_empty() {
            return Ok(());
        }

        let tx = store.transaction()?;
        let users = load_ids(&tx, "users")?;
        let appointments = load_ids(&tx, "appointments")?;

        for (id, mut transaction) in records {
            transaction.id = id;
            if !users.contains(&transaction.user_id) {
                report.skip(&transaction.id, format!("user {} does not exist", transaction.user_id));
                continue;
            }
            null_if_missing(
                report,
                &transaction.id,
                "appointmentId",
                &mut transaction.appointment_id,
                &appointments,
            );
            null_if_missing(
                report,
                &transaction.id,
                "referredUserId",
                &mut transaction.referred_user_id,
                &users,
            );

            upsert_row(&tx, &transaction)?;
            report.written += 1;
        }

        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_owner_required() {
        let store = Store::open_in_memory().unwrap();
        store.conn().execute_batch("INSERT INTO users (id) VALUES ('u1');").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transactions.json");
        fs::write(
            &path,
            r#"[
                {"id": "b1", "userId": "u1", "amount": "150", "type": "referral", "status": "completed",
                 "referredUserId": "u404", "appointmentId": "a404"},
                {"id": "b2", "userId": "u404", "amount": 10}
            ]"#,
        )
        .unwrap();

        let mut report = StageReport::new(Stage::BonusTransactions, &path);
        BonusTransactionsMigrator.migrate(&store, &path, &mut report).unwrap();

        assert_eq!(report.written, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.for_record("b1").count(), 2);
        assert_eq!(store.bonuses().completed_total("u1").unwrap(), 150.0);
    }
}
