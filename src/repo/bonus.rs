//! Bonus ledger repository
//!
//! Transactions are append-only; there is no patch type beyond status.

use rusqlite::{Connection, OptionalExtension, params};

use super::{Repository, delete_by_id, exists, id_or_new};
use crate::model::{BonusStatus, BonusTransaction};
use crate::storage::Store;
use crate::{Error, Result};

const BONUS_COLUMNS: &str =
    "id, user_id, amount, type, status, appointment_id, referred_user_id, description, created_at";

pub(crate) const UPSERT_BONUS: &str = r#"
INSERT INTO bonus_transactions (id, user_id, amount, type, status, appointment_id,
                                referred_user_id, description, created_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
ON CONFLICT(id) DO UPDATE SET
    user_id = excluded.user_id,
    amount = excluded.amount,
    type = excluded.type,
    status = excluded.status,
    appointment_id = excluded.appointment_id,
    referred_user_id = excluded.referred_user_id,
    description = excluded.description,
    created_at = excluded.created_at
"#;

pub(crate) fn upsert_row(conn: &Connection, t: &BonusTransaction) -> Result<()> {
    conn.prepare_cached(UPSERT_BONUS)?.execute(params![
        t.id,
        t.user_id,
        t.amount,
        t.kind,
        t.status,
        t.appointment_id,
        t.referred_user_id,
        t.description,
        t.created_at,
    ])?;
    Ok(())
}

fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<BonusTransaction> {
    Ok(BonusTransaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        amount: row.get(2)?,
        kind: row.get(3)?,
        status: row.get(4)?,
        appointment_id: row.get(5)?,
        referred_user_id: row.get(6)?,
        description: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Status-only change for a ledger entry
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BonusPatch {
    pub status: Option<BonusStatus>,
    pub description: Option<String>,
}

pub struct BonusRepo<'a> {
    store: &'a Store,
}

impl<'a> BonusRepo<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    fn conn(&self) -> &Connection {
        self.store.conn()
    }

    /// A user's ledger, newest first
    pub fn get_by_user_id(&self, user_id: &str) -> Result<Vec<BonusTransaction>> {
        let sql = format!(
            "SELECT {} FROM bonus_transactions WHERE user_id = ?1 ORDER BY created_at DESC, id",
            BONUS_COLUMNS
        );
        let rows = self
            .conn()
            .prepare_cached(&sql)?
            .query_map([user_id], row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Sum of completed transactions for a user
    pub fn completed_total(&self, user_id: &str) -> Result<f64> {
        let total: f64 = self.conn().query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM bonus_transactions WHERE user_id = ?1 AND status = 'completed'",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }
}

impl Repository for BonusRepo<'_> {
    type Entity = BonusTransaction;
    type Patch = BonusPatch;

    fn get_all(&self) -> Result<Vec<BonusTransaction>> {
        let sql = format!(
            "SELECT {} FROM bonus_transactions ORDER BY created_at DESC, id",
            BONUS_COLUMNS
        );
        let rows = self
            .conn()
            .prepare_cached(&sql)?
            .query_map([], row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn get_by_id(&self, id: &str) -> Result<Option<BonusTransaction>> {
        let sql = format!("SELECT {} FROM bonus_transactions WHERE id = ?1", BONUS_COLUMNS);
        Ok(self
            .conn()
            .prepare_cached(&sql)?
            .query_row([id], row_to_transaction)
            .optional()?)
    }

    fn create(&self, mut transaction: BonusTransaction) -> Result<BonusTransaction> {
        transaction.id = id_or_new(&transaction.id);
        if !exists(self.conn(), "users", &transaction.user_id)? {
            return Err(Error::NotFound(format!("user {}", transaction.user_id)));
        }
        if exists(self.conn(), "bonus_transactions", &transaction.id)? {
            return Err(Error::Invalid(format!("transaction {} already exists", transaction.id)));
        }
        transaction.created_at.get_or_insert_with(crate::model::now);
        upsert_row(self.conn(), &transaction)?;
        Ok(transaction)
    }

    fn update(&self, id: &str, patch: BonusPatch) -> Result<Option<BonusTransaction>> {
        if !exists(self.conn(), "bonus_transactions", id)? {
            return Ok(None);
        }
        let mut updates = super::ColumnUpdates::new();
        updates
            .set("status", patch.status)
            .set("description", patch.description);
        updates.apply(self.conn(), "bonus_transactions", id)?;
        self.get_by_id(id)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        delete_by_id(self.conn(), "bonus_transactions", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, amount: f64, status: BonusStatus) -> BonusTransaction {
        BonusTransaction {
            id: id.into(),
            user_id: "u1".into(),
            amount,
            kind: "referral".into(),
            status,
            ..Default::default()
        }
    }

    #[test]
    fn test_ledger_totals() {
        let store = Store::open_in_memory().unwrap();
        store.conn().execute("INSERT INTO users (id) VALUES ('u1')", []).unwrap();
        let repo = store.bonuses();
        repo.create(entry("b1", 100.0, BonusStatus::Completed)).unwrap();
        repo.create(entry("b2", -30.0, BonusStatus::Completed)).unwrap();
        repo.create(entry("b3", 500.0, BonusStatus::Pending)).unwrap();

        assert_eq!(repo.completed_total("u1").unwrap(), 70.0);
        assert_eq!(repo.get_by_user_id("u1").unwrap().len(), 3);

        let patch = BonusPatch {
            status: Some(BonusStatus::Completed),
            ..Default::default()
        };
        repo.update("b3", patch).unwrap().unwrap();
        assert_eq!(repo.completed_total("u1").unwrap(), 570.0);
    }

    #[test]
    fn test_unknown_user_rejected() {
        let store = Store::open_in_memory().unwrap();
        let result = store.bonuses().create(entry("b1", 10.0, BonusStatus::Completed));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
