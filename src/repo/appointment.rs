//! Appointment repository

use rusqlite::{Connection, OptionalExtension, params};

use super::{ColumnUpdates, Repository, delete_by_id, exists, id_or_new};
use crate::model::{Appointment, AppointmentPatch, AppointmentStatus};
use crate::storage::Store;
use crate::{Error, Result};

const APPOINTMENT_COLUMNS: &str = "id, user_id, specialist_id, service_id, date, start_time, end_time, \
     status, price, client_name, client_phone, client_email, comment, promo_code, discount_amount, \
     bonus_used, created_at, updated_at";

pub(crate) const UPSERT_APPOINTMENT: &str = r#"
INSERT INTO appointments (id, user_id, specialist_id, service_id, date, start_time, end_time,
                          status, price, client_name, client_phone, client_email, comment,
                          promo_code, discount_amount, bonus_used, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
ON CONFLICT(id) DO UPDATE SET
    user_id = excluded.user_id,
    specialist_id = excluded.specialist_id,
    service_id = excluded.service_id,
    date = excluded.date,
    start_time = excluded.start_time,
    end_time = excluded.end_time,
    status = excluded.status,
    price = excluded.price,
    client_name = excluded.client_name,
    client_phone = excluded.client_phone,
    client_email = excluded.client_email,
    comment = excluded.comment,
    promo_code = excluded.promo_code,
    discount_amount = excluded.discount_amount,
    bonus_used = excluded.bonus_used,
    created_at = excluded.created_at,
    updated_at = excluded.updated_at
"#;

pub(crate) fn upsert_row(conn: &Connection, a: &Appointment) -> Result<()> {
    conn.prepare_cached(UPSERT_APPOINTMENT)?.execute(params![
        a.id,
        a.user_id,
        a.specialist_id,
        a.service_id,
        a.date,
        a.start_time,
        a.end_time,
        a.status,
        a.price,
        a.client_name,
        a.client_phone,
        a.client_email,
        a.comment,
        a.promo_code,
        a.discount_amount,
        a.bonus_used,
        a.created_at,
        a.updated_at,
    ])?;
    Ok(())
}

fn row_to_appointment(row: &rusqlite::Row) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: row.get(0)?,
        user_id: row.get(1)?,
        specialist_id: row.get(2)?,
        service_id: row.get(3)?,
        date: row.get(4)?,
        start_time: row.get(5)?,
        end_time: row.get(6)?,
        status: row.get(7)?,
        price: row.get(8)?,
        client_name: row.get(9)?,
        client_phone: row.get(10)?,
        client_email: row.get(11)?,
        comment: row.get(12)?,
        promo_code: row.get(13)?,
        discount_amount: row.get(14)?,
        bonus_used: row.get(15)?,
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    })
}

pub struct AppointmentRepo<'a> {
    store: &'a Store,
}

impl<'a> AppointmentRepo<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    fn conn(&self) -> &Connection {
        self.store.conn()
    }

    fn query(&self, filter: &str, param: Option<&str>) -> Result<Vec<Appointment>> {
        let sql = format!(
            "SELECT {} FROM appointments {} ORDER BY date, start_time, id",
            APPOINTMENT_COLUMNS, filter
        );
        let mut stmt = self.conn().prepare_cached(&sql)?;
        let rows = match param {
            Some(p) => stmt.query_map([p], row_to_appointment)?.collect::<std::result::Result<Vec<_>, _>>()?,
            None => stmt.query_map([], row_to_appointment)?.collect::<std::result::Result<Vec<_>, _>>()?,
        };
        Ok(rows)
    }

    pub fn get_by_user_id(&self, user_id: &str) -> Result<Vec<Appointment>> {
        self.query("WHERE user_id = ?1", Some(user_id))
    }

    pub fn get_by_specialist_id(&self, specialist_id: &str) -> Result<Vec<Appointment>> {
        self.query("WHERE specialist_id = ?1", Some(specialist_id))
    }

    /// A specialist's bookings on one day that still occupy the calendar
    pub fn get_active_for_day(&self, specialist_id: &str, date: &str) -> Result<Vec<Appointment>> {
        let sql = format!(
            "SELECT {} FROM appointments WHERE specialist_id = ?1 AND date = ?2 \
             AND status IN ('pending', 'confirmed') ORDER BY start_time, id",
            APPOINTMENT_COLUMNS
        );
        let rows = self
            .conn()
            .prepare_cached(&sql)?
            .query_map(params![specialist_id, date], row_to_appointment)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get_by_status(&self, status: AppointmentStatus) -> Result<Vec<Appointment>> {
        self.query("WHERE status = ?1", Some(status.as_str()))
    }

    pub fn set_status(&self, id: &str, status: AppointmentStatus) -> Result<bool> {
        let changed = self.conn().execute(
            "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status, crate::model::now(), id],
        )?;
        Ok(changed > 0)
    }
}

impl Repository for AppointmentRepo<'_> {
    type Entity = Appointment;
    type Patch = AppointmentPatch;

    fn get_all(&self) -> Result<Vec<Appointment>> {
        self.query("", None)
    }

    fn get_by_id(&self, id: &str) -> Result<Option<Appointment>> {
        let sql = format!("SELECT {} FROM appointments WHERE id = ?1", APPOINTMENT_COLUMNS);
        Ok(self
            .conn()
            .prepare_cached(&sql)?
            .query_row([id], row_to_appointment)
            .optional()?)
    }

    fn create(&self, mut appointment: Appointment) -> Result<Appointment> {
        appointment.id = id_or_new(&appointment.id);
        if !exists(self.conn(), "specialists", &appointment.specialist_id)? {
            return Err(Error::NotFound(format!("specialist {}", appointment.specialist_id)));
        }
        if exists(self.conn(), "appointments", &appointment.id)? {
            return Err(Error::Invalid(format!("appointment {} already exists", appointment.id)));
        }
        let now = crate::model::now();
        appointment.created_at.get_or_insert_with(|| now.clone());
        appointment.updated_at = Some(now);

        upsert_row(self.conn(), &appointment)?;
        tracing::debug!("Created appointment {}", appointment.id);
        Ok(appointment)
    }

    fn update(&self, id: &str, patch: AppointmentPatch) -> Result<Option<Appointment>> {
        if !exists(self.conn(), "appointments", id)? {
            return Ok(None);
        }
        let mut updates = ColumnUpdates::new();
        updates
            .set("user_id", patch.user_id)
            .set("service_id", patch.service_id)
            .set("date", patch.date)
            .set("start_time", patch.start_time)
            .set("end_time", patch.end_time)
            .set("status", patch.status)
            .set("price", patch.price)
            .set("client_name", patch.client_name)
            .set("client_phone", patch.client_phone)
            .set("client_email", patch.client_email)
            .set("comment", patch.comment)
            .set("promo_code", patch.promo_code)
            .set("discount_amount", patch.discount_amount)
            .set("bonus_used", patch.bonus_used);
        if !updates.is_empty() {
            updates.set("updated_at", Some(crate::model::now()));
        }
        updates.apply(self.conn(), "appointments", id)?;
        self.get_by_id(id)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        delete_by_id(self.conn(), "appointments", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(store: &Store) {
        store
            .conn()
            .execute_batch(
                "INSERT INTO users (id) VALUES ('u1');
                 INSERT INTO specialists (id, first_name) VALUES ('s1', 'Anna');
                 INSERT INTO services (id, name) VALUES ('svc1', 'Massage');",
            )
            .unwrap();
    }

    fn appointment(id: &str, date: &str, start: &str) -> Appointment {
        Appointment {
            id: id.into(),
            user_id: Some("u1".into()),
            specialist_id: "s1".into(),
            service_id: Some("svc1".into()),
            date: date.into(),
            start_time: start.into(),
            end_time: "23:00".into(),
            price: 3000.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_create_requires_specialist() {
        let store = Store::open_in_memory().unwrap();
        seed(&store);
        let mut orphan = appointment("a1", "2024-05-01", "10:00");
        orphan.specialist_id = "ghost".into();
        assert!(matches!(store.appointments().create(orphan), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_status_queries() {
        let store = Store::open_in_memory().unwrap();
        seed(&store);
        let repo = store.appointments();
        repo.create(appointment("a1", "2024-05-01", "12:00")).unwrap();
        repo.create(appointment("a2", "2024-05-01", "10:00")).unwrap();
        repo.create(appointment("a3", "2024-05-02", "10:00")).unwrap();

        assert!(repo.set_status("a1", AppointmentStatus::Cancelled).unwrap());
        let day = repo.get_active_for_day("s1", "2024-05-01").unwrap();
        assert_eq!(day.len(), 1);
        assert_eq!(day[0].id, "a2");
        assert_eq!(repo.get_by_status(AppointmentStatus::Cancelled).unwrap().len(), 1);

        let mine: Vec<String> = repo.get_by_user_id("u1").unwrap().into_iter().map(|a| a.id).collect();
        assert_eq!(mine, vec!["a2", "a1", "a3"]);
    }

    #[test]
    fn test_service_delete_clears_reference() {
        let store = Store::open_in_memory().unwrap();
        seed(&store);
        store.appointments().create(appointment("a1", "2024-05-01", "10:00")).unwrap();
        store.services().delete("svc1").unwrap();

        let loaded = store.appointments().get_by_id("a1").unwrap().unwrap();
        assert!(loaded.service_id.is_none());
    }

    #[test]
    fn test_update_patch() {
        let store = Store::open_in_memory().unwrap();
        seed(&store);
        store.appointments().create(appointment("a1", "2024-05-01", "10:00")).unwrap();
        let patch = AppointmentPatch {
            comment: Some(Some("Bring a towel".into())),
            status: Some(AppointmentStatus::Confirmed),
            ..Default::default()
        };
        let updated = store.appointments().update("a1", patch).unwrap().unwrap();
        assert_eq!(updated.status, AppointmentStatus::Confirmed);
        assert_eq!(updated.comment.as_deref(), Some("Bring a towel"));
        assert_eq!(updated.price, 3000.0);
    }
}
