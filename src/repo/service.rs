//! Service repository

use rusqlite::{Connection, OptionalExtension, params};

use super::{ColumnUpdates, Repository, delete_by_id, exists, id_or_new};
use crate::model::{Service, ServicePatch};
use crate::storage::Store;
use crate::{Error, Result};

const SERVICE_COLUMNS: &str =
    "id, name, description, price, duration, color, display_order, is_archived, created_at, updated_at";

pub(crate) const UPSERT_SERVICE: &str = r#"
INSERT INTO services (id, name, description, price, duration, color, display_order,
                      is_archived, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
ON CONFLICT(id) DO UPDATE SET
    name = excluded.name,
    description = excluded.description,
    price = excluded.price,
    duration = excluded.duration,
    color = excluded.color,
    display_order = excluded.display_order,
    is_archived = excluded.is_archived,
    created_at = excluded.created_at,
    updated_at = excluded.updated_at
"#;

pub(crate) fn upsert_row(conn: &Connection, s: &Service) -> Result<()> {
    conn.prepare_cached(UPSERT_SERVICE)?.execute(params![
        s.id,
        s.name,
        s.description,
        s.price,
        s.duration,
        s.color,
        s.order,
        s.is_archived,
        s.created_at,
        s.updated_at,
    ])?;
    Ok(())
}

fn row_to_service(row: &rusqlite::Row) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        duration: row.get(4)?,
        color: row.get(5)?,
        order: row.get(6)?,
        is_archived: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

pub struct ServiceRepo<'a> {
    store: &'a Store,
}

impl<'a> ServiceRepo<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    fn conn(&self) -> &Connection {
        self.store.conn()
    }

    fn query(&self, sql: &str, param: Option<&str>) -> Result<Vec<Service>> {
        let mut stmt = self.conn().prepare_cached(sql)?;
        let rows = match param {
            Some(p) => stmt.query_map([p], row_to_service)?.collect::<std::result::Result<Vec<_>, _>>()?,
            None => stmt.query_map([], row_to_service)?.collect::<std::result::Result<Vec<_>, _>>()?,
        };
        Ok(rows)
    }

    /// Services that are not archived, in display order
    pub fn get_active(&self) -> Result<Vec<Service>> {
        let sql = format!(
            "SELECT {} FROM services WHERE is_archived = 0 ORDER BY display_order, name, id",
            SERVICE_COLUMNS
        );
        self.query(&sql, None)
    }

    /// Services a specialist offers
    pub fn get_by_specialist_id(&self, specialist_id: &str) -> Result<Vec<Service>> {
        let columns = SERVICE_COLUMNS
            .split(", ")
            .map(|c| format!("s.{}", c))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {} FROM services s JOIN specialist_services ss ON ss.service_id = s.id \
             WHERE ss.specialist_id = ?1 ORDER BY s.display_order, s.name, s.id",
            columns
        );
        self.query(&sql, Some(specialist_id))
    }

    /// Give each listed id its index as display order; unlisted services
    /// keep theirs.
    pub fn set_order<S: AsRef<str>>(&self, ids: &[S]) -> Result<usize> {
        let tx = self.store.transaction()?;
        let mut updated = 0;
        {
            let mut stmt = tx.prepare_cached("UPDATE services SET display_order = ?1 WHERE id = ?2")?;
            for (index, id) in ids.iter().enumerate() {
                updated += stmt.execute(params![index as i64, id.as_ref()])?;
            }
        }
        tx.commit()?;
        Ok(updated)
    }

    /// Archived services stay linked to past appointments but are hidden
    /// from booking.
    pub fn set_archived(&self, id: &str, archived: bool) -> Result<bool> {
        let changed = self.conn().execute(
            "UPDATE services SET is_archived = ?1, updated_at = ?2 WHERE id = ?3",
            params![archived, crate::model::now(), id],
        )?;
        Ok(changed > 0)
    }
}

impl Repository for ServiceRepo<'_> {
    type Entity = Service;
    type Patch = ServicePatch;

    fn get_all(&self) -> Result<Vec<Service>> {
        let sql = format!(
            "SELECT {} FROM services ORDER BY display_order, name, id",
            SERVICE_COLUMNS
        );
        self.query(&sql, None)
    }

    fn get_by_id(&self, id: &str) -> Result<Option<Service>> {
        let sql = format!("SELECT {} FROM services WHERE id = ?1", SERVICE_COLUMNS);
        Ok(self
            .conn()
            .prepare_cached(&sql)?
            .query_row([id], row_to_service)
            .optional()?)
    }

    fn create(&self, mut service: Service) -> Result<Service> {
        service.id = id_or_new(&service.id);
        if service.name.trim().is_empty() {
            return Err(Error::Invalid("service name is required".into()));
        }
        if exists(self.conn(), "services", &service.id)? {
            return Err(Error::Invalid(format!("service {} already exists", service.id)));
        }
        service.order = self.conn().query_row(
            "SELECT COALESCE(MAX(display_order) + 1, 0) FROM services",
            [],
            |row| row.get(0),
        )?;
        let now = crate::model::now();
        service.created_at = Some(now.clone());
        service.updated_at = Some(now);

        upsert_row(self.conn(), &service)?;
        Ok(service)
    }

    fn update(&self, id: &str, patch: ServicePatch) -> Result<Option<Service>> {
        if !exists(self.conn(), "services", id)? {
            return Ok(None);
        }
        let mut updates = ColumnUpdates::new();
        updates
            .set("name", patch.name)
            .set("description", patch.description)
            .set("price", patch.price)
            .set("duration", patch.duration)
            .set("color", patch.color)
            .set("display_order", patch.order)
            .set("is_archived", patch.is_archived);
        if !updates.is_empty() {
            updates.set("updated_at", Some(crate::model::now()));
        }
        updates.apply(self.conn(), "services", id)?;
        self.get_by_id(id)
    }

    /// Links to specialists go with the service; appointments keep their
    /// row with `service_id` cleared.
    fn delete(&self, id: &str) -> Result<bool> {
        delete_by_id(self.conn(), "services", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(id: &str, name: &str) -> Service {
        Service {
            id: id.into(),
            name: name.into(),
            price: 3000.0,
            duration: 60,
            ..Default::default()
        }
    }

    #[test]
    fn test_create_appends_order() {
        let store = Store::open_in_memory().unwrap();
        let first = store.services().create(service("a", "Massage")).unwrap();
        let second = store.services().create(service("b", "Yoga")).unwrap();
        assert_eq!((first.order, second.order), (0, 1));
        assert!(store.services().create(service("c", "  ")).is_err());
    }

    #[test]
    fn test_active_and_archived() {
        let store = Store::open_in_memory().unwrap();
        store.services().create(service("a", "Massage")).unwrap();
        store.services().create(service("b", "Yoga")).unwrap();
        assert!(store.services().set_archived("a", true).unwrap());

        let active = store.services().get_active().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "b");
        assert_eq!(store.services().get_all().unwrap().len(), 2);
    }

    #[test]
    fn test_by_specialist_and_delete() {
        let store = Store::open_in_memory().unwrap();
        store.services().create(service("a", "Massage")).unwrap();
        store.services().create(service("b", "Yoga")).unwrap();
        store
            .conn()
            .execute_batch(
                "INSERT INTO specialists (id, first_name) VALUES ('s1', 'Anna');
                 INSERT INTO specialist_services (specialist_id, service_id) VALUES ('s1', 'b');",
            )
            .unwrap();

        let offered = store.services().get_by_specialist_id("s1").unwrap();
        assert_eq!(offered.len(), 1);
        assert_eq!(offered[0].name, "Yoga");

        assert!(store.services().delete("b").unwrap());
        assert_eq!(store.count("specialist_services").unwrap(), 0);
    }

    #[test]
    fn test_update_and_reorder() {
        let store = Store::open_in_memory().unwrap();
        store.services().create(service("a", "Massage")).unwrap();
        store.services().create(service("b", "Yoga")).unwrap();

        let updated = store
            .services()
            .update("a", ServicePatch { price: Some(3500.0), ..Default::default() })
            .unwrap()
            .unwrap();
        assert_eq!(updated.price, 3500.0);
        assert_eq!(updated.name, "Massage");

        store.services().set_order(&["b", "a"]).unwrap();
        let ids: Vec<String> = store.services().get_all().unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }
}
