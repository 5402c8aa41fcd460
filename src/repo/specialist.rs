//! Specialist repository
//!
//! Hydration issues one query for the root row and one per child collection
//! (positions, documents, schedule, the schedule's days, each day's lunch
//! breaks, vacations, linked services). Joining everything at once would fan
//! out rows across the independent one-to-many collections.

use rusqlite::{Connection, OptionalExtension, params};

use super::{ColumnUpdates, Repository, delete_by_id, exists, id_or_new, matches_query};
use crate::model::{FileRef, LunchBreak, Specialist, SpecialistPatch, Vacation, WorkDay, WorkSchedule};
use crate::storage::Store;
use crate::{Error, Result};

const SPECIALIST_COLUMNS: &str = "id, first_name, last_name, middle_name, photo, description, position, \
     experience, display_order, user_id, created_at, updated_at";

pub(crate) const UPSERT_SPECIALIST: &str = r#"
INSERT INTO specialists (id, first_name, last_name, middle_name, photo, description, position,
                         experience, display_order, user_id, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
ON CONFLICT(id) DO UPDATE SET
    first_name = excluded.first_name,
    last_name = excluded.last_name,
    middle_name = excluded.middle_name,
    photo = excluded.photo,
    description = excluded.description,
    position = excluded.position,
    experience = excluded.experience,
    display_order = excluded.display_order,
    user_id = excluded.user_id,
    created_at = excluded.created_at,
    updated_at = excluded.updated_at
"#;

/// Insert or overwrite the root row only
pub(crate) fn upsert_row(conn: &Connection, s: &Specialist) -> Result<()> {
    conn.prepare_cached(UPSERT_SPECIALIST)?.execute(params![
        s.id,
        s.first_name,
        s.last_name,
        s.middle_name,
        s.photo,
        s.description,
        s.position,
        s.experience,
        s.order,
        s.user_id,
        s.created_at,
        s.updated_at,
    ])?;
    Ok(())
}

pub(crate) fn replace_positions(conn: &Connection, specialist_id: &str, positions: &[&str]) -> Result<()> {
    conn.prepare_cached("DELETE FROM specialist_positions WHERE specialist_id = ?1")?
        .execute([specialist_id])?;
    let mut insert = conn.prepare_cached(
        "INSERT OR IGNORE INTO specialist_positions (specialist_id, position) VALUES (?1, ?2)",
    )?;
    for position in positions {
        insert.execute(params![specialist_id, position])?;
    }
    Ok(())
}

pub(crate) fn replace_documents(conn: &Connection, specialist_id: &str, documents: &[FileRef]) -> Result<()> {
    conn.prepare_cached("DELETE FROM specialist_documents WHERE specialist_id = ?1")?
        .execute([specialist_id])?;
    let mut insert = conn.prepare_cached(
        "INSERT INTO specialist_documents (specialist_id, path, name, type) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for doc in documents.iter().filter(|d| !d.path.trim().is_empty()) {
        insert.execute(params![specialist_id, doc.path, doc.name, doc.file_type])?;
    }
    Ok(())
}

/// Drop the specialist's schedule tree, bottom-up
fn delete_schedule(conn: &Connection, specialist_id: &str) -> Result<()> {
    let schedule_id: Option<String> = conn
        .prepare_cached("SELECT id FROM work_schedules WHERE specialist_id = ?1")?
        .query_row([specialist_id], |row| row.get(0))
        .optional()?;
    let Some(schedule_id) = schedule_id else {
        return Ok(());
    };

    conn.prepare_cached(
        "DELETE FROM lunch_breaks WHERE work_day_id IN (SELECT id FROM work_days WHERE schedule_id = ?1)",
    )?
    .execute([&schedule_id])?;
    conn.prepare_cached("DELETE FROM work_days WHERE schedule_id = ?1")?
        .execute([&schedule_id])?;
    conn.prepare_cached("DELETE FROM vacations WHERE schedule_id = ?1")?
        .execute([&schedule_id])?;
    conn.prepare_cached("DELETE FROM work_schedules WHERE id = ?1")?
        .execute([&schedule_id])?;
    Ok(())
}

/// Replace the whole schedule tree. `schedule` must already be validated
/// (days within 0..6, no duplicates).
pub(crate) fn replace_schedule(
    conn: &Connection,
    specialist_id: &str,
    schedule: Option<&WorkSchedule>,
) -> Result<()> {
    delete_schedule(conn, specialist_id)?;
    let Some(schedule) = schedule else {
        return Ok(());
    };

    let schedule_id = schedule.id_for(specialist_id);
    conn.prepare_cached("INSERT INTO work_schedules (id, specialist_id, enabled) VALUES (?1, ?2, ?3)")?
        .execute(params![schedule_id, specialist_id, schedule.enabled])?;

    let mut insert_day = conn.prepare_cached(
        "INSERT INTO work_days (schedule_id, day, active, start_time, end_time) VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    let mut insert_break = conn.prepare_cached(
        "INSERT INTO lunch_breaks (work_day_id, enabled, start_time, end_time) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for day in &schedule.work_days {
        insert_day.execute(params![schedule_id, day.day, day.active, day.start_time, day.end_time])?;
        let day_id = conn.last_insert_rowid();
        for lunch in &day.lunch_breaks {
            insert_break.execute(params![day_id, lunch.enabled, lunch.start_time, lunch.end_time])?;
        }
    }

    let mut insert_vacation = conn.prepare_cached(
        "INSERT INTO vacations (schedule_id, enabled, start_date, end_date) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for vacation in &schedule.vacations {
        insert_vacation.execute(params![
            schedule_id,
            vacation.enabled,
            vacation.start_date,
            vacation.end_date
        ])?;
    }
    Ok(())
}

pub(crate) fn replace_service_links(conn: &Connection, specialist_id: &str, service_ids: &[String]) -> Result<()> {
    conn.prepare_cached("DELETE FROM specialist_services WHERE specialist_id = ?1")?
        .execute([specialist_id])?;
    let mut insert = conn.prepare_cached(
        "INSERT OR IGNORE INTO specialist_services (specialist_id, service_id) VALUES (?1, ?2)",
    )?;
    for service_id in service_ids {
        insert.execute(params![specialist_id, service_id])?;
    }
    Ok(())
}

fn row_to_specialist(row: &rusqlite::Row) -> rusqlite::Result<Specialist> {
    Ok(Specialist {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        middle_name: row.get(3)?,
        photo: row.get(4)?,
        description: row.get(5)?,
        position: row.get(6)?,
        experience: row.get(7)?,
        order: row.get(8)?,
        user_id: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
        ..Default::default()
    })
}

/// Specialist repository
pub struct SpecialistRepo<'a> {
    store: &'a Store,
}

impl<'a> SpecialistRepo<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    fn conn(&self) -> &Connection {
        self.store.conn()
    }

    /// Fill in every child collection of a root row.
    ///
    /// The reads are not wrapped in a transaction; a concurrent writer can
    /// make the collections momentarily disagree with each other.
    pub fn hydrate(&self, mut specialist: Specialist) -> Result<Specialist> {
        let conn = self.conn();
        let id = specialist.id.clone();

        specialist.additional_positions = conn
            .prepare_cached("SELECT position FROM specialist_positions WHERE specialist_id = ?1 ORDER BY rowid")?
            .query_map([&id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        specialist.documents = conn
            .prepare_cached("SELECT path, name, type FROM specialist_documents WHERE specialist_id = ?1 ORDER BY id")?
            .query_map([&id], |row| {
                Ok(FileRef {
                    path: row.get(0)?,
                    name: row.get(1)?,
                    file_type: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        specialist.work_schedule = self.load_schedule(&id)?;

        specialist.services = conn
            .prepare_cached("SELECT service_id FROM specialist_services WHERE specialist_id = ?1 ORDER BY rowid")?
            .query_map([&id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        specialist.photo = specialist
            .photo
            .as_deref()
            .map(|photo| self.store.media().resolve_image(photo));

        Ok(specialist)
    }

    fn load_schedule(&self, specialist_id: &str) -> Result<Option<WorkSchedule>> {
        let conn = self.conn();
        let schedule = conn
            .prepare_cached("SELECT id, enabled FROM work_schedules WHERE specialist_id = ?1")?
            .query_row([specialist_id], |row| {
                Ok(WorkSchedule {
                    id: row.get(0)?,
                    enabled: row.get(1)?,
                    ..Default::default()
                })
            })
            .optional()?;
        let Some(mut schedule) = schedule else {
            return Ok(None);
        };

        let days = conn
            .prepare_cached(
                "SELECT id, day, active, start_time, end_time FROM work_days WHERE schedule_id = ?1 ORDER BY day",
            )?
            .query_map([&schedule.id], |row| {
                let day_id: i64 = row.get(0)?;
                let day = WorkDay {
                    day: row.get(1)?,
                    active: row.get(2)?,
                    start_time: row.get(3)?,
                    end_time: row.get(4)?,
                    lunch_breaks: Vec::new(),
                };
                Ok((day_id, day))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut breaks_stmt = conn.prepare_cached(
            "SELECT enabled, start_time, end_time FROM lunch_breaks WHERE work_day_id = ?1 ORDER BY id",
        )?;
        for (day_id, mut day) in days {
            day.lunch_breaks = breaks_stmt
                .query_map([day_id], |row| {
                    Ok(LunchBreak {
                        enabled: row.get(0)?,
                        start_time: row.get(1)?,
                        end_time: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            schedule.work_days.push(day);
        }

        schedule.vacations = conn
            .prepare_cached(
                "SELECT enabled, start_date, end_date FROM vacations WHERE schedule_id = ?1 ORDER BY id",
            )?
            .query_map([&schedule.id], |row| {
                Ok(Vacation {
                    enabled: row.get(0)?,
                    start_date: row.get(1)?,
                    end_date: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Some(schedule))
    }

    fn query_rows(&self, sql: &str, param: Option<&str>) -> Result<Vec<Specialist>> {
        let mut stmt = self.conn().prepare_cached(sql)?;
        let rows = match param {
            Some(p) => stmt.query_map([p], row_to_specialist)?.collect::<std::result::Result<Vec<_>, _>>()?,
            None => stmt.query_map([], row_to_specialist)?.collect::<std::result::Result<Vec<_>, _>>()?,
        };
        rows.into_iter().map(|row| self.hydrate(row)).collect()
    }

    /// Specialists offering a service, in display order
    pub fn get_by_service_id(&self, service_id: &str) -> Result<Vec<Specialist>> {
        let sql = format!(
            "SELECT {} FROM specialists s JOIN specialist_services ss ON ss.specialist_id = s.id \
             WHERE ss.service_id = ?1 ORDER BY s.display_order, s.last_name, s.first_name, s.id",
            prefixed_columns("s")
        );
        self.query_rows(&sql, Some(service_id))
    }

    /// The specialist profile linked to a user account, if any
    pub fn get_by_user_id(&self, user_id: &str) -> Result<Option<Specialist>> {
        let sql = format!(
            "SELECT {} FROM specialists WHERE user_id = ?1 ORDER BY display_order LIMIT 1",
            SPECIALIST_COLUMNS
        );
        Ok(self.query_rows(&sql, Some(user_id))?.into_iter().next())
    }

    /// Case-insensitive search over names, positions and description
    pub fn search(&self, query: &str) -> Result<Vec<Specialist>> {
        let mut positions_stmt = self
            .conn()
            .prepare_cached("SELECT position FROM specialist_positions WHERE specialist_id = ?1")?;
        let sql = format!(
            "SELECT {} FROM specialists ORDER BY display_order, last_name, first_name, id",
            SPECIALIST_COLUMNS
        );
        let rows = self
            .conn()
            .prepare_cached(&sql)?
            .query_map([], row_to_specialist)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut matched = Vec::new();
        for row in rows {
            let positions = positions_stmt
                .query_map([&row.id], |r| r.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            let fields = [
                Some(row.first_name.as_str()),
                Some(row.last_name.as_str()),
                row.middle_name.as_deref(),
                row.position.as_deref(),
                row.description.as_deref(),
            ];
            let haystack = fields
                .into_iter()
                .flatten()
                .chain(positions.iter().map(String::as_str));
            if matches_query(query, haystack) {
                matched.push(row);
            }
        }
        drop(positions_stmt);

        matched.into_iter().map(|row| self.hydrate(row)).collect()
    }

    /// Give each listed id its index in `ids` as display order.
    ///
    /// Ids missing from `ids` keep their current order, so a partial list
    /// only moves the specialists it names. Unknown ids are ignored. Returns
    /// the number of rows updated.
    pub fn set_order<S: AsRef<str>>(&self, ids: &[S]) -> Result<usize> {
        let tx = self.store.transaction()?;
        let mut updated = 0;
        {
            let mut stmt = tx.prepare_cached("UPDATE specialists SET display_order = ?1 WHERE id = ?2")?;
            for (index, id) in ids.iter().enumerate() {
                updated += stmt.execute(params![index as i64, id.as_ref()])?;
            }
        }
        tx.commit()?;
        Ok(updated)
    }

    /// Replace every owned child collection from `source`: positions,
    /// documents, schedule tree and service links. Partial child updates are
    /// not supported; pass the full desired collections.
    pub fn replace_children(&self, id: &str, source: &Specialist) -> Result<()> {
        if let Some(schedule) = &source.work_schedule {
            schedule.validate()?;
        }
        let tx = self.store.transaction()?;
        write_children(&tx, id, source)?;
        tx.commit()?;
        Ok(())
    }

    fn next_order(&self) -> Result<i64> {
        let next: i64 = self.conn().query_row(
            "SELECT COALESCE(MAX(display_order) + 1, 0) FROM specialists",
            [],
            |row| row.get(0),
        )?;
        Ok(next)
    }

    /// Paths of every file the specialist references
    fn media_paths(&self, id: &str) -> Result<Vec<String>> {
        let photo: Option<Option<String>> = self
            .conn()
            .query_row("SELECT photo FROM specialists WHERE id = ?1", [id], |row| row.get(0))
            .optional()?;

        let mut paths = Vec::new();
        if let Some(Some(photo)) = photo {
            paths.extend(self.store.media().variants(&photo));
        }
        let documents = self
            .conn()
            .prepare_cached("SELECT path FROM specialist_documents WHERE specialist_id = ?1")?
            .query_map([id], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        paths.extend(documents);
        Ok(paths)
    }
}

fn prefixed_columns(alias: &str) -> String {
    SPECIALIST_COLUMNS
        .split(", ")
        .map(|column| format!("{}.{}", alias, column.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_children(conn: &Connection, id: &str, source: &Specialist) -> Result<()> {
    replace_positions(conn, id, &source.distinct_positions())?;
    replace_documents(conn, id, &source.documents)?;
    replace_schedule(conn, id, source.work_schedule.as_ref())?;
    replace_service_links(conn, id, &source.services)?;
    Ok(())
}

impl Repository for SpecialistRepo<'_> {
    type Entity = Specialist;
    type Patch = SpecialistPatch;

    fn get_all(&self) -> Result<Vec<Specialist>> {
        let sql = format!(
            "SELECT {} FROM specialists ORDER BY display_order, last_name, first_name, id",
            SPECIALIST_COLUMNS
        );
        self.query_rows(&sql, None)
    }

    fn get_by_id(&self, id: &str) -> Result<Option<Specialist>> {
        let row = self
            .conn()
            .prepare_cached(&format!("SELECT {} FROM specialists WHERE id = ?1", SPECIALIST_COLUMNS))?
            .query_row([id], row_to_specialist)
            .optional()?;
        row.map(|row| self.hydrate(row)).transpose()
    }

    /// New specialists are appended to the end of the display order.
    fn create(&self, mut specialist: Specialist) -> Result<Specialist> {
        specialist.id = id_or_new(&specialist.id);
        if let Some(schedule) = &specialist.work_schedule {
            schedule.validate()?;
        }
        if exists(self.conn(), "specialists", &specialist.id)? {
            return Err(Error::Invalid(format!("specialist {} already exists", specialist.id)));
        }

        let now = crate::model::now();
        specialist.order = self.next_order()?;
        specialist.created_at = Some(now.clone());
        specialist.updated_at = Some(now);

        let tx = self.store.transaction()?;
        upsert_row(&tx, &specialist)?;
        write_children(&tx, &specialist.id, &specialist)?;
        tx.commit()?;

        tracing::debug!("Created specialist {}", specialist.id);
        self.get_by_id(&specialist.id)?
            .ok_or_else(|| Error::NotFound(format!("specialist {}", specialist.id)))
    }

    fn update(&self, id: &str, patch: SpecialistPatch) -> Result<Option<Specialist>> {
        if !exists(self.conn(), "specialists", id)? {
            return Ok(None);
        }
        if let Some(Some(schedule)) = &patch.work_schedule {
            schedule.validate()?;
        }

        let mut updates = ColumnUpdates::new();
        updates
            .set("first_name", patch.first_name)
            .set("last_name", patch.last_name)
            .set("middle_name", patch.middle_name)
            .set("photo", patch.photo)
            .set("description", patch.description)
            .set("position", patch.position)
            .set("experience", patch.experience)
            .set("display_order", patch.order)
            .set("user_id", patch.user_id);
        let children_changed = patch.additional_positions.is_some()
            || patch.documents.is_some()
            || patch.work_schedule.is_some()
            || patch.services.is_some();
        if !updates.is_empty() || children_changed {
            updates.set("updated_at", Some(crate::model::now()));
        }

        let tx = self.store.transaction()?;
        updates.apply(&tx, "specialists", id)?;
        if let Some(positions) = &patch.additional_positions {
            let probe = Specialist {
                additional_positions: positions.clone(),
                ..Default::default()
            };
            replace_positions(&tx, id, &probe.distinct_positions())?;
        }
        if let Some(documents) = &patch.documents {
            replace_documents(&tx, id, documents)?;
        }
        if let Some(schedule) = &patch.work_schedule {
            replace_schedule(&tx, id, schedule.as_ref())?;
        }
        if let Some(services) = &patch.services {
            replace_service_links(&tx, id, services)?;
        }
        tx.commit()?;

        self.get_by_id(id)
    }

    /// Delete a specialist and everything hanging off it.
    ///
    /// Owned tables are cleared explicitly; reviews, articles and promo codes
    /// follow their foreign-key actions. Media files are removed after the
    /// commit, and failures there are logged without undoing the delete.
    fn delete(&self, id: &str) -> Result<bool> {
        let media = self.media_paths(id)?;

        let tx = self.store.transaction()?;
        delete_schedule(&tx, id)?;
        for table in [
            "specialist_positions",
            "specialist_documents",
            "specialist_services",
            "appointments",
            "specialist_notes",
        ] {
            tx.execute(&format!("DELETE FROM {} WHERE specialist_id = ?1", table), [id])?;
        }
        let removed = delete_by_id(&tx, "specialists", id)?;
        tx.commit()?;

        if removed {
            let files = self.store.media().remove_files(media.iter().map(String::as_str));
            tracing::info!("Deleted specialist {} ({} media file(s) removed)", id, files);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specialist(id: &str, first: &str, last: &str) -> Specialist {
        Specialist {
            id: id.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            ..Default::default()
        }
    }

    fn add_service(store: &Store, id: &str) {
        store
            .conn()
            .execute("INSERT INTO services (id, name) VALUES (?1, ?1)", [id])
            .unwrap();
    }

    fn schedule() -> WorkSchedule {
        WorkSchedule {
            id: String::new(),
            enabled: true,
            work_days: vec![
                WorkDay {
                    day: 1,
                    active: true,
                    start_time: "09:00".into(),
                    end_time: "18:00".into(),
                    lunch_breaks: vec![
                        LunchBreak {
                            enabled: true,
                            start_time: "12:00".into(),
                            end_time: "12:30".into(),
                        },
                        LunchBreak {
                            enabled: false,
                            start_time: "15:00".into(),
                            end_time: "15:15".into(),
                        },
                    ],
                },
                WorkDay {
                    day: 3,
                    active: false,
                    start_time: "10:00".into(),
                    end_time: "16:00".into(),
                    lunch_breaks: vec![],
                },
            ],
            vacations: vec![Vacation {
                enabled: true,
                start_date: "2024-07-01".into(),
                end_date: "2024-07-14".into(),
            }],
        }
    }

    #[test]
    fn test_schedule_round_trip() {
        let store = Store::open_in_memory().unwrap();
        let mut input = specialist("s1", "Anna", "Ivanova");
        input.work_schedule = Some(schedule());
        store.specialists().create(input).unwrap();

        let loaded = store.specialists().get_by_id("s1").unwrap().unwrap();
        let loaded_schedule = loaded.work_schedule.unwrap();
        let expected = schedule();
        assert_eq!(loaded_schedule.id, "schedule-s1");
        assert_eq!(loaded_schedule.work_days, expected.work_days);
        assert_eq!(loaded_schedule.vacations, expected.vacations);
        assert_eq!(loaded_schedule.work_days[0].lunch_breaks.len(), 2);
    }

    #[test]
    fn test_create_rejects_invalid_day() {
        let store = Store::open_in_memory().unwrap();
        let mut input = specialist("s1", "Anna", "Ivanova");
        input.work_schedule = Some(WorkSchedule {
            work_days: vec![WorkDay { day: 7, ..Default::default() }],
            ..Default::default()
        });
        assert!(matches!(store.specialists().create(input), Err(Error::Invalid(_))));
        assert_eq!(store.count("specialists").unwrap(), 0);
    }

    #[test]
    fn test_create_appends_order_and_generates_id() {
        let store = Store::open_in_memory().unwrap();
        let repo = store.specialists();
        let first = repo.create(specialist("", "Anna", "A")).unwrap();
        let second = repo.create(specialist("", "Boris", "B")).unwrap();
        assert!(!first.id.is_empty());
        assert_ne!(first.id, second.id);
        assert_eq!(first.order, 0);
        assert_eq!(second.order, 1);
        assert!(repo.create(specialist(&first.id, "Dup", "D")).is_err());
    }

    #[test]
    fn test_partial_set_order() {
        let store = Store::open_in_memory().unwrap();
        let repo = store.specialists();
        for (i, name) in ["a", "b", "c", "d"].iter().enumerate() {
            repo.create(specialist(&format!("id{}", i), name, name)).unwrap();
        }

        let updated = repo.set_order(&["id3", "id1", "missing"]).unwrap();
        assert_eq!(updated, 2);

        let order_of = |id: &str| repo.get_by_id(id).unwrap().unwrap().order;
        assert_eq!(order_of("id3"), 0);
        assert_eq!(order_of("id1"), 1);
        assert_eq!(order_of("id0"), 0);
        assert_eq!(order_of("id2"), 2);
    }

    #[test]
    fn test_update_leaves_absent_fields() {
        let store = Store::open_in_memory().unwrap();
        add_service(&store, "svc1");
        let mut input = specialist("s1", "Anna", "Ivanova");
        input.description = Some("Massage therapist".into());
        input.services = vec!["svc1".into()];
        input.additional_positions = vec!["Yoga".into()];
        store.specialists().create(input).unwrap();

        let patch = SpecialistPatch {
            position: Some(Some("Head therapist".into())),
            additional_positions: Some(vec!["Pilates".into(), "Pilates".into()]),
            ..Default::default()
        };
        let updated = store.specialists().update("s1", patch).unwrap().unwrap();
        assert_eq!(updated.description.as_deref(), Some("Massage therapist"));
        assert_eq!(updated.position.as_deref(), Some("Head therapist"));
        assert_eq!(updated.additional_positions, vec!["Pilates"]);
        assert_eq!(updated.services, vec!["svc1"]);

        assert!(store.specialists().update("nope", SpecialistPatch::default()).unwrap().is_none());
    }

    #[test]
    fn test_update_can_clear_schedule() {
        let store = Store::open_in_memory().unwrap();
        let mut input = specialist("s1", "Anna", "Ivanova");
        input.work_schedule = Some(schedule());
        store.specialists().create(input).unwrap();

        let patch = SpecialistPatch {
            work_schedule: Some(None),
            ..Default::default()
        };
        let updated = store.specialists().update("s1", patch).unwrap().unwrap();
        assert!(updated.work_schedule.is_none());
        assert_eq!(store.count("work_days").unwrap(), 0);
        assert_eq!(store.count("lunch_breaks").unwrap(), 0);
    }

    #[test]
    fn test_get_by_service_and_search() {
        let store = Store::open_in_memory().unwrap();
        add_service(&store, "svc1");
        let mut anna = specialist("s1", "Анна", "Иванова");
        anna.services = vec!["svc1".into()];
        anna.additional_positions = vec!["Массажист".into()];
        store.specialists().create(anna).unwrap();
        store.specialists().create(specialist("s2", "Boris", "Petrov")).unwrap();

        let by_service = store.specialists().get_by_service_id("svc1").unwrap();
        assert_eq!(by_service.len(), 1);
        assert_eq!(by_service[0].id, "s1");

        let found = store.specialists().search("МАССАЖ").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "s1");
        assert_eq!(store.specialists().search("").unwrap().len(), 2);
    }

    #[test]
    fn test_photo_resolves_to_placeholder_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_in_memory()
            .unwrap()
            .with_media(crate::media::MediaRoot::new(dir.path(), "/img/none.webp"));
        let mut input = specialist("s1", "Anna", "Ivanova");
        input.photo = Some("/uploads/anna.webp".into());
        let created = store.specialists().create(input).unwrap();
        assert_eq!(created.photo.as_deref(), Some("/img/none.webp"));
    }
}
