//! Specialist notes about clients

use rusqlite::{Connection, OptionalExtension, params};

use super::{Repository, delete_by_id, exists, id_or_new};
use crate::model::SpecialistNote;
use crate::storage::Store;
use crate::{Error, Result};

const NOTE_COLUMNS: &str = "id, specialist_id, user_id, content, created_at, updated_at";

fn row_to_note(row: &rusqlite::Row) -> rusqlite::Result<SpecialistNote> {
    Ok(SpecialistNote {
        id: row.get(0)?,
        specialist_id: row.get(1)?,
        user_id: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

pub struct NoteRepo<'a> {
    store: &'a Store,
}

impl<'a> NoteRepo<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    fn conn(&self) -> &Connection {
        self.store.conn()
    }

    pub fn get_by_specialist_id(&self, specialist_id: &str) -> Result<Vec<SpecialistNote>> {
        self.get_for_client(specialist_id, None)
    }

    /// Notes a specialist wrote, optionally narrowed to one client
    pub fn get_for_client(&self, specialist_id: &str, user_id: Option<&str>) -> Result<Vec<SpecialistNote>> {
        let sql = format!(
            "SELECT {} FROM specialist_notes WHERE specialist_id = ?1 AND (?2 IS NULL OR user_id = ?2) \
             ORDER BY created_at DESC, id",
            NOTE_COLUMNS
        );
        let rows = self
            .conn()
            .prepare_cached(&sql)?
            .query_map(params![specialist_id, user_id], row_to_note)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl Repository for NoteRepo<'_> {
    type Entity = SpecialistNote;
    /// Only the text of a note can change
    type Patch = String;

    fn get_all(&self) -> Result<Vec<SpecialistNote>> {
        let sql = format!("SELECT {} FROM specialist_notes ORDER BY created_at DESC, id", NOTE_COLUMNS);
        let rows = self
            .conn()
            .prepare_cached(&sql)?
            .query_map([], row_to_note)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn get_by_id(&self, id: &str) -> Result<Option<SpecialistNote>> {
        let sql = format!("SELECT {} FROM specialist_notes WHERE id = ?1", NOTE_COLUMNS);
        Ok(self
            .conn()
            .prepare_cached(&sql)?
            .query_row([id], row_to_note)
            .optional()?)
    }

    fn create(&self, mut note: SpecialistNote) -> Result<SpecialistNote> {
        note.id = id_or_new(&note.id);
        if !exists(self.conn(), "specialists", &note.specialist_id)? {
            return Err(Error::NotFound(format!("specialist {}", note.specialist_id)));
        }
        let now = crate::model::now();
        note.created_at = Some(now.clone());
        note.updated_at = Some(now);
        self.conn().execute(
            "INSERT INTO specialist_notes (id, specialist_id, user_id, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                note.id,
                note.specialist_id,
                note.user_id,
                note.content,
                note.created_at,
                note.updated_at
            ],
        )?;
        Ok(note)
    }

    fn update(&self, id: &str, content: String) -> Result<Option<SpecialistNote>> {
        let changed = self.conn().execute(
            "UPDATE specialist_notes SET content = ?1, updated_at = ?2 WHERE id = ?3",
            params![content, crate::model::now(), id],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_by_id(id)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        delete_by_id(self.conn(), "specialist_notes", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notes_filtered_by_client() {
        let store = Store::open_in_memory().unwrap();
        store
            .conn()
            .execute_batch(
                "INSERT INTO users (id) VALUES ('u1'), ('u2');
                 INSERT INTO specialists (id, first_name) VALUES ('s1', 'Anna');",
            )
            .unwrap();

        let repo = store.notes();
        for (id, user) in [("n1", "u1"), ("n2", "u2")] {
            repo.create(SpecialistNote {
                id: id.into(),
                specialist_id: "s1".into(),
                user_id: Some(user.into()),
                content: "Prefers mornings".into(),
                ..Default::default()
            })
            .unwrap();
        }

        assert_eq!(repo.get_by_specialist_id("s1").unwrap().len(), 2);
        let only_u1 = repo.get_for_client("s1", Some("u1")).unwrap();
        assert_eq!(only_u1.len(), 1);
        assert_eq!(only_u1[0].id, "n1");

        let updated = repo.update("n1", "Prefers evenings".into()).unwrap().unwrap();
        assert_eq!(updated.content, "Prefers evenings");
        assert!(repo.update("missing", String::new()).unwrap().is_none());
    }
}
