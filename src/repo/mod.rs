//! Repositories - per-entity read/write API over the normalized tables
//!
//! Aggregates are hydrated with one query for the root row and one query
//! per child collection, then assembled in memory. Writes decompose the
//! aggregate back into per-table statements inside a transaction; owned
//! child collections are always replaced wholesale (`replace_children`).

pub mod appointment;
pub mod article;
pub mod bonus;
pub mod content;
pub mod note;
pub mod review;
pub mod service;
pub mod settings;
pub mod specialist;
pub mod user;

pub use appointment::AppointmentRepo;
pub use article::ArticleRepo;
pub use bonus::{BonusPatch, BonusRepo};
pub use content::{EventRepo, FaqRepo, PromoCodeRepo};
pub use note::NoteRepo;
pub use review::{RatingSummary, ReviewRepo};
pub use service::ServiceRepo;
pub use settings::SettingsRepo;
pub use specialist::SpecialistRepo;
pub use user::UserRepo;

use rusqlite::types::ToSql;
use rusqlite::{Connection, OptionalExtension};

use crate::storage::Store;
use crate::Result;

/// CRUD contract shared by every entity repository.
///
/// `create` takes a whole entity (an empty id means "generate one");
/// `update` takes a patch where absent fields leave columns untouched and
/// returns `None` when the id does not exist.
pub trait Repository {
    type Entity;
    type Patch;

    fn get_all(&self) -> Result<Vec<Self::Entity>>;

    fn get_by_id(&self, id: &str) -> Result<Option<Self::Entity>>;

    fn create(&self, entity: Self::Entity) -> Result<Self::Entity>;

    fn update(&self, id: &str, patch: Self::Patch) -> Result<Option<Self::Entity>>;

    /// Returns whether a row was deleted
    fn delete(&self, id: &str) -> Result<bool>;
}

impl Store {
    pub fn users(&self) -> UserRepo<'_> {
        UserRepo::new(self)
    }

    pub fn specialists(&self) -> SpecialistRepo<'_> {
        SpecialistRepo::new(self)
    }

    pub fn services(&self) -> ServiceRepo<'_> {
        ServiceRepo::new(self)
    }

    pub fn articles(&self) -> ArticleRepo<'_> {
        ArticleRepo::new(self)
    }

    pub fn reviews(&self) -> ReviewRepo<'_> {
        ReviewRepo::new(self)
    }

    pub fn appointments(&self) -> AppointmentRepo<'_> {
        AppointmentRepo::new(self)
    }

    pub fn bonuses(&self) -> BonusRepo<'_> {
        BonusRepo::new(self)
    }

    pub fn notes(&self) -> NoteRepo<'_> {
        NoteRepo::new(self)
    }

    pub fn events(&self) -> EventRepo<'_> {
        EventRepo::new(self)
    }

    pub fn faq(&self) -> FaqRepo<'_> {
        FaqRepo::new(self)
    }

    pub fn promo_codes(&self) -> PromoCodeRepo<'_> {
        PromoCodeRepo::new(self)
    }

    pub fn settings(&self) -> SettingsRepo<'_> {
        SettingsRepo::new(self)
    }
}

/// Column list for a partial `UPDATE`, built from whichever patch fields
/// are present.
#[derive(Default)]
pub(crate) struct ColumnUpdates {
    columns: Vec<&'static str>,
    values: Vec<Box<dyn ToSql>>,
}

impl ColumnUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `column = value` when the patch carries a value
    pub fn set<T: ToSql + 'static>(&mut self, column: &'static str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.columns.push(column);
            self.values.push(Box::new(value));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Run the update against the row with primary key `id`
    pub fn apply(self, conn: &Connection, table: &str, id: &str) -> Result<usize> {
        if self.is_empty() {
            return Ok(0);
        }
        let assignments: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{} = ?{}", column, i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            table,
            assignments.join(", "),
            self.columns.len() + 1
        );

        let mut params: Vec<&dyn ToSql> = self.values.iter().map(|v| v.as_ref()).collect();
        params.push(&id);
        Ok(conn.execute(&sql, params.as_slice())?)
    }
}

/// Whether a row with this primary key exists
pub(crate) fn exists(conn: &Connection, table: &str, id: &str) -> Result<bool> {
    let found = conn
        .query_row(&format!("SELECT 1 FROM {} WHERE id = ?1", table), [id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

/// Delete by primary key, returning whether anything was removed
pub(crate) fn delete_by_id(conn: &Connection, table: &str, id: &str) -> Result<bool> {
    let removed = conn.execute(&format!("DELETE FROM {} WHERE id = ?1", table), [id])?;
    Ok(removed > 0)
}

/// Id for a newly created row: keep the caller's, or generate one
pub(crate) fn id_or_new(id: &str) -> String {
    if id.trim().is_empty() {
        crate::model::new_id()
    } else {
        id.trim().to_string()
    }
}

/// Read a JSON text column into a typed value
pub(crate) fn json_column<T: serde::de::DeserializeOwned>(
    row: &rusqlite::Row,
    idx: usize,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Lowercased substring match used by the in-memory search paths; SQLite's
/// LIKE only folds ASCII, and names here are mostly Cyrillic.
pub(crate) fn matches_query<'a>(query: &str, haystack: impl IntoIterator<Item = &'a str>) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    haystack
        .into_iter()
        .any(|field| field.to_lowercase().contains(&needle))
}
