//! Flat content tables: events, FAQ entries and promo codes

use rusqlite::{Connection, OptionalExtension, params};

use super::{ColumnUpdates, Repository, delete_by_id, exists, id_or_new};
use crate::model::{Event, EventPatch, Faq, FaqPatch, PromoCode, PromoCodePatch};
use crate::storage::Store;
use crate::{Error, Result};

// Events

const EVENT_COLUMNS: &str =
    "id, title, description, date, time, location, image, price, is_published, created_at, updated_at";

pub(crate) fn upsert_event(conn: &Connection, e: &Event) -> Result<()> {
    conn.prepare_cached(
        "INSERT INTO events (id, title, description, date, time, location, image, price,
                             is_published, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         ON CONFLICT(id) DO UPDATE SET
             title = excluded.title,
             description = excluded.description,
             date = excluded.date,
             time = excluded.time,
             location = excluded.location,
             image = excluded.image,
             price = excluded.price,
             is_published = excluded.is_published,
             created_at = excluded.created_at,
             updated_at = excluded.updated_at",
    )?
    .execute(params![
        e.id,
        e.title,
        e.description,
        e.date,
        e.time,
        e.location,
        e.image,
        e.price,
        e.is_published,
        e.created_at,
        e.updated_at,
    ])?;
    Ok(())
}

fn row_to_event(row: &rusqlite::Row) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        date: row.get(3)?,
        time: row.get(4)?,
        location: row.get(5)?,
        image: row.get(6)?,
        price: row.get(7)?,
        is_published: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

pub struct EventRepo<'a> {
    store: &'a Store,
}

impl<'a> EventRepo<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    fn query(&self, filter: &str, param: Option<&str>) -> Result<Vec<Event>> {
        let sql = format!(
            "SELECT {} FROM events {} ORDER BY date, time, id",
            EVENT_COLUMNS, filter
        );
        let mut stmt = self.store.conn().prepare_cached(&sql)?;
        let rows = match param {
            Some(p) => stmt.query_map([p], row_to_event)?.collect::<std::result::Result<Vec<_>, _>>()?,
            None => stmt.query_map([], row_to_event)?.collect::<std::result::Result<Vec<_>, _>>()?,
        };
        Ok(rows
            .into_iter()
            .map(|mut event| {
                event.image = event.image.as_deref().map(|i| self.store.media().resolve_image(i));
                event
            })
            .collect())
    }

    pub fn get_published(&self) -> Result<Vec<Event>> {
        self.query("WHERE is_published = 1", None)
    }

    /// Published events on or after `date` (ISO `YYYY-MM-DD`)
    pub fn get_upcoming(&self, date: &str) -> Result<Vec<Event>> {
        self.query("WHERE is_published = 1 AND date >= ?1", Some(date))
    }
}

impl Repository for EventRepo<'_> {
    type Entity = Event;
    type Patch = EventPatch;

    fn get_all(&self) -> Result<Vec<Event>> {
        self.query("", None)
    }

    fn get_by_id(&self, id: &str) -> Result<Option<Event>> {
        Ok(self.query("WHERE id = ?1", Some(id))?.into_iter().next())
    }

    fn create(&self, mut event: Event) -> Result<Event> {
        event.id = id_or_new(&event.id);
        if event.title.trim().is_empty() {
            return Err(Error::Invalid("event title is required".into()));
        }
        if exists(self.store.conn(), "events", &event.id)? {
            return Err(Error::Invalid(format!("event {} already exists", event.id)));
        }
        let now = crate::model::now();
        event.created_at.get_or_insert_with(|| now.clone());
        event.updated_at = Some(now);
        upsert_event(self.store.conn(), &event)?;
        Ok(event)
    }

    fn update(&self, id: &str, patch: EventPatch) -> Result<Option<Event>> {
        if !exists(self.store.conn(), "events", id)? {
            return Ok(None);
        }
        let mut updates = ColumnUpdates::new();
        updates
            .set("title", patch.title)
            .set("description", patch.description)
            .set("date", patch.date)
            .set("time", patch.time)
            .set("location", patch.location)
            .set("image", patch.image)
            .set("price", patch.price)
            .set("is_published", patch.is_published);
        if !updates.is_empty() {
            updates.set("updated_at", Some(crate::model::now()));
        }
        updates.apply(self.store.conn(), "events", id)?;
        self.get_by_id(id)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        delete_by_id(self.store.conn(), "events", id)
    }
}

// FAQ

const FAQ_COLUMNS: &str = "id, question, answer, category, display_order, is_published";

pub(crate) fn upsert_faq(conn: &Connection, f: &Faq) -> Result<()> {
    conn.prepare_cached(
        "INSERT INTO faq (id, question, answer, category, display_order, is_published)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
             question = excluded.question,
             answer = excluded.answer,
             category = excluded.category,
             display_order = excluded.display_order,
             is_published = excluded.is_published",
    )?
    .execute(params![f.id, f.question, f.answer, f.category, f.order, f.is_published])?;
    Ok(())
}

fn row_to_faq(row: &rusqlite::Row) -> rusqlite::Result<Faq> {
    Ok(Faq {
        id: row.get(0)?,
        question: row.get(1)?,
        answer: row.get(2)?,
        category: row.get(3)?,
        order: row.get(4)?,
        is_published: row.get(5)?,
    })
}

pub struct FaqRepo<'a> {
    store: &'a Store,
}

impl<'a> FaqRepo<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    fn query(&self, filter: &str, param: Option<&str>) -> Result<Vec<Faq>> {
        let sql = format!(
            "SELECT {} FROM faq {} ORDER BY display_order, id",
            FAQ_COLUMNS, filter
        );
        let mut stmt = self.store.conn().prepare_cached(&sql)?;
        let rows = match param {
            Some(p) => stmt.query_map([p], row_to_faq)?.collect::<std::result::Result<Vec<_>, _>>()?,
            None => stmt.query_map([], row_to_faq)?.collect::<std::result::Result<Vec<_>, _>>()?,
        };
        Ok(rows)
    }

    pub fn get_published(&self) -> Result<Vec<Faq>> {
        self.query("WHERE is_published = 1", None)
    }

    pub fn get_by_category(&self, category: &str) -> Result<Vec<Faq>> {
        self.query("WHERE category = ?1", Some(category))
    }

    /// Same semantics as the specialist reorder: unlisted entries keep
    /// their position.
    pub fn set_order<S: AsRef<str>>(&self, ids: &[S]) -> Result<usize> {
        let tx = self.store.transaction()?;
        let mut updated = 0;
        {
            let mut stmt = tx.prepare_cached("UPDATE faq SET display_order = ?1 WHERE id = ?2")?;
            for (index, id) in ids.iter().enumerate() {
                updated += stmt.execute(params![index as i64, id.as_ref()])?;
            }
        }
        tx.commit()?;
        Ok(updated)
    }
}

impl Repository for FaqRepo<'_> {
    type Entity = Faq;
    type Patch = FaqPatch;

    fn get_all(&self) -> Result<Vec<Faq>> {
        self.query("", None)
    }

    fn get_by_id(&self, id: &str) -> Result<Option<Faq>> {
        Ok(self.query("WHERE id = ?1", Some(id))?.into_iter().next())
    }

    fn create(&self, mut faq: Faq) -> Result<Faq> {
        faq.id = id_or_new(&faq.id);
        if faq.question.trim().is_empty() {
            return Err(Error::Invalid("question is required".into()));
        }
        if exists(self.store.conn(), "faq", &faq.id)? {
            return Err(Error::Invalid(format!("faq entry {} already exists", faq.id)));
        }
        faq.order = self.store.conn().query_row(
            "SELECT COALESCE(MAX(display_order) + 1, 0) FROM faq",
            [],
            |row| row.get(0),
        )?;
        upsert_faq(self.store.conn(), &faq)?;
        Ok(faq)
    }

    fn update(&self, id: &str, patch: FaqPatch) -> Result<Option<Faq>> {
        if !exists(self.store.conn(), "faq", id)? {
            return Ok(None);
        }
        let mut updates = ColumnUpdates::new();
        updates
            .set("question", patch.question)
            .set("answer", patch.answer)
            .set("category", patch.category)
            .set("display_order", patch.order)
            .set("is_published", patch.is_published);
        updates.apply(self.store.conn(), "faq", id)?;
        self.get_by_id(id)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        delete_by_id(self.store.conn(), "faq", id)
    }
}

// Promo codes

const PROMO_COLUMNS: &str = "id, code, description, discount_type, discount_value, valid_from, \
     valid_until, max_uses, used_count, is_active, service_id, specialist_id, created_at";

/// Codes are stored upper-cased; the caller picks the id.
pub(crate) fn upsert_promo_code(conn: &Connection, id: &str, p: &PromoCode) -> Result<()> {
    conn.prepare_cached(
        "INSERT INTO promo_codes (id, code, description, discount_type, discount_value, valid_from,
                                  valid_until, max_uses, used_count, is_active, service_id,
                                  specialist_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
         ON CONFLICT(id) DO UPDATE SET
             code = excluded.code,
             description = excluded.description,
             discount_type = excluded.discount_type,
             discount_value = excluded.discount_value,
             valid_from = excluded.valid_from,
             valid_until = excluded.valid_until,
             max_uses = excluded.max_uses,
             used_count = excluded.used_count,
             is_active = excluded.is_active,
             service_id = excluded.service_id,
             specialist_id = excluded.specialist_id,
             created_at = excluded.created_at",
    )?
    .execute(params![
        id,
        p.normalized_code(),
        p.description,
        p.discount_type,
        p.discount_value,
        p.valid_from,
        p.valid_until,
        p.max_uses,
        p.used_count,
        p.is_active,
        p.service_id,
        p.specialist_id,
        p.created_at,
    ])?;
    Ok(())
}

fn row_to_promo(row: &rusqlite::Row) -> rusqlite::Result<PromoCode> {
    Ok(PromoCode {
        id: row.get(0)?,
        code: row.get(1)?,
        description: row.get(2)?,
        discount_type: row.get(3)?,
        discount_value: row.get(4)?,
        valid_from: row.get(5)?,
        valid_until: row.get(6)?,
        max_uses: row.get(7)?,
        used_count: row.get(8)?,
        is_active: row.get(9)?,
        service_id: row.get(10)?,
        specialist_id: row.get(11)?,
        created_at: row.get(12)?,
    })
}

pub struct PromoCodeRepo<'a> {
    store: &'a Store,
}

impl<'a> PromoCodeRepo<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    fn find(&self, filter: &str, value: &str) -> Result<Option<PromoCode>> {
        let sql = format!("SELECT {} FROM promo_codes WHERE {}", PROMO_COLUMNS, filter);
        Ok(self
            .store
            .conn()
            .prepare_cached(&sql)?
            .query_row([value], row_to_promo)
            .optional()?)
    }

    /// Lookup ignores case and surrounding whitespace
    pub fn get_by_code(&self, code: &str) -> Result<Option<PromoCode>> {
        self.find("code = ?1", &code.trim().to_uppercase())
    }

    /// Count one use of a code, refusing once `max_uses` is reached
    pub fn record_use(&self, id: &str) -> Result<bool> {
        let changed = self.store.conn().execute(
            "UPDATE promo_codes SET used_count = used_count + 1
             WHERE id = ?1 AND (max_uses IS NULL OR used_count < max_uses)",
            [id],
        )?;
        Ok(changed > 0)
    }
}

impl Repository for PromoCodeRepo<'_> {
    type Entity = PromoCode;
    type Patch = PromoCodePatch;

    fn get_all(&self) -> Result<Vec<PromoCode>> {
        let sql = format!("SELECT {} FROM promo_codes ORDER BY code", PROMO_COLUMNS);
        let rows = self
            .store
            .conn()
            .prepare_cached(&sql)?
            .query_map([], row_to_promo)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn get_by_id(&self, id: &str) -> Result<Option<PromoCode>> {
        self.find("id = ?1", id)
    }

    fn create(&self, mut promo: PromoCode) -> Result<PromoCode> {
        promo.code = promo.normalized_code();
        if promo.code.is_empty() {
            return Err(Error::Invalid("promo code cannot be empty".into()));
        }
        if self.get_by_code(&promo.code)?.is_some() {
            return Err(Error::Invalid(format!("promo code {} already exists", promo.code)));
        }
        promo.id = id_or_new(&promo.id);
        promo.created_at.get_or_insert_with(crate::model::now);
        upsert_promo_code(self.store.conn(), &promo.id, &promo)?;
        Ok(promo)
    }

    fn update(&self, id: &str, patch: PromoCodePatch) -> Result<Option<PromoCode>> {
        if !exists(self.store.conn(), "promo_codes", id)? {
            return Ok(None);
        }
        let mut updates = ColumnUpdates::new();
        updates
            .set("description", patch.description)
            .set("discount_type", patch.discount_type)
            .set("discount_value", patch.discount_value)
            .set("valid_from", patch.valid_from)
            .set("valid_until", patch.valid_until)
            .set("max_uses", patch.max_uses)
            .set("used_count", patch.used_count)
            .set("is_active", patch.is_active)
            .set("service_id", patch.service_id)
            .set("specialist_id", patch.specialist_id);
        updates.apply(self.store.conn(), "promo_codes", id)?;
        self.get_by_id(id)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        delete_by_id(self.store.conn(), "promo_codes", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DiscountType;

    #[test]
    fn test_promo_code_lookup_is_case_insensitive() {
        let store = Store::open_in_memory().unwrap();
        let created = store
            .promo_codes()
            .create(PromoCode {
                code: " spring10 ".into(),
                discount_value: 10.0,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(created.code, "SPRING10");

        let found = store.promo_codes().get_by_code("Spring10").unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.discount_type, DiscountType::Percent);

        let duplicate = PromoCode {
            code: "SPRING10".into(),
            ..Default::default()
        };
        assert!(store.promo_codes().create(duplicate).is_err());
    }

    #[test]
    fn test_record_use_respects_limit() {
        let store = Store::open_in_memory().unwrap();
        let promo = store
            .promo_codes()
            .create(PromoCode {
                id: "p1".into(),
                code: "ONCE".into(),
                max_uses: Some(1),
                ..Default::default()
            })
            .unwrap();
        assert!(promo.is_usable_on("2024-01-01"));
        assert!(store.promo_codes().record_use("p1").unwrap());
        assert!(!store.promo_codes().record_use("p1").unwrap());

        let used = store.promo_codes().get_by_id("p1").unwrap().unwrap();
        assert!(!used.is_usable_on("2024-01-01"));
    }

    #[test]
    fn test_validity_window() {
        let promo = PromoCode {
            code: "SUMMER".into(),
            valid_from: Some("2024-06-01".into()),
            valid_until: Some("2024-08-31T23:59:59Z".into()),
            ..Default::default()
        };
        assert!(!promo.is_usable_on("2024-05-31"));
        assert!(promo.is_usable_on("2024-08-31"));
        assert!(!promo.is_usable_on("2024-09-01"));
    }

    #[test]
    fn test_faq_order_and_events() {
        let store = Store::open_in_memory().unwrap();
        for (id, question) in [("f1", "Parking?"), ("f2", "Gift cards?"), ("f3", "Cancellation?")] {
            store
                .faq()
                .create(Faq {
                    id: id.into(),
                    question: question.into(),
                    ..Default::default()
                })
                .unwrap();
        }
        store.faq().set_order(&["f3"]).unwrap();
        let ids: Vec<String> = store.faq().get_all().unwrap().into_iter().map(|f| f.id).collect();
        assert_eq!(ids, vec!["f1", "f3", "f2"]);

        store
            .events()
            .create(Event {
                id: "e1".into(),
                title: "Open day".into(),
                date: Some("2024-06-01".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(store.events().get_upcoming("2024-05-01").unwrap().len(), 1);
        assert!(store.events().get_upcoming("2024-07-01").unwrap().is_empty());
    }
}
