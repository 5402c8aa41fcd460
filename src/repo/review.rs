//! Review repository
//!
//! A review hydrates from five tables: the row itself, its attachments and
//! reactions, its replies, and each reply's attachments and reactions.

use rusqlite::{Connection, OptionalExtension, params};

use super::{ColumnUpdates, Repository, exists, id_or_new};
use crate::model::{FileRef, Reaction, Review, ReviewPatch, ReviewReply, rating_in_range};
use crate::storage::Store;
use crate::{Error, Result};

const REVIEW_COLUMNS: &str = "id, specialist_id, user_id, author_name, rating, text, is_moderated, \
     is_published, created_at, updated_at";

pub(crate) const UPSERT_REVIEW: &str = r#"
INSERT INTO reviews (id, specialist_id, user_id, author_name, rating, text, is_moderated,
                     is_published, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
ON CONFLICT(id) DO UPDATE SET
    specialist_id = excluded.specialist_id,
    user_id = excluded.user_id,
    author_name = excluded.author_name,
    rating = excluded.rating,
    text = excluded.text,
    is_moderated = excluded.is_moderated,
    is_published = excluded.is_published,
    created_at = excluded.created_at,
    updated_at = excluded.updated_at
"#;

/// Which parent a reaction or attachment hangs off
#[derive(Debug, Clone, Copy)]
enum Parent {
    Review,
    Reply,
}

impl Parent {
    fn attachments_table(self) -> (&'static str, &'static str) {
        match self {
            Parent::Review => ("review_attachments", "review_id"),
            Parent::Reply => ("reply_attachments", "reply_id"),
        }
    }

    fn reactions_table(self) -> (&'static str, &'static str) {
        match self {
            Parent::Review => ("review_reactions", "review_id"),
            Parent::Reply => ("reply_reactions", "reply_id"),
        }
    }
}

pub(crate) fn upsert_row(conn: &Connection, r: &Review) -> Result<()> {
    conn.prepare_cached(UPSERT_REVIEW)?.execute(params![
        r.id,
        r.specialist_id,
        r.user_id,
        r.author_name,
        r.rating,
        r.text,
        r.is_moderated,
        r.is_published,
        r.created_at,
        r.updated_at,
    ])?;
    Ok(())
}

fn replace_attachments(conn: &Connection, parent: Parent, parent_id: &str, files: &[FileRef]) -> Result<()> {
    let (table, key) = parent.attachments_table();
    conn.prepare_cached(&format!("DELETE FROM {} WHERE {} = ?1", table, key))?
        .execute([parent_id])?;
    let mut insert = conn.prepare_cached(&format!(
        "INSERT INTO {} ({}, path, name, type) VALUES (?1, ?2, ?3, ?4)",
        table, key
    ))?;
    for file in files.iter().filter(|f| !f.path.trim().is_empty()) {
        insert.execute(params![parent_id, file.path, file.name, file.file_type])?;
    }
    Ok(())
}

fn replace_reactions(conn: &Connection, parent: Parent, parent_id: &str, reactions: &[Reaction]) -> Result<()> {
    let (table, key) = parent.reactions_table();
    conn.prepare_cached(&format!("DELETE FROM {} WHERE {} = ?1", table, key))?
        .execute([parent_id])?;
    let mut insert = conn.prepare_cached(&format!(
        "INSERT OR REPLACE INTO {} ({}, user_id, type, created_at) VALUES (?1, ?2, ?3, ?4)",
        table, key
    ))?;
    for reaction in reactions {
        insert.execute(params![parent_id, reaction.user_id, reaction.kind, reaction.created_at])?;
    }
    Ok(())
}

fn upsert_reply(conn: &Connection, review_id: &str, reply_id: &str, reply: &ReviewReply) -> Result<()> {
    conn.prepare_cached(
        "INSERT INTO review_replies (id, review_id, user_id, author_name, text, is_published, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO UPDATE SET
             review_id = excluded.review_id,
             user_id = excluded.user_id,
             author_name = excluded.author_name,
             text = excluded.text,
             is_published = excluded.is_published,
             created_at = excluded.created_at,
             updated_at = excluded.updated_at",
    )?
    .execute(params![
        reply_id,
        review_id,
        reply.user_id,
        reply.author_name,
        reply.text,
        reply.is_published,
        reply.created_at,
        reply.updated_at,
    ])?;
    replace_attachments(conn, Parent::Reply, reply_id, &reply.attachments)?;
    replace_reactions(conn, Parent::Reply, reply_id, &reply.reactions)?;
    Ok(())
}

/// Replace every reply of a review, with their attachments and reactions.
/// Replies without an id get one derived from their position.
pub(crate) fn replace_replies(conn: &Connection, review_id: &str, replies: &[ReviewReply]) -> Result<()> {
    conn.prepare_cached(
        "DELETE FROM reply_attachments WHERE reply_id IN (SELECT id FROM review_replies WHERE review_id = ?1)",
    )?
    .execute([review_id])?;
    conn.prepare_cached(
        "DELETE FROM reply_reactions WHERE reply_id IN (SELECT id FROM review_replies WHERE review_id = ?1)",
    )?
    .execute([review_id])?;
    conn.prepare_cached("DELETE FROM review_replies WHERE review_id = ?1")?
        .execute([review_id])?;

    for (index, reply) in replies.iter().enumerate() {
        upsert_reply(conn, review_id, &reply.id_for(review_id, index), reply)?;
    }
    Ok(())
}

/// Write the owned collections of a review
pub(crate) fn replace_children(conn: &Connection, review: &Review) -> Result<()> {
    replace_attachments(conn, Parent::Review, &review.id, &review.attachments)?;
    replace_reactions(conn, Parent::Review, &review.id, &review.reactions)?;
    replace_replies(conn, &review.id, &review.replies)?;
    Ok(())
}

fn row_to_review(row: &rusqlite::Row) -> rusqlite::Result<Review> {
    Ok(Review {
        id: row.get(0)?,
        specialist_id: row.get(1)?,
        user_id: row.get(2)?,
        author_name: row.get(3)?,
        rating: row.get(4)?,
        text: row.get(5)?,
        is_moderated: row.get(6)?,
        is_published: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
        ..Default::default()
    })
}

/// Rating count and average for one specialist
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct RatingSummary {
    pub count: usize,
    pub average: f64,
}

pub struct ReviewRepo<'a> {
    store: &'a Store,
}

impl<'a> ReviewRepo<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    fn conn(&self) -> &Connection {
        self.store.conn()
    }

    fn load_attachments(&self, parent: Parent, parent_id: &str) -> Result<Vec<FileRef>> {
        let (table, key) = parent.attachments_table();
        let files = self
            .conn()
            .prepare_cached(&format!(
                "SELECT path, name, type FROM {} WHERE {} = ?1 ORDER BY id",
                table, key
            ))?
            .query_map([parent_id], |row| {
                Ok(FileRef {
                    path: row.get(0)?,
                    name: row.get(1)?,
                    file_type: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(files)
    }

    fn load_reactions(&self, parent: Parent, parent_id: &str) -> Result<Vec<Reaction>> {
        let (table, key) = parent.reactions_table();
        let reactions = self
            .conn()
            .prepare_cached(&format!(
                "SELECT user_id, type, created_at FROM {} WHERE {} = ?1 ORDER BY created_at, user_id, type",
                table, key
            ))?
            .query_map([parent_id], |row| {
                Ok(Reaction {
                    user_id: row.get(0)?,
                    kind: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(reactions)
    }

    fn hydrate(&self, mut review: Review) -> Result<Review> {
        review.attachments = self.load_attachments(Parent::Review, &review.id)?;
        review.reactions = self.load_reactions(Parent::Review, &review.id)?;

        let replies = self
            .conn()
            .prepare_cached(
                "SELECT id, user_id, author_name, text, is_published, created_at, updated_at
                 FROM review_replies WHERE review_id = ?1 ORDER BY created_at, rowid",
            )?
            .query_map([&review.id], |row| {
                Ok(ReviewReply {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    author_name: row.get(2)?,
                    text: row.get(3)?,
                    is_published: row.get(4)?,
                    created_at: row.get(5)?,
                    updated_at: row.get(6)?,
                    ..Default::default()
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        review.replies = Vec::with_capacity(replies.len());
        for mut reply in replies {
            reply.attachments = self.load_attachments(Parent::Reply, &reply.id)?;
            reply.reactions = self.load_reactions(Parent::Reply, &reply.id)?;
            review.replies.push(reply);
        }
        Ok(review)
    }

    fn query(&self, filter: &str, param: Option<&str>) -> Result<Vec<Review>> {
        let sql = format!(
            "SELECT {} FROM reviews {} ORDER BY created_at DESC, id",
            REVIEW_COLUMNS, filter
        );
        let mut stmt = self.conn().prepare_cached(&sql)?;
        let rows = match param {
            Some(p) => stmt.query_map([p], row_to_review)?.collect::<std::result::Result<Vec<_>, _>>()?,
            None => stmt.query_map([], row_to_review)?.collect::<std::result::Result<Vec<_>, _>>()?,
        };
        rows.into_iter().map(|row| self.hydrate(row)).collect()
    }

    pub fn get_by_specialist_id(&self, specialist_id: &str) -> Result<Vec<Review>> {
        self.query("WHERE specialist_id = ?1", Some(specialist_id))
    }

    pub fn get_by_user_id(&self, user_id: &str) -> Result<Vec<Review>> {
        self.query("WHERE user_id = ?1", Some(user_id))
    }

    /// Published reviews for one specialist, or for everyone
    pub fn get_published(&self, specialist_id: Option<&str>) -> Result<Vec<Review>> {
        match specialist_id {
            Some(id) => self.query("WHERE is_published = 1 AND specialist_id = ?1", Some(id)),
            None => self.query("WHERE is_published = 1", None),
        }
    }

    /// Reviews still waiting for a moderator
    pub fn get_pending_moderation(&self) -> Result<Vec<Review>> {
        self.query("WHERE is_moderated = 0", None)
    }

    /// Mark a review as moderated and publish or hide it
    pub fn moderate(&self, id: &str, publish: bool) -> Result<bool> {
        let changed = self.conn().execute(
            "UPDATE reviews SET is_moderated = 1, is_published = ?1, updated_at = ?2 WHERE id = ?3",
            params![publish, crate::model::now(), id],
        )?;
        Ok(changed > 0)
    }

    /// Count and average over published reviews
    pub fn rating_summary(&self, specialist_id: &str) -> Result<RatingSummary> {
        let (count, average): (i64, Option<f64>) = self.conn().query_row(
            "SELECT COUNT(*), AVG(rating) FROM reviews WHERE specialist_id = ?1 AND is_published = 1",
            [specialist_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(RatingSummary {
            count: count as usize,
            average: average.unwrap_or(0.0),
        })
    }

    /// Record a reaction; the same user reacting with the same type again
    /// only refreshes the timestamp.
    pub fn set_reaction(&self, review_id: &str, user_id: &str, kind: &str) -> Result<()> {
        self.conn()
            .prepare_cached(
                "INSERT OR REPLACE INTO review_reactions (review_id, user_id, type, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
            )?
            .execute(params![review_id, user_id, kind, crate::model::now()])?;
        Ok(())
    }

    pub fn remove_reaction(&self, review_id: &str, user_id: &str, kind: &str) -> Result<bool> {
        let removed = self.conn().execute(
            "DELETE FROM review_reactions WHERE review_id = ?1 AND user_id = ?2 AND type = ?3",
            params![review_id, user_id, kind],
        )?;
        Ok(removed > 0)
    }

    /// Append a reply to an existing review
    pub fn add_reply(&self, review_id: &str, mut reply: ReviewReply) -> Result<ReviewReply> {
        if !exists(self.conn(), "reviews", review_id)? {
            return Err(Error::NotFound(format!("review {}", review_id)));
        }
        reply.id = id_or_new(&reply.id);
        let now = crate::model::now();
        reply.created_at.get_or_insert_with(|| now.clone());
        reply.updated_at = Some(now);

        let tx = self.store.transaction()?;
        upsert_reply(&tx, review_id, &reply.id, &reply)?;
        tx.commit()?;
        Ok(reply)
    }

    pub fn delete_reply(&self, reply_id: &str) -> Result<bool> {
        let files = self.load_attachments(Parent::Reply, reply_id)?;
        let removed = self
            .conn()
            .execute("DELETE FROM review_replies WHERE id = ?1", [reply_id])?
            > 0;
        if removed {
            self.store.media().remove_files(files.iter().map(|f| f.path.as_str()));
        }
        Ok(removed)
    }

    /// Attachment paths of a review and all of its replies
    fn attachment_paths(&self, review_id: &str) -> Result<Vec<String>> {
        let paths = self
            .conn()
            .prepare_cached(
                "SELECT path FROM review_attachments WHERE review_id = ?1
                 UNION ALL
                 SELECT ra.path FROM reply_attachments ra
                 JOIN review_replies rr ON rr.id = ra.reply_id WHERE rr.review_id = ?1",
            )?
            .query_map([review_id], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(paths)
    }
}

impl Repository for ReviewRepo<'_> {
    type Entity = Review;
    type Patch = ReviewPatch;

    fn get_all(&self) -> Result<Vec<Review>> {
        self.query("", None)
    }

    fn get_by_id(&self, id: &str) -> Result<Option<Review>> {
        let sql = format!("SELECT {} FROM reviews WHERE id = ?1", REVIEW_COLUMNS);
        let row = self
            .conn()
            .prepare_cached(&sql)?
            .query_row([id], row_to_review)
            .optional()?;
        row.map(|row| self.hydrate(row)).transpose()
    }

    fn create(&self, mut review: Review) -> Result<Review> {
        review.id = id_or_new(&review.id);
        if !rating_in_range(review.rating) {
            return Err(Error::Invalid(format!("rating {} is outside 1..5", review.rating)));
        }
        if !exists(self.conn(), "specialists", &review.specialist_id)? {
            return Err(Error::NotFound(format!("specialist {}", review.specialist_id)));
        }
        if exists(self.conn(), "reviews", &review.id)? {
            return Err(Error::Invalid(format!("review {} already exists", review.id)));
        }
        let now = crate::model::now();
        review.created_at.get_or_insert_with(|| now.clone());
        review.updated_at = Some(now);

        let tx = self.store.transaction()?;
        upsert_row(&tx, &review)?;
        replace_children(&tx, &review)?;
        tx.commit()?;

        self.get_by_id(&review.id)?
            .ok_or_else(|| Error::NotFound(format!("review {}", review.id)))
    }

    fn update(&self, id: &str, patch: ReviewPatch) -> Result<Option<Review>> {
        if !exists(self.conn(), "reviews", id)? {
            return Ok(None);
        }
        if let Some(rating) = patch.rating {
            if !rating_in_range(rating) {
                return Err(Error::Invalid(format!("rating {} is outside 1..5", rating)));
            }
        }

        let mut updates = ColumnUpdates::new();
        updates
            .set("author_name", patch.author_name)
            .set("rating", patch.rating)
            .set("text", patch.text)
            .set("is_moderated", patch.is_moderated)
            .set("is_published", patch.is_published);
        if !updates.is_empty() || patch.attachments.is_some() {
            updates.set("updated_at", Some(crate::model::now()));
        }

        let tx = self.store.transaction()?;
        updates.apply(&tx, "reviews", id)?;
        if let Some(files) = &patch.attachments {
            replace_attachments(&tx, Parent::Review, id, files)?;
        }
        tx.commit()?;

        self.get_by_id(id)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let files = self.attachment_paths(id)?;
        let removed = self.conn().execute("DELETE FROM reviews WHERE id = ?1", [id])? > 0;
        if removed {
            self.store.media().remove_files(files.iter().map(String::as_str));
        }
        Ok(removed)
    }
}
