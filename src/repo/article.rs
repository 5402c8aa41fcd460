//! Article repository

use rusqlite::{Connection, OptionalExtension, params};

use super::{ColumnUpdates, Repository, delete_by_id, exists, id_or_new, matches_query};
use crate::model::{Article, ArticlePatch};
use crate::storage::Store;
use crate::{Error, Result};

const ARTICLE_COLUMNS: &str =
    "id, title, slug, content, excerpt, image, status, specialist_id, created_at, updated_at";

pub(crate) const UPSERT_ARTICLE: &str = r#"
INSERT INTO articles (id, title, slug, content, excerpt, image, status, specialist_id,
                      created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
ON CONFLICT(id) DO UPDATE SET
    title = excluded.title,
    slug = excluded.slug,
    content = excluded.content,
    excerpt = excluded.excerpt,
    image = excluded.image,
    status = excluded.status,
    specialist_id = excluded.specialist_id,
    created_at = excluded.created_at,
    updated_at = excluded.updated_at
"#;

/// Articles without a slug are addressed by id
pub(crate) fn slug_or_id(article: &Article) -> String {
    let slug = article.slug.trim();
    if slug.is_empty() {
        article.id.clone()
    } else {
        slug.to_string()
    }
}

pub(crate) fn upsert_row(conn: &Connection, a: &Article) -> Result<()> {
    conn.prepare_cached(UPSERT_ARTICLE)?.execute(params![
        a.id,
        a.title,
        slug_or_id(a),
        a.content,
        a.excerpt,
        a.image,
        a.status,
        a.specialist_id,
        a.created_at,
        a.updated_at,
    ])?;
    Ok(())
}

pub(crate) fn replace_tags(conn: &Connection, article_id: &str, tags: &[&str]) -> Result<()> {
    conn.prepare_cached("DELETE FROM article_tags WHERE article_id = ?1")?
        .execute([article_id])?;
    let mut insert = conn.prepare_cached("INSERT OR IGNORE INTO article_tags (article_id, tag) VALUES (?1, ?2)")?;
    for tag in tags {
        insert.execute(params![article_id, tag])?;
    }
    Ok(())
}

fn row_to_article(row: &rusqlite::Row) -> rusqlite::Result<Article> {
    Ok(Article {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        content: row.get(3)?,
        excerpt: row.get(4)?,
        image: row.get(5)?,
        status: row.get(6)?,
        specialist_id: row.get(7)?,
        tags: Vec::new(),
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

pub struct ArticleRepo<'a> {
    store: &'a Store,
}

impl<'a> ArticleRepo<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    fn conn(&self) -> &Connection {
        self.store.conn()
    }

    fn hydrate(&self, mut article: Article) -> Result<Article> {
        article.tags = self
            .conn()
            .prepare_cached("SELECT tag FROM article_tags WHERE article_id = ?1 ORDER BY rowid")?
            .query_map([&article.id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        article.image = article
            .image
            .as_deref()
            .map(|image| self.store.media().resolve_image(image));
        Ok(article)
    }

    fn query(&self, filter: &str, param: Option<&str>) -> Result<Vec<Article>> {
        let sql = format!(
            "SELECT {} FROM articles {} ORDER BY created_at DESC, id",
            ARTICLE_COLUMNS, filter
        );
        let mut stmt = self.conn().prepare_cached(&sql)?;
        let rows = match param {
            Some(p) => stmt.query_map([p], row_to_article)?.collect::<std::result::Result<Vec<_>, _>>()?,
            None => stmt.query_map([], row_to_article)?.collect::<std::result::Result<Vec<_>, _>>()?,
        };
        rows.into_iter().map(|row| self.hydrate(row)).collect()
    }

    pub fn get_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        let sql = format!("SELECT {} FROM articles WHERE slug = ?1", ARTICLE_COLUMNS);
        let row = self
            .conn()
            .prepare_cached(&sql)?
            .query_row([slug.trim()], row_to_article)
            .optional()?;
        row.map(|row| self.hydrate(row)).transpose()
    }

    /// Published articles, newest first
    pub fn get_published(&self) -> Result<Vec<Article>> {
        self.query("WHERE status = 'published'", None)
    }

    pub fn get_by_specialist_id(&self, specialist_id: &str) -> Result<Vec<Article>> {
        self.query("WHERE specialist_id = ?1", Some(specialist_id))
    }

    pub fn get_by_tag(&self, tag: &str) -> Result<Vec<Article>> {
        self.query(
            "WHERE id IN (SELECT article_id FROM article_tags WHERE tag = ?1)",
            Some(tag.trim()),
        )
    }

    /// Case-insensitive search over title, excerpt, content and tags
    pub fn search(&self, query: &str) -> Result<Vec<Article>> {
        let all = self.query("", None)?;
        Ok(all
            .into_iter()
            .filter(|a| {
                let fields = [Some(a.title.as_str()), a.excerpt.as_deref(), Some(a.content.as_str())];
                matches_query(
                    query,
                    fields.into_iter().flatten().chain(a.tags.iter().map(String::as_str)),
                )
            })
            .collect())
    }

    fn ensure_slug_free(&self, slug: &str, own_id: &str) -> Result<()> {
        let owner: Option<String> = self
            .conn()
            .query_row("SELECT id FROM articles WHERE slug = ?1", [slug], |row| row.get(0))
            .optional()?;
        match owner {
            Some(owner) if owner != own_id => Err(Error::Invalid(format!("slug {} is already taken", slug))),
            _ => Ok(()),
        }
    }
}

impl Repository for ArticleRepo<'_> {
    type Entity = Article;
    type Patch = ArticlePatch;

    fn get_all(&self) -> Result<Vec<Article>> {
        self.query("", None)
    }

    fn get_by_id(&self, id: &str) -> Result<Option<Article>> {
        let sql = format!("SELECT {} FROM articles WHERE id = ?1", ARTICLE_COLUMNS);
        let row = self
            .conn()
            .prepare_cached(&sql)?
            .query_row([id], row_to_article)
            .optional()?;
        row.map(|row| self.hydrate(row)).transpose()
    }

    fn create(&self, mut article: Article) -> Result<Article> {
        article.id = id_or_new(&article.id);
        if article.title.trim().is_empty() {
            return Err(Error::Invalid("article title is required".into()));
        }
        if exists(self.conn(), "articles", &article.id)? {
            return Err(Error::Invalid(format!("article {} already exists", article.id)));
        }
        article.slug = slug_or_id(&article);
        self.ensure_slug_free(&article.slug, &article.id)?;

        let now = crate::model::now();
        article.created_at.get_or_insert_with(|| now.clone());
        article.updated_at = Some(now);

        let tx = self.store.transaction()?;
        upsert_row(&tx, &article)?;
        replace_tags(&tx, &article.id, &article.distinct_tags())?;
        tx.commit()?;

        self.get_by_id(&article.id)?
            .ok_or_else(|| Error::NotFound(format!("article {}", article.id)))
    }

    fn update(&self, id: &str, patch: ArticlePatch) -> Result<Option<Article>> {
        if !exists(self.conn(), "articles", id)? {
            return Ok(None);
        }
        if let Some(slug) = &patch.slug {
            if slug.trim().is_empty() {
                return Err(Error::Invalid("slug cannot be empty".into()));
            }
            self.ensure_slug_free(slug.trim(), id)?;
        }

        let tags = patch.tags.map(|tags| Article { tags, ..Default::default() });
        let mut updates = ColumnUpdates::new();
        updates
            .set("title", patch.title)
            .set("slug", patch.slug.map(|s| s.trim().to_string()))
            .set("content", patch.content)
            .set("excerpt", patch.excerpt)
            .set("image", patch.image)
            .set("status", patch.status)
            .set("specialist_id", patch.specialist_id);
        if !updates.is_empty() || tags.is_some() {
            updates.set("updated_at", Some(crate::model::now()));
        }

        let tx = self.store.transaction()?;
        updates.apply(&tx, "articles", id)?;
        if let Some(tags) = &tags {
            replace_tags(&tx, id, &tags.distinct_tags())?;
        }
        tx.commit()?;

        self.get_by_id(id)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let image: Option<Option<String>> = self
            .conn()
            .query_row("SELECT image FROM articles WHERE id = ?1", [id], |row| row.get(0))
            .optional()?;
        let removed = delete_by_id(self.conn(), "articles", id)?;
        if let Some(Some(image)) = image.filter(|_| removed) {
            let variants = self.store.media().variants(&image);
            self.store.media().remove_files(variants.iter().map(String::as_str));
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ArticleStatus;

    fn article(id: &str, title: &str, slug: &str) -> Article {
        Article {
            id: id.into(),
            title: title.into(),
            slug: slug.into(),
            content: "Body".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_tags_round_trip_and_lookup() {
        let store = Store::open_in_memory().unwrap();
        let mut input = article("a1", "Breathing", "breathing");
        input.tags = vec!["health".into(), " health ".into(), "yoga".into()];
        input.status = ArticleStatus::Published;
        store.articles().create(input).unwrap();

        let loaded = store.articles().get_by_slug("breathing").unwrap().unwrap();
        assert_eq!(loaded.tags, vec!["health", "yoga"]);
        assert!(loaded.status.is_published());
        assert_eq!(store.articles().get_by_tag("yoga").unwrap().len(), 1);
        assert_eq!(store.articles().get_published().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_slug_falls_back_to_id() {
        let store = Store::open_in_memory().unwrap();
        let created = store.articles().create(article("a1", "Title", "")).unwrap();
        assert_eq!(created.slug, "a1");
    }

    #[test]
    fn test_duplicate_slug_rejected() {
        let store = Store::open_in_memory().unwrap();
        store.articles().create(article("a1", "One", "same")).unwrap();
        assert!(store.articles().create(article("a2", "Two", "same")).is_err());

        store.articles().create(article("a3", "Three", "three")).unwrap();
        let patch = ArticlePatch {
            slug: Some("same".into()),
            ..Default::default()
        };
        assert!(store.articles().update("a3", patch).is_err());
    }

    #[test]
    fn test_search_and_update_tags() {
        let store = Store::open_in_memory().unwrap();
        store.articles().create(article("a1", "Массаж спины", "massage")).unwrap();
        store.articles().create(article("a2", "Yoga basics", "yoga")).unwrap();

        let found = store.articles().search("МАССАЖ").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "a1");

        let patch = ArticlePatch {
            tags: Some(vec!["beginner".into()]),
            ..Default::default()
        };
        let updated = store.articles().update("a2", patch).unwrap().unwrap();
        assert_eq!(updated.tags, vec!["beginner"]);
        assert_eq!(updated.title, "Yoga basics");
        assert_eq!(store.articles().search("beginner").unwrap().len(), 1);
    }
}
