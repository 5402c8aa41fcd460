use std::collections::HashSet;
use std::path::Path;

use super::{UniqueClaims, exact, null_if_missing, release_unique, stored_values};
use crate::migrate::source::parse_records;
use crate::migrate::{Migrator, Stage, StageReport};
use crate::model::Article;
use crate::repo::article::{replace_tags, slug_or_id, upsert_row};
use crate::storage::{Store, load_ids};
use crate::Result;

/// `articles/articles.json` into `articles` and `article_tags`. A slug
/// already held by another article skips the record.
pub struct ArticlesMigrator;

impl Migrator for ArticlesMigrator {
    fn stage(&self) -> Stage {
        Stage::Articles
    }

    fn migrate(&self, store: &Store, source: &Path, report: &mut StageReport) -> Result<()> {
        let records = parse_records(source, report, |a: &Article| a.id.clone())?;
        if records.is_empty() {
            return Ok(());
        }

        let tx = store.transaction()?;
        let specialists = load_ids(&tx, "specialists")?;

        let batch: HashSet<&str> = records.iter().map(|(id, _)| id.as_str()).collect();
        let stored_slugs = stored_values(&tx, "articles", "slug", &batch)?;
        release_unique(&tx, "articles", "slug = 'migrating:' || id", batch.iter().copied())?;
        let mut slugs = UniqueClaims::load(&tx, "articles", "slug", &batch, exact)?;

        let mut skipped = Vec::new();
        for (id, mut article) in records {
            article.id = id;
            let slug = slug_or_id(&article);
            if !slugs.claim(&slug, &article.id) {
                report.skip(&article.id, format!("slug {} is already taken", slug));
                skipped.push(article.id);
                continue;
            }
            null_if_missing(report, &article.id, "specialistId", &mut article.specialist_id, &specialists);

            upsert_row(&tx, &article)?;
            replace_tags(&tx, &article.id, &article.distinct_tags())?;
            report.written += 1;
        }

        // A skipped record keeps its stored row, under its old slug when that is still free
        for id in skipped {
            let Some(old) = stored_slugs.get(&id) else {
                continue;
            };
            if slugs.claim(old, &id) {
                tx.execute("UPDATE articles SET slug = ?2 WHERE id = ?1", [&id, old])?;
            } else {
                tracing::warn!("article {} keeps placeholder slug migrating:{}", id, id);
            }
        }

        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::Issue;
    use crate::repo::Repository;
    use std::fs;

    fn run(store: &Store, body: &str) -> StageReport {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.json");
        fs::write(&path, body).unwrap();
        let mut report = StageReport::new(Stage::Articles, &path);
        ArticlesMigrator.migrate(store, &path, &mut report).unwrap();
        report
    }

    #[test]
    fn test_duplicate_slug_skips_and_dangling_author_nulls() {
        let store = Store::open_in_memory().unwrap();
        let report = run(
            &store,
            r#"[
                {"id": "a1", "title": "Осанка", "slug": "posture", "tags": ["спина", "спина", "йога"],
                 "specialistId": "s404", "status": "published"},
                {"id": "a2", "title": "Copy", "slug": "posture"},
                {"id": "a3", "title": "No slug"}
            ]"#,
        );

        assert_eq!(report.written, 2);
        assert_eq!(report.skipped, 1);
        assert!(matches!(report.for_record("a2").next(), Some(Issue::Skipped { .. })));
        assert!(matches!(report.for_record("a1").next(), Some(Issue::Nulled { .. })));

        let articles = store.articles();
        let a1 = articles.get_by_slug("posture").unwrap().unwrap();
        assert_eq!(a1.id, "a1");
        assert!(a1.specialist_id.is_none());
        assert_eq!(a1.tags, vec!["спина", "йога"]);
        assert_eq!(articles.get_by_id("a3").unwrap().unwrap().slug, "a3");
    }

    #[test]
    fn test_rerun_is_stable() {
        let store = Store::open_in_memory().unwrap();
        let body = r#"[{"id": "a1", "title": "One", "slug": "one", "tags": ["x"]}]"#;
        run(&store, body);
        let report = run(&store, body);

        assert!(report.diagnostics.is_empty());
        assert_eq!(store.count("articles").unwrap(), 1);
        assert_eq!(store.count("article_tags").unwrap(), 1);
        assert_eq!(store.articles().get_by_id("a1").unwrap().unwrap().slug, "one");
    }
}
