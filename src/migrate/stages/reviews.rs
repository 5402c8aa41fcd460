use std::collections::HashSet;
use std::path::Path;

use super::{keep_last_occurrence, null_if_missing};
use crate::migrate::source::parse_records;
use crate::migrate::{Migrator, Stage, StageReport};
use crate::model::{Reaction, Review, rating_in_range};
use crate::repo::review::{replace_children, replace_replies, upsert_row};
use crate::storage::{Store, load_ids};
use crate::Result;

/// `reviews.json` into `reviews` and its attachment, reaction and reply
/// tables.
///
/// A review without its specialist, or with a rating outside 1..5, is
/// skipped. A missing author only clears `userId`.
pub struct ReviewsMigrator;

impl Migrator for ReviewsMigrator {
    fn stage(&self) -> Stage {
        Stage::Reviews
    }

    fn migrate(&self, store: &Store, source: &Path, report: &mut StageReport) -> Result<()> {
        let parsed = parse_records(source, report, |r: &Review| r.id.clone())?;
        let records = keep_last_occurrence(report, parsed);
        if records.is_empty() {
            return Ok(());
        }

        let tx = store.transaction()?;
        let specialists = load_ids(&tx, "specialists")?;
        let users = load_ids(&tx, "users")?;

        let mut accepted = Vec::with_capacity(records.len());
        for (id, mut review) in records {
            review.id = id;
            if !specialists.contains(&review.specialist_id) {
                report.skip(
                    &review.id,
                    format!("specialist {} does not exist", review.specialist_id),
                );
                continue;
            }
            if !rating_in_range(review.rating) {
                report.skip(&review.id, format!("rating {} is outside 1..5", review.rating));
                continue;
            }
            accepted.push(review);
        }

        // Replies are rewritten from scratch, so their old ids are free again.
        // Skipped reviews keep what is stored.
        for review in &accepted {
            replace_replies(&tx, &review.id, &[])?;
        }
        let mut reply_ids: HashSet<String> = load_ids(&tx, "review_replies")?;

        for mut review in accepted {
            null_if_missing(report, &review.id, "userId", &mut review.user_id, &users);
            keep_known_reactions(report, &review.id, &mut review.reactions, &users);

            let review_id = review.id.clone();
            let mut replies = Vec::with_capacity(review.replies.len());
            for (index, mut reply) in std::mem::take(&mut review.replies).into_iter().enumerate() {
                let mut reply_id = reply.id_for(&review_id, index);
                if reply_ids.contains(&reply_id) {
                    let derived = format!("{}-reply-{}", review_id, index);
                    if reply_ids.contains(&derived) {
                        report.child_dropped(&review_id, "replies", format!("reply id {} is already taken", reply_id));
                        continue;
                    }
                    report.duplicate(&review_id, "replies.id", reply_id);
                    reply_id = derived;
                }
                reply_ids.insert(reply_id.clone());
                reply.id = reply_id;

                null_if_missing(report, &review_id, "replies.userId", &mut reply.user_id, &users);
                keep_known_reactions(report, &review_id, &mut reply.reactions, &users);
                replies.push(reply);
            }
            review.replies = replies;

            upsert_row(&tx, &review)?;
            replace_children(&tx, &review)?;
            report.written += 1;
        }

        tx.commit()?;
        Ok(())
    }
}

/// Reactions are keyed by user, so one from a user that does not exist
/// cannot be kept.
fn keep_known_reactions(
    report: &mut StageReport,
    record_id: &str,
    reactions: &mut Vec<Reaction>,
    users: &HashSet<String>,
) {
    reactions.retain(|reaction| {
        let known = users.contains(&reaction.user_id);
        if !known {
            report.child_dropped(
                record_id,
                "reactions",
                format!("user {} does not exist", reaction.user_id),
            );
        }
        known
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::Issue;
    use crate::repo::Repository;
    use std::fs;

    fn seeded() -> Store {
        let store = Store::open_in_memory().unwrap();
        store
            .conn()
            .execute_batch(
                "INSERT INTO users (id) VALUES ('u1');
                 INSERT INTO specialists (id, first_name, last_name) VALUES ('s1', 'A', 'A');",
            )
            .unwrap();
        store
    }

    fn run(store: &Store, body: &str) -> StageReport {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.json");
        fs::write(&path, body).unwrap();
        let mut report = StageReport::new(Stage::Reviews, &path);
        ReviewsMigrator.migrate(store, &path, &mut report).unwrap();
        report
    }

    #[test]
    fn test_skip_versus_null() {
        let store = seeded();
        let report = run(
            &store,
            r#"[
                {"id": "r1", "specialistId": "s1", "userId": "u404", "rating": 5, "text": "Отлично"},
                {"id": "r2", "specialistId": "s404", "userId": "u1", "rating": 4},
                {"id": "r3", "specialistId": "s1", "rating": 9}
            ]"#,
        );

        assert_eq!(report.written, 1);
        assert_eq!(report.skipped, 2);
        assert!(matches!(report.for_record("r1").next(), Some(Issue::Nulled { .. })));
        assert!(matches!(report.for_record("r2").next(), Some(Issue::Skipped { .. })));
        assert!(matches!(report.for_record("r3").next(), Some(Issue::Skipped { .. })));
        assert!(store.reviews().get_by_id("r1").unwrap().unwrap().user_id.is_none());
    }

    #[test]
    fn test_replies_and_reactions() {
        let store = seeded();
        let body = r#"[{
            "id": "r1", "specialistId": "s1", "userId": "u1", "rating": 5,
            "reactions": [{"userId": "u1", "type": "like"}, {"userId": "u404", "type": "like"}],
            "replies": [
                {"userId": "u404", "text": "Спасибо!", "reactions": [{"userId": "u1", "type": "like"}]},
                {"id": "rep-9", "text": "Ждём снова"}
            ]
        }]"#;
        let report = run(&store, body);

        assert_eq!(report.written, 1);
        let review = store.reviews().get_by_id("r1").unwrap().unwrap();
        assert_eq!(review.reactions.len(), 1);
        assert_eq!(review.replies.len(), 2);
        assert_eq!(review.replies[0].id, "r1-reply-0");
        assert!(review.replies[0].user_id.is_none());
        assert_eq!(review.replies[0].reactions.len(), 1);

        run(&store, body);
        assert_eq!(store.count("review_replies").unwrap(), 2);
        assert_eq!(store.count("reply_reactions").unwrap(), 1);
    }

    #[test]
    fn test_skipped_rerun_keeps_stored_replies() {
        let store = seeded();
        run(
            &store,
            r#"[{"id": "r1", "specialistId": "s1", "rating": 5, "text": "v1",
                 "replies": [{"userId": "u1", "text": "Спасибо", "reactions": [{"userId": "u1", "type": "like"}]}]}]"#,
        );

        let report = run(
            &store,
            r#"[{"id": "r1", "specialistId": "s1", "rating": 9, "text": "v2",
                 "replies": [{"userId": "u1", "text": "Другой ответ"}]}]"#,
        );

        assert_eq!((report.written, report.skipped), (0, 1));
        let review = store.reviews().get_by_id("r1").unwrap().unwrap();
        assert_eq!(review.text, "v1");
        assert_eq!(review.replies.len(), 1);
        assert_eq!(review.replies[0].text, "Спасибо");
        assert_eq!(store.count("reply_reactions").unwrap(), 1);
    }

    #[test]
    fn test_repeated_id_keeps_last_record_with_its_replies() {
        let store = seeded();
        let report = run(
            &store,
            r#"[
                {"id": "r1", "specialistId": "s1", "rating": 4, "replies": [{"text": "первый"}]},
                {"id": "r1", "specialistId": "s1", "rating": 5, "replies": [{"text": "второй"}]}
            ]"#,
        );

        assert_eq!((report.written, report.skipped), (1, 1));
        let review = store.reviews().get_by_id("r1").unwrap().unwrap();
        assert_eq!(review.rating, 5);
        assert_eq!(review.replies.len(), 1);
        assert_eq!(review.replies[0].text, "второй");
    }

    #[test]
    fn test_many_replies_keep_source_order() {
        let store = seeded();
        let replies: Vec<String> = (0..12).map(|i| format!(r#"{{"text": "ответ {}"}}"#, i)).collect();
        let body = format!(
            r#"[{{"id": "r1", "specialistId": "s1", "rating": 5, "replies": [{}]}}]"#,
            replies.join(",")
        );
        run(&store, &body);

        let review = store.reviews().get_by_id("r1").unwrap().unwrap();
        let texts: Vec<String> = review.replies.iter().map(|r| r.text.clone()).collect();
        let expected: Vec<String> = (0..12).map(|i| format!("ответ {}", i)).collect();
        assert_eq!(texts, expected);
        assert_eq!(review.replies[10].id, "r1-reply-10");
    }
}
