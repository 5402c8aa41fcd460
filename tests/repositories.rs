mod common;

use std::fs;

use common::{Workspace, write_full_tree};
use wellness_store::config::DEFAULT_PLACEHOLDER_IMAGE;
use wellness_store::migrate::{Migration, SourceLayout};
use wellness_store::model::{
    Appointment, FileRef, LunchBreak, Review, ReviewReply, Service, Specialist, SpecialistNote,
    SpecialistPatch, WorkDay, WorkSchedule,
};
use wellness_store::repo::Repository;

fn order_of(store: &wellness_store::Store, id: &str) -> i64 {
    store.specialists().get_by_id(id).unwrap().unwrap().order
}

#[test]
fn test_set_order_moves_only_listed_specialists() {
    let ws = Workspace::new();
    write_full_tree(&ws.data_dir());
    let store = ws.open();
    Migration::new(&store, SourceLayout::new(ws.data_dir())).run();

    assert_eq!(store.specialists().set_order(&["s4", "s2", "nobody"]).unwrap(), 2);

    assert_eq!(order_of(&store, "s4"), 0);
    assert_eq!(order_of(&store, "s2"), 1);
    assert_eq!(order_of(&store, "s1"), 0);
    assert_eq!(order_of(&store, "s3"), 2);
}

#[test]
fn test_photo_falls_back_to_original_then_placeholder() {
    let ws = Workspace::new();
    write_full_tree(&ws.data_dir());
    let original = ws.media_root().join("uploads/specialists/anna.jpg");
    fs::create_dir_all(original.parent().unwrap()).unwrap();
    fs::write(&original, b"jpeg").unwrap();

    let store = ws.open();
    Migration::new(&store, SourceLayout::new(ws.data_dir())).run();
    let specialists = store.specialists();

    let s1 = specialists.get_by_id("s1").unwrap().unwrap();
    assert_eq!(s1.photo.as_deref(), Some("/uploads/specialists/anna.jpg"));

    fs::remove_file(&original).unwrap();
    let s1 = specialists.get_by_id("s1").unwrap().unwrap();
    assert_eq!(s1.photo.as_deref(), Some(DEFAULT_PLACEHOLDER_IMAGE));
}

#[test]
fn test_delete_specialist_removes_every_owned_row_and_file() {
    let ws = Workspace::new();
    let store = ws.open();

    let services = store.services();
    for (id, name) in [("svc-1", "Остеопатия"), ("svc-2", "Массаж")] {
        services
            .create(Service {
                id: id.to_string(),
                name: name.to_string(),
                ..Default::default()
            })
            .unwrap();
    }

    let document = ws.media_root().join("uploads/docs/license.pdf");
    fs::create_dir_all(document.parent().unwrap()).unwrap();
    fs::write(&document, b"%PDF").unwrap();

    let specialist = store
        .specialists()
        .create(Specialist {
            id: "s1".to_string(),
            first_name: "Анна".to_string(),
            last_name: "Иванова".to_string(),
            documents: vec![FileRef::new("/uploads/docs/license.pdf")],
            services: vec!["svc-1".to_string(), "svc-2".to_string()],
            work_schedule: Some(WorkSchedule {
                work_days: vec![WorkDay {
                    day: 2,
                    lunch_breaks: vec![LunchBreak::default()],
                    ..Default::default()
                }],
                ..Default::default()
            }),
            ..Default::default()
        })
        .unwrap();
    store
        .appointments()
        .create(Appointment {
            specialist_id: specialist.id.clone(),
            service_id: Some("svc-1".to_string()),
            date: "2024-05-20".to_string(),
            ..Default::default()
        })
        .unwrap();
    store
        .notes()
        .create(SpecialistNote {
            specialist_id: specialist.id.clone(),
            content: "Аллергия на масло".to_string(),
            ..Default::default()
        })
        .unwrap();
    store
        .reviews()
        .create(Review {
            id: "r1".to_string(),
            specialist_id: specialist.id.clone(),
            rating: 5,
            text: "Спасибо".to_string(),
            replies: vec![ReviewReply {
                text: "Рады помочь".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        })
        .unwrap();
    assert_eq!(store.count("specialist_notes").unwrap(), 1);
    assert_eq!(store.count("review_replies").unwrap(), 1);

    assert!(store.specialists().delete("s1").unwrap());

    assert!(store.specialists().get_by_id("s1").unwrap().is_none());
    for table in [
        "specialist_documents",
        "specialist_positions",
        "specialist_services",
        "work_schedules",
        "work_days",
        "lunch_breaks",
        "vacations",
        "appointments",
        "specialist_notes",
        "reviews",
        "review_replies",
    ] {
        assert_eq!(store.count(table).unwrap(), 0, "{} not emptied", table);
    }
    assert_eq!(store.count("services").unwrap(), 2);
    assert!(!document.exists());
    assert!(!store.specialists().delete("s1").unwrap());
}

#[test]
fn test_patch_replaces_children_only_when_given() {
    let ws = Workspace::new();
    write_full_tree(&ws.data_dir());
    let store = ws.open();
    Migration::new(&store, SourceLayout::new(ws.data_dir())).run();
    let specialists = store.specialists();

    let renamed = specialists
        .update(
            "s1",
            SpecialistPatch {
                middle_name: Some(Some("Петровна".to_string())),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(renamed.middle_name.as_deref(), Some("Петровна"));
    assert_eq!(renamed.work_schedule.as_ref().unwrap().work_days.len(), 2);
    assert_eq!(renamed.services.len(), 2);

    let cleared = specialists
        .update(
            "s1",
            SpecialistPatch {
                services: Some(vec!["2".to_string()]),
                work_schedule: Some(None),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();
    assert!(cleared.work_schedule.is_none());
    assert_eq!(cleared.services, vec!["2"]);
    assert_eq!(store.count("work_days").unwrap(), 0);
    assert!(store.foreign_key_violations().unwrap().is_empty());
}

#[test]
fn test_search_and_lookup_after_migration() {
    let ws = Workspace::new();
    write_full_tree(&ws.data_dir());
    let store = ws.open();
    Migration::new(&store, SourceLayout::new(ws.data_dir())).run();

    let found = store.specialists().search("массаж").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "s1");

    assert_eq!(store.specialists().get_by_user_id("u1").unwrap().unwrap().id, "s1");
    assert_eq!(store.users().get_by_email("Boris@Example.com").unwrap().unwrap().id, "u2");
    assert_eq!(store.users().get_by_referral_code("anna2024").unwrap().unwrap().id, "u1");
    assert_eq!(store.promo_codes().get_by_code("SPRING10").unwrap().unwrap().id, "p1");
    assert_eq!(store.articles().get_by_slug("healthy-back").unwrap().unwrap().tags.len(), 2);
    assert_eq!(store.reviews().get_published(Some("s1")).unwrap().len(), 1);
    assert_eq!(store.appointments().get_by_user_id("u2").unwrap().len(), 1);
    assert_eq!(store.bonuses().get_by_user_id("u1").unwrap().len(), 1);
}

#[test]
fn test_delete_leaves_files_outside_media_root() {
    let ws = Workspace::new();
    let store = ws.open();
    let outside = ws.dir.path().join("outside.txt");
    fs::write(&outside, b"keep").unwrap();

    store
        .specialists()
        .create(Specialist {
            id: "s1".to_string(),
            first_name: "Анна".to_string(),
            last_name: "Иванова".to_string(),
            photo: Some("/../outside.txt".to_string()),
            documents: vec![FileRef::new("/uploads/../../outside.txt")],
            ..Default::default()
        })
        .unwrap();

    assert!(store.specialists().delete("s1").unwrap());
    assert!(outside.exists());
}
