//! Legacy JSON data trees for the integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use wellness_store::config::StoreConfig;
use wellness_store::storage::Store;

pub const USERS: &str = r#"[
    {"id": "u1", "email": "anna@example.com", "firstName": "Анна", "role": "specialist",
     "referralCode": "ANNA2024", "bonusPoints": 120},
    {"id": "u2", "email": "boris@example.com", "firstName": "Борис", "referredBy": "u1",
     "favorites": {"specialists": ["s1"], "services": [1]}},
    {"id": "u3", "email": "ANNA@example.com", "firstName": "Двойник"}
]"#;

pub const SPECIALISTS: &str = r#"[
    {
        "id": "s1",
        "firstName": "Анна",
        "lastName": "Иванова",
        "position": "Остеопат",
        "additionalPositions": ["Массажист"],
        "photo": "/uploads/specialists/anna.webp",
        "order": 0,
        "userId": "u1",
        "services": [1, "2"],
        "documents": [{"path": "/uploads/docs/diploma.pdf", "name": "Диплом"}],
        "workSchedule": {
            "id": "ws-s1",
            "enabled": true,
            "workDays": [
                {"day": 1, "active": true, "startTime": "09:00", "endTime": "18:00",
                 "lunchBreaks": [
                     {"enabled": true, "startTime": "12:00", "endTime": "12:30"},
                     {"enabled": true, "startTime": "15:00", "endTime": "15:15"}
                 ]},
                {"day": 3, "active": true, "startTime": "10:00", "endTime": "16:00"}
            ],
            "vacations": [{"enabled": true, "startDate": "2024-07-01", "endDate": "2024-07-14"}]
        }
    },
    {"id": "s2", "firstName": "Пётр", "lastName": "Смирнов", "order": 1, "userId": "ghost", "services": [404]},
    {"id": "s3", "firstName": "Ольга", "lastName": "Кузнецова", "order": 2},
    {"id": "s4", "firstName": "Игорь", "lastName": "Орлов", "order": 3}
]"#;

pub const SERVICES: &str = r#"[
    {"id": 1, "name": "Остеопатия", "price": "4500", "duration": 60, "order": 0},
    {"id": "2", "name": "Массаж", "price": 3000, "duration": 45, "order": 1}
]"#;

pub const ARTICLES: &str = r#"[
    {"id": "a1", "title": "Здоровая спина", "slug": "healthy-back", "content": "...",
     "status": "published", "specialistId": "s1", "tags": ["спина", "осанка"]},
    {"id": "a2", "title": "Дубль", "slug": "healthy-back"}
]"#;

pub const REVIEWS: &str = r#"[
    {"id": "r1", "specialistId": "s1", "userId": "u2", "rating": 5, "text": "Спасибо!",
     "isPublished": true, "reactions": [{"userId": "u1", "type": "like"}],
     "replies": [{"userId": "u1", "text": "Рады помочь"}]},
    {"id": "r2", "specialistId": "s404", "userId": "u2", "rating": 4},
    {"id": "r3", "specialistId": "s1", "userId": "u404", "rating": 4, "text": "Хорошо"}
]"#;

pub const APPOINTMENTS: &str = r#"[
    {"id": "ap1", "specialistId": "s1", "userId": "u2", "serviceId": 1, "date": "2024-05-20",
     "startTime": "10:00", "endTime": "11:00", "status": "confirmed", "price": 4500},
    {"id": "ap2", "specialistId": "s404", "date": "2024-05-21"}
]"#;

pub const EVENTS: &str = r#"[{"id": "e1", "title": "Йога в парке", "date": "2024-06-01", "isPublished": true}]"#;

pub const SETTINGS: &str = r#"{"siteName": "Гармония", "bookingEnabled": true}"#;

pub const FAQ: &str = r#"[{"id": "f1", "question": "Как записаться?", "answer": "Онлайн", "order": 0}]"#;

pub const PROMO_CODES: &str = r#"[
    {"id": "p1", "code": "spring10", "discountType": "percent", "discountValue": 10, "specialistId": "s1"}
]"#;

pub const BONUSES: &str = r#"[
    {"id": "b1", "userId": "u1", "amount": 100, "type": "referral", "referredUserId": "u2"}
]"#;

pub fn write(root: &Path, relative: &str, body: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, body).unwrap();
}

/// A complete data directory under `root`
pub fn write_full_tree(root: &Path) {
    write(root, "users/users.json", USERS);
    write(root, "specialists/specialists.json", SPECIALISTS);
    write(root, "services/services.json", SERVICES);
    write(root, "articles/articles.json", ARTICLES);
    write(root, "reviews.json", REVIEWS);
    write(root, "appointments/appointments.json", APPOINTMENTS);
    write(root, "events/events.json", EVENTS);
    write(root, "settings/settings.json", SETTINGS);
    write(root, "faq/faq.json", FAQ);
    write(root, "promocodes/promocodes.json", PROMO_CODES);
    write(root, "bonuses/transactions.json", BONUSES);
}

/// Data, media and database locations inside one temporary directory
pub struct Workspace {
    pub dir: tempfile::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("public")).unwrap();
        Self { dir }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    pub fn media_root(&self) -> PathBuf {
        self.dir.path().join("public")
    }

    pub fn config(&self) -> StoreConfig {
        StoreConfig {
            database: Some(self.dir.path().join("db").join("wellness.db")),
            data_dir: Some(self.data_dir()),
            media_root: Some(self.media_root()),
            placeholder_image: None,
        }
    }

    pub fn open(&self) -> Store {
        Store::from_config(&self.config()).unwrap()
    }
}
