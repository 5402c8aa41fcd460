//! Database schema definitions
//!
//! Table and column names are the durable contract shared with reporting
//! queries, so they are spelled out here once and never generated.

/// SQL to create the users table
pub const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT UNIQUE,
    password_hash TEXT,
    first_name TEXT,
    last_name TEXT,
    phone TEXT,
    role TEXT NOT NULL DEFAULT 'user',
    roles TEXT NOT NULL DEFAULT '[]',
    favorites TEXT NOT NULL DEFAULT '{}',
    bonus_balance REAL NOT NULL DEFAULT 0,
    referral_code TEXT UNIQUE,
    referred_by TEXT REFERENCES users(id) ON DELETE SET NULL,
    created_at TEXT,
    updated_at TEXT
)
"#;

/// SQL to create the specialists table
pub const CREATE_SPECIALISTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS specialists (
    id TEXT PRIMARY KEY,
    first_name TEXT NOT NULL DEFAULT '',
    last_name TEXT NOT NULL DEFAULT '',
    middle_name TEXT,
    photo TEXT,
    description TEXT,
    position TEXT,
    experience INTEGER NOT NULL DEFAULT 0,
    display_order INTEGER NOT NULL DEFAULT 0,
    user_id TEXT REFERENCES users(id) ON DELETE SET NULL,
    created_at TEXT,
    updated_at TEXT
)
"#;

/// Additional positions held by a specialist
pub const CREATE_SPECIALIST_POSITIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS specialist_positions (
    specialist_id TEXT NOT NULL REFERENCES specialists(id) ON DELETE CASCADE,
    position TEXT NOT NULL,
    PRIMARY KEY (specialist_id, position)
)
"#;

pub const CREATE_SPECIALIST_DOCUMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS specialist_documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    specialist_id TEXT NOT NULL REFERENCES specialists(id) ON DELETE CASCADE,
    path TEXT NOT NULL,
    name TEXT,
    type TEXT
)
"#;

/// One schedule per specialist, enforced by the UNIQUE constraint
pub const CREATE_WORK_SCHEDULES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS work_schedules (
    id TEXT PRIMARY KEY,
    specialist_id TEXT NOT NULL UNIQUE REFERENCES specialists(id) ON DELETE CASCADE,
    enabled INTEGER NOT NULL DEFAULT 1
)
"#;

pub const CREATE_WORK_DAYS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS work_days (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    schedule_id TEXT NOT NULL REFERENCES work_schedules(id) ON DELETE CASCADE,
    day INTEGER NOT NULL CHECK (day BETWEEN 0 AND 6),
    active INTEGER NOT NULL DEFAULT 1,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    UNIQUE (schedule_id, day)
)
"#;

pub const CREATE_LUNCH_BREAKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS lunch_breaks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    work_day_id INTEGER NOT NULL REFERENCES work_days(id) ON DELETE CASCADE,
    enabled INTEGER NOT NULL DEFAULT 1,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL
)
"#;

pub const CREATE_VACATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS vacations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    schedule_id TEXT NOT NULL REFERENCES work_schedules(id) ON DELETE CASCADE,
    enabled INTEGER NOT NULL DEFAULT 1,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL
)
"#;

pub const CREATE_SERVICES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS services (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    price REAL NOT NULL DEFAULT 0,
    duration INTEGER NOT NULL DEFAULT 0,
    color TEXT,
    display_order INTEGER NOT NULL DEFAULT 0,
    is_archived INTEGER NOT NULL DEFAULT 0,
    created_at TEXT,
    updated_at TEXT
)
"#;

/// Many-to-many junction between specialists and services
pub const CREATE_SPECIALIST_SERVICES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS specialist_services (
    specialist_id TEXT NOT NULL REFERENCES specialists(id) ON DELETE CASCADE,
    service_id TEXT NOT NULL REFERENCES services(id) ON DELETE CASCADE,
    PRIMARY KEY (specialist_id, service_id)
)
"#;

pub const CREATE_ARTICLES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS articles (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE,
    content TEXT NOT NULL DEFAULT '',
    excerpt TEXT,
    image TEXT,
    status TEXT NOT NULL DEFAULT 'draft',
    specialist_id TEXT REFERENCES specialists(id) ON DELETE SET NULL,
    created_at TEXT,
    updated_at TEXT
)
"#;

pub const CREATE_ARTICLE_TAGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS article_tags (
    article_id TEXT NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
    tag TEXT NOT NULL,
    PRIMARY KEY (article_id, tag)
)
"#;

pub const CREATE_REVIEWS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS reviews (
    id TEXT PRIMARY KEY,
    specialist_id TEXT NOT NULL REFERENCES specialists(id) ON DELETE CASCADE,
    user_id TEXT REFERENCES users(id) ON DELETE CASCADE,
    author_name TEXT,
    rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
    text TEXT NOT NULL DEFAULT '',
    is_moderated INTEGER NOT NULL DEFAULT 0,
    is_published INTEGER NOT NULL DEFAULT 0,
    created_at TEXT,
    updated_at TEXT
)
"#;

pub const CREATE_REVIEW_ATTACHMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS review_attachments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    review_id TEXT NOT NULL REFERENCES reviews(id) ON DELETE CASCADE,
    path TEXT NOT NULL,
    name TEXT,
    type TEXT
)
"#;

/// One reaction per (review, user, type); re-inserting overwrites
pub const CREATE_REVIEW_REACTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS review_reactions (
    review_id TEXT NOT NULL REFERENCES reviews(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    type TEXT NOT NULL,
    created_at TEXT,
    PRIMARY KEY (review_id, user_id, type)
)
"#;

pub const CREATE_REVIEW_REPLIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS review_replies (
    id TEXT PRIMARY KEY,
    review_id TEXT NOT NULL REFERENCES reviews(id) ON DELETE CASCADE,
    user_id TEXT REFERENCES users(id) ON DELETE SET NULL,
    author_name TEXT,
    text TEXT NOT NULL DEFAULT '',
    is_published INTEGER NOT NULL DEFAULT 1,
    created_at TEXT,
    updated_at TEXT
)
"#;

pub const CREATE_REPLY_ATTACHMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS reply_attachments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    reply_id TEXT NOT NULL REFERENCES review_replies(id) ON DELETE CASCADE,
    path TEXT NOT NULL,
    name TEXT,
    type TEXT
)
"#;

pub const CREATE_REPLY_REACTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS reply_reactions (
    reply_id TEXT NOT NULL REFERENCES review_replies(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    type TEXT NOT NULL,
    created_at TEXT,
    PRIMARY KEY (reply_id, user_id, type)
)
"#;

pub const CREATE_APPOINTMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS appointments (
    id TEXT PRIMARY KEY,
    user_id TEXT REFERENCES users(id) ON DELETE SET NULL,
    specialist_id TEXT NOT NULL REFERENCES specialists(id) ON DELETE CASCADE,
    service_id TEXT REFERENCES services(id) ON DELETE SET NULL,
    date TEXT NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    price REAL NOT NULL DEFAULT 0,
    client_name TEXT,
    client_phone TEXT,
    client_email TEXT,
    comment TEXT,
    promo_code TEXT,
    discount_amount REAL NOT NULL DEFAULT 0,
    bonus_used REAL NOT NULL DEFAULT 0,
    created_at TEXT,
    updated_at TEXT
)
"#;

pub const CREATE_BONUS_TRANSACTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS bonus_transactions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    amount REAL NOT NULL,
    type TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'completed',
    appointment_id TEXT REFERENCES appointments(id) ON DELETE SET NULL,
    referred_user_id TEXT REFERENCES users(id) ON DELETE SET NULL,
    description TEXT,
    created_at TEXT
)
"#;

/// Private notes a specialist keeps about a client
pub const CREATE_SPECIALIST_NOTES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS specialist_notes (
    id TEXT PRIMARY KEY,
    specialist_id TEXT NOT NULL REFERENCES specialists(id) ON DELETE CASCADE,
    user_id TEXT REFERENCES users(id) ON DELETE SET NULL,
    content TEXT NOT NULL,
    created_at TEXT,
    updated_at TEXT
)
"#;

pub const CREATE_EVENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT,
    date TEXT,
    time TEXT,
    location TEXT,
    image TEXT,
    price REAL,
    is_published INTEGER NOT NULL DEFAULT 1,
    created_at TEXT,
    updated_at TEXT
)
"#;

/// Key/value settings; `value` holds JSON text
pub const CREATE_SETTINGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
"#;

pub const CREATE_FAQ_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS faq (
    id TEXT PRIMARY KEY,
    question TEXT NOT NULL,
    answer TEXT NOT NULL DEFAULT '',
    category TEXT,
    display_order INTEGER NOT NULL DEFAULT 0,
    is_published INTEGER NOT NULL DEFAULT 1
)
"#;

pub const CREATE_PROMO_CODES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS promo_codes (
    id TEXT PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    description TEXT,
    discount_type TEXT NOT NULL DEFAULT 'percent',
    discount_value REAL NOT NULL DEFAULT 0,
    valid_from TEXT,
    valid_until TEXT,
    max_uses INTEGER,
    used_count INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1,
    service_id TEXT REFERENCES services(id) ON DELETE SET NULL,
    specialist_id TEXT REFERENCES specialists(id) ON DELETE SET NULL,
    created_at TEXT
)
"#;

/// Every table, parents before children, paired with its creation SQL
pub const TABLES: &[(&str, &str)] = &[
    ("users", CREATE_USERS_TABLE),
    ("specialists", CREATE_SPECIALISTS_TABLE),
    ("specialist_positions", CREATE_SPECIALIST_POSITIONS_TABLE),
    ("specialist_documents", CREATE_SPECIALIST_DOCUMENTS_TABLE),
    ("work_schedules", CREATE_WORK_SCHEDULES_TABLE),
    ("work_days", CREATE_WORK_DAYS_TABLE),
    ("lunch_breaks", CREATE_LUNCH_BREAKS_TABLE),
    ("vacations", CREATE_VACATIONS_TABLE),
    ("services", CREATE_SERVICES_TABLE),
    ("specialist_services", CREATE_SPECIALIST_SERVICES_TABLE),
    ("articles", CREATE_ARTICLES_TABLE),
    ("article_tags", CREATE_ARTICLE_TAGS_TABLE),
    ("reviews", CREATE_REVIEWS_TABLE),
    ("review_attachments", CREATE_REVIEW_ATTACHMENTS_TABLE),
    ("review_reactions", CREATE_REVIEW_REACTIONS_TABLE),
    ("review_replies", CREATE_REVIEW_REPLIES_TABLE),
    ("reply_attachments", CREATE_REPLY_ATTACHMENTS_TABLE),
    ("reply_reactions", CREATE_REPLY_REACTIONS_TABLE),
    ("appointments", CREATE_APPOINTMENTS_TABLE),
    ("bonus_transactions", CREATE_BONUS_TRANSACTIONS_TABLE),
    ("specialist_notes", CREATE_SPECIALIST_NOTES_TABLE),
    ("events", CREATE_EVENTS_TABLE),
    ("settings", CREATE_SETTINGS_TABLE),
    ("faq", CREATE_FAQ_TABLE),
    ("promo_codes", CREATE_PROMO_CODES_TABLE),
];

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_users_referred_by ON users(referred_by)",
    "CREATE INDEX IF NOT EXISTS idx_specialists_order ON specialists(display_order)",
    "CREATE INDEX IF NOT EXISTS idx_specialists_user ON specialists(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_documents_specialist ON specialist_documents(specialist_id)",
    "CREATE INDEX IF NOT EXISTS idx_work_days_schedule ON work_days(schedule_id)",
    "CREATE INDEX IF NOT EXISTS idx_lunch_breaks_day ON lunch_breaks(work_day_id)",
    "CREATE INDEX IF NOT EXISTS idx_vacations_schedule ON vacations(schedule_id)",
    "CREATE INDEX IF NOT EXISTS idx_specialist_services_service ON specialist_services(service_id)",
    "CREATE INDEX IF NOT EXISTS idx_services_order ON services(display_order)",
    "CREATE INDEX IF NOT EXISTS idx_articles_status ON articles(status)",
    "CREATE INDEX IF NOT EXISTS idx_articles_specialist ON articles(specialist_id)",
    "CREATE INDEX IF NOT EXISTS idx_reviews_specialist ON reviews(specialist_id)",
    "CREATE INDEX IF NOT EXISTS idx_reviews_user ON reviews(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_review_attachments_review ON review_attachments(review_id)",
    "CREATE INDEX IF NOT EXISTS idx_review_replies_review ON review_replies(review_id)",
    "CREATE INDEX IF NOT EXISTS idx_appointments_specialist ON appointments(specialist_id, date)",
    "CREATE INDEX IF NOT EXISTS idx_appointments_user ON appointments(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_appointments_status ON appointments(status)",
    "CREATE INDEX IF NOT EXISTS idx_bonus_transactions_user ON bonus_transactions(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_specialist_notes_specialist ON specialist_notes(specialist_id)",
    "CREATE INDEX IF NOT EXISTS idx_faq_order ON faq(display_order)",
];

/// Names of every table in creation order
pub fn table_names() -> impl Iterator<Item = &'static str> {
    TABLES.iter().map(|(name, _)| *name)
}
