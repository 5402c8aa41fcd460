//! Storage Layer - SQLite-backed persistence
//!
//! One connection per process, configured for WAL with a generous busy
//! timeout. Tables, parents first:
//! - users, specialists (+ positions, documents, schedule tree), services
//! - specialist_services, articles (+ tags), reviews (+ attachments,
//!   reactions, replies), appointments, bonus_transactions, specialist_notes
//! - events, settings, faq, promo_codes

pub mod schema;
pub mod store;

pub use store::{DbStats, ForeignKeyViolation, SchemaFailure, SchemaStatus, Store, BUSY_TIMEOUT};

pub(crate) use store::load_ids;
