//! # wellness-store - persistence layer for the wellness center platform
//!
//! Normalized SQLite storage for what used to be a set of JSON documents.
//!
//! wellness-store provides:
//! - A relational schema for users, specialists (with their schedule tree),
//!   services, articles, reviews, appointments and site content
//! - A one-shot JSON migration that repairs dangling references on the way in
//! - Repositories that hydrate nested aggregates from flat tables
//! - Media path resolution with on-disk fallbacks

pub mod config;
pub mod media;
pub mod migrate;
pub mod model;
pub mod repo;
pub mod storage;
pub mod ui;

// Re-exports for convenient access
pub use config::StoreConfig;
pub use media::MediaRoot;
pub use migrate::{Migration, MigrationReport, SourceLayout, Stage, migrate_data};
pub use repo::Repository;
pub use storage::Store;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for store operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read source {path}: {source}")]
    Source {
        path: std::path::PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid data: {0}")]
    Invalid(String),

    #[error("Not found: {0}")]
    NotFound(String),
}
