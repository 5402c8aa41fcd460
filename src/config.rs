use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

pub const DEFAULT_PLACEHOLDER_IMAGE: &str = "/images/placeholder.webp";

/// On-disk configuration (`wellness-store.toml`). Every field is optional so
/// that CLI flags can fill in whatever the file leaves out.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    pub database: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub media_root: Option<PathBuf>,
    pub placeholder_image: Option<String>,
}

impl StoreConfig {
    pub fn database_path(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| default_database_path_in(Path::new(".")))
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| PathBuf::from("data"))
    }

    pub fn media_root(&self) -> PathBuf {
        self.media_root.clone().unwrap_or_else(|| PathBuf::from("public"))
    }

    pub fn placeholder_image(&self) -> &str {
        self.placeholder_image
            .as_deref()
            .unwrap_or(DEFAULT_PLACEHOLDER_IMAGE)
    }

    /// Fill unset fields from `other`; values already set here win.
    pub fn merged_with(mut self, other: StoreConfig) -> Self {
        self.database = self.database.or(other.database);
        self.data_dir = self.data_dir.or(other.data_dir);
        self.media_root = self.media_root.or(other.media_root);
        self.placeholder_image = self.placeholder_image.or(other.placeholder_image);
        self
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("wellness-store.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join("data").join("wellness.db")
}

pub fn load_config(path: Option<&Path>) -> Result<Option<StoreConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: StoreConfig = toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &StoreConfig, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    let contents = toml::to_string_pretty(config).map_err(|e| Error::Config(e.to_string()))?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wellness-store.toml");
        let config = StoreConfig {
            database: Some(PathBuf::from("db/wellness.db")),
            data_dir: Some(PathBuf::from("legacy")),
            ..Default::default()
        };

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.database_path(), PathBuf::from("db/wellness.db"));
        assert_eq!(loaded.data_dir(), PathBuf::from("legacy"));
        assert_eq!(loaded.placeholder_image(), DEFAULT_PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_merge_prefers_self() {
        let cli = StoreConfig {
            database: Some(PathBuf::from("cli.db")),
            ..Default::default()
        };
        let file = StoreConfig {
            database: Some(PathBuf::from("file.db")),
            media_root: Some(PathBuf::from("media")),
            ..Default::default()
        };
        let merged = cli.merged_with(file);
        assert_eq!(merged.database_path(), PathBuf::from("cli.db"));
        assert_eq!(merged.media_root(), PathBuf::from("media"));
    }
}
