//! Media files on disk
//!
//! Rows record web paths such as `/uploads/specialists/anna.webp`; the files
//! live under a media root. Uploads are converted to WebP, but older rows may
//! still point at a WebP that was never generated, so reads fall back to the
//! original upload and finally to a placeholder.

use std::path::{Component, Path, PathBuf};

use crate::config::{DEFAULT_PLACEHOLDER_IMAGE, StoreConfig};

/// Extensions an upload may have had before WebP conversion
const ORIGINAL_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

#[derive(Debug, Clone)]
pub struct MediaRoot {
    root: PathBuf,
    placeholder: String,
}

impl Default for MediaRoot {
    fn default() -> Self {
        Self::new("public", DEFAULT_PLACEHOLDER_IMAGE)
    }
}

impl MediaRoot {
    pub fn new(root: impl Into<PathBuf>, placeholder: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            placeholder: placeholder.into(),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.media_root(), config.placeholder_image())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Where a recorded web path lives on disk.
    ///
    /// `None` for paths that would escape the media root (`..`, a second
    /// root, a drive prefix).
    pub fn disk_path(&self, web_path: &str) -> Option<PathBuf> {
        let relative = Path::new(web_path.trim_start_matches('/'));
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        contained.then(|| self.root.join(relative))
    }

    fn exists(&self, web_path: &str) -> bool {
        self.disk_path(web_path).is_some_and(|path| path.is_file())
    }

    /// Resolve a recorded image path to something that can be served.
    ///
    /// Order: the recorded path, then (for `.webp`) the same stem with an
    /// original extension, then the placeholder. Remote URLs pass through.
    pub fn resolve_image(&self, recorded: &str) -> String {
        let recorded = recorded.trim();
        if recorded.is_empty() {
            return self.placeholder.clone();
        }
        if is_remote(recorded) || self.exists(recorded) {
            return recorded.to_string();
        }

        if let Some(stem) = webp_stem(recorded) {
            for ext in ORIGINAL_EXTENSIONS {
                let candidate = format!("{}.{}", stem, ext);
                if self.exists(&candidate) {
                    tracing::debug!("Image {} missing, serving {}", recorded, candidate);
                    return candidate;
                }
            }
        }

        tracing::debug!("Image {} missing, serving placeholder", recorded);
        self.placeholder.clone()
    }

    /// The recorded path plus every original-format sibling of a WebP file
    pub fn variants(&self, recorded: &str) -> Vec<String> {
        let mut out = vec![recorded.to_string()];
        if let Some(stem) = webp_stem(recorded) {
            out.extend(ORIGINAL_EXTENSIONS.iter().map(|ext| format!("{}.{}", stem, ext)));
        }
        out
    }

    /// Delete files that are no longer referenced.
    ///
    /// Missing files are fine; any other failure is logged and skipped, never
    /// returned, because the rows referencing them are already gone. Returns
    /// how many files were actually removed.
    pub fn remove_files<'a>(&self, web_paths: impl IntoIterator<Item = &'a str>) -> usize {
        let mut removed = 0;
        for web_path in web_paths {
            if web_path.trim().is_empty() || is_remote(web_path) || web_path == self.placeholder {
                continue;
            }
            let Some(path) = self.disk_path(web_path) else {
                tracing::warn!("Refusing to remove {} outside the media root", web_path);
                continue;
            };
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    tracing::debug!("Removed {}", path.display());
                    removed += 1;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
        removed
    }
}

fn is_remote(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://") || path.starts_with("data:")
}

fn webp_stem(path: &str) -> Option<&str> {
    let lower = path.to_ascii_lowercase();
    lower
        .ends_with(".webp")
        .then(|| &path[..path.len() - ".webp".len()])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media_with(files: &[&str]) -> (tempfile::TempDir, MediaRoot) {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            let path = dir.path().join(file.trim_start_matches('/'));
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, b"img").unwrap();
        }
        let media = MediaRoot::new(dir.path(), "/images/placeholder.webp");
        (dir, media)
    }

    #[test]
    fn test_existing_webp_is_kept() {
        let (_dir, media) = media_with(&["/uploads/anna.webp"]);
        assert_eq!(media.resolve_image("/uploads/anna.webp"), "/uploads/anna.webp");
    }

    #[test]
    fn test_missing_webp_falls_back_to_original() {
        let (_dir, media) = media_with(&["/uploads/anna.png"]);
        assert_eq!(media.resolve_image("/uploads/anna.webp"), "/uploads/anna.png");
    }

    #[test]
    fn test_missing_everything_gives_placeholder() {
        let (_dir, media) = media_with(&[]);
        assert_eq!(media.resolve_image("/uploads/anna.webp"), "/images/placeholder.webp");
        assert_eq!(media.resolve_image("/uploads/anna.jpg"), "/images/placeholder.webp");
        assert_eq!(media.resolve_image(""), "/images/placeholder.webp");
    }

    #[test]
    fn test_remote_urls_pass_through() {
        let (_dir, media) = media_with(&[]);
        assert_eq!(
            media.resolve_image("https://cdn.example.com/a.webp"),
            "https://cdn.example.com/a.webp"
        );
    }

    #[test]
    fn test_remove_files_ignores_missing() {
        let (dir, media) = media_with(&["/uploads/anna.webp", "/uploads/anna.jpg"]);
        let variants = media.variants("/uploads/anna.webp");
        let removed = media.remove_files(variants.iter().map(String::as_str));
        assert_eq!(removed, 2);
        assert!(!dir.path().join("uploads/anna.webp").exists());
    }

    #[test]
    fn test_paths_outside_the_root_are_left_alone() {
        let outer = tempfile::tempdir().unwrap();
        let root = outer.path().join("public");
        std::fs::create_dir_all(&root).unwrap();
        let sibling = outer.path().join("outside.txt");
        std::fs::write(&sibling, b"keep").unwrap();
        let media = MediaRoot::new(&root, "/images/placeholder.webp");

        assert!(media.disk_path("/../outside.txt").is_none());
        assert!(media.disk_path("/uploads/../../outside.txt").is_none());
        assert_eq!(media.remove_files(["/../outside.txt", "/uploads/../../outside.txt"]), 0);
        assert!(sibling.exists());
        assert_eq!(media.resolve_image("/../outside.txt"), "/images/placeholder.webp");
        assert_eq!(media.disk_path("/uploads/a.jpg"), Some(root.join("uploads/a.jpg")));
    }
}
