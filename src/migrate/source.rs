//! Reading the legacy JSON files

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::{Stage, StageReport};
use crate::{Error, Result};

/// Where each stage's source file lives under the data directory
#[derive(Debug, Clone)]
pub struct SourceLayout {
    root: PathBuf,
}

impl SourceLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, stage: Stage) -> PathBuf {
        self.root.join(stage.source_file())
    }
}

fn source_error(path: &Path, error: impl Into<Error>) -> Error {
    Error::Source {
        path: path.to_path_buf(),
        source: Box::new(error.into()),
    }
}

/// Parse a source file into a JSON value. A missing or blank file is `None`.
fn read_value(path: &Path) -> Result<Option<Value>> {
    if !path.exists() {
        tracing::info!("{} not found, nothing to migrate", path.display());
        return Ok(None);
    }
    let text = fs::read_to_string(path).map_err(|e| source_error(path, e))?;
    if text.trim().is_empty() {
        return Ok(None);
    }
    let value = serde_json::from_str(&text).map_err(|e| source_error(path, e))?;
    Ok(Some(value))
}

/// Records of an array file.
///
/// Older exports wrap the array in an object with a single key
/// (`{"users": [...]}`); that shape is accepted too.
pub(crate) fn read_array(path: &Path) -> Result<Vec<Value>> {
    match read_value(path)? {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(Value::Object(map)) if map.len() == 1 => match map.into_iter().next() {
            Some((_, Value::Array(items))) => Ok(items),
            _ => Err(source_error(path, Error::Invalid("expected a JSON array".into()))),
        },
        Some(_) => Err(source_error(path, Error::Invalid("expected a JSON array".into()))),
    }
}

/// Entries of an object file such as `settings.json`
pub(crate) fn read_object(path: &Path) -> Result<Map<String, Value>> {
    match read_value(path)? {
        None => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(source_error(path, Error::Invalid("expected a JSON object".into()))),
    }
}

/// Name a raw record in diagnostics: its id when it has one, else its
/// position in the file
fn record_label(value: &Value, index: usize) -> String {
    match value.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id.trim().to_string(),
        Some(Value::Number(id)) => id.to_string(),
        _ => format!("#{}", index),
    }
}

/// Read and type every record of an array file.
///
/// Records that do not deserialize, or whose `id_of` is empty, are counted
/// as skipped with a diagnostic. The rest come back paired with their id.
pub(crate) fn parse_records<T, F>(path: &Path, report: &mut StageReport, id_of: F) -> Result<Vec<(String, T)>>
where
    T: DeserializeOwned,
    F: Fn(&T) -> String,
{
    let raw = read_array(path)?;
    report.read = raw.len();

    let mut records = Vec::with_capacity(raw.len());
    for (index, value) in raw.into_iter().enumerate() {
        let label = record_label(&value, index);
        match serde_json::from_value::<T>(value) {
            Ok(record) => {
                let id = id_of(&record);
                if id.trim().is_empty() {
                    report.skip(&label, "record has no id");
                } else {
                    records.push((id.trim().to_string(), record));
                }
            }
            Err(e) => report.malformed(&label, e.to_string()),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Service;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_array(&dir.path().join("nope.json")).unwrap().is_empty());
        assert!(read_object(&dir.path().join("nope.json")).unwrap().is_empty());
    }

    #[test]
    fn test_wrapped_array_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "services.json", r#"{"services": [{"id": 1, "name": "Yoga"}]}"#);
        assert_eq!(read_array(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_json_is_a_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "services.json", "[{ broken");
        assert!(matches!(read_array(&path), Err(Error::Source { .. })));

        let path = write(dir.path(), "object.json", r#"{"a": 1, "b": 2}"#);
        assert!(matches!(read_array(&path), Err(Error::Source { .. })));
    }

    #[test]
    fn test_bad_records_are_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "services.json",
            r#"[
                {"id": 1, "name": "Yoga", "price": "2500"},
                {"id": "s2", "name": ["not", "a", "string"]},
                {"name": "No id"}
            ]"#,
        );
        let mut report = StageReport::new(Stage::Services, &path);
        let records = parse_records::<Service, _>(&path, &mut report, |s| s.id.clone()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, "1");
        assert_eq!(records[0].1.price, 2500.0);
        assert_eq!(report.read, 3);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.diagnostics[0].record_id, "s2");
        assert_eq!(report.diagnostics[1].record_id, "#2");
    }
}
