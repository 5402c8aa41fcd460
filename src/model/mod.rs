//! Domain types
//!
//! The same structs are read from the legacy JSON files and returned by the
//! repositories, so they serialize as camelCase and every "missing field"
//! default lives in a `Default` impl or in one of the lenient helpers below.

pub mod appointment;
pub mod article;
pub mod bonus;
pub mod content;
pub mod review;
pub mod service;
pub mod specialist;
pub mod user;

pub use appointment::{Appointment, AppointmentPatch, AppointmentStatus};
pub use article::{Article, ArticlePatch, ArticleStatus};
pub use bonus::{BonusStatus, BonusTransaction};
pub use content::{DiscountType, Event, EventPatch, Faq, FaqPatch, PromoCode, PromoCodePatch};
pub use review::{MAX_RATING, MIN_RATING, Reaction, Review, ReviewPatch, ReviewReply, rating_in_range};
pub use service::{Service, ServicePatch};
pub use specialist::{
    LunchBreak, Specialist, SpecialistNote, SpecialistPatch, Vacation, WorkDay, WorkSchedule,
};
pub use user::{Favorites, User, UserPatch, UserRole};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A stored file: specialist document or review attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", from = "FileRefRepr")]
pub struct FileRef {
    pub path: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub file_type: Option<String>,
}

impl FileRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

/// Legacy files store either a bare path or a full object.
#[derive(Deserialize)]
#[serde(untagged)]
enum FileRefRepr {
    Path(String),
    Full {
        #[serde(alias = "url", default)]
        path: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(rename = "type", alias = "mimeType", default)]
        file_type: Option<String>,
    },
}

impl From<FileRefRepr> for FileRef {
    fn from(repr: FileRefRepr) -> Self {
        match repr {
            FileRefRepr::Path(path) => FileRef::new(path),
            FileRefRepr::Full {
                path,
                name,
                file_type,
            } => FileRef {
                path,
                name,
                file_type,
            },
        }
    }
}

/// Current time as stored in `created_at`/`updated_at` columns.
pub fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Fresh opaque id for rows created through the repositories.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn id_from_value<E: serde::de::Error>(value: Value) -> Result<Option<String>, E> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => {
            let s = s.trim();
            Ok((!s.is_empty()).then(|| s.to_string()))
        }
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(E::custom(format!("expected an id, got {other}"))),
    }
}

/// Ids are opaque strings, but older files wrote some of them as numbers.
pub(crate) fn opaque_id<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(id_from_value::<D::Error>(Value::deserialize(de)?)?.unwrap_or_default())
}

/// Optional reference: `null`, `""` and a missing key all mean "no reference".
pub(crate) fn opaque_id_opt<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    id_from_value(Value::deserialize(de)?)
}

pub(crate) fn opaque_ids<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<String>, D::Error> {
    match Value::deserialize(de)? {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => {
            let mut ids = Vec::with_capacity(items.len());
            for item in items {
                // `{ "id": .. }` objects show up where a populated list was saved
                let item = match item {
                    Value::Object(mut map) => map.remove("id").unwrap_or(Value::Null),
                    other => other,
                };
                if let Some(id) = id_from_value::<D::Error>(item)? {
                    ids.push(id);
                }
            }
            Ok(ids)
        }
        other => Err(D::Error::custom(format!("expected a list of ids, got {other}"))),
    }
}

pub(crate) fn lenient_f64<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
    match Value::deserialize(de)? {
        Value::Null => Ok(0.0),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom(format!("number out of range: {n}"))),
        Value::String(s) if s.trim().is_empty() => Ok(0.0),
        Value::String(s) => s
            .trim()
            .replace(',', ".")
            .parse()
            .map_err(|_| D::Error::custom(format!("not a number: {s}"))),
        other => Err(D::Error::custom(format!("expected a number, got {other}"))),
    }
}

pub(crate) fn lenient_f64_opt<'de, D: Deserializer<'de>>(de: D) -> Result<Option<f64>, D::Error> {
    match Value::deserialize(de)? {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        other => lenient_f64(other).map(Some).map_err(D::Error::custom),
    }
}

pub(crate) fn lenient_i64<'de, D: Deserializer<'de>>(de: D) -> Result<i64, D::Error> {
    let value = lenient_f64(Value::deserialize(de)?).map_err(D::Error::custom)?;
    Ok(value.round() as i64)
}

pub(crate) fn lenient_i64_opt<'de, D: Deserializer<'de>>(de: D) -> Result<Option<i64>, D::Error> {
    let value = lenient_f64_opt(Value::deserialize(de)?).map_err(D::Error::custom)?;
    Ok(value.map(|v| v.round() as i64))
}

/// Keeps "field absent" (`None`) apart from "field set to null" (`Some(None)`)
/// in patch types.
pub(crate) fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

/// Shared by the enum types: a `FromStr` failure surfaces as a serde error.
macro_rules! string_enum_serde {
    ($ty:ty) => {
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
                s.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
                let raw = <String as serde::Deserialize>::deserialize(d)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl rusqlite::types::ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(self.as_str().into())
            }
        }

        impl rusqlite::types::FromSql for $ty {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: crate::Error| rusqlite::types::FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

pub(crate) use string_enum_serde;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "opaque_id")]
        id: String,
        #[serde(default, deserialize_with = "opaque_id_opt")]
        parent: Option<String>,
        #[serde(default, deserialize_with = "opaque_ids")]
        links: Vec<String>,
        #[serde(default, deserialize_with = "lenient_f64")]
        price: f64,
    }

    #[test]
    fn test_numeric_and_string_ids() {
        let probe: Probe =
            serde_json::from_value(json!({ "id": 42, "parent": "", "links": [1, "b", {"id": 3}] }))
                .unwrap();
        assert_eq!(probe.id, "42");
        assert_eq!(probe.parent, None);
        assert_eq!(probe.links, vec!["1", "b", "3"]);
        assert_eq!(probe.price, 0.0);
    }

    #[test]
    fn test_price_from_string() {
        let probe: Probe = serde_json::from_value(json!({ "id": "a", "price": "1500,50" })).unwrap();
        assert!((probe.price - 1500.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_file_ref_from_path_or_object() {
        let files: Vec<FileRef> = serde_json::from_value(json!([
            "/uploads/a.pdf",
            { "path": "/uploads/b.pdf", "name": "Diploma", "type": "application/pdf" }
        ]))
        .unwrap();
        assert_eq!(files[0], FileRef::new("/uploads/a.pdf"));
        assert_eq!(files[1].name.as_deref(), Some("Diploma"));
        assert_eq!(files[1].file_type.as_deref(), Some("application/pdf"));
    }
}
