//! Site settings: a key/value table holding JSON values

use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::storage::Store;
use crate::Result;

pub(crate) fn upsert_setting(conn: &Connection, key: &str, value: &Value) -> Result<()> {
    conn.prepare_cached(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )?
    .execute(params![key, serde_json::to_string(value)?])?;
    Ok(())
}

pub struct SettingsRepo<'a> {
    store: &'a Store,
}

impl<'a> SettingsRepo<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        let raw: Option<String> = self
            .store
            .conn()
            .prepare_cached("SELECT value FROM settings WHERE key = ?1")?
            .query_row([key], |row| row.get(0))
            .optional()?;
        raw.map(|raw| serde_json::from_str(&raw).map_err(Into::into)).transpose()
    }

    /// Typed read of one setting
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.get(key)?
            .map(|value| serde_json::from_value(value).map_err(Into::into))
            .transpose()
    }

    /// Every setting as one JSON object, keys sorted
    pub fn get_all(&self) -> Result<Map<String, Value>> {
        let rows = self
            .store
            .conn()
            .prepare_cached("SELECT key, value FROM settings ORDER BY key")?
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut out = Map::new();
        for (key, raw) in rows {
            out.insert(key, serde_json::from_str(&raw)?);
        }
        Ok(out)
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        upsert_setting(self.store.conn(), key, &serde_json::to_value(value)?)
    }

    pub fn delete(&self, key: &str) -> Result<bool> {
        let removed = self
            .store
            .conn()
            .execute("DELETE FROM settings WHERE key = ?1", [key])?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_values_keep_their_json_shape() {
        let store = Store::open_in_memory().unwrap();
        let settings = store.settings();
        settings.set("phone", &"+7 900 000 00 00").unwrap();
        settings
            .set("workingHours", &json!({ "weekdays": "09:00-21:00", "weekends": null }))
            .unwrap();
        settings.set("bookingEnabled", &true).unwrap();

        assert_eq!(settings.get_as::<bool>("bookingEnabled").unwrap(), Some(true));
        assert_eq!(settings.get("workingHours").unwrap().unwrap()["weekdays"], "09:00-21:00");
        assert!(settings.get("missing").unwrap().is_none());

        let all = settings.get_all().unwrap();
        let keys: Vec<&String> = all.keys().collect();
        assert_eq!(keys, vec!["bookingEnabled", "phone", "workingHours"]);

        settings.set("phone", &"+7 911 111 11 11").unwrap();
        assert_eq!(settings.get_as::<String>("phone").unwrap().as_deref(), Some("+7 911 111 11 11"));
        assert!(settings.delete("phone").unwrap());
        assert!(!settings.delete("phone").unwrap());
    }
}
