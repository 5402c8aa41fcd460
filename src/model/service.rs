use super::{lenient_f64, lenient_i64, opaque_id};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Service {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub price: f64,
    /// Minutes
    #[serde(deserialize_with = "lenient_i64")]
    pub duration: i64,
    pub color: Option<String>,
    #[serde(deserialize_with = "lenient_i64")]
    pub order: i64,
    #[serde(alias = "archived")]
    pub is_archived: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServicePatch {
    pub name: Option<String>,
    #[serde(deserialize_with = "super::double_option")]
    pub description: Option<Option<String>>,
    pub price: Option<f64>,
    pub duration: Option<i64>,
    #[serde(deserialize_with = "super::double_option")]
    pub color: Option<Option<String>>,
    pub order: Option<i64>,
    pub is_archived: Option<bool>,
}
