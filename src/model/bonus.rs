//! Bonus ledger entries. Only the storage shape lives here; balance rules
//! belong to the application.

use super::{lenient_f64, opaque_id, opaque_id_opt, string_enum_serde};
use crate::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BonusStatus {
    Pending,
    #[default]
    Completed,
    Cancelled,
}

impl BonusStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BonusStatus::Pending => "pending",
            BonusStatus::Completed => "completed",
            BonusStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for BonusStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(BonusStatus::Pending),
            "completed" | "" => Ok(BonusStatus::Completed),
            "cancelled" | "canceled" => Ok(BonusStatus::Cancelled),
            _ => Err(Error::Invalid(format!("Unknown bonus status: {}", s))),
        }
    }
}

string_enum_serde!(BonusStatus);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BonusTransaction {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(deserialize_with = "opaque_id")]
    pub user_id: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub amount: f64,
    /// Free-form kind (`referral`, `appointment`, `manual`, ...)
    #[serde(rename = "type")]
    pub kind: String,
    pub status: BonusStatus,
    #[serde(deserialize_with = "opaque_id_opt")]
    pub appointment_id: Option<String>,
    #[serde(deserialize_with = "opaque_id_opt")]
    pub referred_user_id: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<String>,
}
