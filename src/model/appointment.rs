use super::{double_option, lenient_f64, opaque_id, opaque_id_opt, string_enum_serde};
use crate::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Booking lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Archived,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Archived => "archived",
        }
    }

    pub fn all() -> &'static [AppointmentStatus] {
        &[
            AppointmentStatus::Pending,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::Archived,
        ]
    }

    /// Whether the slot still blocks the specialist's calendar
    pub fn is_active(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }
}

impl FromStr for AppointmentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "" | "new" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" | "done" => Ok(AppointmentStatus::Completed),
            "cancelled" | "canceled" => Ok(AppointmentStatus::Cancelled),
            "archived" => Ok(AppointmentStatus::Archived),
            _ => Err(Error::Invalid(format!("Unknown appointment status: {}", s))),
        }
    }
}

string_enum_serde!(AppointmentStatus);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Appointment {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(deserialize_with = "opaque_id_opt")]
    pub user_id: Option<String>,
    #[serde(deserialize_with = "opaque_id")]
    pub specialist_id: String,
    #[serde(deserialize_with = "opaque_id_opt")]
    pub service_id: Option<String>,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub status: AppointmentStatus,
    #[serde(deserialize_with = "lenient_f64")]
    pub price: f64,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub client_email: Option<String>,
    pub comment: Option<String>,
    pub promo_code: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub discount_amount: f64,
    #[serde(alias = "bonusPointsUsed", deserialize_with = "lenient_f64")]
    pub bonus_used: f64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppointmentPatch {
    #[serde(deserialize_with = "double_option")]
    pub user_id: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub service_id: Option<Option<String>>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub price: Option<f64>,
    #[serde(deserialize_with = "double_option")]
    pub client_name: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub client_phone: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub client_email: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub comment: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub promo_code: Option<Option<String>>,
    pub discount_amount: Option<f64>,
    pub bonus_used: Option<f64>,
}
