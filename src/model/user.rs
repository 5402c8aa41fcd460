//! Users and their denormalized role/favorites data

use super::{double_option, lenient_f64, opaque_id, opaque_id_opt, opaque_ids, string_enum_serde};
use crate::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UserRole {
    #[default]
    User,
    Specialist,
    Admin,
    Client,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Specialist => "specialist",
            UserRole::Admin => "admin",
            UserRole::Client => "client",
        }
    }
}

impl FromStr for UserRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" | "" => Ok(UserRole::User),
            "specialist" => Ok(UserRole::Specialist),
            "admin" | "administrator" => Ok(UserRole::Admin),
            "client" | "customer" => Ok(UserRole::Client),
            _ => Err(Error::Invalid(format!("Unknown user role: {}", s))),
        }
    }
}

string_enum_serde!(UserRole);

/// Ids the user bookmarked, stored as one JSON column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Favorites {
    #[serde(deserialize_with = "opaque_ids")]
    pub articles: Vec<String>,
    #[serde(deserialize_with = "opaque_ids")]
    pub services: Vec<String>,
    #[serde(deserialize_with = "opaque_ids")]
    pub specialists: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub email: Option<String>,
    #[serde(alias = "password", skip_serializing)]
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub roles: Vec<UserRole>,
    pub favorites: Favorites,
    #[serde(alias = "bonusPoints", deserialize_with = "lenient_f64")]
    pub bonus_balance: f64,
    pub referral_code: Option<String>,
    #[serde(deserialize_with = "opaque_id_opt")]
    pub referred_by: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl User {
    /// `roles` always contains the primary role.
    pub fn normalize_roles(&mut self) {
        if !self.roles.contains(&self.role) {
            self.roles.insert(0, self.role);
        }
        let mut seen = Vec::with_capacity(self.roles.len());
        self.roles.retain(|r| {
            if seen.contains(r) {
                false
            } else {
                seen.push(*r);
                true
            }
        });
    }

    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            self.email.clone().unwrap_or_else(|| self.id.clone())
        } else {
            parts.join(" ")
        }
    }
}

/// Partial update for a user; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPatch {
    #[serde(deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub password_hash: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub first_name: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub last_name: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    pub role: Option<UserRole>,
    pub roles: Option<Vec<UserRole>>,
    pub favorites: Option<Favorites>,
    pub bonus_balance: Option<f64>,
    #[serde(deserialize_with = "double_option")]
    pub referral_code: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub referred_by: Option<Option<String>>,
}
