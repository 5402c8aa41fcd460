//! Site content: events, FAQ entries and promo codes

use super::{
    double_option, lenient_f64, lenient_f64_opt, lenient_i64, lenient_i64_opt, opaque_id,
    opaque_id_opt, string_enum_serde,
};
use crate::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub image: Option<String>,
    #[serde(deserialize_with = "lenient_f64_opt")]
    pub price: Option<f64>,
    pub is_published: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Default for Event {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            description: None,
            date: None,
            time: None,
            location: None,
            image: None,
            price: None,
            is_published: true,
            created_at: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventPatch {
    pub title: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub date: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub time: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub image: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub price: Option<Option<f64>>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Faq {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub question: String,
    pub answer: String,
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient_i64")]
    pub order: i64,
    pub is_published: bool,
}

impl Default for Faq {
    fn default() -> Self {
        Self {
            id: String::new(),
            question: String::new(),
            answer: String::new(),
            category: None,
            order: 0,
            is_published: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FaqPatch {
    pub question: Option<String>,
    pub answer: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub category: Option<Option<String>>,
    pub order: Option<i64>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DiscountType {
    #[default]
    Percent,
    Fixed,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percent => "percent",
            DiscountType::Fixed => "fixed",
        }
    }
}

impl FromStr for DiscountType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "percent" | "percentage" | "%" | "" => Ok(DiscountType::Percent),
            "fixed" | "amount" => Ok(DiscountType::Fixed),
            _ => Err(Error::Invalid(format!("Unknown discount type: {}", s))),
        }
    }
}

string_enum_serde!(DiscountType);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PromoCode {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    #[serde(alias = "discount", deserialize_with = "lenient_f64")]
    pub discount_value: f64,
    pub valid_from: Option<String>,
    pub valid_until: Option<String>,
    #[serde(deserialize_with = "lenient_i64_opt")]
    pub max_uses: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub used_count: i64,
    pub is_active: bool,
    #[serde(deserialize_with = "opaque_id_opt")]
    pub service_id: Option<String>,
    #[serde(deserialize_with = "opaque_id_opt")]
    pub specialist_id: Option<String>,
    pub created_at: Option<String>,
}

impl Default for PromoCode {
    fn default() -> Self {
        Self {
            id: String::new(),
            code: String::new(),
            description: None,
            discount_type: DiscountType::Percent,
            discount_value: 0.0,
            valid_from: None,
            valid_until: None,
            max_uses: None,
            used_count: 0,
            is_active: true,
            service_id: None,
            specialist_id: None,
            created_at: None,
        }
    }
}

impl PromoCode {
    /// Codes are matched case-insensitively and stored upper-case.
    pub fn normalized_code(&self) -> String {
        self.code.trim().to_uppercase()
    }

    /// Whether the code can be applied on `date` (ISO `YYYY-MM-DD`)
    pub fn is_usable_on(&self, date: &str) -> bool {
        let started = self.valid_from.as_deref().is_none_or(|from| day_part(from) <= date);
        let not_expired = self.valid_until.as_deref().is_none_or(|until| date <= day_part(until));
        let uses_left = self.max_uses.is_none_or(|max| self.used_count < max);
        self.is_active && started && not_expired && uses_left
    }

    /// Legacy files keyed promo codes by the code itself.
    pub fn id_or_code(&self) -> String {
        if self.id.is_empty() {
            self.normalized_code()
        } else {
            self.id.clone()
        }
    }
}

/// Date portion of an ISO timestamp
fn day_part(value: &str) -> &str {
    value.get(..10).unwrap_or(value)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PromoCodePatch {
    #[serde(deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<f64>,
    #[serde(deserialize_with = "double_option")]
    pub valid_from: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub valid_until: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub max_uses: Option<Option<i64>>,
    pub used_count: Option<i64>,
    pub is_active: Option<bool>,
    #[serde(deserialize_with = "double_option")]
    pub service_id: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub specialist_id: Option<Option<String>>,
}
