//! Specialist aggregate
//!
//! A specialist owns its additional positions, documents and at most one
//! work schedule. The schedule owns its work days (each with lunch breaks)
//! and vacations. All of it is loaded and saved together.

use super::{FileRef, double_option, lenient_i64, opaque_id, opaque_id_opt, opaque_ids};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Specialist {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub photo: Option<String>,
    pub description: Option<String>,
    pub position: Option<String>,
    #[serde(deserialize_with = "lenient_i64")]
    pub experience: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub order: i64,
    #[serde(deserialize_with = "opaque_id_opt")]
    pub user_id: Option<String>,
    pub additional_positions: Vec<String>,
    pub documents: Vec<FileRef>,
    pub work_schedule: Option<WorkSchedule>,
    /// Linked service ids, stored in `specialist_services`
    #[serde(deserialize_with = "opaque_ids")]
    pub services: Vec<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Specialist {
    pub fn full_name(&self) -> String {
        [
            Some(self.last_name.as_str()),
            Some(self.first_name.as_str()),
            self.middle_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// Distinct, non-empty additional positions in their original order.
    pub fn distinct_positions(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::with_capacity(self.additional_positions.len());
        for position in &self.additional_positions {
            let position = position.trim();
            if !position.is_empty() && !out.contains(&position) {
                out.push(position);
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkSchedule {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub enabled: bool,
    pub work_days: Vec<WorkDay>,
    pub vacations: Vec<Vacation>,
}

impl Default for WorkSchedule {
    fn default() -> Self {
        Self {
            id: String::new(),
            enabled: true,
            work_days: Vec::new(),
            vacations: Vec::new(),
        }
    }
}

impl WorkSchedule {
    /// Schedules without an id get one derived from the owner, so re-running
    /// a migration keeps the same primary key.
    pub fn id_for(&self, specialist_id: &str) -> String {
        if self.id.is_empty() {
            format!("schedule-{}", specialist_id)
        } else {
            self.id.clone()
        }
    }

    /// Strict check used by repository writes.
    pub fn validate(&self) -> Result<()> {
        let mut seen = [false; 7];
        for day in &self.work_days {
            if !(0..=6).contains(&day.day) {
                return Err(Error::Invalid(format!("work day {} is outside 0..6", day.day)));
            }
            let slot = &mut seen[day.day as usize];
            if *slot {
                return Err(Error::Invalid(format!("work day {} appears twice", day.day)));
            }
            *slot = true;
        }
        Ok(())
    }

    /// Lenient variant used by the migration: drops the offending days and
    /// returns a description of each one.
    pub fn repair(&mut self) -> Vec<String> {
        let mut dropped = Vec::new();
        let mut seen = [false; 7];
        self.work_days.retain(|day| {
            if !(0..=6).contains(&day.day) {
                dropped.push(format!("day {} is outside 0..6", day.day));
                return false;
            }
            let slot = &mut seen[day.day as usize];
            if *slot {
                dropped.push(format!("day {} appears twice", day.day));
                return false;
            }
            *slot = true;
            true
        });
        dropped
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkDay {
    /// 0 = Sunday .. 6 = Saturday
    #[serde(alias = "dayOfWeek", deserialize_with = "lenient_i64")]
    pub day: i64,
    #[serde(alias = "isActive")]
    pub active: bool,
    pub start_time: String,
    pub end_time: String,
    pub lunch_breaks: Vec<LunchBreak>,
}

impl Default for WorkDay {
    fn default() -> Self {
        Self {
            day: 0,
            active: true,
            start_time: "09:00".to_string(),
            end_time: "18:00".to_string(),
            lunch_breaks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LunchBreak {
    pub enabled: bool,
    pub start_time: String,
    pub end_time: String,
}

impl Default for LunchBreak {
    fn default() -> Self {
        Self {
            enabled: true,
            start_time: "13:00".to_string(),
            end_time: "14:00".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Vacation {
    pub enabled: bool,
    pub start_date: String,
    pub end_date: String,
}

impl Default for Vacation {
    fn default() -> Self {
        Self {
            enabled: true,
            start_date: String::new(),
            end_date: String::new(),
        }
    }
}

/// Private note a specialist keeps about a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SpecialistNote {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(deserialize_with = "opaque_id")]
    pub specialist_id: String,
    #[serde(deserialize_with = "opaque_id_opt")]
    pub user_id: Option<String>,
    pub content: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Partial update for a specialist.
///
/// Scalar fields that are `None` are left untouched. Child collections that
/// are `Some` replace the stored collection wholesale; there is no per-item
/// diffing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpecialistPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub middle_name: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub photo: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub position: Option<Option<String>>,
    pub experience: Option<i64>,
    pub order: Option<i64>,
    #[serde(deserialize_with = "double_option")]
    pub user_id: Option<Option<String>>,
    pub additional_positions: Option<Vec<String>>,
    pub documents: Option<Vec<FileRef>>,
    #[serde(deserialize_with = "double_option")]
    pub work_schedule: Option<Option<WorkSchedule>>,
    pub services: Option<Vec<String>>,
}
