//! What a migration run did, stage by stage

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use super::Stage;
use crate::storage::SchemaStatus;

/// Something the migration changed or dropped about one source record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Issue {
    /// The record was not written
    Skipped { reason: String },
    /// An optional reference pointed nowhere and was cleared
    Nulled { field: String, missing: String },
    /// A value that must be unique was already taken and was cleared or
    /// replaced
    Duplicate { field: String, value: String },
    /// The record could not be read into its typed shape
    Malformed { reason: String },
    /// The record was written without one of its children
    ChildDropped { child: String, reason: String },
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::Skipped { reason } => write!(f, "skipped: {}", reason),
            Issue::Nulled { field, missing } => write!(f, "{} cleared, {} does not exist", field, missing),
            Issue::Duplicate { field, value } => write!(f, "{} {} is already taken", field, value),
            Issue::Malformed { reason } => write!(f, "malformed: {}", reason),
            Issue::ChildDropped { child, reason } => write!(f, "dropped {}: {}", child, reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub stage: Stage,
    pub record_id: String,
    pub issue: Issue,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.stage, self.record_id, self.issue)
    }
}

/// Counts and diagnostics for one stage
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageReport {
    pub stage: Stage,
    pub source: PathBuf,
    /// Records found in the source
    pub read: usize,
    /// Rows written to the stage's main table
    pub written: usize,
    /// Records not written (malformed or skipped)
    pub skipped: usize,
    pub elapsed_ms: u64,
    pub diagnostics: Vec<Diagnostic>,
}

impl StageReport {
    pub fn new(stage: Stage, source: impl Into<PathBuf>) -> Self {
        Self {
            stage,
            source: source.into(),
            read: 0,
            written: 0,
            skipped: 0,
            elapsed_ms: 0,
            diagnostics: Vec::new(),
        }
    }

    fn push(&mut self, record_id: &str, issue: Issue) {
        tracing::warn!("{} {}: {}", self.stage, record_id, issue);
        self.diagnostics.push(Diagnostic {
            stage: self.stage,
            record_id: record_id.to_string(),
            issue,
        });
    }

    pub fn skip(&mut self, record_id: &str, reason: impl Into<String>) {
        self.skipped += 1;
        self.push(record_id, Issue::Skipped { reason: reason.into() });
    }

    pub fn malformed(&mut self, record_id: &str, reason: impl Into<String>) {
        self.skipped += 1;
        self.push(record_id, Issue::Malformed { reason: reason.into() });
    }

    pub fn nulled(&mut self, record_id: &str, field: impl Into<String>, missing: impl Into<String>) {
        self.push(
            record_id,
            Issue::Nulled {
                field: field.into(),
                missing: missing.into(),
            },
        );
    }

    pub fn duplicate(&mut self, record_id: &str, field: impl Into<String>, value: impl Into<String>) {
        self.push(
            record_id,
            Issue::Duplicate {
                field: field.into(),
                value: value.into(),
            },
        );
    }

    pub fn child_dropped(&mut self, record_id: &str, child: impl Into<String>, reason: impl Into<String>) {
        self.push(
            record_id,
            Issue::ChildDropped {
                child: child.into(),
                reason: reason.into(),
            },
        );
    }

    /// Diagnostics about one record
    pub fn for_record<'a>(&'a self, record_id: &'a str) -> impl Iterator<Item = &'a Issue> + 'a {
        self.diagnostics
            .iter()
            .filter(move |d| d.record_id == record_id)
            .map(|d| &d.issue)
    }
}

/// The stage that stopped the run
#[derive(Debug, Clone, Serialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub error: String,
}

/// Result of a full migration run
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub schema: SchemaStatus,
    pub stages: Vec<StageReport>,
    pub failure: Option<StageFailure>,
    pub elapsed_ms: u64,
}

impl MigrationReport {
    /// True when every stage ran to completion
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.stages.iter().flat_map(|s| s.diagnostics.iter())
    }

    pub fn total_written(&self) -> usize {
        self.stages.iter().map(|s| s.written).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.stages.iter().map(|s| s.skipped).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_follow_diagnostics() {
        let mut report = StageReport::new(Stage::Reviews, "reviews.json");
        report.skip("r1", "specialist s9 does not exist");
        report.malformed("#3", "invalid type: map, expected a string");
        report.nulled("r2", "userId", "u9");
        assert_eq!(report.skipped, 2);
        assert_eq!(report.diagnostics.len(), 3);
        assert_eq!(report.for_record("r2").count(), 1);
        assert_eq!(
            report.diagnostics[2].to_string(),
            "[reviews] r2: userId cleared, u9 does not exist"
        );
    }

    #[test]
    fn test_issue_serializes_with_kind_tag() {
        let issue = Issue::ChildDropped {
            child: "workDays".into(),
            reason: "day 9 is outside 0..6".into(),
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["kind"], "childDropped");
        assert_eq!(json["child"], "workDays");
    }
}
