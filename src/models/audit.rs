//! Audit domain models

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::subject::SubjectKind;

/// Action recorded in an audit row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Deleted,
    Restored,
    Viewed,
    ViewsUpdated,
    PhoneChanged,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Deleted => "deleted",
            AuditAction::Restored => "restored",
            AuditAction::Viewed => "viewed",
            AuditAction::ViewsUpdated => "views_updated",
            AuditAction::PhoneChanged => "phone_changed",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deleted" => Ok(AuditAction::Deleted),
            "restored" => Ok(AuditAction::Restored),
            "viewed" => Ok(AuditAction::Viewed),
            "views_updated" => Ok(AuditAction::ViewsUpdated),
            "phone_changed" => Ok(AuditAction::PhoneChanged),
            other => Err(format!("unknown audit action: {}", other)),
        }
    }
}

/// Append-only audit row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: Uuid,
    pub subject_type: SubjectKind,
    pub subject_id: Uuid,
    pub action: AuditAction,
    pub by_id: Option<Uuid>,
    pub by_name: String,
    pub reason: Option<String>,
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        subject_type: SubjectKind,
        subject_id: Uuid,
        action: AuditAction,
        by_id: Option<Uuid>,
        by_name: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject_type,
            subject_id,
            action,
            by_id,
            by_name: by_name.to_string(),
            reason: None,
            note: None,
            timestamp: Utc::now().trunc_subsecs(6),
        }
    }

    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }

    /// Timestamps keep microsecond precision, matching `TIMESTAMPTZ`
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp.trunc_subsecs(6);
        self
    }
}

/// Database row for the `*_audits` tables
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuditRow {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub action: String,
    pub by_id: Option<Uuid>,
    pub by_name: String,
    pub reason: Option<String>,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl AuditRow {
    pub fn into_entry(self, kind: SubjectKind) -> Result<AuditEntry, String> {
        Ok(AuditEntry {
            id: self.id,
            subject_type: kind,
            subject_id: self.subject_id,
            action: self.action.parse()?,
            by_id: self.by_id,
            by_name: self.by_name,
            reason: self.reason,
            note: self.note,
            timestamp: self.occurred_at,
        })
    }
}

/// Timestamp ordering for audit listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("sort must be asc or desc, got {}", other)),
        }
    }
}

/// Audit filters, already validated
#[derive(Debug, Clone, Default)]
pub struct AuditFilters {
    pub action: Option<AuditAction>,
    /// Case-insensitive regular expression over `by_name`
    pub by_name: Option<String>,
    pub subject_id: Option<Uuid>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl AuditFilters {
    /// Compile `by_name` the way every backend evaluates it
    pub fn name_pattern(&self) -> Result<Option<regex::Regex>, regex::Error> {
        self.by_name
            .as_deref()
            .map(|pattern| {
                regex::RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
            })
            .transpose()
    }

    /// In-process evaluation, used by the memory backend.
    /// `by_name` must already be compiled into `name_pattern`.
    pub fn matches(&self, entry: &AuditEntry, name_pattern: Option<&regex::Regex>) -> bool {
        if let Some(action) = self.action {
            if entry.action != action {
                return false;
            }
        }
        if let Some(subject_id) = self.subject_id {
            if entry.subject_id != subject_id {
                return false;
            }
        }
        if let Some(start) = self.start {
            if entry.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if entry.timestamp > end {
                return false;
            }
        }
        if let Some(pattern) = name_pattern {
            if !pattern.is_match(&entry.by_name) {
                return false;
            }
        }
        true
    }
}

/// One page of audit rows
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditPage {
    pub audits: Vec<AuditEntry>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub sort: SortOrder,
}
