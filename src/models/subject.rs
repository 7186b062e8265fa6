//! Soft-deletable subject domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Kind of record that can be soft-deleted and audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Review,
    News,
    User,
}

impl SubjectKind {
    pub const ALL: [SubjectKind; 3] = [SubjectKind::Review, SubjectKind::News, SubjectKind::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::Review => "review",
            SubjectKind::News => "news",
            SubjectKind::User => "user",
        }
    }

    /// Subject table
    pub fn table(&self) -> &'static str {
        match self {
            SubjectKind::Review => "reviews",
            SubjectKind::News => "news",
            SubjectKind::User => "users",
        }
    }

    /// Parallel audit table
    pub fn audit_table(&self) -> &'static str {
        match self {
            SubjectKind::Review => "review_audits",
            SubjectKind::News => "news_audits",
            SubjectKind::User => "user_audits",
        }
    }

    /// Name of the subject id in query strings and CSV headers
    pub fn id_key(&self) -> &'static str {
        match self {
            SubjectKind::Review => "reviewId",
            SubjectKind::News => "newsId",
            SubjectKind::User => "userId",
        }
    }

    /// Real-time channel carrying this kind's audit rows
    pub fn channel(&self) -> &'static str {
        match self {
            SubjectKind::Review => "audit:review",
            SubjectKind::News => "audit:news",
            SubjectKind::User => "audit:user",
        }
    }

    pub fn from_channel(channel: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.channel() == channel)
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata captured when a subject is soft-deleted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deletion {
    pub at: DateTime<Utc>,
    pub by_id: Uuid,
    pub by_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Lifecycle state of a subject
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubjectState {
    #[default]
    Active,
    Deleted(Deletion),
}

impl SubjectState {
    pub fn is_active(&self) -> bool {
        matches!(self, SubjectState::Active)
    }

    pub fn deletion(&self) -> Option<&Deletion> {
        match self {
            SubjectState::Active => None,
            SubjectState::Deleted(deletion) => Some(deletion),
        }
    }

    /// Rebuild the state from the nullable `deleted_*` columns.
    /// A row is active iff `deleted_at` is null.
    pub fn from_columns(
        deleted_at: Option<DateTime<Utc>>,
        deleted_by_id: Option<Uuid>,
        deleted_by_name: Option<String>,
        deleted_reason: Option<String>,
        deleted_note: Option<String>,
    ) -> Self {
        match deleted_at {
            None => SubjectState::Active,
            Some(at) => SubjectState::Deleted(Deletion {
                at,
                by_id: deleted_by_id.unwrap_or_else(Uuid::nil),
                by_name: deleted_by_name.unwrap_or_default(),
                reason: deleted_reason,
                note: deleted_note,
            }),
        }
    }

    /// Flatten into `(deleted_at, deleted_by_id, deleted_by_name, deleted_reason, deleted_note)`
    pub fn to_columns(
        &self,
    ) -> (
        Option<DateTime<Utc>>,
        Option<Uuid>,
        Option<String>,
        Option<String>,
        Option<String>,
    ) {
        match self {
            SubjectState::Active => (None, None, None, None, None),
            SubjectState::Deleted(d) => (
                Some(d.at),
                Some(d.by_id),
                Some(d.by_name.clone()),
                d.reason.clone(),
                d.note.clone(),
            ),
        }
    }
}

/// Which side of the soft-delete boundary a listing reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Active,
    Deleted,
}

impl Visibility {
    pub fn matches(&self, state: &SubjectState) -> bool {
        match self {
            Visibility::Active => state.is_active(),
            Visibility::Deleted => !state.is_active(),
        }
    }
}

/// Actor role
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Staff,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "customer" | "user" => Ok(Role::Customer),
            "staff" => Ok(Role::Staff),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Trim free-text input; blank strings become `None`
pub fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
