//! User domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::subject::{Role, SubjectState};

/// Storefront account
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub state: SubjectState,
}

/// Database row for `users`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by_id: Option<Uuid>,
    pub deleted_by_name: Option<String>,
    pub deleted_reason: Option<String>,
    pub deleted_note: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = String;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            role: row.role.parse()?,
            created_at: row.created_at,
            state: SubjectState::from_columns(
                row.deleted_at,
                row.deleted_by_id,
                row.deleted_by_name,
                row.deleted_reason,
                row.deleted_note,
            ),
        })
    }
}

/// Change phone request
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePhoneRequest {
    #[validate(length(min = 5, max = 32, message = "phone must be 5-32 characters"))]
    pub phone: String,
}

/// Public representation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            created_at: user.created_at,
        }
    }
}
