//! News domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::subject::SubjectState;

/// Published news item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct News {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub views: i64,
    pub author_id: Uuid,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub state: SubjectState,
}

/// Database row for `news`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NewsRow {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub views: i64,
    pub author_id: Uuid,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by_id: Option<Uuid>,
    pub deleted_by_name: Option<String>,
    pub deleted_reason: Option<String>,
    pub deleted_note: Option<String>,
}

impl From<NewsRow> for News {
    fn from(row: NewsRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            views: row.views,
            author_id: row.author_id,
            author_name: row.author_name,
            created_at: row.created_at,
            state: SubjectState::from_columns(
                row.deleted_at,
                row.deleted_by_id,
                row.deleted_by_name,
                row.deleted_reason,
                row.deleted_note,
            ),
        }
    }
}

/// Publish news request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateNewsRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: String,
}

/// Set view counter request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateViewsRequest {
    #[validate(range(min = 0, message = "views must not be negative"))]
    pub views: i64,
}

/// Public representation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub views: i64,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<News> for NewsResponse {
    fn from(news: News) -> Self {
        Self {
            id: news.id,
            title: news.title,
            content: news.content,
            views: news.views,
            author_name: news.author_name,
            created_at: news.created_at,
        }
    }
}
