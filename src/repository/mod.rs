//! Database repository layer
//!
//! Storage is split into one trait per concern. `PgStore` implements them
//! over PostgreSQL; `MemoryStore` keeps everything in process and backs the
//! test suite and local demos.

pub mod audit_repo;
pub mod memory;
pub mod news_repo;
pub mod review_repo;
pub mod subject_repo;
pub mod user_repo;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{
        AuditAction, AuditEntry, AuditFilters, News, Review, SortOrder, SubjectKind, SubjectState,
        User, Visibility,
    },
};

/// SQL predicate selecting one side of the soft-delete boundary
pub(crate) fn visibility_clause(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Active => "deleted_at IS NULL",
        Visibility::Deleted => "deleted_at IS NOT NULL",
    }
}

/// Lifecycle state of any subject kind
#[async_trait]
pub trait SubjectRepository: Send + Sync {
    async fn load_state(&self, kind: SubjectKind, id: Uuid) -> Result<Option<SubjectState>>;

    /// Overwrite the state. Returns false when the subject does not exist.
    async fn save_state(&self, kind: SubjectKind, id: Uuid, state: &SubjectState) -> Result<bool>;
}

/// Append-only audit tables, one per subject kind
#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn insert_audit(&self, entry: &AuditEntry) -> Result<()>;

    /// Ordered by timestamp then id. `limit: None` reads the whole filtered set.
    async fn query_audits(
        &self,
        kind: SubjectKind,
        filters: &AuditFilters,
        sort: SortOrder,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<Vec<AuditEntry>>;

    async fn count_audits(&self, kind: SubjectKind, filters: &AuditFilters) -> Result<i64>;

    /// Delete rows with `action` older than `before`. Returns the number removed.
    async fn purge_audits(
        &self,
        kind: SubjectKind,
        action: AuditAction,
        before: DateTime<Utc>,
    ) -> Result<u64>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn insert_review(&self, review: &Review) -> Result<()>;
    async fn find_review(&self, id: Uuid) -> Result<Option<Review>>;
    /// Newest first
    async fn list_reviews(&self, visibility: Visibility) -> Result<Vec<Review>>;
}

#[async_trait]
pub trait NewsRepository: Send + Sync {
    async fn insert_news(&self, news: &News) -> Result<()>;
    async fn find_news(&self, id: Uuid) -> Result<Option<News>>;
    /// Newest first
    async fn list_news(&self, visibility: Visibility) -> Result<Vec<News>>;
    /// Bump the view counter of an active item. Returns the new count.
    async fn increment_views(&self, id: Uuid) -> Result<Option<i64>>;
    /// Overwrite the view counter. Returns the previous count.
    async fn set_views(&self, id: Uuid, views: i64) -> Result<Option<i64>>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert_user(&self, user: &User) -> Result<()>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;
    /// Newest first
    async fn list_users(&self, visibility: Visibility) -> Result<Vec<User>>;
    /// Replace the phone number. Returns the previous value, `None` if the user is absent.
    async fn set_phone(&self, id: Uuid, phone: &str) -> Result<Option<Option<String>>>;
}

/// Everything the service layer needs from storage
#[async_trait]
pub trait Store:
    SubjectRepository + AuditRepository + ReviewRepository + NewsRepository + UserRepository
{
    /// Readiness probe
    async fn ping(&self) -> Result<()>;

    fn backend_name(&self) -> &'static str;
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
