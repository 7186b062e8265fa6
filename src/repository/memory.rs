//! In-memory store
//!
//! Mirrors the Postgres semantics (ordering, retention purge, regex name
//! filter) closely enough for the API test suite to run without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    AuditRepository, NewsRepository, ReviewRepository, Store, SubjectRepository, UserRepository,
};
use crate::{
    error::{AppError, Result},
    models::{
        AuditAction, AuditEntry, AuditFilters, News, Review, SortOrder, SubjectKind, SubjectState,
        User, Visibility,
    },
};

#[derive(Default)]
struct MemoryData {
    reviews: HashMap<Uuid, Review>,
    news: HashMap<Uuid, News>,
    users: HashMap<Uuid, User>,
    audits: HashMap<SubjectKind, Vec<AuditEntry>>,
}

impl MemoryData {
    fn state_mut(&mut self, kind: SubjectKind, id: Uuid) -> Option<&mut SubjectState> {
        match kind {
            SubjectKind::Review => self.reviews.get_mut(&id).map(|r| &mut r.state),
            SubjectKind::News => self.news.get_mut(&id).map(|n| &mut n.state),
            SubjectKind::User => self.users.get_mut(&id).map(|u| &mut u.state),
        }
    }

    fn filtered_audits(&self, kind: SubjectKind, filters: &AuditFilters) -> Result<Vec<&AuditEntry>> {
        let pattern = filters
            .name_pattern()
            .map_err(|e| AppError::BadRequest(format!("Invalid byName pattern: {}", e)))?;

        Ok(self
            .audits
            .get(&kind)
            .map(|rows| {
                rows.iter()
                    .filter(|entry| filters.matches(entry, pattern.as_ref()))
                    .collect()
            })
            .unwrap_or_default())
    }
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, Uuid)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<MemoryData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubjectRepository for MemoryStore {
    async fn load_state(&self, kind: SubjectKind, id: Uuid) -> Result<Option<SubjectState>> {
        let data = self.data.read().await;
        let state = match kind {
            SubjectKind::Review => data.reviews.get(&id).map(|r| r.state.clone()),
            SubjectKind::News => data.news.get(&id).map(|n| n.state.clone()),
            SubjectKind::User => data.users.get(&id).map(|u| u.state.clone()),
        };
        Ok(state)
    }

    async fn save_state(&self, kind: SubjectKind, id: Uuid, state: &SubjectState) -> Result<bool> {
        let mut data = self.data.write().await;
        match data.state_mut(kind, id) {
            Some(current) => {
                *current = state.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl AuditRepository for MemoryStore {
    async fn insert_audit(&self, entry: &AuditEntry) -> Result<()> {
        let mut data = self.data.write().await;
        data.audits
            .entry(entry.subject_type)
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    async fn query_audits(
        &self,
        kind: SubjectKind,
        filters: &AuditFilters,
        sort: SortOrder,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<Vec<AuditEntry>> {
        let data = self.data.read().await;
        let mut rows = data.filtered_audits(kind, filters)?;

        rows.sort_by(|a, b| {
            let ordering = a
                .timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.id.cmp(&b.id));
            match sort {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let offset = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
        let limit = limit
            .map(|l| usize::try_from(l.max(0)).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        Ok(rows.into_iter().skip(offset).take(limit).cloned().collect())
    }

    async fn count_audits(&self, kind: SubjectKind, filters: &AuditFilters) -> Result<i64> {
        let data = self.data.read().await;
        Ok(data.filtered_audits(kind, filters)?.len() as i64)
    }

    async fn purge_audits(
        &self,
        kind: SubjectKind,
        action: AuditAction,
        before: DateTime<Utc>,
    ) -> Result<u64> {
        let mut data = self.data.write().await;
        let Some(rows) = data.audits.get_mut(&kind) else {
            return Ok(0);
        };

        let before_len = rows.len();
        rows.retain(|entry| !(entry.action == action && entry.timestamp < before));
        Ok((before_len - rows.len()) as u64)
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn insert_review(&self, review: &Review) -> Result<()> {
        let mut data = self.data.write().await;
        data.reviews.insert(review.id, review.clone());
        Ok(())
    }

    async fn find_review(&self, id: Uuid) -> Result<Option<Review>> {
        Ok(self.data.read().await.reviews.get(&id).cloned())
    }

    async fn list_reviews(&self, visibility: Visibility) -> Result<Vec<Review>> {
        let data = self.data.read().await;
        let mut reviews: Vec<Review> = data
            .reviews
            .values()
            .filter(|r| visibility.matches(&r.state))
            .cloned()
            .collect();
        newest_first(&mut reviews, |r| (r.created_at, r.id));
        Ok(reviews)
    }
}

#[async_trait]
impl NewsRepository for MemoryStore {
    async fn insert_news(&self, news: &News) -> Result<()> {
        let mut data = self.data.write().await;
        data.news.insert(news.id, news.clone());
        Ok(())
    }

    async fn find_news(&self, id: Uuid) -> Result<Option<News>> {
        Ok(self.data.read().await.news.get(&id).cloned())
    }

    async fn list_news(&self, visibility: Visibility) -> Result<Vec<News>> {
        let data = self.data.read().await;
        let mut items: Vec<News> = data
            .news
            .values()
            .filter(|n| visibility.matches(&n.state))
            .cloned()
            .collect();
        newest_first(&mut items, |n| (n.created_at, n.id));
        Ok(items)
    }

    async fn increment_views(&self, id: Uuid) -> Result<Option<i64>> {
        let mut data = self.data.write().await;
        Ok(data
            .news
            .get_mut(&id)
            .filter(|n| n.state.is_active())
            .map(|n| {
                n.views += 1;
                n.views
            }))
    }

    async fn set_views(&self, id: Uuid, views: i64) -> Result<Option<i64>> {
        let mut data = self.data.write().await;
        Ok(data
            .news
            .get_mut(&id)
            .map(|n| std::mem::replace(&mut n.views, views)))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut data = self.data.write().await;
        data.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.data.read().await.users.get(&id).cloned())
    }

    async fn list_users(&self, visibility: Visibility) -> Result<Vec<User>> {
        let data = self.data.read().await;
        let mut users: Vec<User> = data
            .users
            .values()
            .filter(|u| visibility.matches(&u.state))
            .cloned()
            .collect();
        newest_first(&mut users, |u| (u.created_at, u.id));
        Ok(users)
    }

    async fn set_phone(&self, id: Uuid, phone: &str) -> Result<Option<Option<String>>> {
        let mut data = self.data.write().await;
        Ok(data
            .users
            .get_mut(&id)
            .map(|u| std::mem::replace(&mut u.phone, Some(phone.to_string()))))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
