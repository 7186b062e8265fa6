//! 内容服务
//! 评论、新闻、用户的创建与读取，以及浏览量 / 手机号等附带审计的字段修改

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::Actor,
    error::{AppError, Result},
    models::{
        AuditAction, AuditEntry, ChangePhoneRequest, CreateNewsRequest, CreateReviewRequest, News,
        Review, SubjectKind, SubjectState, User, Visibility,
    },
    repository::Store,
    services::{
        audit_service::AuditService,
        permission_service::{Permission, PermissionService},
    },
};

pub struct ContentService {
    store: Arc<dyn Store>,
    audit_service: Arc<AuditService>,
    permissions: PermissionService,
}

impl ContentService {
    pub fn new(
        store: Arc<dyn Store>,
        audit_service: Arc<AuditService>,
        permissions: PermissionService,
    ) -> Self {
        Self {
            store,
            audit_service,
            permissions,
        }
    }

    // ==================== 评论 ====================

    pub async fn active_reviews(&self) -> Result<Vec<Review>> {
        self.store.list_reviews(Visibility::Active).await
    }

    pub async fn deleted_reviews(&self, actor: &Actor) -> Result<Vec<Review>> {
        self.permissions
            .require_permission(actor, SubjectKind::Review, Permission::ListDeleted)?;
        self.store.list_reviews(Visibility::Deleted).await
    }

    #[instrument(skip(self, actor, request), fields(actor_id = %actor.id))]
    pub async fn create_review(&self, actor: &Actor, request: CreateReviewRequest) -> Result<Review> {
        request.validate()?;

        let review = Review {
            id: Uuid::new_v4(),
            user_id: actor.id,
            user_name: actor.name.clone(),
            rating: request.rating,
            comment: request.comment.trim().to_string(),
            created_at: Utc::now(),
            state: SubjectState::Active,
        };
        self.store.insert_review(&review).await?;

        info!(review_id = %review.id, rating = review.rating, "Review created");
        Ok(review)
    }

    /// 读取单条评论（任意状态）
    pub async fn find_review(&self, id: Uuid) -> Result<Review> {
        self.store.find_review(id).await?.ok_or(AppError::NotFound)
    }

    // ==================== 新闻 ====================

    pub async fn active_news(&self) -> Result<Vec<News>> {
        self.store.list_news(Visibility::Active).await
    }

    pub async fn deleted_news(&self, actor: &Actor) -> Result<Vec<News>> {
        self.permissions
            .require_permission(actor, SubjectKind::News, Permission::ListDeleted)?;
        self.store.list_news(Visibility::Deleted).await
    }

    #[instrument(skip(self, actor, request), fields(actor_id = %actor.id))]
    pub async fn publish_news(&self, actor: &Actor, request: CreateNewsRequest) -> Result<News> {
        self.permissions
            .require_permission(actor, SubjectKind::News, Permission::Publish)?;
        request.validate()?;

        let news = News {
            id: Uuid::new_v4(),
            title: request.title.trim().to_string(),
            content: request.content,
            views: 0,
            author_id: actor.id,
            author_name: actor.name.clone(),
            created_at: Utc::now(),
            state: SubjectState::Active,
        };
        self.store.insert_news(&news).await?;

        info!(news_id = %news.id, "News published");
        Ok(news)
    }

    pub async fn find_news(&self, id: Uuid) -> Result<News> {
        self.store.find_news(id).await?.ok_or(AppError::NotFound)
    }

    /// 公开阅读：已删除的新闻视为不存在；登录用户的阅读记入审计
    pub async fn view_news(&self, id: Uuid, viewer: Option<&Actor>) -> Result<News> {
        let views = self
            .store
            .increment_views(id)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut news = self.find_news(id).await?;
        news.views = views;

        if let Some(viewer) = viewer {
            self.audit_service
                .record(AuditEntry::new(
                    SubjectKind::News,
                    id,
                    AuditAction::Viewed,
                    Some(viewer.id),
                    &viewer.name,
                ))
                .await?;
        }

        Ok(news)
    }

    /// 管理员直接设置浏览量，备注 `old -> new`
    #[instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn update_views(&self, actor: &Actor, id: Uuid, views: i64) -> Result<News> {
        self.permissions
            .require_permission(actor, SubjectKind::News, Permission::Manage)?;
        if views < 0 {
            return Err(AppError::BadRequest("views must not be negative".to_string()));
        }

        let old = self
            .store
            .set_views(id, views)
            .await?
            .ok_or(AppError::NotFound)?;

        self.audit_service
            .record(
                AuditEntry::new(
                    SubjectKind::News,
                    id,
                    AuditAction::ViewsUpdated,
                    Some(actor.id),
                    &actor.name,
                )
                .with_note(Some(format!("{} -> {}", old, views))),
            )
            .await?;

        self.find_news(id).await
    }

    // ==================== 用户 ====================

    /// 管理员或本人可见；已删除账户返回 404
    pub async fn get_user(&self, actor: &Actor, id: Uuid) -> Result<User> {
        actor.require_admin_or_self(id)?;
        self.store
            .find_user(id)
            .await?
            .filter(|u| u.state.is_active())
            .ok_or(AppError::NotFound)
    }

    pub async fn find_user(&self, id: Uuid) -> Result<User> {
        self.store.find_user(id).await?.ok_or(AppError::NotFound)
    }

    pub async fn deleted_users(&self, actor: &Actor) -> Result<Vec<User>> {
        self.permissions
            .require_permission(actor, SubjectKind::User, Permission::ListDeleted)?;
        self.store.list_users(Visibility::Deleted).await
    }

    /// 修改手机号，备注 `<old|none> -> <new>`
    #[instrument(skip(self, actor, request), fields(actor_id = %actor.id))]
    pub async fn change_phone(
        &self,
        actor: &Actor,
        id: Uuid,
        request: ChangePhoneRequest,
    ) -> Result<User> {
        actor.require_admin_or_self(id)?;
        request.validate()?;

        let user = self.get_user(actor, id).await?;
        let phone = request.phone.trim().to_string();

        let old = self
            .store
            .set_phone(user.id, &phone)
            .await?
            .ok_or(AppError::NotFound)?;

        self.audit_service
            .record(
                AuditEntry::new(
                    SubjectKind::User,
                    id,
                    AuditAction::PhoneChanged,
                    Some(actor.id),
                    &actor.name,
                )
                .with_note(Some(format!(
                    "{} -> {}",
                    old.as_deref().unwrap_or("none"),
                    phone
                ))),
            )
            .await?;

        Ok(User {
            phone: Some(phone),
            ..user
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ModerationConfig,
        models::{AuditFilters, Role, SortOrder},
        realtime::EventBus,
        repository::{AuditRepository, MemoryStore},
    };

    fn actor(role: Role) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            name: format!("{}-tester", role.as_str()),
            role,
        }
    }

    fn service(store: Arc<MemoryStore>) -> ContentService {
        let audit = Arc::new(AuditService::new(
            store.clone(),
            Arc::new(EventBus::new(16)),
            ModerationConfig::default(),
        ));
        ContentService::new(store, audit, PermissionService::new())
    }

    async fn news_audits(store: &MemoryStore) -> Vec<AuditEntry> {
        store
            .query_audits(SubjectKind::News, &AuditFilters::default(), SortOrder::Asc, None, 0)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_anonymous_view_is_not_audited() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone());
        let staff = actor(Role::Staff);

        let news = service
            .publish_news(
                &staff,
                CreateNewsRequest {
                    title: "Grand opening".to_string(),
                    content: "Doors open at nine".to_string(),
                },
            )
            .await
            .unwrap();

        let viewed = service.view_news(news.id, None).await.unwrap();
        assert_eq!(viewed.views, 1);
        assert!(news_audits(&store).await.is_empty());

        let reader = actor(Role::Customer);
        let viewed = service.view_news(news.id, Some(&reader)).await.unwrap();
        assert_eq!(viewed.views, 2);

        let audits = news_audits(&store).await;
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].action, AuditAction::Viewed);
        assert_eq!(audits[0].by_id, Some(reader.id));
    }

    #[tokio::test]
    async fn test_update_views_notes_old_and_new() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone());
        let admin = actor(Role::Admin);

        let news = service
            .publish_news(
                &admin,
                CreateNewsRequest {
                    title: "Sale".to_string(),
                    content: "Everything half off".to_string(),
                },
            )
            .await
            .unwrap();

        let updated = service.update_views(&admin, news.id, 42).await.unwrap();
        assert_eq!(updated.views, 42);

        let audits = news_audits(&store).await;
        assert_eq!(audits[0].action, AuditAction::ViewsUpdated);
        assert_eq!(audits[0].note.as_deref(), Some("0 -> 42"));

        let denied = service.update_views(&actor(Role::Staff), news.id, 1).await;
        assert!(matches!(denied, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn test_customer_cannot_publish() {
        let store = Arc::new(MemoryStore::new());
        let result = service(store)
            .publish_news(
                &actor(Role::Customer),
                CreateNewsRequest {
                    title: "x".to_string(),
                    content: "y".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn test_create_review_validates_rating() {
        let store = Arc::new(MemoryStore::new());
        let result = service(store)
            .create_review(
                &actor(Role::Customer),
                CreateReviewRequest {
                    rating: 9,
                    comment: "great".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
