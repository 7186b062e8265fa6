//! 软删除 / 恢复服务
//! 对三类对象（评论、新闻、用户）通用：鉴权 → 查找 → 修改状态 → 写审计 → 广播

use chrono::{SubsecRound, Utc};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::Actor,
    error::{AppError, Result},
    models::{clean_text, AuditAction, AuditEntry, Deletion, SubjectKind, SubjectState},
    repository::Store,
    services::{
        audit_service::AuditService,
        permission_service::{Permission, PermissionService},
    },
};

/// 恢复审计的备注：`<note> (restored; prevReason: X)` 或 `restored; prevReason: X`
pub fn restore_note(note: Option<&str>, prev_reason: &str) -> String {
    match note {
        Some(note) => format!("{} (restored; prevReason: {})", note, prev_reason),
        None => format!("restored; prevReason: {}", prev_reason),
    }
}

pub struct ModerationService {
    store: Arc<dyn Store>,
    audit_service: Arc<AuditService>,
    permissions: PermissionService,
    strict_restore: bool,
}

impl ModerationService {
    pub fn new(
        store: Arc<dyn Store>,
        audit_service: Arc<AuditService>,
        permissions: PermissionService,
        strict_restore: bool,
    ) -> Self {
        Self {
            store,
            audit_service,
            permissions,
            strict_restore,
        }
    }

    /// 软删除
    #[instrument(skip(self, actor, reason, note), fields(actor_id = %actor.id))]
    pub async fn soft_delete(
        &self,
        kind: SubjectKind,
        id: Uuid,
        actor: &Actor,
        reason: Option<&str>,
        note: Option<&str>,
    ) -> Result<AuditEntry> {
        self.permissions
            .require_permission(actor, kind, Permission::Delete)?;

        if kind == SubjectKind::User && actor.id == id {
            return Err(AppError::BadRequest(
                "Administrators cannot delete their own account".to_string(),
            ));
        }

        if self.store.load_state(kind, id).await?.is_none() {
            return Err(AppError::NotFound);
        }

        let deletion = Deletion {
            at: Utc::now().trunc_subsecs(6),
            by_id: actor.id,
            by_name: actor.name.clone(),
            reason: clean_text(reason),
            note: clean_text(note),
        };

        // 已删除的对象再次删除时直接覆盖删除信息
        let state = SubjectState::Deleted(deletion.clone());
        if !self.store.save_state(kind, id, &state).await? {
            return Err(AppError::NotFound);
        }

        let entry = AuditEntry::new(kind, id, AuditAction::Deleted, Some(actor.id), &actor.name)
            .with_reason(deletion.reason)
            .with_note(deletion.note)
            .at(deletion.at);
        let entry = self.audit_service.record(entry).await?;

        metrics::counter!("moderation_soft_deletes_total", "kind" => kind.as_str()).increment(1);
        info!(subject_type = kind.as_str(), subject_id = %id, "Subject soft-deleted");

        Ok(entry)
    }

    /// 恢复（仅管理员）
    #[instrument(skip(self, actor, note), fields(actor_id = %actor.id))]
    pub async fn restore(
        &self,
        kind: SubjectKind,
        id: Uuid,
        actor: &Actor,
        note: Option<&str>,
    ) -> Result<AuditEntry> {
        self.permissions
            .require_permission(actor, kind, Permission::Restore)?;

        let current = self
            .store
            .load_state(kind, id)
            .await?
            .ok_or(AppError::NotFound)?;

        if current.is_active() && self.strict_restore {
            return Err(AppError::Conflict(format!(
                "{} is not deleted",
                kind.as_str()
            )));
        }

        let prev_reason = current
            .deletion()
            .and_then(|d| d.reason.clone())
            .unwrap_or_else(|| "none".to_string());

        if !self
            .store
            .save_state(kind, id, &SubjectState::Active)
            .await?
        {
            return Err(AppError::NotFound);
        }

        let note = clean_text(note);
        let entry = AuditEntry::new(kind, id, AuditAction::Restored, Some(actor.id), &actor.name)
            .with_note(Some(restore_note(note.as_deref(), &prev_reason)));
        let entry = self.audit_service.record(entry).await?;

        metrics::counter!("moderation_restores_total", "kind" => kind.as_str()).increment(1);
        info!(
            subject_type = kind.as_str(),
            subject_id = %id,
            prev_reason = %prev_reason,
            "Subject restored"
        );

        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ModerationConfig,
        models::{AuditFilters, Review, Role, SortOrder},
        realtime::EventBus,
        repository::{AuditRepository, MemoryStore, ReviewRepository, SubjectRepository},
    };

    fn actor(role: Role) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            name: format!("{}-tester", role.as_str()),
            role,
        }
    }

    fn service(store: Arc<MemoryStore>, strict_restore: bool) -> ModerationService {
        let audit = Arc::new(AuditService::new(
            store.clone(),
            Arc::new(EventBus::new(16)),
            ModerationConfig::default(),
        ));
        ModerationService::new(store, audit, PermissionService::new(), strict_restore)
    }

    async fn seed_review(store: &MemoryStore) -> Uuid {
        let review = Review {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            user_name: "reader".to_string(),
            rating: 4,
            comment: "good".to_string(),
            created_at: Utc::now(),
            state: SubjectState::Active,
        };
        store.insert_review(&review).await.unwrap();
        review.id
    }

    #[test]
    fn test_restore_note_format() {
        assert_eq!(restore_note(None, "spam"), "restored; prevReason: spam");
        assert_eq!(
            restore_note(Some("appeal ok"), "none"),
            "appeal ok (restored; prevReason: none)"
        );
    }

    #[tokio::test]
    async fn test_delete_then_restore_carries_reason() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone(), false);
        let id = seed_review(&store).await;
        let admin = actor(Role::Admin);

        let deleted = service
            .soft_delete(SubjectKind::Review, id, &admin, Some("  spam "), Some("   "))
            .await
            .unwrap();
        assert_eq!(deleted.reason.as_deref(), Some("spam"));
        assert_eq!(deleted.note, None);

        let state = store.load_state(SubjectKind::Review, id).await.unwrap().unwrap();
        assert_eq!(state.deletion().unwrap().by_name, admin.name);
        assert_eq!(state.deletion().unwrap().at, deleted.timestamp);

        let restored = service
            .restore(SubjectKind::Review, id, &admin, None)
            .await
            .unwrap();
        assert_eq!(restored.note.as_deref(), Some("restored; prevReason: spam"));
        assert!(store
            .load_state(SubjectKind::Review, id)
            .await
            .unwrap()
            .unwrap()
            .is_active());

        let rows = store
            .query_audits(SubjectKind::Review, &AuditFilters::default(), SortOrder::Asc, None, 0)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].action, AuditAction::Restored);
    }

    #[tokio::test]
    async fn test_restore_active_subject() {
        let store = Arc::new(MemoryStore::new());
        let id = seed_review(&store).await;
        let admin = actor(Role::Admin);

        let entry = service(store.clone(), false)
            .restore(SubjectKind::Review, id, &admin, None)
            .await
            .unwrap();
        assert_eq!(entry.note.as_deref(), Some("restored; prevReason: none"));

        let strict = service(store.clone(), true)
            .restore(SubjectKind::Review, id, &admin, None)
            .await;
        assert!(matches!(strict, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_staff_cannot_restore_and_missing_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone(), false);
        let id = seed_review(&store).await;

        let result = service
            .restore(SubjectKind::Review, id, &actor(Role::Staff), None)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden)));

        let result = service
            .soft_delete(SubjectKind::Review, Uuid::new_v4(), &actor(Role::Staff), None, None)
            .await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_admin_cannot_delete_self() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store, false);
        let admin = actor(Role::Admin);

        let result = service
            .soft_delete(SubjectKind::User, admin.id, &admin, None, None)
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
