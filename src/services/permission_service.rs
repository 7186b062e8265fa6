//! 权限检查服务
//! 角色到操作的静态策略

use crate::{
    auth::Actor,
    error::AppError,
    models::{Role, SubjectKind},
};

/// 受控操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// 软删除
    Delete,
    /// 恢复
    Restore,
    /// 查询/导出审计记录
    ReadAudit,
    /// 查看已删除列表
    ListDeleted,
    /// 发布内容（新闻）
    Publish,
    /// 修改计数等管理字段
    Manage,
    /// 订阅实时审计流
    Subscribe,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Delete => "delete",
            Permission::Restore => "restore",
            Permission::ReadAudit => "read_audit",
            Permission::ListDeleted => "list_deleted",
            Permission::Publish => "publish",
            Permission::Manage => "manage",
            Permission::Subscribe => "subscribe",
        }
    }
}

const ADMIN_ONLY: &[Role] = &[Role::Admin];
const ADMIN_OR_STAFF: &[Role] = &[Role::Admin, Role::Staff];

#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionService;

impl PermissionService {
    pub fn new() -> Self {
        Self
    }

    /// 允许执行某操作的角色
    pub fn allowed_roles(&self, kind: SubjectKind, permission: Permission) -> &'static [Role] {
        match (kind, permission) {
            // 账户删除比内容删除更严格
            (SubjectKind::User, Permission::Delete) => ADMIN_ONLY,
            (_, Permission::Delete) => ADMIN_OR_STAFF,
            (_, Permission::Restore) => ADMIN_ONLY,
            (_, Permission::ReadAudit) => ADMIN_ONLY,
            (_, Permission::ListDeleted) => ADMIN_OR_STAFF,
            (_, Permission::Publish) => ADMIN_OR_STAFF,
            (_, Permission::Manage) => ADMIN_ONLY,
            (_, Permission::Subscribe) => ADMIN_OR_STAFF,
        }
    }

    /// 检查用户是否拥有权限
    pub fn check_permission(&self, actor: &Actor, kind: SubjectKind, permission: Permission) -> bool {
        self.allowed_roles(kind, permission).contains(&actor.role)
    }

    /// 检查权限，如果无权限则返回错误
    pub fn require_permission(
        &self,
        actor: &Actor,
        kind: SubjectKind,
        permission: Permission,
    ) -> Result<(), AppError> {
        if self.check_permission(actor, kind, permission) {
            return Ok(());
        }

        tracing::warn!(
            actor_id = %actor.id,
            role = actor.role.as_str(),
            resource = kind.as_str(),
            permission = permission.as_str(),
            "Permission denied"
        );
        Err(AppError::Forbidden)
    }
}
