//! Business logic services layer

pub mod audit_service;
pub mod content_service;
pub mod moderation_service;
pub mod permission_service;

pub use audit_service::{AuditListRequest, AuditService};
pub use content_service::ContentService;
pub use moderation_service::ModerationService;
pub use permission_service::{Permission, PermissionService};
