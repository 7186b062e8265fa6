//! 审计日志服务
//! 追加 + 广播、过滤分页查询、CSV 导出，以及查询时顺带执行的保留期清理

use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::{
    config::ModerationConfig,
    error::{AppError, Result},
    models::{AuditAction, AuditEntry, AuditFilters, AuditPage, SortOrder, SubjectKind},
    realtime::EventBus,
    repository::Store,
};

/// 已校验的审计列表请求
#[derive(Debug, Clone)]
pub struct AuditListRequest {
    pub filters: AuditFilters,
    pub page: i64,
    pub page_size: i64,
    pub sort: SortOrder,
}

impl AuditListRequest {
    /// skip = (page - 1) * pageSize
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

pub struct AuditService {
    store: Arc<dyn Store>,
    event_bus: Arc<EventBus>,
    config: ModerationConfig,
}

impl AuditService {
    pub fn new(store: Arc<dyn Store>, event_bus: Arc<EventBus>, config: ModerationConfig) -> Self {
        Self {
            store,
            event_bus,
            config,
        }
    }

    /// 写入审计记录并推送到实时频道
    pub async fn record(&self, entry: AuditEntry) -> Result<AuditEntry> {
        if let Err(e) = self.store.insert_audit(&entry).await {
            // 对象状态已经写入，这里不回滚
            tracing::error!(
                subject_type = entry.subject_type.as_str(),
                subject_id = %entry.subject_id,
                action = entry.action.as_str(),
                error = %e,
                "Failed to append audit row"
            );
            return Err(e);
        }

        tracing::info!(
            subject_type = entry.subject_type.as_str(),
            subject_id = %entry.subject_id,
            action = entry.action.as_str(),
            by_name = %entry.by_name,
            "Audit row appended"
        );

        self.event_bus.publish_audit(&entry);
        Ok(entry)
    }

    /// 清理超过保留期的 "deleted" 审计记录（对象本身不受影响）
    pub async fn sweep_expired(&self, kind: SubjectKind) -> Result<u64> {
        let cutoff = Utc::now() - Duration::days(self.config.audit_retention_days);
        let purged = self
            .store
            .purge_audits(kind, AuditAction::Deleted, cutoff)
            .await?;

        if purged > 0 {
            metrics::counter!("audit_rows_purged_total", "kind" => kind.as_str()).increment(purged);
            tracing::info!(
                subject_type = kind.as_str(),
                purged,
                cutoff = %cutoff,
                "Expired audit rows purged"
            );
        }

        Ok(purged)
    }

    /// 校验 byName 正则（非法表达式返回 400，而不是交给数据库报错）
    pub fn validate_filters(filters: &AuditFilters) -> Result<()> {
        filters
            .name_pattern()
            .map_err(|e| AppError::BadRequest(format!("Invalid byName pattern: {}", e)))?;
        if let (Some(start), Some(end)) = (filters.start, filters.end) {
            if start > end {
                return Err(AppError::BadRequest("start must not be after end".to_string()));
            }
        }
        Ok(())
    }

    /// 分页查询
    pub async fn list(&self, kind: SubjectKind, request: &AuditListRequest) -> Result<AuditPage> {
        Self::validate_filters(&request.filters)?;
        self.sweep_expired(kind).await?;

        let total = self.store.count_audits(kind, &request.filters).await?;
        let audits = self
            .store
            .query_audits(
                kind,
                &request.filters,
                request.sort,
                Some(request.page_size),
                request.offset(),
            )
            .await?;

        Ok(AuditPage {
            audits,
            total,
            page: request.page,
            page_size: request.page_size,
            sort: request.sort,
        })
    }

    /// 导出过滤后的完整集合，非 exportAll 时截断到上限
    pub async fn export(
        &self,
        kind: SubjectKind,
        filters: &AuditFilters,
        sort: SortOrder,
        export_all: bool,
    ) -> Result<Vec<AuditEntry>> {
        Self::validate_filters(filters)?;
        self.sweep_expired(kind).await?;

        let limit = if export_all {
            None
        } else {
            Some(self.config.export_row_cap)
        };

        let rows = self.store.query_audits(kind, filters, sort, limit, 0).await?;

        tracing::info!(
            subject_type = kind.as_str(),
            rows = rows.len(),
            export_all,
            "Audit export generated"
        );

        Ok(rows)
    }
}
