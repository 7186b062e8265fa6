//! Audit repository (审计数据访问)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder, Row};

use super::{AuditRepository, PgStore};
use crate::{
    error::{AppError, Result},
    models::{AuditAction, AuditEntry, AuditFilters, AuditRow, SortOrder, SubjectKind},
};

/// 追加 WHERE 条件（查询与计数共用）
/// byName 在进程内用 regex 匹配，不下推为 `~*`
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &AuditFilters) {
    builder.push(" WHERE 1=1");

    if let Some(action) = filters.action {
        builder.push(" AND action = ").push_bind(action.as_str());
    }
    if let Some(subject_id) = filters.subject_id {
        builder.push(" AND subject_id = ").push_bind(subject_id);
    }
    if let Some(start) = filters.start {
        builder.push(" AND occurred_at >= ").push_bind(start);
    }
    if let Some(end) = filters.end {
        builder.push(" AND occurred_at <= ").push_bind(end);
    }
}

fn name_pattern(filters: &AuditFilters) -> Result<Option<regex::Regex>> {
    filters
        .name_pattern()
        .map_err(|e| AppError::BadRequest(format!("Invalid byName pattern: {}", e)))
}

#[async_trait]
impl AuditRepository for PgStore {
    async fn insert_audit(&self, entry: &AuditEntry) -> Result<()> {
        let query = format!(
            r#"
            INSERT INTO {} (id, subject_id, action, by_id, by_name, reason, note, occurred_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
            entry.subject_type.audit_table()
        );

        sqlx::query(&query)
            .bind(entry.id)
            .bind(entry.subject_id)
            .bind(entry.action.as_str())
            .bind(entry.by_id)
            .bind(&entry.by_name)
            .bind(&entry.reason)
            .bind(&entry.note)
            .bind(entry.timestamp)
            .execute(&self.db)
            .await?;

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
        let pattern = name_pattern(filters)?;

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT id, subject_id, action, by_id, by_name, reason, note, occurred_at FROM {}",
            kind.audit_table()
        ));
        push_filters(&mut builder, filters);

        let direction = sort.as_sql();
        builder.push(format!(" ORDER BY occurred_at {direction}, id {direction}"));
        // 有名称过滤时分页只能在匹配之后做
        if pattern.is_none() {
            if let Some(limit) = limit {
                builder.push(" LIMIT ").push_bind(limit);
            }
            builder.push(" OFFSET ").push_bind(offset);
        }

        let rows = builder.build_query_as::<AuditRow>().fetch_all(&self.db).await?;
        let entries = rows
            .into_iter()
            .map(|row| row.into_entry(kind).map_err(AppError::Internal))
            .collect::<Result<Vec<_>>>()?;

        let Some(pattern) = pattern else {
            return Ok(entries);
        };

        let offset = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
        let limit = limit
            .map(|l| usize::try_from(l.max(0)).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        Ok(entries
            .into_iter()
            .filter(|entry| pattern.is_match(&entry.by_name))
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn count_audits(&self, kind: SubjectKind, filters: &AuditFilters) -> Result<i64> {
        if filters.by_name.is_some() {
            let rows = self
                .query_audits(kind, filters, SortOrder::Asc, None, 0)
                .await?;
            return Ok(rows.len() as i64);
        }

        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {}", kind.audit_table()));
        push_filters(&mut builder, filters);

        let count: i64 = builder.build().fetch_one(&self.db).await?.get(0);
        Ok(count)
    }

    async fn purge_audits(
        &self,
        kind: SubjectKind,
        action: AuditAction,
        before: DateTime<Utc>,
    ) -> Result<u64> {
        let query = format!(
            "DELETE FROM {} WHERE action = $1 AND occurred_at < $2",
            kind.audit_table()
        );

        let result = sqlx::query(&query)
            .bind(action.as_str())
            .bind(before)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }
}
