//! 审计日志查询 / 导出处理器
//! 三类对象共用一套查询参数解析，JSON 分页或 CSV 导出

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::Actor,
    config::ModerationConfig,
    error::{AppError, Result},
    middleware::AppState,
    models::{AuditAction, AuditFilters, SortOrder, SubjectKind},
    output,
    services::{AuditListRequest, Permission},
};

/// 解析后的审计查询
#[derive(Debug, Clone)]
pub struct AuditQuery {
    pub request: AuditListRequest,
    pub csv: bool,
    pub export_all: bool,
}

fn bad_request(msg: impl Into<String>) -> AppError {
    AppError::BadRequest(msg.into())
}

fn non_empty<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn parse_bounded(
    params: &HashMap<String, String>,
    key: &str,
    default: i64,
    min: i64,
    max: i64,
) -> Result<i64> {
    let Some(raw) = non_empty(params, key) else {
        return Ok(default);
    };
    let value: i64 = raw
        .parse()
        .map_err(|_| bad_request(format!("{} must be an integer", key)))?;
    if value < min || value > max {
        return Err(bad_request(format!(
            "{} must be between {} and {}",
            key, min, max
        )));
    }
    Ok(value)
}

/// RFC 3339 时间戳或 `YYYY-MM-DD`；日期作为结束边界时包含当天全部时间
pub fn parse_date_bound(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| bad_request(format!("Invalid date: {}", raw)))?;
    let time = if end_of_day {
        date.and_hms_micro_opt(23, 59, 59, 999_999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };

    time.map(|t| t.and_utc())
        .ok_or_else(|| bad_request(format!("Invalid date: {}", raw)))
}

fn is_truthy(value: Option<&str>) -> bool {
    matches!(value, Some(v) if v.eq_ignore_ascii_case("true") || v == "1")
}

/// 解析查询参数；对象 ID 的参数名随类型变化，`subjectId` 作为别名
pub fn parse_audit_query(
    kind: SubjectKind,
    params: &HashMap<String, String>,
    config: &ModerationConfig,
) -> Result<AuditQuery> {
    let page = parse_bounded(params, "page", 1, 1, i64::MAX)?;
    let page_size = parse_bounded(
        params,
        "pageSize",
        config.default_page_size,
        1,
        config.max_page_size,
    )?;

    let sort = match non_empty(params, "sort") {
        Some(raw) => raw.parse::<SortOrder>().map_err(bad_request)?,
        None => SortOrder::default(),
    };

    let action = non_empty(params, "action")
        .map(|raw| raw.parse::<AuditAction>().map_err(bad_request))
        .transpose()?;

    let subject_id = non_empty(params, kind.id_key())
        .or_else(|| non_empty(params, "subjectId"))
        .map(|raw| {
            Uuid::parse_str(raw)
                .map_err(|_| bad_request(format!("Invalid {}: {}", kind.id_key(), raw)))
        })
        .transpose()?;

    let start = non_empty(params, "start")
        .map(|raw| parse_date_bound(raw, false))
        .transpose()?;
    let end = non_empty(params, "end")
        .map(|raw| parse_date_bound(raw, true))
        .transpose()?;

    let csv = match non_empty(params, "export") {
        None => false,
        Some(format) if format.eq_ignore_ascii_case("csv") => true,
        Some(format) => return Err(bad_request(format!("Unsupported export format: {}", format))),
    };

    Ok(AuditQuery {
        request: AuditListRequest {
            filters: AuditFilters {
                action,
                by_name: non_empty(params, "byName").map(str::to_string),
                subject_id,
                start,
                end,
            },
            page,
            page_size,
            sort,
        },
        csv,
        export_all: is_truthy(non_empty(params, "exportAll")),
    })
}

async fn list_audits(
    kind: SubjectKind,
    state: &AppState,
    actor: &Actor,
    params: &HashMap<String, String>,
) -> Result<Response> {
    state
        .permission_service
        .require_permission(actor, kind, Permission::ReadAudit)?;

    let query = parse_audit_query(kind, params, &state.config.moderation)?;

    if query.csv {
        let rows = state
            .audit_service
            .export(
                kind,
                &query.request.filters,
                query.request.sort,
                query.export_all,
            )
            .await?;

        let headers = [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", output::csv_filename(kind)),
            ),
        ];
        return Ok((headers, output::render_csv(kind, &rows)).into_response());
    }

    let page = state.audit_service.list(kind, &query.request).await?;
    Ok(Json(page).into_response())
}

/// 评论审计
pub async fn list_review_audits(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response> {
    list_audits(SubjectKind::Review, &state, &actor, &params).await
}

/// 新闻审计
pub async fn list_news_audits(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response> {
    list_audits(SubjectKind::News, &state, &actor, &params).await
}

/// 用户审计
pub async fn list_user_audits(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response> {
    list_audits(SubjectKind::User, &state, &actor, &params).await
}
