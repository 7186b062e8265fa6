//! HTTP 中间件
//! 应用状态、请求追踪、账户状态检查、IP 白名单

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    auth::{Actor, JwtService},
    config::AppConfig,
    error::{AppError, Result},
    realtime::EventBus,
    models::{SubjectKind, SubjectState},
    repository::Store,
    services::{AuditService, ContentService, ModerationService, PermissionService},
};

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn Store>,
    pub jwt_service: Arc<JwtService>,
    pub permission_service: PermissionService,
    pub audit_service: Arc<AuditService>,
    pub moderation_service: Arc<ModerationService>,
    pub content_service: Arc<ContentService>,
    pub event_bus: Arc<EventBus>,
}

impl AppState {
    /// 按配置装配各服务
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Result<Self> {
        let jwt_service = Arc::new(JwtService::from_config(&config)?);
        let event_bus = Arc::new(EventBus::new(config.moderation.event_bus_capacity));
        let permission_service = PermissionService::new();

        let audit_service = Arc::new(AuditService::new(
            store.clone(),
            event_bus.clone(),
            config.moderation.clone(),
        ));
        let moderation_service = Arc::new(ModerationService::new(
            store.clone(),
            audit_service.clone(),
            permission_service,
            config.moderation.strict_restore,
        ));
        let content_service = Arc::new(ContentService::new(
            store.clone(),
            audit_service.clone(),
            permission_service,
        ));

        tracing::info!(
            backend = store.backend_name(),
            strict_restore = config.moderation.strict_restore,
            "Application state initialized"
        );

        Ok(Self {
            config,
            store,
            jwt_service,
            permission_service,
            audit_service,
            moderation_service,
            content_service,
            event_bus,
        })
    }
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().clone();
    let uri = req.uri().path().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    async move {
        let start = Instant::now();
        let mut response = next.run(req).await;
        let elapsed = start.elapsed();

        let status = response.status().as_u16();
        // 标签取值固定，避免高基数
        let method_name = match method.as_str() {
            "GET" => "GET",
            "POST" => "POST",
            "PUT" => "PUT",
            "DELETE" => "DELETE",
            "PATCH" => "PATCH",
            _ => "OTHER",
        };
        let status_class = match status {
            200..=299 => "2xx",
            300..=399 => "3xx",
            400..=499 => "4xx",
            _ => "5xx",
        };

        metrics::counter!("http_requests_total", "method" => method_name, "status" => status_class)
            .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            method = %method,
            uri = %uri,
            status = status,
            elapsed_ms = elapsed.as_millis() as u64,
            "Request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && s.len() <= 128)
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// 已软删除账户的令牌在过期前同样失效
/// 没有用户记录的操作者（外部签发的令牌）不受影响
pub async fn active_account_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response> {
    if let Some(actor) = req.extensions().get::<Actor>() {
        let account = state.store.load_state(SubjectKind::User, actor.id).await?;
        if let Some(SubjectState::Deleted(_)) = account {
            tracing::warn!(actor_id = %actor.id, "Token presented by a deleted account");
            return Err(AppError::Unauthorized);
        }
    }

    Ok(next.run(req).await)
}

/// IP 白名单中间件
pub async fn ip_whitelist_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response> {
    if let Some(allowed_ips) = &state.config.security.allowed_ips {
        let client_ip = get_client_ip(req.headers(), state.config.security.trust_proxy);

        if !allowed_ips.iter().any(|ip| ip == &client_ip) {
            tracing::warn!(client_ip = %client_ip, "IP not in whitelist");
            return Err(AppError::Forbidden);
        }

        tracing::debug!(client_ip = %client_ip, "IP allowed by whitelist");
    }

    Ok(next.run(req).await)
}

/// 获取客户端 IP 地址（仅在信任代理时读取转发头）
fn get_client_ip(headers: &HeaderMap, trust_proxy: bool) -> String {
    if trust_proxy {
        // X-Forwarded-For 可能包含多个 IP，取第一个
        if let Some(first_ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
        {
            return first_ip.trim().to_string();
        }

        if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
            return real_ip.trim().to_string();
        }
    }

    "unknown".to_string()
}
