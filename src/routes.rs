//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::{handlers, middleware::AppState};

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    let jwt_service = state.jwt_service.clone();

    // 公开端点（健康检查）
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check));

    // 公开内容，登录用户的身份会被识别（新闻阅读审计）
    let optional_auth_routes = Router::new()
        .route("/api/reviews", get(handlers::review::list_reviews))
        .route("/api/news", get(handlers::news::list_news))
        .route("/api/news/{news_id}", get(handlers::news::get_news))
        .layer(axum::middleware::from_fn_with_state(
            jwt_service.clone(),
            crate::auth::optional_auth_middleware,
        ));

    // 需要认证的路由
    let authenticated_routes = Router::new()
        // 评论
        .route("/api/reviews", post(handlers::review::create_review))
        .route("/api/reviews/deleted", get(handlers::review::list_deleted_reviews))
        .route("/api/reviews/audit", get(handlers::audit::list_review_audits))
        .route(
            "/api/reviews/{review_id}",
            axum::routing::delete(handlers::review::delete_review),
        )
        .route(
            "/api/reviews/{review_id}/restore",
            post(handlers::review::restore_review),
        )

        // 新闻
        .route("/api/news", post(handlers::news::create_news))
        .route("/api/news/deleted", get(handlers::news::list_deleted_news))
        .route("/api/news/audit", get(handlers::audit::list_news_audits))
        .route(
            "/api/news/{news_id}",
            axum::routing::delete(handlers::news::delete_news),
        )
        .route(
            "/api/news/{news_id}/restore",
            post(handlers::news::restore_news),
        )
        .route("/api/news/{news_id}/views", put(handlers::news::update_views))

        // 用户
        .route("/api/users/deleted", get(handlers::user::list_deleted_users))
        .route("/api/users/audit", get(handlers::audit::list_user_audits))
        .route(
            "/api/users/{user_id}",
            get(handlers::user::get_user).delete(handlers::user::delete_user),
        )
        .route(
            "/api/users/{user_id}/restore",
            post(handlers::user::restore_user),
        )
        .route("/api/users/{user_id}/phone", put(handlers::user::change_phone))

        // 实时审计流（SSE）
        .route("/api/stream/audit", get(handlers::stream::audit_stream))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::active_account_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            jwt_service,
            crate::auth::jwt_auth_middleware,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 组合所有路由
    Router::new()
        .merge(public_routes)
        .merge(optional_auth_routes)
        .merge(authenticated_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::ip_whitelist_middleware,
        ))
        .layer(RequestBodyLimitLayer::new(state.config.server.body_limit_bytes))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}
