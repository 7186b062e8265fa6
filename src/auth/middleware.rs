//! JWT 认证中间件

use crate::{auth::jwt::JwtService, error::AppError, models::Role};
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;

/// 当前操作者（附加到请求扩展）
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// 管理员或本人
    pub fn require_admin_or_self(&self, user_id: Uuid) -> Result<(), AppError> {
        if self.is_admin() || self.id == user_id {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

// 实现 FromRequestParts 以便在 handler 中直接提取 Actor
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

// 可选认证路由使用 Option<Actor>
impl<S> OptionalFromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<Actor>().cloned())
    }
}

/// 从 Authorization 头提取令牌
pub fn extract_token(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(AppError::Unauthorized)
}

fn actor_from_token(jwt_service: &JwtService, token: &str) -> Result<Actor, AppError> {
    let claims = jwt_service.validate_token(token)?;
    let id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;

    Ok(Actor {
        id,
        name: claims.username,
        role: claims.role,
    })
}

/// JWT 认证中间件 - 必须认证
pub async fn jwt_auth_middleware(
    State(jwt_service): State<Arc<JwtService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(req.headers())?;
    let actor = actor_from_token(&jwt_service, &token)?;

    req.extensions_mut().insert(actor);

    Ok(next.run(req).await)
}

/// 可选认证 - 不强制要求令牌，无效令牌按匿名处理
pub async fn optional_auth_middleware(
    State(jwt_service): State<Arc<JwtService>>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Ok(token) = extract_token(req.headers()) {
        if let Ok(actor) = actor_from_token(&jwt_service, &token) {
            req.extensions_mut().insert(actor);
        }
    }

    next.run(req).await
}
