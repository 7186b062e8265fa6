//! 用户处理器

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::{
    auth::Actor,
    error::AppError,
    handlers::subject::{parse_optional_body, parse_subject_id, DeleteRequest, RestoreRequest},
    middleware::AppState,
    models::{ChangePhoneRequest, SubjectKind, UserResponse},
};

/// 获取用户详情（管理员或本人）
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_subject_id(&id)?;
    let user = state.content_service.get_user(&actor, id).await?;

    Ok(Json(json!({ "user": UserResponse::from(user) })))
}

/// 修改手机号
pub async fn change_phone(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
    payload: Result<Json<ChangePhoneRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    let id = parse_subject_id(&id)?;
    let user = state.content_service.change_phone(&actor, id, req).await?;

    Ok(Json(json!({ "user": UserResponse::from(user) })))
}

/// 已删除用户
pub async fn list_deleted_users(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<impl IntoResponse, AppError> {
    let users = state.content_service.deleted_users(&actor).await?;

    Ok(Json(json!({
        "users": users,
        "count": users.len()
    })))
}

/// 软删除用户（仅管理员，不能删除自己）
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_subject_id(&id)?;
    let req: DeleteRequest = parse_optional_body(&body)?;

    state
        .moderation_service
        .soft_delete(
            SubjectKind::User,
            id,
            &actor,
            req.reason.as_deref(),
            req.note.as_deref(),
        )
        .await?;

    Ok(Json(json!({ "success": true })))
}

/// 恢复用户
pub async fn restore_user(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_subject_id(&id)?;
    let req: RestoreRequest = parse_optional_body(&body)?;

    state
        .moderation_service
        .restore(SubjectKind::User, id, &actor, req.note.as_deref())
        .await?;

    let user = state.content_service.find_user(id).await?;
    Ok(Json(json!({ "user": UserResponse::from(user) })))
}
