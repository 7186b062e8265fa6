//! 新闻处理器

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::{
    auth::Actor,
    error::AppError,
    handlers::subject::{parse_optional_body, parse_subject_id, DeleteRequest, RestoreRequest},
    middleware::AppState,
    models::{CreateNewsRequest, NewsResponse, SubjectKind, UpdateViewsRequest},
};

/// 公开新闻列表
pub async fn list_news(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let news: Vec<NewsResponse> = state
        .content_service
        .active_news()
        .await?
        .into_iter()
        .map(NewsResponse::from)
        .collect();

    Ok(Json(json!({
        "news": news,
        "count": news.len()
    })))
}

/// 发布新闻
pub async fn create_news(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    payload: Result<Json<CreateNewsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    let news = state.content_service.publish_news(&actor, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "news": NewsResponse::from(news) })),
    ))
}

/// 阅读新闻（可选认证）
pub async fn get_news(
    State(state): State<Arc<AppState>>,
    actor: Option<Actor>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_subject_id(&id)?;
    let news = state.content_service.view_news(id, actor.as_ref()).await?;

    Ok(Json(json!({ "news": NewsResponse::from(news) })))
}

/// 设置浏览量
pub async fn update_views(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
    payload: Result<Json<UpdateViewsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_subject_id(&id)?;
    let Json(req) = payload?;
    req.validate()?;

    let news = state
        .content_service
        .update_views(&actor, id, req.views)
        .await?;

    Ok(Json(json!({ "news": NewsResponse::from(news) })))
}

/// 已删除新闻
pub async fn list_deleted_news(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<impl IntoResponse, AppError> {
    let news = state.content_service.deleted_news(&actor).await?;

    Ok(Json(json!({
        "news": news,
        "count": news.len()
    })))
}

/// 软删除新闻
pub async fn delete_news(
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
            SubjectKind::News,
            id,
            &actor,
            req.reason.as_deref(),
            req.note.as_deref(),
        )
        .await?;

    Ok(Json(json!({ "success": true })))
}

/// 恢复新闻
pub async fn restore_news(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_subject_id(&id)?;
    let req: RestoreRequest = parse_optional_body(&body)?;

    state
        .moderation_service
        .restore(SubjectKind::News, id, &actor, req.note.as_deref())
        .await?;

    let news = state.content_service.find_news(id).await?;
    Ok(Json(json!({ "news": NewsResponse::from(news) })))
}
