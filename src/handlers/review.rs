//! 评论处理器

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
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
    models::{CreateReviewRequest, ReviewResponse, SubjectKind},
};

/// 公开评论列表
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let reviews: Vec<ReviewResponse> = state
        .content_service
        .active_reviews()
        .await?
        .into_iter()
        .map(ReviewResponse::from)
        .collect();

    Ok(Json(json!({
        "reviews": reviews,
        "count": reviews.len()
    })))
}

/// 发表评论
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    payload: Result<Json<CreateReviewRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    let review = state.content_service.create_review(&actor, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "review": ReviewResponse::from(review) })),
    ))
}

/// 已删除评论（含删除信息）
pub async fn list_deleted_reviews(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<impl IntoResponse, AppError> {
    let reviews = state.content_service.deleted_reviews(&actor).await?;

    Ok(Json(json!({
        "reviews": reviews,
        "count": reviews.len()
    })))
}

/// 软删除评论
pub async fn delete_review(
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
            SubjectKind::Review,
            id,
            &actor,
            req.reason.as_deref(),
            req.note.as_deref(),
        )
        .await?;

    Ok(Json(json!({ "success": true })))
}

/// 恢复评论
pub async fn restore_review(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_subject_id(&id)?;
    let req: RestoreRequest = parse_optional_body(&body)?;

    state
        .moderation_service
        .restore(SubjectKind::Review, id, &actor, req.note.as_deref())
        .await?;

    let review = state.content_service.find_review(id).await?;
    Ok(Json(json!({ "review": ReviewResponse::from(review) })))
}
