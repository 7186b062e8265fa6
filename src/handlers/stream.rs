//! 实时审计流（SSE）

use axum::{
    extract::{Query, State},
    response::sse::{Event, Sse},
};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    auth::Actor,
    error::{AppError, Result},
    middleware::AppState,
    models::SubjectKind,
    services::Permission,
};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    /// `audit:review` / `audit:news` / `audit:user`，或简写 `review` 等
    pub channel: Option<String>,
}

/// 解析频道参数；为空表示订阅全部
pub fn parse_channel(raw: Option<&str>) -> Result<Option<SubjectKind>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    SubjectKind::from_channel(raw)
        .or_else(|| SubjectKind::ALL.into_iter().find(|k| k.as_str() == raw))
        .map(Some)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown channel: {}", raw)))
}

/// 订阅审计事件
pub async fn audit_stream(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Query(query): Query<StreamQuery>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let channel = parse_channel(query.channel.as_deref())?;

    let kinds = match channel {
        Some(kind) => vec![kind],
        None => SubjectKind::ALL.to_vec(),
    };
    for kind in kinds {
        state
            .permission_service
            .require_permission(&actor, kind, Permission::Subscribe)?;
    }

    tracing::info!(
        actor_id = %actor.id,
        channel = channel.map(|k| k.channel()).unwrap_or("all"),
        subscribers = state.event_bus.subscriber_count() + 1,
        "Audit stream opened"
    );

    let stream = state
        .event_bus
        .audit_stream(channel, HEARTBEAT_INTERVAL)
        .map(|event| {
            Ok(Event::default()
                .event(event.event_type())
                .data(event.to_sse_data()))
        });

    Ok(Sse::new(stream))
}
