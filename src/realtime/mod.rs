//! 实时事件推送
//! 审计记录写入后广播给在线的后台看板（SSE）
//!
//! 仅尽力投递：没有确认、没有重放，断线期间的事件由客户端通过分页查询补齐。

use futures::{Stream, StreamExt};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream, IntervalStream};

use crate::models::{AuditEntry, SubjectKind};

/// 实时事件
#[derive(Debug, Clone)]
pub enum RealtimeEvent {
    /// 新审计记录
    Audit(AuditEntry),
    /// 心跳信号（保持连接活跃）
    Heartbeat,
}

impl RealtimeEvent {
    /// 事件名（审计记录使用频道名，如 `audit:review`）
    pub fn event_type(&self) -> &'static str {
        match self {
            RealtimeEvent::Audit(entry) => entry.subject_type.channel(),
            RealtimeEvent::Heartbeat => "heartbeat",
        }
    }

    /// 转换为SSE格式的数据
    pub fn to_sse_data(&self) -> String {
        match self {
            RealtimeEvent::Audit(entry) => {
                serde_json::to_string(entry).unwrap_or_else(|_| "{}".to_string())
            }
            RealtimeEvent::Heartbeat => serde_json::json!({
                "timestamp": chrono::Utc::now().to_rfc3339()
            })
            .to_string(),
        }
    }

    /// 是否属于给定频道（心跳对所有订阅者可见）
    pub fn matches_channel(&self, channel: Option<SubjectKind>) -> bool {
        match (self, channel) {
            (RealtimeEvent::Heartbeat, _) => true,
            (RealtimeEvent::Audit(_), None) => true,
            (RealtimeEvent::Audit(entry), Some(kind)) => entry.subject_type == kind,
        }
    }
}

/// 事件总线
#[derive(Clone)]
pub struct EventBus {
    /// 广播发送器（用于向所有订阅者发送事件）
    sender: broadcast::Sender<RealtimeEvent>,
}

impl EventBus {
    /// 创建新的事件总线
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// 发布审计记录。没有订阅者时直接丢弃，返回送达的订阅者数量
    pub fn publish_audit(&self, entry: &AuditEntry) -> usize {
        match self.sender.send(RealtimeEvent::Audit(entry.clone())) {
            Ok(receivers) => {
                tracing::debug!(
                    channel = entry.subject_type.channel(),
                    audit_id = %entry.id,
                    receivers,
                    "Audit event published"
                );
                receivers
            }
            Err(_) => {
                tracing::trace!(
                    channel = entry.subject_type.channel(),
                    "No realtime subscribers, audit event dropped"
                );
                0
            }
        }
    }

    /// 订阅事件
    pub fn subscribe(&self) -> broadcast::Receiver<RealtimeEvent> {
        self.sender.subscribe()
    }

    /// 当前订阅者数量
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// 订阅审计事件流（可按频道过滤），并混入心跳
    pub fn audit_stream(
        &self,
        channel: Option<SubjectKind>,
        heartbeat: Duration,
    ) -> impl Stream<Item = RealtimeEvent> + Send + 'static {
        let events = BroadcastStream::new(self.subscribe()).filter_map(move |item| async move {
            match item {
                Ok(event) if event.matches_channel(channel) => Some(event),
                Ok(_) => None,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Realtime subscriber lagging, events skipped");
                    None
                }
            }
        });

        let mut interval = tokio::time::interval(heartbeat);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // 第一次 tick 立即触发，跳过以免连接建立时就发心跳
        let heartbeats = IntervalStream::new(interval)
            .skip(1)
            .map(|_| RealtimeEvent::Heartbeat);

        futures::stream::select(events, heartbeats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuditAction;
    use uuid::Uuid;

    fn sample(kind: SubjectKind) -> AuditEntry {
        AuditEntry::new(kind, Uuid::new_v4(), AuditAction::Deleted, None, "moderator")
    }

    #[test]
    fn test_publish_without_subscribers_is_not_an_error() {
        let bus = EventBus::new(16);
        assert_eq!(bus.publish_audit(&sample(SubjectKind::Review)), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_audit() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let entry = sample(SubjectKind::News);

        assert_eq!(bus.publish_audit(&entry), 1);

        match rx.recv().await.unwrap() {
            RealtimeEvent::Audit(received) => assert_eq!(received.id, entry.id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stream_filters_by_channel() {
        let bus = EventBus::new(16);
        let stream = bus.audit_stream(Some(SubjectKind::User), Duration::from_secs(3600));
        tokio::pin!(stream);

        bus.publish_audit(&sample(SubjectKind::Review));
        let user_entry = sample(SubjectKind::User);
        bus.publish_audit(&user_entry);

        let event = tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.event_type(), "audit:user");
        assert!(event.to_sse_data().contains(&user_entry.id.to_string()));
    }
}
