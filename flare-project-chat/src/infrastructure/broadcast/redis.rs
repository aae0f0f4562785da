//! # Redis 房间广播
//!
//! 将 `{room_id, message, payload}` 以 JSON 发布到 Redis 频道，由实时网关转发到房间。
//! 所有发布经由同一个后台任务按 `emit` 顺序串行执行，失败只记录日志。

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::{AsyncCommands, RedisResult, aio::ConnectionManager};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::model::ChatEvent;
use crate::domain::repository::RoomBroadcaster;

pub const DEFAULT_ROOM_CHANNEL: &str = "editor-events";

/// 房间消息的发布端
#[async_trait]
pub trait RoomPublisher: Send + 'static {
    /// 返回收到消息的订阅者数量
    async fn publish_room(&mut self, channel: &str, payload: String) -> RedisResult<i64>;
}

#[async_trait]
impl RoomPublisher for ConnectionManager {
    async fn publish_room(&mut self, channel: &str, payload: String) -> RedisResult<i64> {
        self.publish(channel, payload).await
    }
}

struct OutgoingRoomMessage {
    project_id: String,
    event: &'static str,
    payload: String,
}

pub struct RedisRoomBroadcaster {
    sender: mpsc::UnboundedSender<OutgoingRoomMessage>,
}

impl RedisRoomBroadcaster {
    pub async fn connect(url: &str, channel: impl Into<String>) -> Result<Self> {
        let client = redis::Client::open(url).context("invalid redis url for room bus")?;
        let connection = ConnectionManager::new(client)
            .await
            .context("failed to connect room bus")?;
        Ok(Self::new(connection, channel))
    }

    /// 需在 tokio 运行时内调用，发布任务随最后一个广播器句柄释放而退出
    pub fn new<P: RoomPublisher>(publisher: P, channel: impl Into<String>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(publish_loop(publisher, channel.into(), receiver));
        Self { sender }
    }
}

async fn publish_loop<P: RoomPublisher>(
    mut publisher: P,
    channel: String,
    mut receiver: mpsc::UnboundedReceiver<OutgoingRoomMessage>,
) {
    while let Some(message) = receiver.recv().await {
        match publisher.publish_room(&channel, message.payload).await {
            Ok(receivers) => debug!(
                project_id = %message.project_id,
                event = message.event,
                receivers,
                "Room message published"
            ),
            Err(err) => warn!(
                project_id = %message.project_id,
                event = message.event,
                error = %err,
                "Failed to publish room message"
            ),
        }
    }
    debug!(channel = %channel, "Room publisher stopped");
}

impl RoomBroadcaster for RedisRoomBroadcaster {
    fn emit(&self, project_id: &str, event: ChatEvent) {
        let payload = match event
            .to_room_message(project_id)
            .and_then(|message| serde_json::to_string(&message))
        {
            Ok(payload) => payload,
            Err(err) => {
                warn!(project_id = %project_id, event = event.name(), error = %err, "Failed to encode room message");
                return;
            }
        };

        let outgoing = OutgoingRoomMessage {
            project_id: project_id.to_string(),
            event: event.name(),
            payload,
        };
        if self.sender.send(outgoing).is_err() {
            warn!(project_id = %project_id, event = event.name(), "Room publisher stopped, message dropped");
        }
    }
}
