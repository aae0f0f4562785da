//! 进程内房间广播：每个项目一个 tokio broadcast 通道

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::trace;

use crate::domain::model::ChatEvent;
use crate::domain::repository::RoomBroadcaster;

const DEFAULT_ROOM_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct InProcessRoomBroadcaster {
    rooms: Arc<DashMap<String, broadcast::Sender<ChatEvent>>>,
    capacity: usize,
}

impl Default for InProcessRoomBroadcaster {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_ROOM_CAPACITY)
    }
}

impl InProcessRoomBroadcaster {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// 订阅项目房间，只会收到订阅之后的事件
    pub fn subscribe(&self, project_id: &str) -> broadcast::Receiver<ChatEvent> {
        self.rooms
            .entry(project_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

impl RoomBroadcaster for InProcessRoomBroadcaster {
    fn emit(&self, project_id: &str, event: ChatEvent) {
        let Some(sender) = self.rooms.get(project_id).map(|room| room.clone()) else {
            trace!(project_id = %project_id, event = event.name(), "No room subscribers");
            return;
        };

        if sender.send(event).is_err() {
            // 所有订阅者都已离开
            self.rooms
                .remove_if(project_id, |_, room| room.receiver_count() == 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_room_events_only() {
        let broadcaster = InProcessRoomBroadcaster::default();
        let mut p1 = broadcaster.subscribe("p1");
        let mut p2 = broadcaster.subscribe("p2");

        broadcaster.emit(
            "p1",
            ChatEvent::DeleteThread {
                thread_id: "t1".into(),
            },
        );

        assert_eq!(
            p1.recv().await.unwrap(),
            ChatEvent::DeleteThread {
                thread_id: "t1".into()
            }
        );
        assert!(p2.try_recv().is_err());
    }

    #[test]
    fn test_emit_without_subscribers_is_silent() {
        let broadcaster = InProcessRoomBroadcaster::default();
        broadcaster.emit(
            "p1",
            ChatEvent::ReopenThread {
                thread_id: "t1".into(),
            },
        );
        assert_eq!(broadcaster.room_count(), 0);

        drop(broadcaster.subscribe("p1"));
        broadcaster.emit(
            "p1",
            ChatEvent::ReopenThread {
                thread_id: "t1".into(),
            },
        );
        assert_eq!(broadcaster.room_count(), 0);
    }
}
