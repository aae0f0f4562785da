//! 房间广播事件目录

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::message::{GlobalMessage, ThreadMessage};
use super::profile::DisplayProfile;
use super::view::EnrichedMessage;

/// 推送给项目房间内所有在线参与者的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    NewChatMessage(EnrichedMessage<GlobalMessage>),
    DeleteGlobalMessage {
        message_id: String,
        user_id: Option<String>,
    },
    EditGlobalMessage {
        message_id: String,
        user_id: String,
        content: String,
    },
    NewComment {
        thread_id: String,
        message: EnrichedMessage<ThreadMessage>,
    },
    ResolveThread {
        thread_id: String,
        user: DisplayProfile,
    },
    ReopenThread {
        thread_id: String,
    },
    DeleteThread {
        thread_id: String,
    },
    EditMessage {
        thread_id: String,
        message_id: String,
        content: String,
    },
    DeleteMessage {
        thread_id: String,
        message_id: String,
    },
}

impl ChatEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ChatEvent::NewChatMessage(_) => "new-chat-message",
            ChatEvent::DeleteGlobalMessage { .. } => "delete-global-message",
            ChatEvent::EditGlobalMessage { .. } => "edit-global-message",
            ChatEvent::NewComment { .. } => "new-comment",
            ChatEvent::ResolveThread { .. } => "resolve-thread",
            ChatEvent::ReopenThread { .. } => "reopen-thread",
            ChatEvent::DeleteThread { .. } => "delete-thread",
            ChatEvent::EditMessage { .. } => "edit-message",
            ChatEvent::DeleteMessage { .. } => "delete-message",
        }
    }

    /// 事件的位置参数列表
    pub fn args(&self) -> serde_json::Result<Vec<Value>> {
        let args = match self {
            ChatEvent::NewChatMessage(message) => vec![serde_json::to_value(message)?],
            ChatEvent::DeleteGlobalMessage {
                message_id,
                user_id,
            } => vec![json!({ "messageId": message_id, "userId": user_id })],
            ChatEvent::EditGlobalMessage {
                message_id,
                user_id,
                content,
            } => vec![json!({
                "messageId": message_id,
                "userId": user_id,
                "content": content,
            })],
            ChatEvent::NewComment { thread_id, message } => {
                vec![json!(thread_id), serde_json::to_value(message)?]
            }
            ChatEvent::ResolveThread { thread_id, user } => {
                vec![json!(thread_id), serde_json::to_value(user)?]
            }
            ChatEvent::ReopenThread { thread_id } | ChatEvent::DeleteThread { thread_id } => {
                vec![json!(thread_id)]
            }
            ChatEvent::EditMessage {
                thread_id,
                message_id,
                content,
            } => vec![json!(thread_id), json!(message_id), json!(content)],
            ChatEvent::DeleteMessage {
                thread_id,
                message_id,
            } => vec![json!(thread_id), json!(message_id)],
        };
        Ok(args)
    }

    pub fn to_room_message(&self, room_id: &str) -> serde_json::Result<RoomMessage> {
        Ok(RoomMessage {
            room_id: room_id.to_string(),
            message: self.name().to_string(),
            payload: self.args()?,
        })
    }
}

/// 房间总线上传输的消息信封
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomMessage {
    pub room_id: String,
    pub message: String,
    pub payload: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_event_args_are_positional() {
        let event = ChatEvent::EditMessage {
            thread_id: "t1".into(),
            message_id: "m1".into(),
            content: "fixed".into(),
        };
        let room = event.to_room_message("p1").unwrap();
        assert_eq!(room.message, "edit-message");
        assert_eq!(room.payload, vec![json!("t1"), json!("m1"), json!("fixed")]);
    }

    #[test]
    fn test_delete_global_message_payload_shape() {
        let event = ChatEvent::DeleteGlobalMessage {
            message_id: "m1".into(),
            user_id: Some("u1".into()),
        };
        assert_eq!(
            event.args().unwrap(),
            vec![json!({"messageId": "m1", "userId": "u1"})]
        );
    }

    #[test]
    fn test_resolve_thread_carries_profile() {
        let event = ChatEvent::ResolveThread {
            thread_id: "t1".into(),
            user: DisplayProfile::placeholder("u2"),
        };
        assert_eq!(event.name(), "resolve-thread");
        assert_eq!(event.args().unwrap()[1], json!({"id": "u2"}));
    }
}
