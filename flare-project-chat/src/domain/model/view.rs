use serde::{Deserialize, Serialize};

use super::message::ThreadMessage;
use super::profile::DisplayProfile;

/// 补全作者信息后的消息视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedMessage<M> {
    #[serde(flatten)]
    pub message: M,
    pub user: DisplayProfile,
    #[serde(
        rename = "clientId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub client_id: Option<String>,
}

impl<M> EnrichedMessage<M> {
    pub fn new(message: M, user: DisplayProfile) -> Self {
        Self {
            message,
            user,
            client_id: None,
        }
    }

    pub fn with_client_id(mut self, client_id: Option<String>) -> Self {
        self.client_id = client_id;
        self
    }
}

/// `get_threads` 返回的线程视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadView {
    pub messages: Vec<EnrichedMessage<ThreadMessage>>,
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by_user: Option<DisplayProfile>,
}
