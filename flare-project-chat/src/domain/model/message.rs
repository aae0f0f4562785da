use serde::{Deserialize, Serialize};

/// 带作者的消息
pub trait Authored {
    fn author_id(&self) -> &str;
}

/// 项目全局聊天消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalMessage {
    pub id: String,
    pub project_id: String,
    pub user_id: String,
    pub content: String,
    /// 发送时间（毫秒）
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<i64>,
}

/// 评论线程中的消息，线程内按插入顺序排列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    pub thread_id: String,
    pub user_id: String,
    pub content: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<i64>,
}

impl Authored for GlobalMessage {
    fn author_id(&self) -> &str {
        &self.user_id
    }
}

impl Authored for ThreadMessage {
    fn author_id(&self) -> &str {
        &self.user_id
    }
}
