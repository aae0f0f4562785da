use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::model::{
    ChatEvent, GlobalMessage, PersonalInfo, Thread, ThreadMessage, ThreadState,
};

/// 消息与线程持久化网关（需要作为 trait 对象使用，保留 async-trait）
///
/// 目标不存在时返回 `None` / `false`，存储故障返回 `Err`。
#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn send_global_message(
        &self,
        project_id: &str,
        user_id: &str,
        content: &str,
    ) -> Result<GlobalMessage>;

    /// 按时间倒序返回早于 `before`（毫秒，不含）的最多 `limit` 条消息
    async fn get_global_messages(
        &self,
        project_id: &str,
        limit: usize,
        before: Option<i64>,
    ) -> Result<Vec<GlobalMessage>>;

    async fn delete_global_message(&self, project_id: &str, message_id: &str) -> Result<bool>;

    /// 仅匹配 (message_id, user_id)，他人的消息视为不存在
    async fn edit_global_message(
        &self,
        project_id: &str,
        message_id: &str,
        user_id: &str,
        content: &str,
    ) -> Result<Option<GlobalMessage>>;

    async fn get_threads(&self, project_id: &str) -> Result<Vec<Thread>>;

    /// 线程不存在时在同一次写入中创建
    async fn send_comment(
        &self,
        project_id: &str,
        thread_id: &str,
        user_id: &str,
        content: &str,
    ) -> Result<ThreadMessage>;

    async fn resolve_thread(
        &self,
        project_id: &str,
        thread_id: &str,
        user_id: &str,
    ) -> Result<Option<ThreadState>>;

    async fn reopen_thread(&self, project_id: &str, thread_id: &str)
    -> Result<Option<ThreadState>>;

    async fn delete_thread(&self, project_id: &str, thread_id: &str) -> Result<bool>;

    async fn edit_thread_message(
        &self,
        project_id: &str,
        thread_id: &str,
        message_id: &str,
        user_id: &str,
        content: &str,
    ) -> Result<Option<ThreadMessage>>;

    async fn delete_thread_message(
        &self,
        project_id: &str,
        thread_id: &str,
        message_id: &str,
    ) -> Result<bool>;
}

/// 用户信息查询
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// 用户不存在时返回 `Ok(None)`
    async fn get_personal_info(&self, user_id: &str) -> Result<Option<PersonalInfo>>;
}

/// 项目房间广播，发后即忘
pub trait RoomBroadcaster: Send + Sync {
    fn emit(&self, project_id: &str, event: ChatEvent);
}

pub type ChatRepositoryRef = Arc<dyn ChatRepository>;
pub type IdentityResolverRef = Arc<dyn IdentityResolver>;
pub type RoomBroadcasterRef = Arc<dyn RoomBroadcaster>;
