//! 聊天协调领域服务
//!
//! 每个写操作固定按以下顺序执行：鉴权 → 内容校验 → 持久化 → 补全用户信息 → 房间广播，
//! 全局消息发送在广播之后再触发提交后 Hook。目标不存在或持久化失败时不会产生广播。

use std::collections::BTreeMap;
use std::sync::Arc;

use flare_collab_core::hooks::{HookContext, HookDispatcher, HookEvent};
use serde_json::json;
use tracing::{debug, warn};

use crate::domain::errors::{ChatError, ChatResult};
use crate::domain::model::{
    AuthorizationPolicy, CHAT_MESSAGE_SENT, ChatDomainConfig, ChatEvent, ChatOperation,
    EnrichedMessage, GlobalMessage, ThreadMessage, ThreadView,
};
use crate::domain::repository::{ChatRepositoryRef, IdentityResolverRef, RoomBroadcasterRef};
use crate::domain::service::thread_enrichment::ThreadEnrichmentService;

pub struct ChatDomainService {
    repository: ChatRepositoryRef,
    broadcaster: RoomBroadcasterRef,
    hooks: HookDispatcher,
    enrichment: ThreadEnrichmentService,
    policy: AuthorizationPolicy,
    config: ChatDomainConfig,
}

impl ChatDomainService {
    pub fn new(
        repository: ChatRepositoryRef,
        identity: IdentityResolverRef,
        broadcaster: RoomBroadcasterRef,
        hooks: HookDispatcher,
        policy: AuthorizationPolicy,
        config: ChatDomainConfig,
    ) -> Self {
        Self {
            repository,
            broadcaster,
            hooks,
            enrichment: ThreadEnrichmentService::new(identity),
            policy,
            config,
        }
    }

    pub fn config(&self) -> &ChatDomainConfig {
        &self.config
    }

    /// 鉴权并要求存在调用者身份（需要记录作者的操作）
    fn require_author<'a>(
        &self,
        operation: ChatOperation,
        caller: Option<&'a str>,
    ) -> ChatResult<&'a str> {
        self.policy
            .authorize(operation, caller)?
            .ok_or(ChatError::Unauthenticated { operation })
    }

    fn validate_content(&self, content: &str) -> ChatResult<()> {
        if content.trim().is_empty() {
            return Err(ChatError::InvalidContent("content must not be empty".into()));
        }
        let length = content.chars().count();
        if length > self.config.max_content_length {
            return Err(ChatError::InvalidContent(format!(
                "content length {length} exceeds limit {}",
                self.config.max_content_length
            )));
        }
        Ok(())
    }

    /// 发送全局消息
    pub async fn send_message(
        &self,
        project_id: &str,
        caller: Option<&str>,
        content: &str,
        client_id: Option<String>,
    ) -> ChatResult<()> {
        let user_id = self.require_author(ChatOperation::SendMessage, caller)?;
        self.validate_content(content)?;

        let message = self
            .repository
            .send_global_message(project_id, user_id, content)
            .await?;
        let message_id = message.id.clone();

        let user = self.enrichment.profile_for(&message.user_id).await;
        let enriched = EnrichedMessage::new(message, user).with_client_id(client_id);
        self.broadcaster
            .emit(project_id, ChatEvent::NewChatMessage(enriched));

        let ctx = HookContext::new(project_id)
            .with_user(user_id)
            .with_attribute("message_id", message_id.clone())
            .occurred_now();
        let event = HookEvent::new(
            CHAT_MESSAGE_SENT,
            json!({
                "projectId": project_id,
                "userId": user_id,
                "messageId": message_id,
            }),
        );
        let report = self.hooks.fire(&ctx, &event).await;
        if !report.is_clean() {
            warn!(
                project_id = %project_id,
                message_id = %message_id,
                failed = report.failed.len(),
                "Post-commit hooks reported failures"
            );
        }

        Ok(())
    }

    /// 查询全局消息（时间倒序）
    pub async fn get_messages(
        &self,
        project_id: &str,
        caller: Option<&str>,
        limit: Option<usize>,
        before: Option<i64>,
    ) -> ChatResult<Vec<EnrichedMessage<GlobalMessage>>> {
        self.policy.authorize(ChatOperation::GetMessages, caller)?;
        let limit = self.config.resolve_limit(limit);

        let messages = self
            .repository
            .get_global_messages(project_id, limit, before)
            .await?;
        debug!(project_id = %project_id, count = messages.len(), "Loaded global messages");

        Ok(self.enrichment.enrich_global(messages).await)
    }

    pub async fn delete_message(
        &self,
        project_id: &str,
        message_id: &str,
        caller: Option<&str>,
    ) -> ChatResult<()> {
        let caller = self.policy.authorize(ChatOperation::DeleteMessage, caller)?;

        if !self
            .repository
            .delete_global_message(project_id, message_id)
            .await?
        {
            return Err(ChatError::not_found("message", message_id));
        }

        self.broadcaster.emit(
            project_id,
            ChatEvent::DeleteGlobalMessage {
                message_id: message_id.to_string(),
                user_id: caller.map(str::to_string),
            },
        );
        Ok(())
    }

    pub async fn edit_message(
        &self,
        project_id: &str,
        message_id: &str,
        caller: Option<&str>,
        content: &str,
    ) -> ChatResult<()> {
        let user_id = self.require_author(ChatOperation::EditMessage, caller)?;
        self.validate_content(content)?;

        self.repository
            .edit_global_message(project_id, message_id, user_id, content)
            .await?
            .ok_or_else(|| ChatError::not_found("message", message_id))?;

        self.broadcaster.emit(
            project_id,
            ChatEvent::EditGlobalMessage {
                message_id: message_id.to_string(),
                user_id: user_id.to_string(),
                content: content.to_string(),
            },
        );
        Ok(())
    }

    /// 线程 id → 线程视图
    pub async fn get_threads(
        &self,
        project_id: &str,
        caller: Option<&str>,
    ) -> ChatResult<BTreeMap<String, ThreadView>> {
        self.policy.authorize(ChatOperation::GetThreads, caller)?;

        let threads = self.repository.get_threads(project_id).await?;
        debug!(project_id = %project_id, count = threads.len(), "Loaded threads");

        Ok(self.enrichment.enrich_threads(threads).await)
    }

    /// 发表评论，返回值与 `new-comment` 广播的消息一致
    pub async fn send_comment(
        &self,
        project_id: &str,
        thread_id: &str,
        caller: Option<&str>,
        content: &str,
    ) -> ChatResult<EnrichedMessage<ThreadMessage>> {
        let user_id = self.require_author(ChatOperation::SendComment, caller)?;
        self.validate_content(content)?;

        let message = self
            .repository
            .send_comment(project_id, thread_id, user_id, content)
            .await?;

        let user = self.enrichment.profile_for(&message.user_id).await;
        let enriched = EnrichedMessage::new(message, user);
        self.broadcaster.emit(
            project_id,
            ChatEvent::NewComment {
                thread_id: thread_id.to_string(),
                message: enriched.clone(),
            },
        );
        Ok(enriched)
    }

    pub async fn resolve_thread(
        &self,
        project_id: &str,
        thread_id: &str,
        caller: Option<&str>,
    ) -> ChatResult<()> {
        let user_id = self.require_author(ChatOperation::ResolveThread, caller)?;

        let state = self
            .repository
            .resolve_thread(project_id, thread_id, user_id)
            .await?
            .ok_or_else(|| ChatError::not_found("thread", thread_id))?;
        debug!(
            project_id = %project_id,
            thread_id = %thread_id,
            state = %state,
            "Thread resolved"
        );

        let user = self.enrichment.profile_for(user_id).await;
        self.broadcaster.emit(
            project_id,
            ChatEvent::ResolveThread {
                thread_id: thread_id.to_string(),
                user,
            },
        );
        Ok(())
    }

    pub async fn reopen_thread(
        &self,
        project_id: &str,
        thread_id: &str,
        caller: Option<&str>,
    ) -> ChatResult<()> {
        self.policy.authorize(ChatOperation::ReopenThread, caller)?;

        self.repository
            .reopen_thread(project_id, thread_id)
            .await?
            .ok_or_else(|| ChatError::not_found("thread", thread_id))?;

        self.broadcaster.emit(
            project_id,
            ChatEvent::ReopenThread {
                thread_id: thread_id.to_string(),
            },
        );
        Ok(())
    }

    /// 删除线程及其全部消息
    pub async fn delete_thread(
        &self,
        project_id: &str,
        thread_id: &str,
        caller: Option<&str>,
    ) -> ChatResult<()> {
        self.policy.authorize(ChatOperation::DeleteThread, caller)?;

        if !self.repository.delete_thread(project_id, thread_id).await? {
            return Err(ChatError::not_found("thread", thread_id));
        }

        self.broadcaster.emit(
            project_id,
            ChatEvent::DeleteThread {
                thread_id: thread_id.to_string(),
            },
        );
        Ok(())
    }

    pub async fn edit_thread_message(
        &self,
        project_id: &str,
        thread_id: &str,
        message_id: &str,
        caller: Option<&str>,
        content: &str,
    ) -> ChatResult<()> {
        let user_id = self.require_author(ChatOperation::EditThreadMessage, caller)?;
        self.validate_content(content)?;

        self.repository
            .edit_thread_message(project_id, thread_id, message_id, user_id, content)
            .await?
            .ok_or_else(|| ChatError::not_found("message", message_id))?;

        self.broadcaster.emit(
            project_id,
            ChatEvent::EditMessage {
                thread_id: thread_id.to_string(),
                message_id: message_id.to_string(),
                content: content.to_string(),
            },
        );
        Ok(())
    }

    pub async fn delete_thread_message(
        &self,
        project_id: &str,
        thread_id: &str,
        message_id: &str,
        caller: Option<&str>,
    ) -> ChatResult<()> {
        self.policy
            .authorize(ChatOperation::DeleteThreadMessage, caller)?;

        if !self
            .repository
            .delete_thread_message(project_id, thread_id, message_id)
            .await?
        {
            return Err(ChatError::not_found("message", message_id));
        }

        self.broadcaster.emit(
            project_id,
            ChatEvent::DeleteMessage {
                thread_id: thread_id.to_string(),
                message_id: message_id.to_string(),
            },
        );
        Ok(())
    }
}
