use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::application::commands::{
    DeleteMessageCommand, DeleteThreadMessageCommand, EditMessageCommand,
    EditThreadMessageCommand, SendCommentCommand, SendMessageCommand, ThreadCommand,
};
use crate::application::queries::{GetMessagesQuery, GetThreadsQuery};
use crate::domain::errors::{ChatError, ChatResult};
use crate::domain::model::{EnrichedMessage, GlobalMessage, ThreadMessage, ThreadView};
use crate::domain::service::ChatDomainService;

/// 聊天命令处理器
///
/// 每个命令在独立的 tokio 任务中执行：调用方被取消（例如客户端断开）时，
/// 已提交的写操作仍会完成补全与广播。
pub struct ChatCommandHandler {
    domain_service: Arc<ChatDomainService>,
}

/// 在独立任务中运行到完成，等待结果
async fn run_detached<T, F>(task: F) -> ChatResult<T>
where
    F: Future<Output = ChatResult<T>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(task).await.map_err(|err| {
        error!(error = %err, "Chat command task failed");
        ChatError::Internal(format!("chat command task failed: {err}"))
    })?
}

impl ChatCommandHandler {
    pub fn new(domain_service: Arc<ChatDomainService>) -> Self {
        Self { domain_service }
    }

    /// 处理发送全局消息命令
    pub async fn handle_send_message(&self, command: SendMessageCommand) -> ChatResult<()> {
        debug!(
            project_id = %command.project_id,
            client_id = ?command.client_id,
            "Handling send message command"
        );

        let service = self.domain_service.clone();
        run_detached(async move {
            service
                .send_message(
                    &command.project_id,
                    command.caller.as_deref(),
                    &command.content,
                    command.client_id,
                )
                .await?;

            info!(project_id = %command.project_id, "Global message sent");
            Ok(())
        })
        .await
    }

    pub async fn handle_delete_message(&self, command: DeleteMessageCommand) -> ChatResult<()> {
        debug!(
            project_id = %command.project_id,
            message_id = %command.message_id,
            "Handling delete message command"
        );

        let service = self.domain_service.clone();
        run_detached(async move {
            service
                .delete_message(
                    &command.project_id,
                    &command.message_id,
                    command.caller.as_deref(),
                )
                .await?;

            info!(message_id = %command.message_id, "Global message deleted");
            Ok(())
        })
        .await
    }

    pub async fn handle_edit_message(&self, command: EditMessageCommand) -> ChatResult<()> {
        debug!(
            project_id = %command.project_id,
            message_id = %command.message_id,
            "Handling edit message command"
        );

        let service = self.domain_service.clone();
        run_detached(async move {
            service
                .edit_message(
                    &command.project_id,
                    &command.message_id,
                    command.caller.as_deref(),
                    &command.content,
                )
                .await
        })
        .await
    }

    /// 处理发表评论命令
    pub async fn handle_send_comment(
        &self,
        command: SendCommentCommand,
    ) -> ChatResult<EnrichedMessage<ThreadMessage>> {
        debug!(
            project_id = %command.project_id,
            thread_id = %command.thread_id,
            "Handling send comment command"
        );

        let service = self.domain_service.clone();
        run_detached(async move {
            let message = service
                .send_comment(
                    &command.project_id,
                    &command.thread_id,
                    command.caller.as_deref(),
                    &command.content,
                )
                .await?;

            info!(
                thread_id = %command.thread_id,
                message_id = %message.message.id,
                "Comment sent"
            );
            Ok(message)
        })
        .await
    }

    pub async fn handle_resolve_thread(&self, command: ThreadCommand) -> ChatResult<()> {
        debug!(
            project_id = %command.project_id,
            thread_id = %command.thread_id,
            "Handling resolve thread command"
        );

        let service = self.domain_service.clone();
        run_detached(async move {
            service
                .resolve_thread(
                    &command.project_id,
                    &command.thread_id,
                    command.caller.as_deref(),
                )
                .await?;

            info!(thread_id = %command.thread_id, "Thread resolved");
            Ok(())
        })
        .await
    }

    pub async fn handle_reopen_thread(&self, command: ThreadCommand) -> ChatResult<()> {
        debug!(
            project_id = %command.project_id,
            thread_id = %command.thread_id,
            "Handling reopen thread command"
        );

        let service = self.domain_service.clone();
        run_detached(async move {
            service
                .reopen_thread(
                    &command.project_id,
                    &command.thread_id,
                    command.caller.as_deref(),
                )
                .await?;

            info!(thread_id = %command.thread_id, "Thread reopened");
            Ok(())
        })
        .await
    }

    pub async fn handle_delete_thread(&self, command: ThreadCommand) -> ChatResult<()> {
        debug!(
            project_id = %command.project_id,
            thread_id = %command.thread_id,
            "Handling delete thread command"
        );

        let service = self.domain_service.clone();
        run_detached(async move {
            service
                .delete_thread(
                    &command.project_id,
                    &command.thread_id,
                    command.caller.as_deref(),
                )
                .await?;

            info!(thread_id = %command.thread_id, "Thread deleted");
            Ok(())
        })
        .await
    }

    pub async fn handle_edit_thread_message(
        &self,
        command: EditThreadMessageCommand,
    ) -> ChatResult<()> {
        debug!(
            project_id = %command.project_id,
            thread_id = %command.thread_id,
            message_id = %command.message_id,
            "Handling edit thread message command"
        );

        let service = self.domain_service.clone();
        run_detached(async move {
            service
                .edit_thread_message(
                    &command.project_id,
                    &command.thread_id,
                    &command.message_id,
                    command.caller.as_deref(),
                    &command.content,
                )
                .await
        })
        .await
    }

    pub async fn handle_delete_thread_message(
        &self,
        command: DeleteThreadMessageCommand,
    ) -> ChatResult<()> {
        debug!(
            project_id = %command.project_id,
            thread_id = %command.thread_id,
            message_id = %command.message_id,
            "Handling delete thread message command"
        );

        let service = self.domain_service.clone();
        run_detached(async move {
            service
                .delete_thread_message(
                    &command.project_id,
                    &command.thread_id,
                    &command.message_id,
                    command.caller.as_deref(),
                )
                .await?;

            info!(message_id = %command.message_id, "Thread message deleted");
            Ok(())
        })
        .await
    }
}

/// 聊天查询处理器
pub struct ChatQueryHandler {
    domain_service: Arc<ChatDomainService>,
}

impl ChatQueryHandler {
    pub fn new(domain_service: Arc<ChatDomainService>) -> Self {
        Self { domain_service }
    }

    pub async fn handle_get_messages(
        &self,
        query: GetMessagesQuery,
    ) -> ChatResult<Vec<EnrichedMessage<GlobalMessage>>> {
        debug!(
            project_id = %query.project_id,
            limit = ?query.limit,
            before = ?query.before,
            "Handling get messages query"
        );

        self.domain_service
            .get_messages(
                &query.project_id,
                query.caller.as_deref(),
                query.limit,
                query.before,
            )
            .await
    }

    pub async fn handle_get_threads(
        &self,
        query: GetThreadsQuery,
    ) -> ChatResult<BTreeMap<String, ThreadView>> {
        debug!(project_id = %query.project_id, "Handling get threads query");

        self.domain_service
            .get_threads(&query.project_id, query.caller.as_deref())
            .await
    }
}
