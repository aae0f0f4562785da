use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::errors::ChatError;

/// 协调器对外提供的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatOperation {
    SendMessage,
    GetMessages,
    DeleteMessage,
    EditMessage,
    GetThreads,
    SendComment,
    ResolveThread,
    ReopenThread,
    DeleteThread,
    EditThreadMessage,
    DeleteThreadMessage,
}

impl ChatOperation {
    pub const ALL: [ChatOperation; 11] = [
        ChatOperation::SendMessage,
        ChatOperation::GetMessages,
        ChatOperation::DeleteMessage,
        ChatOperation::EditMessage,
        ChatOperation::GetThreads,
        ChatOperation::SendComment,
        ChatOperation::ResolveThread,
        ChatOperation::ReopenThread,
        ChatOperation::DeleteThread,
        ChatOperation::EditThreadMessage,
        ChatOperation::DeleteThreadMessage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatOperation::SendMessage => "send_message",
            ChatOperation::GetMessages => "get_messages",
            ChatOperation::DeleteMessage => "delete_message",
            ChatOperation::EditMessage => "edit_message",
            ChatOperation::GetThreads => "get_threads",
            ChatOperation::SendComment => "send_comment",
            ChatOperation::ResolveThread => "resolve_thread",
            ChatOperation::ReopenThread => "reopen_thread",
            ChatOperation::DeleteThread => "delete_thread",
            ChatOperation::EditThreadMessage => "edit_thread_message",
            ChatOperation::DeleteThreadMessage => "delete_thread_message",
        }
    }
}

impl fmt::Display for ChatOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 操作对调用者身份的要求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallerRequirement {
    Anonymous,
    Authenticated,
}

/// 操作 → 调用者要求 的能力表
///
/// 默认表：读取操作、reopen_thread 与 delete_thread 允许匿名，其余操作需要登录用户。
#[derive(Debug, Clone)]
pub struct AuthorizationPolicy {
    requirements: HashMap<ChatOperation, CallerRequirement>,
}

impl Default for AuthorizationPolicy {
    fn default() -> Self {
        let requirements = ChatOperation::ALL
            .into_iter()
            .map(|op| {
                let requirement = match op {
                    ChatOperation::GetMessages
                    | ChatOperation::GetThreads
                    | ChatOperation::ReopenThread
                    | ChatOperation::DeleteThread => CallerRequirement::Anonymous,
                    _ => CallerRequirement::Authenticated,
                };
                (op, requirement)
            })
            .collect();
        Self { requirements }
    }
}

impl AuthorizationPolicy {
    pub fn with_requirement(mut self, op: ChatOperation, requirement: CallerRequirement) -> Self {
        self.requirements.insert(op, requirement);
        self
    }

    pub fn requirement(&self, op: ChatOperation) -> CallerRequirement {
        self.requirements
            .get(&op)
            .copied()
            .unwrap_or(CallerRequirement::Authenticated)
    }

    pub fn authorize<'a>(
        &self,
        op: ChatOperation,
        caller: Option<&'a str>,
    ) -> Result<Option<&'a str>, ChatError> {
        match (self.requirement(op), caller) {
            (CallerRequirement::Authenticated, None) => {
                Err(ChatError::Unauthenticated { operation: op })
            }
            (_, caller) => Ok(caller),
        }
    }
}
