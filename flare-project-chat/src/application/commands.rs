/// 发送全局消息命令
#[derive(Debug, Clone)]
pub struct SendMessageCommand {
    pub project_id: String,
    pub caller: Option<String>,
    pub content: String,
    pub client_id: Option<String>,
}

/// 删除全局消息命令
#[derive(Debug, Clone)]
pub struct DeleteMessageCommand {
    pub project_id: String,
    pub message_id: String,
    pub caller: Option<String>,
}

/// 编辑全局消息命令
#[derive(Debug, Clone)]
pub struct EditMessageCommand {
    pub project_id: String,
    pub message_id: String,
    pub caller: Option<String>,
    pub content: String,
}

/// 发表评论命令
#[derive(Debug, Clone)]
pub struct SendCommentCommand {
    pub project_id: String,
    pub thread_id: String,
    pub caller: Option<String>,
    pub content: String,
}

/// 线程生命周期命令（resolve / reopen / delete 共用）
#[derive(Debug, Clone)]
pub struct ThreadCommand {
    pub project_id: String,
    pub thread_id: String,
    pub caller: Option<String>,
}

/// 编辑线程消息命令
#[derive(Debug, Clone)]
pub struct EditThreadMessageCommand {
    pub project_id: String,
    pub thread_id: String,
    pub message_id: String,
    pub caller: Option<String>,
    pub content: String,
}

/// 删除线程消息命令
#[derive(Debug, Clone)]
pub struct DeleteThreadMessageCommand {
    pub project_id: String,
    pub thread_id: String,
    pub message_id: String,
    pub caller: Option<String>,
}
