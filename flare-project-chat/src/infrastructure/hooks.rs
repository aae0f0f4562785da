//! 服务内置的本地提交后监听器，可在 hooks.toml 中以 `type = "local"` 引用

use async_trait::async_trait;
use flare_collab_core::hooks::{HookContext, HookEvent, HookOutcome, PostCommitHook};
use tracing::info;

pub const CHAT_AUDIT_HOOK: &str = "chat_audit";

/// 将聊天提交事件写入审计日志
#[derive(Debug, Default)]
pub struct ChatAuditHook;

#[async_trait]
impl PostCommitHook for ChatAuditHook {
    async fn handle(&self, ctx: &HookContext, event: &HookEvent) -> HookOutcome {
        info!(
            target: "flare_project_chat::audit",
            project_id = %ctx.project_id,
            user_id = ?ctx.user_id,
            event = %event.name,
            payload = %event.payload,
            "Chat event committed"
        );
        HookOutcome::Completed
    }
}
