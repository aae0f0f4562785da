//! 项目聊天领域模型

mod events;
mod message;
mod policy;
mod profile;
mod thread_fsm;
mod view;

pub use events::{ChatEvent, RoomMessage};
pub use message::{Authored, GlobalMessage, ThreadMessage};
pub use policy::{AuthorizationPolicy, CallerRequirement, ChatOperation};
pub use profile::{DisplayProfile, PersonalInfo, format_personal_info};
pub use thread_fsm::{Thread, ThreadState, ThreadTransition};
pub use view::{EnrichedMessage, ThreadView};

/// 全局聊天流在用户信息补全中使用的分组键
pub const GLOBAL_GROUP: &str = "global";

/// 全局消息发送后触发的 Hook 事件名
pub const CHAT_MESSAGE_SENT: &str = "chatMessageSent";

/// 聊天领域配置值对象
#[derive(Debug, Clone, Copy)]
pub struct ChatDomainConfig {
    pub default_message_limit: usize,
    pub max_message_limit: usize,
    pub max_content_length: usize,
}

impl Default for ChatDomainConfig {
    fn default() -> Self {
        Self {
            default_message_limit: 50,
            max_message_limit: 200,
            max_content_length: 10 * 1024,
        }
    }
}

impl ChatDomainConfig {
    /// 解析分页大小：缺省使用默认值，并限制在 [1, max] 之间
    pub fn resolve_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_message_limit)
            .clamp(1, self.max_message_limit.max(1))
    }
}
