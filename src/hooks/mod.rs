//! 提交后 Hook 扩展模块
//!
//! - 提供统一的 Hook 上下文、事件与执行报告定义
//! - 支持本地 Hook 注册与基于 WebHook 的远程监听器
//! - 监听器在主流程提交之后执行，失败与超时互相隔离

pub mod adapters;
mod config;
mod registry;
mod runtime;
mod selector;
mod types;

pub use config::{
    HookConfig, HookConfigLoader, HookDefinition, HookFactory, HookSelectorConfig,
    HookTransportConfig,
};
pub use registry::HookRegistry;
pub use runtime::HookDispatcher;
pub use selector::{HookSelector, MatchRule};
pub use types::{
    HookContext, HookErrorPolicy, HookEvent, HookFailure, HookMetadata, HookOutcome, HookReport,
    PostCommitHook,
};
