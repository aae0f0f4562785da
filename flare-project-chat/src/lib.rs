//! Flare 项目协作聊天服务
//!
//! 项目级全局聊天流与文档评论线程的协调核心：
//! 鉴权 → 持久化 → 用户信息补全 → 房间广播 → 提交后 Hook。

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;
pub mod service;

pub use config::ProjectChatConfig;
pub use service::ApplicationBootstrap;
