//! Flare Collab Core 公共库
//!
//! 提供统一的配置加载、日志初始化、错误类型和提交后 Hook 扩展

pub mod config;
pub mod error;
pub mod hooks;
pub mod tracing;
pub mod utils;

pub use config::{
    ConfigManager, FlareAppConfig, LoggingConfig, PostgresInstanceConfig,
    ProjectChatServiceConfig, RedisPoolConfig, ServiceEndpointConfig, ServiceRuntimeConfig,
    app_config, load_config,
};
pub use error::*;
pub use hooks::*;
pub use utils::*;
