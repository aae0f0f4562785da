//! 工具函数模块
//!
//! 提供当前时间戳、服务启动辅助等通用工具函数

pub mod helpers;

pub use helpers::ServiceHelper;

use chrono::Utc;

/// 获取当前时间戳（毫秒）
pub fn current_millis() -> i64 {
    Utc::now().timestamp_millis()
}
