//! 辅助工具函数模块
//!
//! 提供配置加载、服务初始化等常用辅助函数

use std::net::SocketAddr;

use anyhow::{Context, Result};

use crate::config::{FlareAppConfig, ServiceRuntimeConfig};

/// 服务启动辅助函数
pub struct ServiceHelper;

impl ServiceHelper {
    /// 加载配置并验证
    ///
    /// `strict` 为 true 时 profile 引用校验失败直接返回错误，否则只记录告警。
    pub fn load_config(config_path: Option<&str>, strict: bool) -> Result<&'static FlareAppConfig> {
        let config = crate::config::load_config(config_path);

        if strict {
            config
                .validate_references()
                .with_context(|| "configuration validation failed")?;
            return Ok(config);
        }

        if let Err(e) = config.validate_references() {
            tracing::warn!("configuration reference validation failed: {}", e);
        }

        Ok(config)
    }

    /// 从服务配置中解析监听地址
    pub fn parse_server_addr(
        config: &FlareAppConfig,
        runtime: &ServiceRuntimeConfig,
    ) -> Result<SocketAddr> {
        let server = config.compose_server_config(runtime);
        let addr = format!("{}:{}", server.address, server.port)
            .parse()
            .with_context(|| {
                format!("invalid server address: {}:{}", server.address, server.port)
            })?;
        Ok(addr)
    }
}
