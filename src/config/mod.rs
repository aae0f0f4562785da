//! Flare Collab Core 配置模块
//!
//! 该模块提供了完整的应用程序配置管理功能，包括：
//! - 配置文件加载和解析（单文件或目录合并）
//! - 环境特定配置覆盖
//! - 项目聊天服务配置定义
//! - 数据库、Redis 等基础设施配置

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use toml::Value;
use tracing::warn;

mod manager;
pub use manager::ConfigManager;

/// 全局应用配置实例，使用 OnceLock 确保只初始化一次
static APP_CONFIG: OnceLock<FlareAppConfig> = OnceLock::new();

/// Redis 连接池配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RedisPoolConfig {
    /// Redis 服务器地址
    pub url: String,
    /// 命名空间前缀
    #[serde(default)]
    pub namespace: Option<String>,
    /// 数据库编号
    #[serde(default)]
    pub database: Option<u32>,
}

/// PostgreSQL 数据库实例配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PostgresInstanceConfig {
    /// 数据库连接 URL
    pub url: String,
    /// 最大连接数
    #[serde(default)]
    pub max_connections: Option<u32>,
    /// 最小连接数
    #[serde(default)]
    pub min_connections: Option<u32>,
}

/// 服务标识
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            name: "flare-collab-core".to_string(),
            version: "0.1.0".to_string(),
        }
    }
}

/// 监听地址配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 60090,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别（RUST_LOG 优先）
    pub level: String,
    pub with_target: bool,
    pub with_thread_ids: bool,
    pub with_file: bool,
    pub with_line_number: bool,
    /// 输出 JSON 格式日志
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            with_target: true,
            with_thread_ids: true,
            with_file: true,
            with_line_number: true,
            json: false,
        }
    }
}

/// 服务端点配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServiceEndpointConfig {
    /// 服务地址
    pub address: Option<String>,
    /// 服务端口
    pub port: Option<u16>,
}

/// 服务运行时配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServiceRuntimeConfig {
    /// 服务名称
    #[serde(default)]
    pub service_name: Option<String>,
    /// 服务器配置
    #[serde(default)]
    pub server: Option<ServiceEndpointConfig>,
}

/// 项目聊天服务配置
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProjectChatServiceConfig {
    /// 运行时配置
    #[serde(flatten)]
    pub runtime: ServiceRuntimeConfig,
    /// 消息存储（PostgreSQL profile 名称），缺省时使用内存存储
    #[serde(default)]
    pub message_store: Option<String>,
    /// 房间广播总线（Redis profile 名称），缺省时使用进程内广播
    #[serde(default)]
    pub room_bus: Option<String>,
    /// 房间广播频道
    #[serde(default)]
    pub room_channel: Option<String>,
    /// 用户信息服务地址
    #[serde(default)]
    pub identity_endpoint: Option<String>,
    /// 用户信息查询超时（毫秒）
    #[serde(default)]
    pub identity_timeout_ms: Option<u64>,
    /// 网关注入调用者身份的请求头
    #[serde(default)]
    pub caller_header: Option<String>,
    /// 默认分页大小
    #[serde(default)]
    pub default_message_limit: Option<usize>,
    /// 最大分页大小
    #[serde(default)]
    pub max_message_limit: Option<usize>,
    /// 消息内容最大长度（字符）
    #[serde(default)]
    pub max_content_length: Option<usize>,
    /// Hook 配置
    #[serde(default)]
    pub hook_config: Option<String>,
    /// Hook 配置目录
    #[serde(default)]
    pub hook_config_dir: Option<String>,
}

/// 服务配置集合
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServicesConfig {
    /// 项目聊天服务配置
    #[serde(default)]
    pub project_chat: Option<ProjectChatServiceConfig>,
}

/// Flare 应用配置主结构体
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FlareAppConfig {
    #[serde(default)]
    pub service: ServiceInfo,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Redis 配置映射
    #[serde(default)]
    pub redis: HashMap<String, RedisPoolConfig>,
    /// PostgreSQL 配置映射
    #[serde(default)]
    pub postgres: HashMap<String, PostgresInstanceConfig>,
    /// 服务配置
    #[serde(default)]
    pub services: ServicesConfig,
}

impl FlareAppConfig {
    /// 获取 Redis 配置
    pub fn redis_profile(&self, name: &str) -> Option<&RedisPoolConfig> {
        self.redis.get(name)
    }

    /// 获取 PostgreSQL 配置
    pub fn postgres_profile(&self, name: &str) -> Option<&PostgresInstanceConfig> {
        self.postgres.get(name)
    }

    /// 获取项目聊天服务配置
    pub fn project_chat_service(&self) -> ProjectChatServiceConfig {
        self.services.project_chat.clone().unwrap_or_default()
    }

    /// 组合服务监听配置：服务级配置覆盖全局 `[server]`
    pub fn compose_server_config(&self, runtime: &ServiceRuntimeConfig) -> ServerConfig {
        let mut server = self.server.clone();
        if let Some(endpoint) = runtime.server.as_ref() {
            if let Some(address) = endpoint.address.as_ref() {
                server.address = address.clone();
            }
            if let Some(port) = endpoint.port {
                server.port = port;
            }
        }
        server
    }

    /// 校验服务配置引用的 profile 是否存在
    pub fn validate_references(&self) -> Result<()> {
        let chat = self.project_chat_service();
        if let Some(name) = chat.message_store.as_deref() {
            if self.postgres_profile(name).is_none() {
                return Err(anyhow!(
                    "services.project_chat.message_store references unknown postgres profile '{name}'"
                ));
            }
        }
        if let Some(name) = chat.room_bus.as_deref() {
            if self.redis_profile(name).is_none() {
                return Err(anyhow!(
                    "services.project_chat.room_bus references unknown redis profile '{name}'"
                ));
            }
        }
        Ok(())
    }

    /// 确保配置有默认值
    fn ensure_defaults(&mut self) {
        if self.server.address.is_empty() {
            self.server.address = "0.0.0.0".to_string();
        }
        if self.server.port == 0 {
            self.server.port = ServerConfig::default().port;
        }
    }
}

/// 加载配置
pub fn load_config(path: Option<&str>) -> &'static FlareAppConfig {
    let candidates: Vec<PathBuf> = match path {
        Some(p) => vec![PathBuf::from(p)],
        None => vec![PathBuf::from("config"), PathBuf::from("config.toml")],
    };

    APP_CONFIG.get_or_init(|| {
        let mut cfg = load_with_fallback(&candidates);
        // 加载环境特定配置
        if let Err(e) = ConfigManager::load_environment_config(&mut cfg) {
            warn!("failed to load environment config: {}", e);
        }
        cfg
    })
}

/// 获取已加载的应用配置
pub fn app_config() -> Option<&'static FlareAppConfig> {
    APP_CONFIG.get()
}

/// 使用备选方案加载配置
fn load_with_fallback(candidates: &[PathBuf]) -> FlareAppConfig {
    for path in candidates {
        match load_config_from_source(path) {
            Ok(cfg) => return cfg,
            Err(err) => {
                warn!("failed to load config from {}: {err:#}", path.display());
            }
        }
    }

    warn!("no configuration source succeeded, falling back to defaults");
    FlareAppConfig::default()
}

/// 从源加载配置（文件或目录）
pub fn load_config_from_source(path: &Path) -> Result<FlareAppConfig> {
    if !path.exists() {
        return Err(anyhow!(
            "configuration path {} does not exist",
            path.display()
        ));
    }

    let metadata = path
        .metadata()
        .with_context(|| format!("unable to read metadata for {}", path.display()))?;

    let mut cfg = if metadata.is_dir() {
        load_config_from_directory(path)?
    } else {
        load_config_from_file(path)?
    };
    cfg.ensure_defaults();
    Ok(cfg)
}

/// 从文件加载配置
fn load_config_from_file(path: &Path) -> Result<FlareAppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("unable to read config file: {}", path.display()))?;
    let cfg: FlareAppConfig = toml::from_str(&content)
        .with_context(|| format!("invalid config format: {}", path.display()))?;
    Ok(cfg)
}

/// 从目录加载配置
fn load_config_from_directory(path: &Path) -> Result<FlareAppConfig> {
    let base_file = path.join("base.toml");
    if !base_file.exists() {
        return Err(anyhow!(
            "missing base configuration: {}",
            base_file.display()
        ));
    }

    let mut merged = load_toml_value(&base_file)?;

    if !merged.is_table() {
        return Err(anyhow!(
            "base configuration must be a table: {}",
            base_file.display()
        ));
    }

    merge_directory(&mut merged, &path.join("shared"))?;
    merge_directory(&mut merged, &path.join("services"))?;
    merge_directory(&mut merged, &path.join("overrides"))?;

    let cfg: FlareAppConfig = merged
        .try_into()
        .with_context(|| format!("invalid configuration after merging {}", path.display()))?;

    Ok(cfg)
}

/// 合并目录中的配置
fn merge_directory(root: &mut Value, dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }

    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("unable to read config directory {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(OsStr::to_str)
                .map(|ext| ext.eq_ignore_ascii_case("toml"))
                .unwrap_or(false)
        })
        .collect::<Vec<_>>();

    entries.sort_by_key(|entry| entry.path());

    for entry in entries {
        let value = load_toml_value(&entry.path())?;
        merge_value(root, value);
    }

    Ok(())
}

/// 加载 TOML 值
pub(crate) fn load_toml_value(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("unable to read config fragment {}", path.display()))?;
    let value: Value = toml::from_str(&content)
        .with_context(|| format!("invalid TOML content in fragment {}", path.display()))?;
    Ok(value)
}

/// 合并值，overlay 中的表逐键覆盖 base
pub(crate) fn merge_value(base: &mut Value, overlay: Value) {
    match overlay {
        Value::Table(overlay_table) => {
            if let Value::Table(base_table) = base {
                for (key, overlay_value) in overlay_table.into_iter() {
                    match base_table.get_mut(&key) {
                        Some(base_value) => merge_value(base_value, overlay_value),
                        None => {
                            base_table.insert(key, overlay_value);
                        }
                    }
                }
            } else {
                *base = Value::Table(overlay_table);
            }
        }
        other => {
            *base = other;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_load_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.toml");
        write(
            &file,
            r#"
            [server]
            address = "127.0.0.1"
            port = 7000

            [postgres.chat]
            url = "postgres://localhost/chat"

            [services.project_chat]
            message_store = "chat"
            default_message_limit = 20
            "#,
        );

        let cfg = load_config_from_source(&file).unwrap();
        assert_eq!(cfg.server.port, 7000);
        assert_eq!(cfg.project_chat_service().default_message_limit, Some(20));
        assert!(cfg.validate_references().is_ok());
    }

    #[test]
    fn test_directory_overrides_merge_in_order() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("base.toml"),
            r#"
            [server]
            port = 7000
            [logging]
            level = "info"
            "#,
        );
        write(
            &dir.path().join("services/project_chat.toml"),
            r#"
            [services.project_chat]
            max_message_limit = 100
            "#,
        );
        write(
            &dir.path().join("overrides/local.toml"),
            r#"
            [logging]
            level = "trace"
            "#,
        );

        let cfg = load_config_from_source(dir.path()).unwrap();
        assert_eq!(cfg.logging.level, "trace");
        assert_eq!(cfg.server.port, 7000);
        assert_eq!(cfg.project_chat_service().max_message_limit, Some(100));
    }

    #[test]
    fn test_directory_requires_base() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config_from_source(dir.path()).unwrap_err();
        assert!(err.to_string().contains("missing base configuration"));
    }

    #[test]
    fn test_validate_unknown_profile() {
        let mut cfg = FlareAppConfig::default();
        cfg.services.project_chat = Some(ProjectChatServiceConfig {
            room_bus: Some("missing".to_string()),
            ..Default::default()
        });
        let err = cfg.validate_references().unwrap_err();
        assert!(err.to_string().contains("unknown redis profile"));
    }

    #[test]
    fn test_compose_server_config_prefers_service_endpoint() {
        let cfg = FlareAppConfig::default();
        let runtime = ServiceRuntimeConfig {
            service_name: None,
            server: Some(ServiceEndpointConfig {
                address: None,
                port: Some(9100),
            }),
        };
        let server = cfg.compose_server_config(&runtime);
        assert_eq!(server.address, "0.0.0.0");
        assert_eq!(server.port, 9100);
    }
}
