use std::env;
use std::time::Duration;

use anyhow::{Result, anyhow};
use flare_collab_core::config::{ConfigManager, FlareAppConfig, PostgresInstanceConfig};

use crate::domain::model::ChatDomainConfig;
use crate::infrastructure::broadcast::redis::DEFAULT_ROOM_CHANNEL;
use crate::infrastructure::session::DEFAULT_CALLER_HEADER;

#[derive(Clone, Debug)]
pub struct ProjectChatConfig {
    /// 未配置时使用内存仓储
    pub message_store: Option<PostgresInstanceConfig>,
    /// 未配置时使用进程内广播
    pub room_bus_url: Option<String>,
    pub room_channel: String,
    /// 未配置时使用本地用户目录
    pub identity_endpoint: Option<String>,
    pub identity_timeout: Duration,
    pub caller_header: String,
    pub domain: ChatDomainConfig,
    pub hook_config: Option<String>,
    pub hook_config_dir: Option<String>,
}

impl ProjectChatConfig {
    pub fn from_app_config(app: &FlareAppConfig) -> Result<Self> {
        let service_config = app.project_chat_service();

        let message_store = match env::var("PROJECT_CHAT_POSTGRES_URL")
            .ok()
            .filter(|url| !url.is_empty())
        {
            Some(url) => Some(PostgresInstanceConfig {
                url,
                ..Default::default()
            }),
            None => match service_config.message_store.as_deref() {
                Some(name) => Some(
                    ConfigManager::select_message_store_config(app, name)
                        .ok_or_else(|| anyhow!("postgres profile '{name}' not found"))?,
                ),
                None => None,
            },
        };

        let room_bus_url = env::var("PROJECT_CHAT_REDIS_URL")
            .ok()
            .filter(|url| !url.is_empty())
            .or_else(|| {
                service_config
                    .room_bus
                    .as_deref()
                    .and_then(|name| app.redis_profile(name))
                    .map(|profile| profile.url.clone())
            });

        let room_channel = env::var("PROJECT_CHAT_ROOM_CHANNEL")
            .ok()
            .or_else(|| service_config.room_channel.clone())
            .unwrap_or_else(|| DEFAULT_ROOM_CHANNEL.to_string());

        let identity_endpoint = env::var("PROJECT_CHAT_IDENTITY_ENDPOINT")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| service_config.identity_endpoint.clone());

        let identity_timeout_ms = env::var("PROJECT_CHAT_IDENTITY_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .or(service_config.identity_timeout_ms)
            .unwrap_or(2_000);

        let caller_header = env::var("PROJECT_CHAT_CALLER_HEADER")
            .ok()
            .or_else(|| service_config.caller_header.clone())
            .unwrap_or_else(|| DEFAULT_CALLER_HEADER.to_string());

        let defaults = ChatDomainConfig::default();
        let domain = ChatDomainConfig {
            default_message_limit: service_config
                .default_message_limit
                .filter(|v| *v > 0)
                .unwrap_or(defaults.default_message_limit),
            max_message_limit: env::var("PROJECT_CHAT_MAX_MESSAGE_LIMIT")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .or(service_config.max_message_limit)
                .filter(|v| *v > 0)
                .unwrap_or(defaults.max_message_limit),
            max_content_length: service_config
                .max_content_length
                .filter(|v| *v > 0)
                .unwrap_or(defaults.max_content_length),
        };

        Ok(Self {
            message_store,
            room_bus_url,
            room_channel,
            identity_endpoint,
            identity_timeout: Duration::from_millis(identity_timeout_ms),
            caller_header,
            domain,
            hook_config: service_config.hook_config.clone(),
            hook_config_dir: service_config.hook_config_dir.clone(),
        })
    }
}
