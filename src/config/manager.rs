//! 配置管理器 - 负责处理不同环境下的配置选择和覆盖
//!
//! - 根据环境变量选择消息存储 profile
//! - 加载 `config/environments/{env}.toml` 并覆盖 Redis / PostgreSQL profile

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use toml::Value;

use super::{FlareAppConfig, PostgresInstanceConfig, RedisPoolConfig, load_toml_value};

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 选择消息存储配置
    ///
    /// 优先级：
    /// 1. 环境变量 FLARE_MESSAGE_STORE_PROFILE 指定的配置
    /// 2. 配置文件中指定的配置
    pub fn select_message_store_config(
        config: &FlareAppConfig,
        profile_name: &str,
    ) -> Option<PostgresInstanceConfig> {
        if let Ok(env_profile) = env::var("FLARE_MESSAGE_STORE_PROFILE") {
            if let Some(store) = config.postgres_profile(&env_profile) {
                return Some(store.clone());
            }
        }

        config.postgres_profile(profile_name).cloned()
    }

    /// 获取当前环境名称，未设置 FLARE_ENV 时为 "development"
    pub fn get_environment() -> String {
        env::var("FLARE_ENV").unwrap_or_else(|_| "development".to_string())
    }

    /// 根据环境加载特定配置
    pub fn load_environment_config(base_config: &mut FlareAppConfig) -> Result<()> {
        let path = PathBuf::from(format!(
            "config/environments/{}.toml",
            Self::get_environment()
        ));
        Self::apply_environment_file(base_config, &path)
    }

    /// 将环境配置文件中的 profile 覆盖到基础配置
    pub fn apply_environment_file(base_config: &mut FlareAppConfig, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }

        let env_config = load_toml_value(path)?;
        Self::merge_config_values(base_config, &env_config)
            .with_context(|| format!("invalid environment config: {}", path.display()))
    }

    /// 合并配置值：同名 profile 整体替换，新 profile 追加
    fn merge_config_values(base_config: &mut FlareAppConfig, env_config: &Value) -> Result<()> {
        if let Some(tables) = env_config.get("postgres").and_then(Value::as_table) {
            for (name, value) in tables {
                let profile: PostgresInstanceConfig = value.clone().try_into()?;
                base_config.postgres.insert(name.clone(), profile);
            }
        }

        if let Some(tables) = env_config.get("redis").and_then(Value::as_table) {
            for (name, value) in tables {
                let profile: RedisPoolConfig = value.clone().try_into()?;
                base_config.redis.insert(name.clone(), profile);
            }
        }

        Ok(())
    }
}
