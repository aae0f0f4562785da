use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ErrorBuilder, ErrorCode, Result};

use super::registry::HookRegistry;
use super::selector::{HookSelector, MatchRule};
use super::types::{HookErrorPolicy, HookMetadata, PostCommitHook};

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct HookConfig {
    pub post_commit: Vec<HookDefinition>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct HookSelectorConfig {
    pub projects: Vec<String>,
    pub events: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HookTransportConfig {
    Webhook {
        endpoint: String,
        #[serde(default)]
        secret: Option<String>,
        #[serde(default)]
        headers: HashMap<String, String>,
    },
    Local {
        target: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HookDefinition {
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub priority: i32,
    pub timeout_ms: u64,
    pub error_policy: HookErrorPolicy,
    pub selector: HookSelectorConfig,
    pub transport: HookTransportConfig,
    pub metadata: HashMap<String, String>,
}

impl Default for HookDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            enabled: true,
            priority: 0,
            timeout_ms: 3_000,
            error_policy: HookErrorPolicy::Warn,
            selector: HookSelectorConfig::default(),
            transport: HookTransportConfig::Local {
                target: String::new(),
            },
            metadata: HashMap::new(),
        }
    }
}

impl HookDefinition {
    pub fn selector(&self) -> HookSelector {
        HookSelector {
            projects: MatchRule::from_list(&self.selector.projects),
            events: MatchRule::from_list(&self.selector.events),
        }
    }

    pub fn metadata(&self) -> HookMetadata {
        HookMetadata::default()
            .with_name(self.name.clone())
            .with_description(self.description.clone())
            .with_priority(self.priority)
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_error_policy(self.error_policy)
    }
}

pub trait HookFactory: Send + Sync {
    fn build_post_commit(&self, def: &HookDefinition) -> Result<Option<Arc<dyn PostCommitHook>>>;
}

pub struct HookConfigLoader {
    candidate_paths: Vec<PathBuf>,
}

impl Default for HookConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl HookConfigLoader {
    pub fn new() -> Self {
        Self {
            candidate_paths: vec![
                PathBuf::from("config/hooks.toml"),
                PathBuf::from("config/hooks.d"),
            ],
        }
    }

    /// 不带默认候选路径的加载器
    pub fn empty() -> Self {
        Self {
            candidate_paths: Vec::new(),
        }
    }

    pub fn add_candidate<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.candidate_paths.push(path.into());
        self
    }

    /// 返回第一个可用候选路径的配置，全部不可用时返回空配置
    pub fn load(&self) -> Result<HookConfig> {
        for path in &self.candidate_paths {
            let loaded = if path.is_dir() {
                self.load_from_directory(path)
            } else if path.is_file() {
                self.load_from_file(path)
            } else {
                continue;
            };

            match loaded {
                Ok(cfg) => return Ok(cfg),
                Err(err) => tracing::warn!(path = %path.display(), "skip hook config: {err}"),
            }
        }
        Ok(HookConfig::default())
    }

    fn load_from_file(&self, path: &Path) -> Result<HookConfig> {
        let content = fs::read_to_string(path).map_err(|err| {
            ErrorBuilder::new(ErrorCode::ConfigurationError, "failed to read hook config")
                .details(format!("path={}, err={err}", path.display()))
                .build_error()
        })?;
        toml::from_str(&content).map_err(|err| {
            ErrorBuilder::new(ErrorCode::ConfigurationError, "invalid hook config format")
                .details(format!("path={}, err={err}", path.display()))
                .build_error()
        })
    }

    fn load_from_directory(&self, dir: &Path) -> Result<HookConfig> {
        let mut merged = HookConfig::default();

        let mut entries = fs::read_dir(dir)
            .map_err(|err| {
                ErrorBuilder::new(
                    ErrorCode::ConfigurationError,
                    "failed to read hook config dir",
                )
                .details(format!("path={}, err={err}", dir.display()))
                .build_error()
            })?
            .filter_map(|entry| entry.ok())
            .collect::<Vec<_>>();
        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            if entry
                .path()
                .extension()
                .map(|ext| ext == "toml")
                .unwrap_or(false)
            {
                let cfg = self.load_from_file(&entry.path())?;
                merged.merge(cfg);
            }
        }

        Ok(merged)
    }
}

impl HookConfig {
    fn merge(&mut self, other: HookConfig) {
        self.post_commit.extend(other.post_commit);
    }

    /// 将启用的监听器注册到 registry，返回注册数量
    pub async fn install(
        &self,
        registry: Arc<HookRegistry>,
        factory: &dyn HookFactory,
    ) -> Result<usize> {
        let mut installed = 0;
        for def in &self.post_commit {
            if !def.enabled {
                tracing::info!(hook = %def.name, "post-commit hook disabled, skip");
                continue;
            }
            if let Some(handler) = factory.build_post_commit(def)? {
                registry
                    .register_post_commit(def.metadata(), def.selector(), handler)
                    .await;
                installed += 1;
            }
        }
        Ok(installed)
    }
}
