use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{ErrorBuilder, ErrorCode, FlareError};

/// Hook 失败处理策略（post-commit 阶段失败永远不会回滚主流程）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HookErrorPolicy {
    /// 记录告警并计入报告
    #[default]
    Warn,
    /// 仅记录 debug 日志并计入报告
    Ignore,
}

/// Hook 调用上下文
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookContext {
    pub project_id: String,
    pub user_id: Option<String>,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub occurred_at: Option<SystemTime>,
}

impl HookContext {
    pub fn new<T: Into<String>>(project_id: T) -> Self {
        Self {
            project_id: project_id.into(),
            ..Default::default()
        }
    }

    pub fn with_user<T: Into<String>>(mut self, user_id: T) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_attribute<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn occurred_now(mut self) -> Self {
        self.occurred_at = Some(SystemTime::now());
        self
    }
}

/// 已提交的业务事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookEvent {
    pub name: String,
    pub payload: JsonValue,
}

impl HookEvent {
    pub fn new<T: Into<String>>(name: T, payload: JsonValue) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// Hook 执行结果
#[derive(Debug)]
pub enum HookOutcome {
    Completed,
    Failed(FlareError),
}

impl HookOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, HookOutcome::Completed)
    }
}

/// Post-Commit Hook Trait
#[async_trait]
pub trait PostCommitHook: Send + Sync {
    async fn handle(&self, ctx: &HookContext, event: &HookEvent) -> HookOutcome;
}

#[async_trait]
impl<T> PostCommitHook for Arc<T>
where
    T: PostCommitHook + ?Sized,
{
    async fn handle(&self, ctx: &HookContext, event: &HookEvent) -> HookOutcome {
        (**self).handle(ctx, event).await
    }
}

/// Hook 注册元信息
#[derive(Debug, Clone)]
pub struct HookMetadata {
    pub name: Arc<str>,
    pub description: Option<Arc<str>>,
    pub priority: i32,
    pub timeout: Duration,
    pub error_policy: HookErrorPolicy,
}

impl Default for HookMetadata {
    fn default() -> Self {
        Self {
            name: Arc::from("anonymous"),
            description: None,
            priority: 0,
            timeout: Duration::from_millis(3_000),
            error_policy: HookErrorPolicy::Warn,
        }
    }
}

impl HookMetadata {
    pub fn with_name<T: Into<Arc<str>>>(mut self, name: T) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description<T: Into<Arc<str>>>(mut self, description: Option<T>) -> Self {
        self.description = description.map(Into::into);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_error_policy(mut self, policy: HookErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn build_error(&self, code: ErrorCode, message: &str) -> FlareError {
        ErrorBuilder::new(code, message)
            .details(format!("hook={}", self.name))
            .build_error()
    }
}

/// 单个 Hook 的失败记录
#[derive(Debug, Clone)]
pub struct HookFailure {
    pub hook: Arc<str>,
    pub error: FlareError,
}

/// 一次事件分发的执行报告
#[derive(Debug, Clone, Default)]
pub struct HookReport {
    pub completed: Vec<Arc<str>>,
    pub failed: Vec<HookFailure>,
}

impl HookReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn executed(&self) -> usize {
        self.completed.len() + self.failed.len()
    }
}
