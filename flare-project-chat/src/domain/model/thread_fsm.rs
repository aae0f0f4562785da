//! 评论线程生命周期状态机
//!
//! - OPEN: 初始状态
//! - RESOLVED: 已解决，记录解决人与解决时间
//!
//! 重复 resolve / reopen 不改变状态（保留原解决人）；删除在任意状态下都是终态，
//! 由仓储直接移除线程及其全部消息。

use std::fmt;

use serde::{Deserialize, Serialize};

use super::message::ThreadMessage;

/// 线程状态，`resolved_by` 与 `resolved_at` 只能同时存在或同时缺失
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreadState {
    #[default]
    Open,
    Resolved { resolved_by: String, resolved_at: i64 },
}

/// 状态迁移结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadTransition {
    Changed,
    Unchanged,
}

impl ThreadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreadState::Open => "OPEN",
            ThreadState::Resolved { .. } => "RESOLVED",
        }
    }

    /// 由存储层的可空列恢复状态
    pub fn from_columns(resolved_by: Option<String>, resolved_at: Option<i64>) -> Self {
        match (resolved_by, resolved_at) {
            (Some(resolved_by), Some(resolved_at)) => ThreadState::Resolved {
                resolved_by,
                resolved_at,
            },
            _ => ThreadState::Open,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, ThreadState::Resolved { .. })
    }

    pub fn resolved_by(&self) -> Option<&str> {
        match self {
            ThreadState::Resolved { resolved_by, .. } => Some(resolved_by),
            ThreadState::Open => None,
        }
    }

    pub fn resolved_at(&self) -> Option<i64> {
        match self {
            ThreadState::Resolved { resolved_at, .. } => Some(*resolved_at),
            ThreadState::Open => None,
        }
    }

    /// OPEN → RESOLVED
    pub fn resolve(&mut self, user_id: &str, at: i64) -> ThreadTransition {
        match self {
            ThreadState::Open => {
                *self = ThreadState::Resolved {
                    resolved_by: user_id.to_string(),
                    resolved_at: at,
                };
                ThreadTransition::Changed
            }
            ThreadState::Resolved { .. } => ThreadTransition::Unchanged,
        }
    }

    /// RESOLVED → OPEN
    pub fn reopen(&mut self) -> ThreadTransition {
        match self {
            ThreadState::Resolved { .. } => {
                *self = ThreadState::Open;
                ThreadTransition::Changed
            }
            ThreadState::Open => ThreadTransition::Unchanged,
        }
    }
}

impl fmt::Display for ThreadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 评论线程聚合
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    pub id: String,
    pub project_id: String,
    pub state: ThreadState,
    pub messages: Vec<ThreadMessage>,
}

impl Thread {
    pub fn open(project_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            state: ThreadState::Open,
            messages: Vec::new(),
        }
    }
}
