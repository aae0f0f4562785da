use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{HookContext, HookEvent};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MatchRule {
    #[default]
    Any,
    Exact { values: HashSet<String> },
}

impl MatchRule {
    pub fn any() -> Self {
        MatchRule::Any
    }

    pub fn of<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        MatchRule::Exact {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// 空列表视为匹配全部
    pub fn from_list(values: &[String]) -> Self {
        if values.is_empty() {
            MatchRule::Any
        } else {
            MatchRule::of(values.iter().cloned())
        }
    }

    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            MatchRule::Any => true,
            MatchRule::Exact { values } => value.map(|val| values.contains(val)).unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookSelector {
    #[serde(default)]
    pub projects: MatchRule,
    #[serde(default)]
    pub events: MatchRule,
}

impl HookSelector {
    pub fn matches(&self, ctx: &HookContext, event: &HookEvent) -> bool {
        self.projects.matches(Some(ctx.project_id.as_str()))
            && self.events.matches(Some(event.name.as_str()))
    }
}
