use std::sync::Arc;

use super::registry::HookRegistry;
use super::types::{HookContext, HookEvent, HookReport};

/// Hook 调度器，封装常用执行入口
#[derive(Clone)]
pub struct HookDispatcher {
    registry: Arc<HookRegistry>,
}

impl Default for HookDispatcher {
    fn default() -> Self {
        Self::new(HookRegistry::new())
    }
}

impl HookDispatcher {
    pub fn new(registry: Arc<HookRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<HookRegistry> {
        &self.registry
    }

    pub async fn fire(&self, ctx: &HookContext, event: &HookEvent) -> HookReport {
        self.registry.execute_post_commit(ctx, event).await
    }
}
