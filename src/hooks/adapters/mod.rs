mod webhook;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ErrorBuilder, ErrorCode, Result};

use super::config::{HookDefinition, HookFactory, HookTransportConfig};
use super::types::PostCommitHook;

pub use webhook::WebhookHookFactory;

/// 默认的 Hook 工厂，支持 WebHook / 本地实现
pub struct DefaultHookFactory {
    webhook: WebhookHookFactory,
    locals: HashMap<String, Arc<dyn PostCommitHook>>,
}

impl DefaultHookFactory {
    pub fn new() -> Result<Self> {
        Ok(Self {
            webhook: WebhookHookFactory::new()?,
            locals: HashMap::new(),
        })
    }

    pub fn register_local<S: Into<String>>(&mut self, name: S, hook: Arc<dyn PostCommitHook>) {
        self.locals.insert(name.into(), hook);
    }
}

impl HookFactory for DefaultHookFactory {
    fn build_post_commit(&self, def: &HookDefinition) -> Result<Option<Arc<dyn PostCommitHook>>> {
        match &def.transport {
            HookTransportConfig::Webhook {
                endpoint,
                secret,
                headers,
            } => Ok(Some(self.webhook.build_post_commit(
                def,
                endpoint,
                secret.clone(),
                headers.clone(),
            ))),
            HookTransportConfig::Local { target } => {
                let hook = self.locals.get(target).cloned().ok_or_else(|| {
                    ErrorBuilder::new(
                        ErrorCode::ConfigurationError,
                        "local post-commit hook not found",
                    )
                    .details(format!("hook={}, target={target}", def.name))
                    .build_error()
                })?;
                Ok(Some(hook))
            }
        }
    }
}
