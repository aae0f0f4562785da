use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::RwLock;

use crate::error::ErrorCode;

use super::selector::HookSelector;
use super::types::{
    HookContext, HookErrorPolicy, HookEvent, HookFailure, HookMetadata, HookOutcome, HookReport,
    PostCommitHook,
};

#[derive(Clone)]
struct RegistryEntry {
    metadata: HookMetadata,
    selector: HookSelector,
    handler: Arc<dyn PostCommitHook>,
}

/// Post-commit 监听器注册中心，按 priority 升序执行
#[derive(Default)]
pub struct HookRegistry {
    post_commit: RwLock<Vec<RegistryEntry>>,
}

impl HookRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn register_post_commit(
        &self,
        metadata: HookMetadata,
        selector: HookSelector,
        handler: Arc<dyn PostCommitHook>,
    ) {
        let mut guard = self.post_commit.write().await;
        guard.push(RegistryEntry {
            metadata,
            selector,
            handler,
        });
        guard.sort_by(|a, b| a.metadata.priority.cmp(&b.metadata.priority));
    }

    pub async fn len(&self) -> usize {
        self.post_commit.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.post_commit.read().await.is_empty()
    }

    /// 依次执行匹配的监听器；单个监听器失败、超时或 panic 不会影响其它监听器
    pub async fn execute_post_commit(&self, ctx: &HookContext, event: &HookEvent) -> HookReport {
        let plan: Vec<RegistryEntry> = {
            let guard = self.post_commit.read().await;
            guard
                .iter()
                .filter(|entry| entry.selector.matches(ctx, event))
                .cloned()
                .collect()
        };

        let mut report = HookReport::default();
        for entry in plan {
            let fut = AssertUnwindSafe(entry.handler.handle(ctx, event)).catch_unwind();
            let outcome = match tokio::time::timeout(entry.metadata.timeout, fut).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(panic)) => HookOutcome::Failed(entry.metadata.build_error(
                    ErrorCode::OperationFailed,
                    &format!("post-commit hook panicked: {}", panic_message(panic.as_ref())),
                )),
                Err(_) => HookOutcome::Failed(
                    entry
                        .metadata
                        .build_error(ErrorCode::OperationTimeout, "post-commit hook timed out"),
                ),
            };

            match outcome {
                HookOutcome::Completed => report.completed.push(entry.metadata.name.clone()),
                HookOutcome::Failed(error) => {
                    match entry.metadata.error_policy {
                        HookErrorPolicy::Warn => tracing::warn!(
                            hook = %entry.metadata.name,
                            event = %event.name,
                            project_id = %ctx.project_id,
                            "post-commit hook failed: {error}"
                        ),
                        HookErrorPolicy::Ignore => tracing::debug!(
                            hook = %entry.metadata.name,
                            event = %event.name,
                            "post-commit hook failed but configured to ignore: {error}"
                        ),
                    }
                    report.failed.push(HookFailure {
                        hook: entry.metadata.name.clone(),
                        error,
                    });
                }
            }
        }
        report
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::error::FlareError;
    use crate::hooks::MatchRule;

    struct Recording {
        label: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl PostCommitHook for Recording {
        async fn handle(&self, _ctx: &HookContext, _event: &HookEvent) -> HookOutcome {
            self.log.lock().unwrap().push(self.label);
            HookOutcome::Completed
        }
    }

    struct Failing;

    #[async_trait]
    impl PostCommitHook for Failing {
        async fn handle(&self, _ctx: &HookContext, _event: &HookEvent) -> HookOutcome {
            HookOutcome::Failed(FlareError::new(ErrorCode::OperationFailed, "boom"))
        }
    }

    struct Sleeping;

    #[async_trait]
    impl PostCommitHook for Sleeping {
        async fn handle(&self, _ctx: &HookContext, _event: &HookEvent) -> HookOutcome {
            tokio::time::sleep(Duration::from_secs(5)).await;
            HookOutcome::Completed
        }
    }

    struct Panicking;

    #[async_trait]
    impl PostCommitHook for Panicking {
        async fn handle(&self, _ctx: &HookContext, _event: &HookEvent) -> HookOutcome {
            panic!("listener bug");
        }
    }

    fn event() -> HookEvent {
        HookEvent::new("chatMessageSent", json!({"projectId": "p1"}))
    }

    #[tokio::test]
    async fn test_hooks_run_in_priority_order() {
        let registry = HookRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        registry
            .register_post_commit(
                HookMetadata::default().with_name("late").with_priority(10),
                HookSelector::default(),
                Arc::new(Recording {
                    label: "late",
                    log: log.clone(),
                }),
            )
            .await;
        registry
            .register_post_commit(
                HookMetadata::default().with_name("early").with_priority(-5),
                HookSelector::default(),
                Arc::new(Recording {
                    label: "early",
                    log: log.clone(),
                }),
            )
            .await;

        let report = registry
            .execute_post_commit(&HookContext::new("p1"), &event())
            .await;

        assert!(report.is_clean());
        assert_eq!(*log.lock().unwrap(), vec!["early", "late"]);
    }

    #[tokio::test]
    async fn test_failures_and_timeouts_are_isolated() {
        let registry = HookRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        registry
            .register_post_commit(
                HookMetadata::default().with_name("failing").with_priority(0),
                HookSelector::default(),
                Arc::new(Failing),
            )
            .await;
        registry
            .register_post_commit(
                HookMetadata::default()
                    .with_name("slow")
                    .with_priority(1)
                    .with_timeout(Duration::from_millis(20)),
                HookSelector::default(),
                Arc::new(Sleeping),
            )
            .await;
        registry
            .register_post_commit(
                HookMetadata::default().with_name("audit").with_priority(2),
                HookSelector::default(),
                Arc::new(Recording {
                    label: "audit",
                    log: log.clone(),
                }),
            )
            .await;

        let report = registry
            .execute_post_commit(&HookContext::new("p1"), &event())
            .await;

        assert_eq!(report.executed(), 3);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[1].error.code(), ErrorCode::OperationTimeout);
        assert_eq!(*log.lock().unwrap(), vec!["audit"]);
    }

    #[tokio::test]
    async fn test_selector_skips_other_projects() {
        let registry = HookRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        registry
            .register_post_commit(
                HookMetadata::default().with_name("scoped"),
                HookSelector {
                    projects: MatchRule::of(["p2"]),
                    events: MatchRule::Any,
                },
                Arc::new(Recording {
                    label: "scoped",
                    log: log.clone(),
                }),
            )
            .await;

        let report = registry
            .execute_post_commit(&HookContext::new("p1"), &event())
            .await;

        assert_eq!(report.executed(), 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_panicking_hook_is_reported_and_later_hooks_still_run() {
        let registry = HookRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        registry
            .register_post_commit(
                HookMetadata::default().with_name("buggy").with_priority(1),
                HookSelector::default(),
                Arc::new(Panicking),
            )
            .await;
        registry
            .register_post_commit(
                HookMetadata::default().with_name("audit").with_priority(2),
                HookSelector::default(),
                Arc::new(Recording {
                    label: "audit",
                    log: log.clone(),
                }),
            )
            .await;

        let report = registry
            .execute_post_commit(&HookContext::new("p1"), &event())
            .await;

        assert_eq!(report.completed.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(&*report.failed[0].hook, "buggy");
        assert_eq!(report.failed[0].error.code(), ErrorCode::OperationFailed);
        assert_eq!(*log.lock().unwrap(), vec!["audit"]);
    }
}
