// 集成测试共用的记录型替身实现
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use flare_collab_core::error::{ErrorCode, FlareError};
use flare_collab_core::hooks::{
    HookContext, HookDispatcher, HookEvent, HookMetadata, HookOutcome, HookRegistry,
    HookSelector, PostCommitHook,
};
use flare_project_chat::domain::model::{
    AuthorizationPolicy, ChatDomainConfig, ChatEvent, GlobalMessage, PersonalInfo, Thread,
    ThreadMessage, ThreadState,
};
use flare_project_chat::domain::repository::{ChatRepository, IdentityResolver, RoomBroadcaster};
use flare_project_chat::domain::service::ChatDomainService;
use flare_project_chat::infrastructure::identity::StaticIdentityResolver;
use flare_project_chat::infrastructure::persistence::InMemoryChatRepository;

/// 按发生顺序记录持久化、广播与 Hook 调用
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.entries()
            .iter()
            .filter(|entry| entry.starts_with(prefix))
            .count()
    }
}

/// 包装内存仓储，记录每次调用，可模拟存储故障
#[derive(Clone)]
pub struct JournalRepository {
    inner: InMemoryChatRepository,
    journal: Journal,
    failing: Arc<Mutex<bool>>,
}

impl JournalRepository {
    pub fn new(journal: Journal) -> Self {
        Self {
            inner: InMemoryChatRepository::new(),
            journal,
            failing: Arc::new(Mutex::new(false)),
        }
    }

    pub fn inner(&self) -> &InMemoryChatRepository {
        &self.inner
    }

    pub fn fail_writes(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    fn record(&self, op: &str) -> Result<()> {
        self.journal.push(format!("persist:{op}"));
        if *self.failing.lock().unwrap() {
            return Err(anyhow!("simulated storage outage"));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatRepository for JournalRepository {
    async fn send_global_message(
        &self,
        project_id: &str,
        user_id: &str,
        content: &str,
    ) -> Result<GlobalMessage> {
        self.record("send_global_message")?;
        self.inner
            .send_global_message(project_id, user_id, content)
            .await
    }

    async fn get_global_messages(
        &self,
        project_id: &str,
        limit: usize,
        before: Option<i64>,
    ) -> Result<Vec<GlobalMessage>> {
        self.record("get_global_messages")?;
        self.inner
            .get_global_messages(project_id, limit, before)
            .await
    }

    async fn delete_global_message(&self, project_id: &str, message_id: &str) -> Result<bool> {
        self.record("delete_global_message")?;
        self.inner.delete_global_message(project_id, message_id).await
    }

    async fn edit_global_message(
        &self,
        project_id: &str,
        message_id: &str,
        user_id: &str,
        content: &str,
    ) -> Result<Option<GlobalMessage>> {
        self.record("edit_global_message")?;
        self.inner
            .edit_global_message(project_id, message_id, user_id, content)
            .await
    }

    async fn get_threads(&self, project_id: &str) -> Result<Vec<Thread>> {
        self.record("get_threads")?;
        self.inner.get_threads(project_id).await
    }

    async fn send_comment(
        &self,
        project_id: &str,
        thread_id: &str,
        user_id: &str,
        content: &str,
    ) -> Result<ThreadMessage> {
        self.record("send_comment")?;
        self.inner
            .send_comment(project_id, thread_id, user_id, content)
            .await
    }

    async fn resolve_thread(
        &self,
        project_id: &str,
        thread_id: &str,
        user_id: &str,
    ) -> Result<Option<ThreadState>> {
        self.record("resolve_thread")?;
        self.inner
            .resolve_thread(project_id, thread_id, user_id)
            .await
    }

    async fn reopen_thread(
        &self,
        project_id: &str,
        thread_id: &str,
    ) -> Result<Option<ThreadState>> {
        self.record("reopen_thread")?;
        self.inner.reopen_thread(project_id, thread_id).await
    }

    async fn delete_thread(&self, project_id: &str, thread_id: &str) -> Result<bool> {
        self.record("delete_thread")?;
        self.inner.delete_thread(project_id, thread_id).await
    }

    async fn edit_thread_message(
        &self,
        project_id: &str,
        thread_id: &str,
        message_id: &str,
        user_id: &str,
        content: &str,
    ) -> Result<Option<ThreadMessage>> {
        self.record("edit_thread_message")?;
        self.inner
            .edit_thread_message(project_id, thread_id, message_id, user_id, content)
            .await
    }

    async fn delete_thread_message(
        &self,
        project_id: &str,
        thread_id: &str,
        message_id: &str,
    ) -> Result<bool> {
        self.record("delete_thread_message")?;
        self.inner
            .delete_thread_message(project_id, thread_id, message_id)
            .await
    }
}

/// 记录所有广播事件
#[derive(Clone, Default)]
pub struct RecordingBroadcaster {
    journal: Journal,
    events: Arc<Mutex<Vec<(String, ChatEvent)>>>,
}

impl RecordingBroadcaster {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            events: Arc::default(),
        }
    }

    pub fn events(&self) -> Vec<(String, ChatEvent)> {
        self.events.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(|(_, event)| event.name()).collect()
    }
}

impl RoomBroadcaster for RecordingBroadcaster {
    fn emit(&self, project_id: &str, event: ChatEvent) {
        self.journal.push(format!("emit:{}", event.name()));
        self.events
            .lock()
            .unwrap()
            .push((project_id.to_string(), event));
    }
}

/// "broken" 用户查询总是失败
pub struct FlakyDirectory {
    inner: StaticIdentityResolver,
}

#[async_trait]
impl IdentityResolver for FlakyDirectory {
    async fn get_personal_info(&self, user_id: &str) -> Result<Option<PersonalInfo>> {
        if user_id == "broken" {
            return Err(anyhow!("identity service timeout"));
        }
        self.inner.get_personal_info(user_id).await
    }
}

/// 每次查询前等待固定时长
pub struct SlowDirectory {
    inner: FlakyDirectory,
    delay: Duration,
}

impl SlowDirectory {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: directory(),
            delay,
        }
    }
}

#[async_trait]
impl IdentityResolver for SlowDirectory {
    async fn get_personal_info(&self, user_id: &str) -> Result<Option<PersonalInfo>> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_personal_info(user_id).await
    }
}

pub fn person(id: &str, first_name: &str) -> PersonalInfo {
    PersonalInfo {
        id: id.to_string(),
        email: Some(format!("{id}@example.com")),
        first_name: Some(first_name.to_string()),
        last_name: None,
    }
}

pub fn directory() -> FlakyDirectory {
    FlakyDirectory {
        inner: StaticIdentityResolver::new([
            person("U1", "Ada"),
            person("U2", "Grace"),
            person("U3", "Linus"),
        ]),
    }
}

/// 记录收到的事件名
pub struct RecordingHook {
    pub journal: Journal,
}

#[async_trait]
impl PostCommitHook for RecordingHook {
    async fn handle(&self, ctx: &HookContext, event: &HookEvent) -> HookOutcome {
        self.journal
            .push(format!("hook:{}:{}", event.name, ctx.project_id));
        HookOutcome::Completed
    }
}

pub struct FailingHook;

#[async_trait]
impl PostCommitHook for FailingHook {
    async fn handle(&self, _ctx: &HookContext, _event: &HookEvent) -> HookOutcome {
        HookOutcome::Failed(FlareError::new(
            ErrorCode::OperationFailed,
            "downstream rejected event",
        ))
    }
}

pub struct PanickingHook;

#[async_trait]
impl PostCommitHook for PanickingHook {
    async fn handle(&self, _ctx: &HookContext, _event: &HookEvent) -> HookOutcome {
        panic!("listener bug");
    }
}

pub struct Harness {
    pub journal: Journal,
    pub repository: JournalRepository,
    pub broadcaster: RecordingBroadcaster,
    pub registry: Arc<HookRegistry>,
    pub service: ChatDomainService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_policy(AuthorizationPolicy::default())
    }

    pub fn with_policy(policy: AuthorizationPolicy) -> Self {
        let journal = Journal::default();
        let repository = JournalRepository::new(journal.clone());
        let broadcaster = RecordingBroadcaster::new(journal.clone());
        let registry = HookRegistry::new();
        let service = ChatDomainService::new(
            Arc::new(repository.clone()),
            Arc::new(directory()),
            Arc::new(broadcaster.clone()),
            HookDispatcher::new(registry.clone()),
            policy,
            ChatDomainConfig::default(),
        );
        Self {
            journal,
            repository,
            broadcaster,
            registry,
            service,
        }
    }

    pub async fn register_hook(&self, name: &str, priority: i32, hook: Arc<dyn PostCommitHook>) {
        self.registry
            .register_post_commit(
                HookMetadata::default()
                    .with_name(name)
                    .with_priority(priority),
                HookSelector::default(),
                hook,
            )
            .await;
    }
}
