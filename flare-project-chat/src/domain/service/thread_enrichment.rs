//! 用户信息补全服务
//!
//! 全局消息流与评论线程共用同一套例程：输入为「分组键 → 有序消息列表」，
//! 全局消息流视为键为 `global` 的单一分组。

use std::collections::{BTreeMap, BTreeSet, HashMap};

use futures::future::join_all;
use tracing::warn;

use crate::domain::model::{
    Authored, DisplayProfile, EnrichedMessage, GLOBAL_GROUP, GlobalMessage, Thread, ThreadState,
    ThreadView, format_personal_info,
};
use crate::domain::repository::IdentityResolverRef;

/// 补全结果：分组后的消息以及本批次解析到的全部用户信息
pub struct EnrichedGroups<K, M> {
    pub groups: BTreeMap<K, Vec<EnrichedMessage<M>>>,
    pub profiles: HashMap<String, DisplayProfile>,
}

pub struct ThreadEnrichmentService {
    identity: IdentityResolverRef,
}

impl ThreadEnrichmentService {
    pub fn new(identity: IdentityResolverRef) -> Self {
        Self { identity }
    }

    /// 单个用户的展示信息，查询失败时降级为占位信息
    pub async fn profile_for(&self, user_id: &str) -> DisplayProfile {
        match self.identity.get_personal_info(user_id).await {
            Ok(Some(info)) => format_personal_info(&info),
            Ok(None) => {
                warn!(user_id = %user_id, "Unknown user, using placeholder profile");
                DisplayProfile::placeholder(user_id)
            }
            Err(err) => {
                warn!(user_id = %user_id, error = %err, "Identity lookup failed, using placeholder profile");
                DisplayProfile::placeholder(user_id)
            }
        }
    }

    /// 去重后并发查询
    pub async fn resolve_profiles<I>(&self, user_ids: I) -> HashMap<String, DisplayProfile>
    where
        I: IntoIterator<Item = String>,
    {
        let distinct: BTreeSet<String> = user_ids.into_iter().collect();
        let lookups = distinct.iter().map(|user_id| async move {
            let profile = self.profile_for(user_id).await;
            (user_id.clone(), profile)
        });
        join_all(lookups).await.into_iter().collect()
    }

    /// 为每个分组内的消息附加作者信息，保持组内顺序
    pub async fn inject_user_info<K, M, I>(
        &self,
        groups: BTreeMap<K, Vec<M>>,
        extra_user_ids: I,
    ) -> EnrichedGroups<K, M>
    where
        K: Ord,
        M: Authored,
        I: IntoIterator<Item = String>,
    {
        let user_ids: Vec<String> = groups
            .values()
            .flat_map(|messages| messages.iter().map(|m| m.author_id().to_string()))
            .chain(extra_user_ids)
            .collect();
        let profiles = self.resolve_profiles(user_ids).await;

        let groups = groups
            .into_iter()
            .map(|(key, messages)| {
                let enriched = messages
                    .into_iter()
                    .map(|message| {
                        let user = lookup(&profiles, message.author_id());
                        EnrichedMessage::new(message, user)
                    })
                    .collect();
                (key, enriched)
            })
            .collect();

        EnrichedGroups { groups, profiles }
    }

    pub async fn enrich_global(
        &self,
        messages: Vec<GlobalMessage>,
    ) -> Vec<EnrichedMessage<GlobalMessage>> {
        let mut groups = BTreeMap::new();
        groups.insert(GLOBAL_GROUP, messages);
        let mut enriched = self.inject_user_info(groups, Vec::new()).await;
        enriched.groups.remove(&GLOBAL_GROUP).unwrap_or_default()
    }

    /// 线程 id → 线程视图；已解决线程的解决人与作者在同一批次中解析
    pub async fn enrich_threads(&self, threads: Vec<Thread>) -> BTreeMap<String, ThreadView> {
        let mut states: HashMap<String, ThreadState> = HashMap::new();
        let mut groups = BTreeMap::new();
        let mut resolvers = Vec::new();
        for thread in threads {
            if let Some(resolver) = thread.state.resolved_by() {
                resolvers.push(resolver.to_string());
            }
            states.insert(thread.id.clone(), thread.state);
            groups.insert(thread.id, thread.messages);
        }

        let enriched = self.inject_user_info(groups, resolvers).await;
        let profiles = enriched.profiles;

        enriched
            .groups
            .into_iter()
            .map(|(thread_id, messages)| {
                let state = states.remove(&thread_id).unwrap_or_default();
                let view = ThreadView {
                    messages,
                    resolved: state.is_resolved(),
                    resolved_by_user_id: state.resolved_by().map(str::to_string),
                    resolved_at: state.resolved_at(),
                    resolved_by_user: state.resolved_by().map(|id| lookup(&profiles, id)),
                };
                (thread_id, view)
            })
            .collect()
    }
}

fn lookup(profiles: &HashMap<String, DisplayProfile>, user_id: &str) -> DisplayProfile {
    profiles
        .get(user_id)
        .cloned()
        .unwrap_or_else(|| DisplayProfile::placeholder(user_id))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::{Result, anyhow};
    use async_trait::async_trait;

    use super::*;
    use crate::domain::model::{PersonalInfo, ThreadMessage};
    use crate::domain::repository::IdentityResolver;

    #[derive(Default)]
    struct Directory {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl IdentityResolver for Directory {
        async fn get_personal_info(&self, user_id: &str) -> Result<Option<PersonalInfo>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match user_id {
                "broken" => Err(anyhow!("identity service down")),
                "ghost" => Ok(None),
                _ => Ok(Some(PersonalInfo {
                    id: user_id.to_string(),
                    email: Some(format!("{user_id}@example.com")),
                    first_name: Some(user_id.to_uppercase()),
                    last_name: None,
                })),
            }
        }
    }

    fn thread_message(id: &str, thread_id: &str, user_id: &str) -> ThreadMessage {
        ThreadMessage {
            id: id.to_string(),
            thread_id: thread_id.to_string(),
            user_id: user_id.to_string(),
            content: format!("content {id}"),
            timestamp: 1,
            edited_at: None,
        }
    }

    #[tokio::test]
    async fn test_distinct_users_resolved_once() {
        let directory = Arc::new(Directory::default());
        let service = ThreadEnrichmentService::new(directory.clone());

        let mut thread = Thread::open("p1", "t1");
        thread.messages = vec![
            thread_message("m1", "t1", "alice"),
            thread_message("m2", "t1", "bob"),
            thread_message("m3", "t1", "alice"),
        ];
        thread.state.resolve("bob", 99);

        let views = service.enrich_threads(vec![thread]).await;

        assert_eq!(directory.calls.load(Ordering::SeqCst), 2);
        let view = &views["t1"];
        let ids: Vec<_> = view.messages.iter().map(|m| m.message.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
        assert!(view.resolved);
        assert_eq!(view.resolved_by_user_id.as_deref(), Some("bob"));
        assert_eq!(
            view.resolved_by_user.as_ref().and_then(|u| u.first_name.as_deref()),
            Some("BOB")
        );
    }

    #[tokio::test]
    async fn test_unknown_and_failing_users_degrade_to_placeholder() {
        let service = ThreadEnrichmentService::new(Arc::new(Directory::default()));
        let mut groups = BTreeMap::new();
        groups.insert(
            "t1",
            vec![
                thread_message("m1", "t1", "alice"),
                thread_message("m2", "t1", "ghost"),
                thread_message("m3", "t1", "broken"),
            ],
        );

        let enriched = service.inject_user_info(groups, Vec::new()).await;
        let messages = &enriched.groups["t1"];

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].user.email.as_deref(), Some("alice@example.com"));
        assert_eq!(messages[1].user, DisplayProfile::placeholder("ghost"));
        assert_eq!(messages[2].user, DisplayProfile::placeholder("broken"));
    }

    #[tokio::test]
    async fn test_open_thread_has_no_resolver_fields() {
        let service = ThreadEnrichmentService::new(Arc::new(Directory::default()));
        let views = service.enrich_threads(vec![Thread::open("p1", "t9")]).await;
        let view = &views["t9"];
        assert!(!view.resolved);
        assert!(view.messages.is_empty());
        assert!(view.resolved_by_user.is_none());
    }
}
