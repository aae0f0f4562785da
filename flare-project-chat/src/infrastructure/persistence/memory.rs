//! 内存版聊天仓储，每次写入在单个写锁区间内完成

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use flare_collab_core::utils::current_millis;
use tokio::sync::RwLock;
use ulid::Ulid;

use crate::domain::model::{GlobalMessage, Thread, ThreadMessage, ThreadState};
use crate::domain::repository::ChatRepository;

#[derive(Debug, Default)]
struct ProjectState {
    messages: Vec<GlobalMessage>,
    threads: HashMap<String, Thread>,
}

#[derive(Clone, Default)]
pub struct InMemoryChatRepository {
    projects: Arc<RwLock<HashMap<String, ProjectState>>>,
}

impl InMemoryChatRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn send_global_message(
        &self,
        project_id: &str,
        user_id: &str,
        content: &str,
    ) -> Result<GlobalMessage> {
        let message = GlobalMessage {
            id: Ulid::new().to_string(),
            project_id: project_id.to_string(),
            user_id: user_id.to_string(),
            content: content.to_string(),
            timestamp: current_millis(),
            edited_at: None,
        };

        let mut guard = self.projects.write().await;
        guard
            .entry(project_id.to_string())
            .or_default()
            .messages
            .push(message.clone());
        Ok(message)
    }

    async fn get_global_messages(
        &self,
        project_id: &str,
        limit: usize,
        before: Option<i64>,
    ) -> Result<Vec<GlobalMessage>> {
        let guard = self.projects.read().await;
        let Some(project) = guard.get(project_id) else {
            return Ok(Vec::new());
        };

        let mut messages: Vec<GlobalMessage> = project
            .messages
            .iter()
            .filter(|m| before.map(|ts| m.timestamp < ts).unwrap_or(true))
            .cloned()
            .collect();
        messages.sort_by(|a, b| (b.timestamp, &b.id).cmp(&(a.timestamp, &a.id)));
        messages.truncate(limit);
        Ok(messages)
    }

    async fn delete_global_message(&self, project_id: &str, message_id: &str) -> Result<bool> {
        let mut guard = self.projects.write().await;
        let Some(project) = guard.get_mut(project_id) else {
            return Ok(false);
        };
        let before = project.messages.len();
        project.messages.retain(|m| m.id != message_id);
        Ok(project.messages.len() != before)
    }

    async fn edit_global_message(
        &self,
        project_id: &str,
        message_id: &str,
        user_id: &str,
        content: &str,
    ) -> Result<Option<GlobalMessage>> {
        let mut guard = self.projects.write().await;
        let edited = guard.get_mut(project_id).and_then(|project| {
            project
                .messages
                .iter_mut()
                .find(|m| m.id == message_id && m.user_id == user_id)
                .map(|message| {
                    message.content = content.to_string();
                    message.edited_at = Some(current_millis());
                    message.clone()
                })
        });
        Ok(edited)
    }

    async fn get_threads(&self, project_id: &str) -> Result<Vec<Thread>> {
        let guard = self.projects.read().await;
        Ok(guard
            .get(project_id)
            .map(|project| project.threads.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn send_comment(
        &self,
        project_id: &str,
        thread_id: &str,
        user_id: &str,
        content: &str,
    ) -> Result<ThreadMessage> {
        let message = ThreadMessage {
            id: Ulid::new().to_string(),
            thread_id: thread_id.to_string(),
            user_id: user_id.to_string(),
            content: content.to_string(),
            timestamp: current_millis(),
            edited_at: None,
        };

        let mut guard = self.projects.write().await;
        guard
            .entry(project_id.to_string())
            .or_default()
            .threads
            .entry(thread_id.to_string())
            .or_insert_with(|| Thread::open(project_id, thread_id))
            .messages
            .push(message.clone());
        Ok(message)
    }

    async fn resolve_thread(
        &self,
        project_id: &str,
        thread_id: &str,
        user_id: &str,
    ) -> Result<Option<ThreadState>> {
        let mut guard = self.projects.write().await;
        let state = guard
            .get_mut(project_id)
            .and_then(|project| project.threads.get_mut(thread_id))
            .map(|thread| {
                thread.state.resolve(user_id, current_millis());
                thread.state.clone()
            });
        Ok(state)
    }

    async fn reopen_thread(
        &self,
        project_id: &str,
        thread_id: &str,
    ) -> Result<Option<ThreadState>> {
        let mut guard = self.projects.write().await;
        let state = guard
            .get_mut(project_id)
            .and_then(|project| project.threads.get_mut(thread_id))
            .map(|thread| {
                thread.state.reopen();
                thread.state.clone()
            });
        Ok(state)
    }

    async fn delete_thread(&self, project_id: &str, thread_id: &str) -> Result<bool> {
        let mut guard = self.projects.write().await;
        Ok(guard
            .get_mut(project_id)
            .and_then(|project| project.threads.remove(thread_id))
            .is_some())
    }

    async fn edit_thread_message(
        &self,
        project_id: &str,
        thread_id: &str,
        message_id: &str,
        user_id: &str,
        content: &str,
    ) -> Result<Option<ThreadMessage>> {
        let mut guard = self.projects.write().await;
        let edited = guard
            .get_mut(project_id)
            .and_then(|project| project.threads.get_mut(thread_id))
            .and_then(|thread| {
                thread
                    .messages
                    .iter_mut()
                    .find(|m| m.id == message_id && m.user_id == user_id)
            })
            .map(|message| {
                message.content = content.to_string();
                message.edited_at = Some(current_millis());
                message.clone()
            });
        Ok(edited)
    }

    async fn delete_thread_message(
        &self,
        project_id: &str,
        thread_id: &str,
        message_id: &str,
    ) -> Result<bool> {
        let mut guard = self.projects.write().await;
        let Some(thread) = guard
            .get_mut(project_id)
            .and_then(|project| project.threads.get_mut(thread_id))
        else {
            return Ok(false);
        };
        let before = thread.messages.len();
        thread.messages.retain(|m| m.id != message_id);
        Ok(thread.messages.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_global_messages_newest_first_and_before_exclusive() {
        let repo = InMemoryChatRepository::new();
        let mut sent = Vec::new();
        for content in ["one", "two", "three"] {
            sent.push(repo.send_global_message("p1", "u1", content).await.unwrap());
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let all = repo.get_global_messages("p1", 10, None).await.unwrap();
        let contents: Vec<_> = all.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["three", "two", "one"]);

        let older = repo
            .get_global_messages("p1", 10, Some(sent[2].timestamp))
            .await
            .unwrap();
        let contents: Vec<_> = older.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["two", "one"]);
    }

    #[tokio::test]
    async fn test_edit_is_scoped_to_author() {
        let repo = InMemoryChatRepository::new();
        let message = repo.send_global_message("p1", "u1", "hi").await.unwrap();

        let other = repo
            .edit_global_message("p1", &message.id, "u2", "hijack")
            .await
            .unwrap();
        assert!(other.is_none());

        let edited = repo
            .edit_global_message("p1", &message.id, "u1", "hello")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(edited.content, "hello");
        assert!(edited.edited_at.is_some());
    }

    #[tokio::test]
    async fn test_comment_creates_thread_and_delete_removes_messages() {
        let repo = InMemoryChatRepository::new();
        repo.send_comment("p1", "t1", "u1", "first").await.unwrap();
        repo.send_comment("p1", "t1", "u2", "second").await.unwrap();

        let threads = repo.get_threads("p1").await.unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].messages.len(), 2);
        assert_eq!(threads[0].state, ThreadState::Open);

        assert!(repo.delete_thread("p1", "t1").await.unwrap());
        assert!(repo.get_threads("p1").await.unwrap().is_empty());
        assert!(!repo.delete_thread("p1", "t1").await.unwrap());
    }

    #[tokio::test]
    async fn test_resolve_missing_thread_returns_none() {
        let repo = InMemoryChatRepository::new();
        assert!(repo.resolve_thread("p1", "nope", "u1").await.unwrap().is_none());
        assert!(repo.reopen_thread("p1", "nope").await.unwrap().is_none());
    }
}
