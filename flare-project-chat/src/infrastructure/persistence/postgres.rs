//! # PostgreSQL Chat Repository
//!
//! 全局消息与评论线程的 PostgreSQL 持久化实现。
//! 每个写操作是一条 SQL 语句（发表评论为一个事务），并发编辑按最后写入生效。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use flare_collab_core::config::PostgresInstanceConfig;
use flare_collab_core::utils::current_millis;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::{info, instrument};
use ulid::Ulid;

use crate::domain::model::{GlobalMessage, Thread, ThreadMessage, ThreadState};
use crate::domain::repository::ChatRepository;

const SCHEMA: [&str; 5] = [
    r#"
    CREATE TABLE IF NOT EXISTS project_chat_messages (
        id TEXT PRIMARY KEY,
        project_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        content TEXT NOT NULL,
        timestamp_ms BIGINT NOT NULL,
        edited_at_ms BIGINT
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_project_chat_messages_project_ts
        ON project_chat_messages (project_id, timestamp_ms DESC, id DESC)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS project_chat_threads (
        project_id TEXT NOT NULL,
        thread_id TEXT NOT NULL,
        resolved_by TEXT,
        resolved_at_ms BIGINT,
        PRIMARY KEY (project_id, thread_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS project_chat_thread_messages (
        id TEXT PRIMARY KEY,
        project_id TEXT NOT NULL,
        thread_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        content TEXT NOT NULL,
        timestamp_ms BIGINT NOT NULL,
        edited_at_ms BIGINT,
        FOREIGN KEY (project_id, thread_id)
            REFERENCES project_chat_threads (project_id, thread_id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_project_chat_thread_messages_thread
        ON project_chat_thread_messages (project_id, thread_id, timestamp_ms, id)
    "#,
];

/// PostgreSQL Chat Repository实现
pub struct PostgresChatRepository {
    pool: Arc<PgPool>,
}

impl PostgresChatRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// 按 profile 创建连接池
    pub async fn connect(config: &PostgresInstanceConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections.unwrap_or(20))
            .min_connections(config.min_connections.unwrap_or(1))
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.url)
            .await
            .with_context(|| "Failed to connect to chat message store")?;

        info!("Chat message store connection pool created");
        Ok(Self::new(Arc::new(pool)))
    }

    /// 创建表与索引（幂等）
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .context("Failed to apply chat schema")?;
        }
        Ok(())
    }

    fn global_message(row: &PgRow) -> GlobalMessage {
        GlobalMessage {
            id: row.get("id"),
            project_id: row.get("project_id"),
            user_id: row.get("user_id"),
            content: row.get("content"),
            timestamp: row.get("timestamp_ms"),
            edited_at: row.get("edited_at_ms"),
        }
    }

    fn thread_message(row: &PgRow) -> ThreadMessage {
        ThreadMessage {
            id: row.get("id"),
            thread_id: row.get("thread_id"),
            user_id: row.get("user_id"),
            content: row.get("content"),
            timestamp: row.get("timestamp_ms"),
            edited_at: row.get("edited_at_ms"),
        }
    }

    fn thread_state(row: &PgRow) -> ThreadState {
        ThreadState::from_columns(row.get("resolved_by"), row.get("resolved_at_ms"))
    }
}

#[async_trait]
impl ChatRepository for PostgresChatRepository {
    #[instrument(skip(self, content), fields(project_id = %project_id, user_id = %user_id))]
    async fn send_global_message(
        &self,
        project_id: &str,
        user_id: &str,
        content: &str,
    ) -> Result<GlobalMessage> {
        let row = sqlx::query(
            r#"
            INSERT INTO project_chat_messages (id, project_id, user_id, content, timestamp_ms)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, project_id, user_id, content, timestamp_ms, edited_at_ms
            "#,
        )
        .bind(Ulid::new().to_string())
        .bind(project_id)
        .bind(user_id)
        .bind(content)
        .bind(current_millis())
        .fetch_one(&*self.pool)
        .await
        .context("Failed to insert global message")?;

        Ok(Self::global_message(&row))
    }

    #[instrument(skip(self), fields(project_id = %project_id))]
    async fn get_global_messages(
        &self,
        project_id: &str,
        limit: usize,
        before: Option<i64>,
    ) -> Result<Vec<GlobalMessage>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            r#"
            SELECT id, project_id, user_id, content, timestamp_ms, edited_at_ms
            FROM project_chat_messages
            WHERE project_id = $1
              AND ($2::BIGINT IS NULL OR timestamp_ms < $2)
            ORDER BY timestamp_ms DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(project_id)
        .bind(before)
        .bind(limit)
        .fetch_all(&*self.pool)
        .await
        .context("Failed to load global messages")?;

        Ok(rows.iter().map(Self::global_message).collect())
    }

    #[instrument(skip(self), fields(project_id = %project_id, message_id = %message_id))]
    async fn delete_global_message(&self, project_id: &str, message_id: &str) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM project_chat_messages WHERE project_id = $1 AND id = $2")
                .bind(project_id)
                .bind(message_id)
                .execute(&*self.pool)
                .await
                .context("Failed to delete global message")?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, content), fields(project_id = %project_id, message_id = %message_id))]
    async fn edit_global_message(
        &self,
        project_id: &str,
        message_id: &str,
        user_id: &str,
        content: &str,
    ) -> Result<Option<GlobalMessage>> {
        let row = sqlx::query(
            r#"
            UPDATE project_chat_messages
            SET content = $4, edited_at_ms = $5
            WHERE project_id = $1 AND id = $2 AND user_id = $3
            RETURNING id, project_id, user_id, content, timestamp_ms, edited_at_ms
            "#,
        )
        .bind(project_id)
        .bind(message_id)
        .bind(user_id)
        .bind(content)
        .bind(current_millis())
        .fetch_optional(&*self.pool)
        .await
        .context("Failed to edit global message")?;

        Ok(row.as_ref().map(Self::global_message))
    }

    #[instrument(skip(self), fields(project_id = %project_id))]
    async fn get_threads(&self, project_id: &str) -> Result<Vec<Thread>> {
        let thread_rows = sqlx::query(
            r#"
            SELECT thread_id, resolved_by, resolved_at_ms
            FROM project_chat_threads
            WHERE project_id = $1
            "#,
        )
        .bind(project_id)
        .fetch_all(&*self.pool)
        .await
        .context("Failed to load threads")?;

        let message_rows = sqlx::query(
            r#"
            SELECT id, thread_id, user_id, content, timestamp_ms, edited_at_ms
            FROM project_chat_thread_messages
            WHERE project_id = $1
            ORDER BY timestamp_ms ASC, id ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(&*self.pool)
        .await
        .context("Failed to load thread messages")?;

        let mut messages: HashMap<String, Vec<ThreadMessage>> = HashMap::new();
        for row in &message_rows {
            let message = Self::thread_message(row);
            messages
                .entry(message.thread_id.clone())
                .or_default()
                .push(message);
        }

        Ok(thread_rows
            .iter()
            .map(|row| {
                let thread_id: String = row.get("thread_id");
                Thread {
                    messages: messages.remove(&thread_id).unwrap_or_default(),
                    state: Self::thread_state(row),
                    project_id: project_id.to_string(),
                    id: thread_id,
                }
            })
            .collect())
    }

    #[instrument(skip(self, content), fields(project_id = %project_id, thread_id = %thread_id))]
    async fn send_comment(
        &self,
        project_id: &str,
        thread_id: &str,
        user_id: &str,
        content: &str,
    ) -> Result<ThreadMessage> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin comment transaction")?;

        sqlx::query(
            r#"
            INSERT INTO project_chat_threads (project_id, thread_id)
            VALUES ($1, $2)
            ON CONFLICT (project_id, thread_id) DO NOTHING
            "#,
        )
        .bind(project_id)
        .bind(thread_id)
        .execute(&mut *tx)
        .await
        .context("Failed to create thread")?;

        let row = sqlx::query(
            r#"
            INSERT INTO project_chat_thread_messages
                (id, project_id, thread_id, user_id, content, timestamp_ms)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, thread_id, user_id, content, timestamp_ms, edited_at_ms
            "#,
        )
        .bind(Ulid::new().to_string())
        .bind(project_id)
        .bind(thread_id)
        .bind(user_id)
        .bind(content)
        .bind(current_millis())
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert comment")?;

        tx.commit()
            .await
            .context("Failed to commit comment transaction")?;
        Ok(Self::thread_message(&row))
    }

    #[instrument(skip(self), fields(project_id = %project_id, thread_id = %thread_id, user_id = %user_id))]
    async fn resolve_thread(
        &self,
        project_id: &str,
        thread_id: &str,
        user_id: &str,
    ) -> Result<Option<ThreadState>> {
        // 已解决的线程保留原解决人与解决时间
        let row = sqlx::query(
            r#"
            UPDATE project_chat_threads
            SET resolved_by = COALESCE(resolved_by, $3),
                resolved_at_ms = CASE WHEN resolved_by IS NULL THEN $4 ELSE resolved_at_ms END
            WHERE project_id = $1 AND thread_id = $2
            RETURNING resolved_by, resolved_at_ms
            "#,
        )
        .bind(project_id)
        .bind(thread_id)
        .bind(user_id)
        .bind(current_millis())
        .fetch_optional(&*self.pool)
        .await
        .context("Failed to resolve thread")?;

        Ok(row.as_ref().map(Self::thread_state))
    }

    #[instrument(skip(self), fields(project_id = %project_id, thread_id = %thread_id))]
    async fn reopen_thread(
        &self,
        project_id: &str,
        thread_id: &str,
    ) -> Result<Option<ThreadState>> {
        let row = sqlx::query(
            r#"
            UPDATE project_chat_threads
            SET resolved_by = NULL, resolved_at_ms = NULL
            WHERE project_id = $1 AND thread_id = $2
            RETURNING resolved_by, resolved_at_ms
            "#,
        )
        .bind(project_id)
        .bind(thread_id)
        .fetch_optional(&*self.pool)
        .await
        .context("Failed to reopen thread")?;

        Ok(row.as_ref().map(Self::thread_state))
    }

    #[instrument(skip(self), fields(project_id = %project_id, thread_id = %thread_id))]
    async fn delete_thread(&self, project_id: &str, thread_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM project_chat_threads WHERE project_id = $1 AND thread_id = $2",
        )
        .bind(project_id)
        .bind(thread_id)
        .execute(&*self.pool)
        .await
        .context("Failed to delete thread")?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, content), fields(thread_id = %thread_id, message_id = %message_id))]
    async fn edit_thread_message(
        &self,
        project_id: &str,
        thread_id: &str,
        message_id: &str,
        user_id: &str,
        content: &str,
    ) -> Result<Option<ThreadMessage>> {
        let row = sqlx::query(
            r#"
            UPDATE project_chat_thread_messages
            SET content = $5, edited_at_ms = $6
            WHERE project_id = $1 AND thread_id = $2 AND id = $3 AND user_id = $4
            RETURNING id, thread_id, user_id, content, timestamp_ms, edited_at_ms
            "#,
        )
        .bind(project_id)
        .bind(thread_id)
        .bind(message_id)
        .bind(user_id)
        .bind(content)
        .bind(current_millis())
        .fetch_optional(&*self.pool)
        .await
        .context("Failed to edit thread message")?;

        Ok(row.as_ref().map(Self::thread_message))
    }

    #[instrument(skip(self), fields(thread_id = %thread_id, message_id = %message_id))]
    async fn delete_thread_message(
        &self,
        project_id: &str,
        thread_id: &str,
        message_id: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM project_chat_thread_messages
            WHERE project_id = $1 AND thread_id = $2 AND id = $3
            "#,
        )
        .bind(project_id)
        .bind(thread_id)
        .bind(message_id)
        .execute(&*self.pool)
        .await
        .context("Failed to delete thread message")?;
        Ok(result.rows_affected() > 0)
    }
}
