//! # HTTP 接口
//!
//! 项目聊天与评论线程的 REST 路由。调用者身份由网关注入的请求头解析，
//! 写操作成功返回 204，发表评论返回补全后的消息。

mod error;
mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::trace::TraceLayer;

use crate::application::handlers::{ChatCommandHandler, ChatQueryHandler};
use crate::infrastructure::session::CallerIdentityResolverRef;

pub use error::status_for;
pub use handlers::{ContentBody, MessagesParams, SendMessageBody};

#[derive(Clone)]
pub struct HttpState {
    pub command_handler: Arc<ChatCommandHandler>,
    pub query_handler: Arc<ChatQueryHandler>,
    pub caller_resolver: CallerIdentityResolverRef,
}

impl HttpState {
    pub fn new(
        command_handler: Arc<ChatCommandHandler>,
        query_handler: Arc<ChatQueryHandler>,
        caller_resolver: CallerIdentityResolverRef,
    ) -> Self {
        Self {
            command_handler,
            query_handler,
            caller_resolver,
        }
    }
}

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/project/{project_id}/messages",
            get(handlers::get_messages).post(handlers::send_message),
        )
        .route(
            "/project/{project_id}/messages/{message_id}",
            delete(handlers::delete_message),
        )
        .route(
            "/project/{project_id}/messages/{message_id}/edit",
            post(handlers::edit_message),
        )
        .route("/project/{project_id}/threads", get(handlers::get_threads))
        .route(
            "/project/{project_id}/thread/{thread_id}",
            delete(handlers::delete_thread),
        )
        .route(
            "/project/{project_id}/thread/{thread_id}/messages",
            post(handlers::send_comment),
        )
        .route(
            "/project/{project_id}/thread/{thread_id}/resolve",
            post(handlers::resolve_thread),
        )
        .route(
            "/project/{project_id}/thread/{thread_id}/reopen",
            post(handlers::reopen_thread),
        )
        .route(
            "/project/{project_id}/thread/{thread_id}/messages/{message_id}",
            delete(handlers::delete_thread_message),
        )
        .route(
            "/project/{project_id}/thread/{thread_id}/messages/{message_id}/edit",
            post(handlers::edit_thread_message),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
