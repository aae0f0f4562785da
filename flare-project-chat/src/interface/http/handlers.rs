use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

use super::HttpState;
use crate::application::commands::{
    DeleteMessageCommand, DeleteThreadMessageCommand, EditMessageCommand,
    EditThreadMessageCommand, SendCommentCommand, SendMessageCommand, ThreadCommand,
};
use crate::application::queries::{GetMessagesQuery, GetThreadsQuery};
use crate::domain::errors::ChatResult;
use crate::domain::model::{EnrichedMessage, GlobalMessage, ThreadMessage, ThreadView};

#[derive(Debug, Deserialize)]
pub struct SendMessageBody {
    pub content: String,
    #[serde(default, alias = "clientId")]
    pub client_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContentBody {
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct MessagesParams {
    pub limit: Option<usize>,
    pub before: Option<i64>,
}

impl HttpState {
    fn caller(&self, headers: &HeaderMap) -> Option<String> {
        self.caller_resolver.resolve_caller_identity(headers)
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn send_message(
    State(state): State<HttpState>,
    Path(project_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<SendMessageBody>,
) -> ChatResult<StatusCode> {
    state
        .command_handler
        .handle_send_message(SendMessageCommand {
            project_id,
            caller: state.caller(&headers),
            content: body.content,
            client_id: body.client_id,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_messages(
    State(state): State<HttpState>,
    Path(project_id): Path<String>,
    Query(params): Query<MessagesParams>,
    headers: HeaderMap,
) -> ChatResult<Json<Vec<EnrichedMessage<GlobalMessage>>>> {
    let messages = state
        .query_handler
        .handle_get_messages(GetMessagesQuery {
            project_id,
            caller: state.caller(&headers),
            limit: params.limit,
            before: params.before,
        })
        .await?;
    Ok(Json(messages))
}

pub async fn delete_message(
    State(state): State<HttpState>,
    Path((project_id, message_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> ChatResult<StatusCode> {
    state
        .command_handler
        .handle_delete_message(DeleteMessageCommand {
            project_id,
            message_id,
            caller: state.caller(&headers),
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn edit_message(
    State(state): State<HttpState>,
    Path((project_id, message_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<ContentBody>,
) -> ChatResult<StatusCode> {
    state
        .command_handler
        .handle_edit_message(EditMessageCommand {
            project_id,
            message_id,
            caller: state.caller(&headers),
            content: body.content,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_threads(
    State(state): State<HttpState>,
    Path(project_id): Path<String>,
    headers: HeaderMap,
) -> ChatResult<Json<BTreeMap<String, ThreadView>>> {
    let threads = state
        .query_handler
        .handle_get_threads(GetThreadsQuery {
            project_id,
            caller: state.caller(&headers),
        })
        .await?;
    Ok(Json(threads))
}

pub async fn send_comment(
    State(state): State<HttpState>,
    Path((project_id, thread_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<ContentBody>,
) -> ChatResult<Json<EnrichedMessage<ThreadMessage>>> {
    let message = state
        .command_handler
        .handle_send_comment(SendCommentCommand {
            project_id,
            thread_id,
            caller: state.caller(&headers),
            content: body.content,
        })
        .await?;
    Ok(Json(message))
}

fn thread_command(
    state: &HttpState,
    headers: &HeaderMap,
    project_id: String,
    thread_id: String,
) -> ThreadCommand {
    ThreadCommand {
        project_id,
        thread_id,
        caller: state.caller(headers),
    }
}

pub async fn resolve_thread(
    State(state): State<HttpState>,
    Path((project_id, thread_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> ChatResult<StatusCode> {
    let command = thread_command(&state, &headers, project_id, thread_id);
    state.command_handler.handle_resolve_thread(command).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reopen_thread(
    State(state): State<HttpState>,
    Path((project_id, thread_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> ChatResult<StatusCode> {
    let command = thread_command(&state, &headers, project_id, thread_id);
    state.command_handler.handle_reopen_thread(command).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_thread(
    State(state): State<HttpState>,
    Path((project_id, thread_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> ChatResult<StatusCode> {
    let command = thread_command(&state, &headers, project_id, thread_id);
    state.command_handler.handle_delete_thread(command).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn edit_thread_message(
    State(state): State<HttpState>,
    Path((project_id, thread_id, message_id)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(body): Json<ContentBody>,
) -> ChatResult<StatusCode> {
    state
        .command_handler
        .handle_edit_thread_message(EditThreadMessageCommand {
            project_id,
            thread_id,
            message_id,
            caller: state.caller(&headers),
            content: body.content,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_thread_message(
    State(state): State<HttpState>,
    Path((project_id, thread_id, message_id)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> ChatResult<StatusCode> {
    state
        .command_handler
        .handle_delete_thread_message(DeleteThreadMessageCommand {
            project_id,
            thread_id,
            message_id,
            caller: state.caller(&headers),
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
