use thiserror::Error;

use crate::domain::model::ChatOperation;

/// 聊天领域错误
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{operation} requires an authenticated caller")]
    Unauthenticated { operation: ChatOperation },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid content: {0}")]
    InvalidContent(String),

    #[error("storage failure: {0:#}")]
    Storage(anyhow::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        ChatError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ChatError::Unauthenticated { .. } => "UNAUTHENTICATED",
            ChatError::NotFound { .. } => "NOT_FOUND",
            ChatError::InvalidContent(_) => "INVALID_CONTENT",
            ChatError::Storage(_) => "STORAGE_FAILURE",
            ChatError::Internal(_) => "INTERNAL",
        }
    }
}

impl From<anyhow::Error> for ChatError {
    fn from(err: anyhow::Error) -> Self {
        ChatError::Storage(err)
    }
}

pub type ChatResult<T> = Result<T, ChatError>;
