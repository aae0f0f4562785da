use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use crate::domain::errors::ChatError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

pub fn status_for(err: &ChatError) -> StatusCode {
    match err {
        ChatError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
        ChatError::NotFound { .. } => StatusCode::NOT_FOUND,
        ChatError::InvalidContent(_) => StatusCode::BAD_REQUEST,
        ChatError::Storage(_) | ChatError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let message = match &self {
            // 存储错误细节只写日志
            ChatError::Storage(err) => {
                error!(error = ?err, "Chat request failed with storage error");
                "internal storage failure".to_string()
            }
            ChatError::Internal(detail) => {
                error!(error = %detail, "Chat request failed with internal error");
                "internal error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            code: self.code(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ChatOperation;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&ChatError::Unauthenticated {
                operation: ChatOperation::SendMessage
            }),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(&ChatError::not_found("thread", "t1")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&ChatError::InvalidContent("empty".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&ChatError::Storage(anyhow::anyhow!("db down"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&ChatError::Internal("task aborted".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
