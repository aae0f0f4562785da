//! Flare Collab Core 错误工具模块
//!
//! - 统一定义基础设施层（配置、Hook）使用的错误类型
//! - 提供 `ErrorBuilder` 便捷构建带详情的错误

use std::fmt;

use thiserror::Error;

/// 错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidParameter,
    ConfigurationError,
    DeserializationError,
    OperationTimeout,
    OperationFailed,
    ServiceUnavailable,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidParameter => "INVALID_PARAMETER",
            ErrorCode::ConfigurationError => "CONFIGURATION_ERROR",
            ErrorCode::DeserializationError => "DESERIALIZATION_ERROR",
            ErrorCode::OperationTimeout => "OPERATION_TIMEOUT",
            ErrorCode::OperationFailed => "OPERATION_FAILED",
            ErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flare 通用错误
#[derive(Debug, Clone, Error)]
#[error("[{code}] {message}{}", details_suffix(.details))]
pub struct FlareError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl FlareError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }
}

fn details_suffix(details: &Option<String>) -> String {
    details
        .as_deref()
        .map(|d| format!(" ({d})"))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, FlareError>;

/// 错误构建器
pub struct ErrorBuilder {
    code: ErrorCode,
    message: String,
    details: Option<String>,
}

impl ErrorBuilder {
    pub fn new(code: ErrorCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn details<T: Into<String>>(mut self, details: T) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn build_error(self) -> FlareError {
        FlareError {
            code: self.code,
            message: self.message,
            details: self.details,
        }
    }
}

impl From<anyhow::Error> for FlareError {
    fn from(err: anyhow::Error) -> Self {
        ErrorBuilder::new(ErrorCode::Internal, "unexpected error")
            .details(format!("{err:#}"))
            .build_error()
    }
}
