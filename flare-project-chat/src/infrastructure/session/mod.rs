//! 请求级调用者身份解析

pub mod header;

use std::sync::Arc;

use axum::http::HeaderMap;

pub use header::{DEFAULT_CALLER_HEADER, HeaderCallerIdentityResolver};

/// 从请求头中解析已认证的调用者
pub trait CallerIdentityResolver: Send + Sync {
    fn resolve_caller_identity(&self, headers: &HeaderMap) -> Option<String>;
}

pub type CallerIdentityResolverRef = Arc<dyn CallerIdentityResolver>;
