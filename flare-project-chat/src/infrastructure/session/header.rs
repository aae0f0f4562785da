//! 从网关注入的可信请求头中读取调用者身份

use axum::http::{HeaderMap, HeaderName};

use super::CallerIdentityResolver;

pub const DEFAULT_CALLER_HEADER: &str = "x-flare-user-id";

#[derive(Debug, Clone)]
pub struct HeaderCallerIdentityResolver {
    header: HeaderName,
}

impl Default for HeaderCallerIdentityResolver {
    fn default() -> Self {
        Self {
            header: HeaderName::from_static(DEFAULT_CALLER_HEADER),
        }
    }
}

impl HeaderCallerIdentityResolver {
    /// 非法的头名称回退到默认头
    pub fn new(header: &str) -> Self {
        match HeaderName::try_from(header.trim().to_ascii_lowercase()) {
            Ok(header) => Self { header },
            Err(err) => {
                tracing::warn!(header = %header, error = %err, "Invalid caller header, using default");
                Self::default()
            }
        }
    }

    pub fn header(&self) -> &HeaderName {
        &self.header
    }
}

impl CallerIdentityResolver for HeaderCallerIdentityResolver {
    fn resolve_caller_identity(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get(&self.header)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_reads_trimmed_header() {
        let resolver = HeaderCallerIdentityResolver::default();
        let mut headers = HeaderMap::new();
        headers.insert(DEFAULT_CALLER_HEADER, HeaderValue::from_static(" u1 "));
        assert_eq!(
            resolver.resolve_caller_identity(&headers),
            Some("u1".to_string())
        );
    }

    #[test]
    fn test_missing_or_blank_header_is_anonymous() {
        let resolver = HeaderCallerIdentityResolver::new("X-User");
        let mut headers = HeaderMap::new();
        assert_eq!(resolver.resolve_caller_identity(&headers), None);

        headers.insert("x-user", HeaderValue::from_static("   "));
        assert_eq!(resolver.resolve_caller_identity(&headers), None);
    }

    #[test]
    fn test_invalid_header_name_falls_back() {
        let resolver = HeaderCallerIdentityResolver::new("bad header");
        assert_eq!(resolver.header().as_str(), DEFAULT_CALLER_HEADER);
    }
}
