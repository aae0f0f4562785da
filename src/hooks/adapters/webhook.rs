use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Serialize;
use sha2::Sha256;

use crate::error::{ErrorBuilder, ErrorCode, Result};

use super::super::config::HookDefinition;
use super::super::types::{HookContext, HookEvent, HookOutcome, PostCommitHook};

#[derive(Clone)]
pub struct WebhookHookFactory {
    client: Client,
}

impl WebhookHookFactory {
    pub fn new() -> Result<Self> {
        let client = Client::builder().use_rustls_tls().build().map_err(|err| {
            ErrorBuilder::new(ErrorCode::ConfigurationError, "failed to build http client")
                .details(err.to_string())
                .build_error()
        })?;
        Ok(Self { client })
    }

    pub fn build_post_commit(
        &self,
        def: &HookDefinition,
        endpoint: &str,
        secret: Option<String>,
        headers: HashMap<String, String>,
    ) -> Arc<dyn PostCommitHook> {
        Arc::new(WebhookPostCommitHook {
            client: self.client.clone(),
            endpoint: endpoint.to_string(),
            secret,
            headers,
            static_metadata: def.metadata.clone(),
        })
    }
}

#[derive(Serialize)]
struct WebhookContextPayload<'a> {
    project_id: &'a str,
    user_id: Option<&'a str>,
    attributes: &'a HashMap<String, String>,
}

#[derive(Serialize)]
struct PostCommitWebhookRequest<'a> {
    context: WebhookContextPayload<'a>,
    event: &'a HookEvent,
    metadata: &'a HashMap<String, String>,
}

pub(crate) const SIGNATURE_HEADER: &str = "x-flare-signature";

/// 请求体的 HMAC-SHA256 签名（十六进制）
pub(crate) fn sign_body(secret: &str, body: &[u8]) -> Result<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|err| {
        ErrorBuilder::new(ErrorCode::ConfigurationError, "invalid webhook secret")
            .details(err.to_string())
            .build_error()
    })?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn build_headers(
    request_builder: reqwest::RequestBuilder,
    signature: Option<String>,
    headers: &HashMap<String, String>,
) -> reqwest::RequestBuilder {
    let mut builder = request_builder.header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }
    for (key, value) in headers {
        builder = builder.header(key, value);
    }
    builder
}

#[derive(Clone)]
struct WebhookPostCommitHook {
    client: Client,
    endpoint: String,
    secret: Option<String>,
    headers: HashMap<String, String>,
    static_metadata: HashMap<String, String>,
}

#[async_trait]
impl PostCommitHook for WebhookPostCommitHook {
    async fn handle(&self, ctx: &HookContext, event: &HookEvent) -> HookOutcome {
        let request_body = PostCommitWebhookRequest {
            context: WebhookContextPayload {
                project_id: &ctx.project_id,
                user_id: ctx.user_id.as_deref(),
                attributes: &ctx.attributes,
            },
            event,
            metadata: &self.static_metadata,
        };

        let body = match serde_json::to_vec(&request_body) {
            Ok(body) => body,
            Err(err) => {
                return HookOutcome::Failed(
                    ErrorBuilder::new(ErrorCode::Internal, "failed to encode webhook payload")
                        .details(err.to_string())
                        .build_error(),
                );
            }
        };
        let signature = match self.secret.as_deref().map(|secret| sign_body(secret, &body)) {
            Some(Ok(signature)) => Some(signature),
            Some(Err(err)) => return HookOutcome::Failed(err),
            None => None,
        };

        let builder = self.client.post(&self.endpoint);
        let builder = build_headers(builder, signature, &self.headers);
        match builder.body(body).send().await {
            Ok(resp) if resp.status().is_success() => HookOutcome::Completed,
            Ok(resp) => HookOutcome::Failed(
                ErrorBuilder::new(ErrorCode::ServiceUnavailable, "webhook post-commit failed")
                    .details(resp.status().to_string())
                    .build_error(),
            ),
            Err(err) => HookOutcome::Failed(
                ErrorBuilder::new(ErrorCode::ServiceUnavailable, "webhook post-commit failed")
                    .details(err.to_string())
                    .build_error(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_depends_on_secret_and_body() {
        let a = sign_body("secret", b"{\"a\":1}").unwrap();
        let b = sign_body("secret", b"{\"a\":2}").unwrap();
        let c = sign_body("other", b"{\"a\":1}").unwrap();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, sign_body("secret", b"{\"a\":1}").unwrap());
    }
}
