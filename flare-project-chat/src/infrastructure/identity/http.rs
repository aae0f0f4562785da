//! # HTTP 用户服务适配器
//!
//! 调用 `GET {endpoint}/user/{user_id}/personal_info`，404 表示用户不存在。

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};

use crate::domain::model::PersonalInfo;
use crate::domain::repository::IdentityResolver;

pub struct HttpIdentityResolver {
    client: Client,
    endpoint: String,
}

impl HttpIdentityResolver {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build identity http client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    fn personal_info_url(&self, user_id: &str) -> String {
        format!("{}/user/{}/personal_info", self.endpoint, user_id)
    }
}

#[async_trait]
impl IdentityResolver for HttpIdentityResolver {
    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn get_personal_info(&self, user_id: &str) -> Result<Option<PersonalInfo>> {
        let response = self
            .client
            .get(self.personal_info_url(user_id))
            .send()
            .await
            .with_context(|| format!("identity request failed for user {user_id}"))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(user_id = %user_id, "User not found in identity service");
            return Ok(None);
        }

        let info = response
            .error_for_status()
            .context("identity service returned error status")?
            .json::<PersonalInfo>()
            .await
            .context("failed to decode personal info")?;
        Ok(Some(info))
    }
}
