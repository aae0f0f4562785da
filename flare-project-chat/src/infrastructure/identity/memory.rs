use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::model::PersonalInfo;
use crate::domain::repository::IdentityResolver;

/// 进程内用户目录，用于本地开发与测试
#[derive(Clone, Default)]
pub struct StaticIdentityResolver {
    users: Arc<RwLock<HashMap<String, PersonalInfo>>>,
}

impl StaticIdentityResolver {
    pub fn new(users: impl IntoIterator<Item = PersonalInfo>) -> Self {
        let users = users
            .into_iter()
            .map(|info| (info.id.clone(), info))
            .collect();
        Self {
            users: Arc::new(RwLock::new(users)),
        }
    }

    pub async fn insert(&self, info: PersonalInfo) {
        self.users.write().await.insert(info.id.clone(), info);
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentityResolver {
    async fn get_personal_info(&self, user_id: &str) -> Result<Option<PersonalInfo>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }
}
