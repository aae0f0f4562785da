use serde::{Deserialize, Serialize};

/// 用户服务返回的个人信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalInfo {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// 附加在消息上的作者展示信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayProfile {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl DisplayProfile {
    /// 用户不存在或查询失败时使用的占位信息，仅包含 id
    pub fn placeholder(user_id: impl Into<String>) -> Self {
        Self {
            id: user_id.into(),
            email: None,
            first_name: None,
            last_name: None,
        }
    }
}

pub fn format_personal_info(info: &PersonalInfo) -> DisplayProfile {
    DisplayProfile {
        id: info.id.clone(),
        email: info.email.clone(),
        first_name: info.first_name.clone(),
        last_name: info.last_name.clone(),
    }
}
