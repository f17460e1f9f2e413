use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 请求级别的调用者身份
///
/// 由上游可信代理注入的身份头解析而来，显式传入需要它的服务调用。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/context.ts")]
pub struct RequestContext {
    pub user_id: String,
    pub email: Option<String>,
    // 开发环境下使用的本地替身用户
    pub is_development_user: bool,
}

impl RequestContext {
    pub fn new(user_id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email,
            is_development_user: false,
        }
    }

    pub fn development(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            is_development_user: true,
        }
    }
}
