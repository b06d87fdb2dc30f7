//! 操作者身份来源

/// 当前操作者身份提供者
///
/// 没有会话上下文时返回 None，钩子会跳过身份字段
pub trait IdentityProvider: Send + Sync {
    fn current_username(&self) -> Option<String>;
}

/// 固定身份
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    username: Option<String>,
}

impl StaticIdentity {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
        }
    }

    /// 匿名身份
    pub fn anonymous() -> Self {
        Self { username: None }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_username(&self) -> Option<String> {
        self.username.clone()
    }
}
