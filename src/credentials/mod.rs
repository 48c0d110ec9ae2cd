//! # 凭据存储模块
//!
//! 以门店 ID 为键保存商户访问令牌。授权服务在令牌交换成功后写入，
//! Webhook 服务按事件中的 `location_id` 读取。

mod memory;

pub use memory::MemoryCredentialStore;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::provider::TokenResult;

/// 已保存的商户凭据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub merchant_id: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredCredential {
    /// 由令牌交换结果构造
    #[must_use]
    pub fn from_token(token: &TokenResult) -> Self {
        Self {
            merchant_id: token.merchant_id.clone(),
            access_token: token.access_token.clone(),
            refresh_token: token.refresh_token.clone(),
            expires_at: token.expires_at,
            updated_at: Utc::now(),
        }
    }

    /// 在 `now` 时刻是否已过期（预留 `skew` 的提前量）
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        self.expires_at <= now + skew
    }

    /// 是否需要刷新
    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        self.refresh_token.is_some() && self.is_expired_at(Utc::now(), Duration::zero())
    }
}

/// 凭据存储接口
///
/// 每个键的读写各自串行化，不存在跨键事务。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// 按门店 ID 读取
    async fn get(&self, location_id: &str) -> Result<Option<StoredCredential>>;

    /// 写入或覆盖
    async fn set(&self, location_id: &str, credential: StoredCredential) -> Result<()>;

    /// 删除，返回是否存在
    async fn delete(&self, location_id: &str) -> Result<bool>;

    /// 某商户名下已保存的全部门店 ID
    async fn locations_for_merchant(&self, merchant_id: &str) -> Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::credential;

    #[test]
    fn test_expiry_check() {
        let now = Utc::now();
        let mut cred = credential("M1", "token");

        cred.expires_at = now - Duration::minutes(1);
        assert!(cred.is_expired_at(now, Duration::zero()));

        cred.expires_at = now + Duration::minutes(10);
        assert!(!cred.is_expired_at(now, Duration::zero()));
        assert!(cred.is_expired_at(now, Duration::minutes(15)));
    }

    #[test]
    fn test_needs_refresh_requires_refresh_token() {
        let mut cred = credential("M1", "token");
        cred.expires_at = Utc::now() - Duration::hours(1);
        assert!(cred.needs_refresh());

        cred.refresh_token = None;
        assert!(!cred.needs_refresh());
    }
}
