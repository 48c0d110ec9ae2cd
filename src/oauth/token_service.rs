//! # 令牌生命周期服务
//!
//! - 授权码交换成功后，把凭据绑定到商户的全部门店
//! - Webhook 使用前发现令牌过期时，刷新一次并更新该商户的全部门店

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::credentials::{CredentialStore, StoredCredential};
use crate::logging::{LogComponent, LogStage, mask_secret};
use crate::provider::{ProviderApi, ProviderError, TokenRequest, TokenResult};
use crate::{linfo, lwarn};

/// 授权码交换结果
#[derive(Debug, Clone)]
pub struct ExchangeOutcome {
    /// 提供商返回的令牌
    pub token: TokenResult,
    /// 已写入凭据存储的门店 ID，门店查询失败时为空
    pub bound_locations: Vec<String>,
}

/// 令牌交换与刷新
pub struct TokenService {
    api: Arc<dyn ProviderApi>,
    store: Arc<dyn CredentialStore>,
    client_id: String,
    client_secret: String,
    /// merchant_id -> 刷新锁，避免同一商户并发刷新
    refresh_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl TokenService {
    pub fn new(
        api: Arc<dyn ProviderApi>,
        store: Arc<dyn CredentialStore>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            api,
            store,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_locks: DashMap::new(),
        }
    }

    /// 用授权码换取令牌并保存
    ///
    /// 只有令牌交换本身失败才返回错误；门店绑定失败只记录警告。
    pub async fn exchange_code(
        &self,
        request_id: &str,
        code: &str,
    ) -> Result<ExchangeOutcome, ProviderError> {
        let request = TokenRequest::authorization_code(&self.client_id, &self.client_secret, code);
        let token = self.api.obtain_token(&request).await?;

        linfo!(
            request_id,
            LogStage::TokenExchange,
            LogComponent::OAuth,
            "exchange_code",
            &format!(
                "✅ 令牌交换成功: merchant_id={}, access_token={}, expires_at={}",
                token.merchant_id,
                mask_secret(&token.access_token),
                token.expires_at
            )
        );

        let bound_locations = self.bind_locations(request_id, &token).await;
        Ok(ExchangeOutcome {
            token,
            bound_locations,
        })
    }

    async fn bind_locations(&self, request_id: &str, token: &TokenResult) -> Vec<String> {
        let locations = match self.api.list_locations(&token.access_token).await {
            Ok(locations) => locations,
            Err(err) => {
                lwarn!(
                    request_id,
                    LogStage::TokenExchange,
                    LogComponent::CredentialStore,
                    "bind_locations",
                    &format!(
                        "⚠️ 获取门店失败，凭据未保存: merchant_id={}, error={err}",
                        token.merchant_id
                    )
                );
                return Vec::new();
            }
        };

        let credential = StoredCredential::from_token(token);
        let mut bound = Vec::with_capacity(locations.len());
        for location in locations {
            match self.store.set(&location.id, credential.clone()).await {
                Ok(()) => bound.push(location.id),
                Err(err) => lwarn!(
                    request_id,
                    LogStage::TokenExchange,
                    LogComponent::CredentialStore,
                    "bind_locations",
                    &format!("⚠️ 保存凭据失败: location_id={}, error={err}", location.id)
                ),
            }
        }

        linfo!(
            request_id,
            LogStage::TokenExchange,
            LogComponent::CredentialStore,
            "bind_locations",
            &format!(
                "凭据已绑定 {} 个门店: merchant_id={}",
                bound.len(),
                token.merchant_id
            )
        );
        bound
    }

    /// 凭据过期且有刷新令牌时刷新一次，失败则继续使用原凭据
    pub async fn ensure_fresh(
        &self,
        request_id: &str,
        location_id: &str,
        credential: StoredCredential,
    ) -> StoredCredential {
        if !credential.needs_refresh() {
            return credential;
        }

        let lock = self
            .refresh_locks
            .entry(credential.merchant_id.clone())
            .or_default()
            .clone();
        let _guard = lock.lock().await;

        // 等锁期间可能已被其他请求刷新
        let current = match self.store.get(location_id).await {
            Ok(Some(stored)) if stored.merchant_id == credential.merchant_id => stored,
            _ => credential,
        };
        if !current.needs_refresh() {
            return current;
        }

        match self.refresh(request_id, &current).await {
            Some(refreshed) => refreshed,
            None => current,
        }
    }

    async fn refresh(
        &self,
        request_id: &str,
        credential: &StoredCredential,
    ) -> Option<StoredCredential> {
        let refresh_token = credential.refresh_token.as_deref()?;
        let request =
            TokenRequest::refresh_token(&self.client_id, &self.client_secret, refresh_token);

        let token = match self.api.obtain_token(&request).await {
            Ok(token) => token,
            Err(err) => {
                lwarn!(
                    request_id,
                    LogStage::TokenRefresh,
                    LogComponent::OAuth,
                    "refresh_token",
                    &format!(
                        "⚠️ 令牌刷新失败，继续使用原令牌: merchant_id={}, error={err}",
                        credential.merchant_id
                    )
                );
                return None;
            }
        };

        let mut refreshed = StoredCredential::from_token(&token);
        if refreshed.refresh_token.is_none() {
            refreshed.refresh_token.clone_from(&credential.refresh_token);
        }

        let locations = self
            .store
            .locations_for_merchant(&credential.merchant_id)
            .await
            .unwrap_or_default();
        for location_id in &locations {
            if let Err(err) = self.store.set(location_id, refreshed.clone()).await {
                lwarn!(
                    request_id,
                    LogStage::TokenRefresh,
                    LogComponent::CredentialStore,
                    "refresh_token",
                    &format!("⚠️ 更新凭据失败: location_id={location_id}, error={err}")
                );
            }
        }

        linfo!(
            request_id,
            LogStage::TokenRefresh,
            LogComponent::OAuth,
            "refresh_token",
            &format!(
                "🔄 令牌已刷新: merchant_id={}, access_token={}, locations={}",
                refreshed.merchant_id,
                mask_secret(&refreshed.access_token),
                locations.len()
            )
        );
        Some(refreshed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryCredentialStore;
    use crate::provider::{ApiError, MockProviderApi, TokenGrant};
    use crate::testing::fixtures::{credential, expired_credential, location, token_result};
    use pretty_assertions::assert_eq;

    fn service(api: MockProviderApi, store: Arc<MemoryCredentialStore>) -> TokenService {
        TokenService::new(Arc::new(api), store, "sq0idp-app", "sq0csp-secret")
    }

    #[tokio::test]
    async fn test_exchange_binds_every_location() {
        let mut api = MockProviderApi::new();
        api.expect_obtain_token()
            .withf(|req| {
                req.grant
                    == TokenGrant::AuthorizationCode {
                        code: "code-1".to_string(),
                    }
            })
            .times(1)
            .returning(|_| Ok(token_result("M1", "EAAA-new")));
        api.expect_list_locations()
            .withf(|token| token.to_string() == "EAAA-new")
            .times(1)
            .returning(|_| Ok(vec![location("L1", "Downtown"), location("L2", "Airport")]));
        let store = Arc::new(MemoryCredentialStore::new());

        let outcome = service(api, Arc::clone(&store))
            .exchange_code("req", "code-1")
            .await
            .unwrap();

        assert_eq!(outcome.bound_locations, vec!["L1".to_string(), "L2".to_string()]);
        let stored = store.get("L2").await.unwrap().unwrap();
        assert_eq!(stored.access_token, "EAAA-new");
        assert_eq!(stored.merchant_id, "M1");
    }

    #[tokio::test]
    async fn test_exchange_succeeds_when_location_listing_fails() {
        let mut api = MockProviderApi::new();
        api.expect_obtain_token()
            .times(1)
            .returning(|_| Ok(token_result("M1", "EAAA-new")));
        api.expect_list_locations()
            .times(1)
            .returning(|_| Err(ProviderError::Timeout { seconds: 10 }));
        let store = Arc::new(MemoryCredentialStore::new());

        let outcome = service(api, Arc::clone(&store))
            .exchange_code("req", "code-1")
            .await
            .unwrap();

        assert!(outcome.bound_locations.is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_exchange_failure_is_returned() {
        let mut api = MockProviderApi::new();
        api.expect_obtain_token().times(1).returning(|_| {
            Err(ProviderError::Api {
                status: 400,
                errors: vec![ApiError::new("INVALID_REQUEST_ERROR", "BAD_CODE", "expired")],
            })
        });
        api.expect_list_locations().never();

        let err = service(api, Arc::new(MemoryCredentialStore::new()))
            .exchange_code("req", "code-1")
            .await
            .unwrap_err();

        assert_eq!(err.errors()[0].code, "BAD_CODE");
    }

    #[tokio::test]
    async fn test_fresh_credential_is_not_refreshed() {
        let mut api = MockProviderApi::new();
        api.expect_obtain_token().never();
        let store = Arc::new(MemoryCredentialStore::new());

        let cred = credential("M1", "EAAA-live");
        let result = service(api, store).ensure_fresh("req", "L1", cred.clone()).await;
        assert_eq!(result, cred);
    }

    #[tokio::test]
    async fn test_expired_credential_refreshes_all_locations() {
        let mut api = MockProviderApi::new();
        api.expect_obtain_token()
            .withf(|req| matches!(&req.grant, TokenGrant::RefreshToken { refresh_token } if refresh_token == "EAAA-old-refresh"))
            .times(1)
            .returning(|_| Ok(token_result("M1", "EAAA-rotated")));
        let store = Arc::new(MemoryCredentialStore::new());
        let old = expired_credential("M1", "EAAA-old");
        store.set("L1", old.clone()).await.unwrap();
        store.set("L2", old.clone()).await.unwrap();
        store.set("L3", credential("M2", "other")).await.unwrap();

        let result = service(api, Arc::clone(&store)).ensure_fresh("req", "L1", old).await;

        assert_eq!(result.access_token, "EAAA-rotated");
        assert_eq!(store.get("L2").await.unwrap().unwrap().access_token, "EAAA-rotated");
        assert_eq!(store.get("L3").await.unwrap().unwrap().access_token, "other");
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_stored_token() {
        let mut api = MockProviderApi::new();
        api.expect_obtain_token()
            .times(1)
            .returning(|_| Err(ProviderError::Network("connection reset".to_string())));
        let store = Arc::new(MemoryCredentialStore::new());
        let old = expired_credential("M1", "EAAA-old");
        store.set("L1", old.clone()).await.unwrap();

        let result = service(api, Arc::clone(&store)).ensure_fresh("req", "L1", old.clone()).await;

        assert_eq!(result, old);
        assert_eq!(store.get("L1").await.unwrap().unwrap(), old);
    }
}
