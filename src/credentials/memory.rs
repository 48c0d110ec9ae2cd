//! 基于 `DashMap` 的内存凭据存储

use async_trait::async_trait;
use dashmap::DashMap;

use super::{CredentialStore, StoredCredential};
use crate::error::Result;

/// 进程内凭据存储，重启后丢失
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: DashMap<String, StoredCredential>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前保存的门店数量
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, location_id: &str) -> Result<Option<StoredCredential>> {
        Ok(self.entries.get(location_id).map(|entry| entry.value().clone()))
    }

    async fn set(&self, location_id: &str, credential: StoredCredential) -> Result<()> {
        self.entries.insert(location_id.to_string(), credential);
        Ok(())
    }

    async fn delete(&self, location_id: &str) -> Result<bool> {
        Ok(self.entries.remove(location_id).is_some())
    }

    async fn locations_for_merchant(&self, merchant_id: &str) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.value().merchant_id == merchant_id)
            .map(|entry| entry.key().clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}
