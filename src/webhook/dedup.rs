//! 重复投递检测

use moka::future::Cache;
use std::time::Duration;

use crate::config::WebhookConfig;

/// 记住已处理过的 `event_id`
#[derive(Clone)]
pub struct EventDeduplicator {
    seen: Cache<String, ()>,
}

impl EventDeduplicator {
    #[must_use]
    pub fn new(config: &WebhookConfig) -> Self {
        Self {
            seen: Cache::builder()
                .max_capacity(config.dedup_max_entries)
                .time_to_live(Duration::from_secs(config.dedup_ttl_seconds))
                .build(),
        }
    }

    /// 登记事件，首次出现返回 true
    pub async fn claim(&self, event_id: &str) -> bool {
        self.seen.entry_by_ref(event_id).or_insert(()).await.is_fresh()
    }

    /// 处理失败时撤销登记，允许提供商重新投递
    pub async fn release(&self, event_id: &str) {
        self.seen.invalidate(event_id).await;
    }
}
