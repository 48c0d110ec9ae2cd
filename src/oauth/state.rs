//! 防伪造 state 存储
//!
//! 每次访问入口页生成一个随机 state，回调时一次性消费

use moka::future::Cache;
use oauth2::CsrfToken;
use std::time::Duration;

/// 最多同时保留的未消费 state 数
const MAX_PENDING_STATES: u64 = 10_000;

/// 带过期时间的 state 存储
#[derive(Clone)]
pub struct StateStore {
    pending: Cache<String, ()>,
}

impl StateStore {
    /// 创建存储，`ttl` 之后未使用的 state 自动失效
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            pending: Cache::builder()
                .max_capacity(MAX_PENDING_STATES)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// 生成并登记新的 state
    pub async fn issue(&self) -> String {
        let state = CsrfToken::new_random().secret().clone();
        self.pending.insert(state.clone(), ()).await;
        state
    }

    /// 消费 state，仅当其存在且未被使用过时返回 true
    pub async fn consume(&self, state: &str) -> bool {
        // get 会跳过已过期条目；remove 保证并发下只有一个调用者成功
        if self.pending.get(state).await.is_none() {
            return false;
        }
        self.pending.remove(state).await.is_some()
    }
}
