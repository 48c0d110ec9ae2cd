//! # Webhook 模块
//!
//! 接收提供商的支付通知，关联已保存的凭据并补全商户数据

mod dedup;
mod event;
mod processor;

pub use dedup::EventDeduplicator;
pub use event::{EventData, EventObject, Money, Payment, WebhookEvent, is_empty_payload};
pub use processor::{Enrichment, WebhookOutcome, WebhookProcessor};
