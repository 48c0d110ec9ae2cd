//! Webhook 事件模型

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 支付通知事件，只解析处理所需的字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    /// 提供商为每次事件分配的唯一 ID，重复投递时保持不变
    #[serde(default)]
    pub event_id: Option<String>,
    /// 事件所属商户；与门店凭据的商户不一致时只记录告警
    #[serde(default)]
    pub merchant_id: Option<String>,
    pub data: EventData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventData {
    pub object: EventObject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventObject {
    pub payment: Payment,
}

/// 事件中的支付对象
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub location_id: String,
    pub amount_money: Money,
}

/// 金额，`amount` 为最小货币单位
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: i64,
    pub currency: String,
}

impl WebhookEvent {
    #[must_use]
    pub fn payment(&self) -> &Payment {
        &self.data.object.payment
    }

    #[must_use]
    pub fn location_id(&self) -> &str {
        &self.data.object.payment.location_id
    }

    /// 事件声明的商户与给定商户不同时返回事件中的商户 ID
    #[must_use]
    pub fn foreign_merchant(&self, merchant_id: &str) -> Option<&str> {
        self.merchant_id
            .as_deref()
            .filter(|declared| !declared.is_empty() && *declared != merchant_id)
    }
}

/// 空请求体判定：`null`、`false`、`0`、空字符串、空数组、空对象都视为未收到 JSON
#[must_use]
pub fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
