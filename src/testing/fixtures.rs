//! # 测试数据 Fixtures
//!
//! 提供测试用的 Square 数据结构和预设数据

use chrono::{Duration, Utc};
use serde_json::{Value, json};

use crate::credentials::StoredCredential;
use crate::provider::{Location, Merchant, TokenResult};

/// 商户 fixture
pub fn merchant(id: &str, business_name: &str) -> Merchant {
    Merchant {
        id: id.to_string(),
        business_name: Some(business_name.to_string()),
        country: Some("US".to_string()),
        language_code: Some("en-US".to_string()),
        currency: Some("USD".to_string()),
        status: Some("ACTIVE".to_string()),
        main_location_id: None,
    }
}

/// 门店 fixture
pub fn location(id: &str, name: &str) -> Location {
    Location {
        id: id.to_string(),
        name: Some(name.to_string()),
        merchant_id: None,
        business_name: None,
        status: Some("ACTIVE".to_string()),
        timezone: Some("America/Los_Angeles".to_string()),
        currency: Some("USD".to_string()),
    }
}

/// 一小时后过期的令牌交换结果
pub fn token_result(merchant_id: &str, access_token: &str) -> TokenResult {
    TokenResult {
        access_token: access_token.to_string(),
        refresh_token: Some(format!("{access_token}-refresh")),
        expires_at: Utc::now() + Duration::hours(1),
        merchant_id: merchant_id.to_string(),
        token_type: Some("bearer".to_string()),
    }
}

/// 未过期的已存凭据
pub fn credential(merchant_id: &str, access_token: &str) -> StoredCredential {
    StoredCredential::from_token(&token_result(merchant_id, access_token))
}

/// 已过期且带刷新令牌的凭据
pub fn expired_credential(merchant_id: &str, access_token: &str) -> StoredCredential {
    let mut cred = credential(merchant_id, access_token);
    cred.expires_at = Utc::now() - Duration::hours(1);
    cred
}

/// `payment.created` 事件体
pub fn payment_event(event_id: &str, location_id: &str) -> Value {
    json!({
        "merchant_id": "M1",
        "type": "payment.created",
        "event_id": event_id,
        "created_at": "2026-10-16T08:00:00Z",
        "data": {
            "type": "payment",
            "id": "PAY-1",
            "object": {
                "payment": {
                    "id": "PAY-1",
                    "location_id": location_id,
                    "amount_money": { "amount": 1500, "currency": "USD" },
                    "status": "COMPLETED"
                }
            }
        }
    })
}
