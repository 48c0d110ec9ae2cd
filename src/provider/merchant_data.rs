//! # 商户数据查询
//!
//! 对提供商调用的薄封装：失败只记日志并返回 `None`，不向上抛出

use std::sync::Arc;

use super::traits::ProviderApi;
use super::types::{Location, Merchant};
use crate::logging::{LogComponent, LogStage, mask_secret};
use crate::{ldebug, lwarn};

/// 门店查询结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationInfo {
    /// 按 ID 命中的单个门店
    Single(Location),
    /// 未指定 ID 时返回的全部门店
    All(Vec<Location>),
}

impl LocationInfo {
    /// 单个门店的名称
    #[must_use]
    pub fn single_name(&self) -> Option<&str> {
        match self {
            Self::Single(location) => location.name.as_deref(),
            Self::All(_) => None,
        }
    }
}

/// 商户与门店查询服务
#[derive(Clone)]
pub struct MerchantData {
    api: Arc<dyn ProviderApi>,
}

impl MerchantData {
    pub fn new(api: Arc<dyn ProviderApi>) -> Self {
        Self { api }
    }

    /// 获取令牌所属商户
    pub async fn get_merchant_info(&self, access_token: &str) -> Option<Merchant> {
        match self.api.retrieve_merchant(access_token).await {
            Ok(merchant) => {
                ldebug!(
                    "system",
                    LogStage::Enrichment,
                    LogComponent::MerchantData,
                    "get_merchant_info",
                    &format!("获取商户成功: {}", merchant.id)
                );
                Some(merchant)
            }
            Err(err) => {
                lwarn!(
                    "system",
                    LogStage::Enrichment,
                    LogComponent::MerchantData,
                    "get_merchant_info",
                    &format!(
                        "获取商户失败 (token: {}): {err}",
                        mask_secret(access_token)
                    )
                );
                None
            }
        }
    }

    /// 获取门店信息
    ///
    /// 给定 `location_id` 时线性查找，找不到返回 `None`；
    /// 未给定（或为空）时返回全部门店。不处理分页。
    pub async fn get_location_info(
        &self,
        access_token: &str,
        location_id: Option<&str>,
    ) -> Option<LocationInfo> {
        let locations = match self.api.list_locations(access_token).await {
            Ok(locations) => locations,
            Err(err) => {
                lwarn!(
                    "system",
                    LogStage::Enrichment,
                    LogComponent::MerchantData,
                    "get_location_info",
                    &format!("获取门店列表失败: {err}")
                );
                return None;
            }
        };

        let Some(wanted) = location_id.filter(|id| !id.is_empty()) else {
            return Some(LocationInfo::All(locations));
        };

        if let Some(location) = locations.into_iter().find(|l| l.id == wanted) {
            Some(LocationInfo::Single(location))
        } else {
            lwarn!(
                "system",
                LogStage::Enrichment,
                LogComponent::MerchantData,
                "get_location_info",
                &format!("Location ID {wanted} not found.")
            );
            None
        }
    }
}
