// ==========================================
// 旅游批发后台 - 报价 API
// ==========================================
// 职责: 价格文档建档、住宿报价、毛利查询
// 红线: 金额全程定点小数，只在出参时按展示精度舍入
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::config::PricingConfigReader;
use crate::domain::rate::{MarginResult, RateDocument, StayCostBreakdown, StayQuery};
use crate::domain::types::TenantId;
use crate::engine::margin::MarginCalculator;
use crate::engine::rate_resolver::RateResolver;
use crate::repository::rate_repo::RateRepository;
use rust_decimal::Decimal;
use tracing::instrument;

/// 单个档位金额上限 (每晚)
pub const MAX_TIER_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

// ==========================================
// PricingApi - 报价 API
// ==========================================
pub struct PricingApi {
    rate_repo: Arc<RateRepository>,
    config: Arc<dyn PricingConfigReader>,
}

impl PricingApi {
    /// 创建新的PricingApi实例
    pub fn new(rate_repo: Arc<RateRepository>, config: Arc<dyn PricingConfigReader>) -> Self {
        Self { rate_repo, config }
    }

    /// 价格文档建档
    ///
    /// # 校验
    /// - valid_from ≤ valid_to，包房窗口 start ≤ end
    /// - 至少一个档位，min_occupancy ≤ max_occupancy
    /// - 档位金额在 [0, MAX_TIER_AMOUNT]
    ///
    /// # 返回
    /// - Ok(rate_id): rate_id 为空时自动生成
    pub fn create_rate_document(&self, mut doc: RateDocument) -> ApiResult<String> {
        if doc.valid_from > doc.valid_to {
            return Err(ApiError::InvalidRange {
                from: doc.valid_from.to_string(),
                to: doc.valid_to.to_string(),
            });
        }
        if let Some((start, end)) = doc.block_window {
            if start > end {
                return Err(ApiError::InvalidInput(format!(
                    "包房窗口无效: {} ~ {}",
                    start, end
                )));
            }
        }
        if doc.occupancy_tiers.is_empty() {
            return Err(ApiError::InvalidInput("价格文档缺少入住人数档位".to_string()));
        }
        if let Some(tier) = doc
            .occupancy_tiers
            .iter()
            .chain(doc.extra_night_tiers.iter())
            .find(|t| t.min_occupancy > t.max_occupancy)
        {
            return Err(ApiError::InvalidInput(format!(
                "入住人数档位无效: {} > {}",
                tier.min_occupancy, tier.max_occupancy
            )));
        }
        if let Some(tier) = doc
            .occupancy_tiers
            .iter()
            .chain(doc.extra_night_tiers.iter())
            .find(|t| !amount_in_range(t.base_amount) || !amount_in_range(t.per_person_amount))
        {
            return Err(ApiError::InvalidInput(format!(
                "档位金额超出范围 [0, {}]: base={}, per_person={}",
                MAX_TIER_AMOUNT, tier.base_amount, tier.per_person_amount
            )));
        }

        if doc.rate_id.trim().is_empty() {
            doc.rate_id = uuid::Uuid::new_v4().to_string();
        }
        self.rate_repo.insert_document(&doc)?;
        tracing::info!(
            rate_id = %doc.rate_id,
            tenant_id = %doc.tenant_id,
            variant_id = doc.product_variant_id,
            supplier_id = ?doc.supplier_id,
            "价格文档已建档"
        );
        Ok(doc.rate_id)
    }

    /// 住宿报价
    ///
    /// # 参数
    /// - tenant_id: 调用方租户（必须与 query 一致）
    /// - query: supplier_id 为 None 时取对外售价，否则取该供应商成本
    ///
    /// # 返回
    /// - 按展示精度舍入后的报价明细
    #[instrument(skip(self, query), fields(
        %tenant_id,
        variant_id = query.product_variant_id,
        nights = query.nights(),
    ))]
    pub async fn quote_stay(
        &self,
        tenant_id: TenantId,
        query: StayQuery,
    ) -> ApiResult<StayCostBreakdown> {
        ensure_tenant(tenant_id, &query)?;
        let query = self.with_default_room_type(query).await?;
        let scale = self.display_scale().await?;

        let resolver = RateResolver::new(self.rate_repo.as_ref());
        let breakdown = resolver.resolve(&query).inspect_err(|e| {
            tracing::warn!(error = %e, "报价失败");
        })?;

        Ok(breakdown.rounded(scale))
    }

    /// 毛利查询
    ///
    /// # 参数
    /// - tenant_id: 调用方租户（必须与 query 一致）
    /// - query: 入住条件（其中的 supplier_id 会被忽略）
    /// - supplier_id: 成本侧供应商
    #[instrument(skip(self, query), fields(
        %tenant_id,
        variant_id = query.product_variant_id,
        nights = query.nights(),
    ))]
    pub async fn margin(
        &self,
        tenant_id: TenantId,
        query: StayQuery,
        supplier_id: i64,
    ) -> ApiResult<MarginResult> {
        ensure_tenant(tenant_id, &query)?;
        let query = self.with_default_room_type(query).await?;
        let scale = self.display_scale().await?;

        let calculator = MarginCalculator::new(self.rate_repo.as_ref());
        let result = calculator
            .calculate_margin(&query, supplier_id)
            .inspect_err(|e| {
                tracing::warn!(error = %e, supplier_id, "毛利计算失败");
            })?;

        Ok(result.rounded(scale))
    }

    async fn with_default_room_type(&self, query: StayQuery) -> ApiResult<StayQuery> {
        if !query.room_type.trim().is_empty() {
            return Ok(query);
        }
        let room_type = self
            .config
            .get_default_room_type()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        Ok(query.with_room_type(room_type))
    }

    async fn display_scale(&self) -> ApiResult<u32> {
        self.config
            .get_display_scale()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))
    }
}

fn amount_in_range(amount: Decimal) -> bool {
    amount >= Decimal::ZERO && amount <= MAX_TIER_AMOUNT
}

fn ensure_tenant(tenant_id: TenantId, query: &StayQuery) -> ApiResult<()> {
    if query.tenant_id != tenant_id {
        return Err(ApiError::InvalidInput(format!(
            "报价请求租户不一致: query.tenant_id={}, caller={}",
            query.tenant_id, tenant_id
        )));
    }
    Ok(())
}
