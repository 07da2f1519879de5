// ==========================================
// 旅游批发后台 - 配额 API
// ==========================================
// 职责: 配额窗口建档与展开、库存汇总、释放预警列表
// 红线: 所有读写带租户；业务计算交给引擎
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::config::PricingConfigReader;
use crate::domain::allocation::{AllocationReleaseRow, AllocationWindow};
use crate::domain::types::TenantId;
use crate::engine::expander::DateRangeExpander;
use crate::engine::inventory::InventorySummary;
use crate::engine::release::ReleaseUrgencyClassifier;
use crate::repository::allocation_repo::AllocationRepository;
use tracing::instrument;

// ==========================================
// ExpansionReport - 展开结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionReport {
    pub allocation_id: String,
    pub days: usize,    // 窗口覆盖天数
    pub inserted: usize, // 新写入的库存桶
    pub skipped: usize,  // 已存在而跳过的库存桶
    pub batches: usize,
}

// ==========================================
// AllocationApi - 配额 API
// ==========================================
pub struct AllocationApi {
    allocation_repo: Arc<AllocationRepository>,
    config: Arc<dyn PricingConfigReader>,
    expander: DateRangeExpander,
}

impl AllocationApi {
    /// 创建新的AllocationApi实例
    pub fn new(
        allocation_repo: Arc<AllocationRepository>,
        config: Arc<dyn PricingConfigReader>,
    ) -> Self {
        Self {
            allocation_repo,
            config,
            expander: DateRangeExpander::new(),
        }
    }

    /// 配额窗口建档并展开为每日库存桶
    ///
    /// # 参数
    /// - tenant_id: 调用方租户（窗口租户必须一致）
    /// - window: 配额窗口
    ///
    /// # 返回
    /// - Ok(ExpansionReport): 展开统计
    /// - Err(ApiError::InvalidRange): valid_from > valid_to，此时不落库
    /// - Err(ApiError::InvalidInput): 周末系数为负或周末数量溢出
    ///
    /// 窗口与库存桶同一事务写入，失败时什么都不留，可直接重试
    #[instrument(skip(self, window), fields(
        %tenant_id,
        allocation_id = %window.allocation_id,
        days = window.day_count(),
    ))]
    pub async fn create_and_expand(
        &self,
        tenant_id: TenantId,
        window: &AllocationWindow,
    ) -> ApiResult<ExpansionReport> {
        ensure_tenant(tenant_id, window)?;
        validate_window(window)?;

        // 先展开校验区间、读取批大小，再单事务建档
        let buckets = self.expander.expand(window)?;
        let batch_size = self
            .config
            .get_bucket_batch_size()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        let report = self
            .allocation_repo
            .create_window_with_buckets(window, buckets, batch_size)?;

        tracing::info!(
            tenant_id = %tenant_id,
            allocation_id = %window.allocation_id,
            inserted = report.inserted,
            skipped = report.skipped,
            batches = report.batches,
            "配额窗口已展开"
        );

        Ok(ExpansionReport {
            allocation_id: window.allocation_id.clone(),
            days: window.day_count(),
            inserted: report.inserted,
            skipped: report.skipped,
            batches: report.batches,
        })
    }

    /// 重新展开已建档的配额窗口
    ///
    /// 已存在的库存桶保持不变（含 booked/held），只补齐缺失日期
    #[instrument(skip(self))]
    pub async fn reexpand(
        &self,
        tenant_id: TenantId,
        allocation_id: &str,
    ) -> ApiResult<ExpansionReport> {
        let window = self
            .allocation_repo
            .find_window(tenant_id, allocation_id)?
            .ok_or_else(|| ApiError::NotFound(allocation_id.to_string()))?;

        let buckets = self.expander.expand(&window)?;
        let batch_size = self
            .config
            .get_bucket_batch_size()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        let report = self.allocation_repo.upsert_buckets(buckets, batch_size)?;

        tracing::info!(
            tenant_id = %tenant_id,
            allocation_id,
            inserted = report.inserted,
            skipped = report.skipped,
            "配额窗口已重新展开"
        );

        Ok(ExpansionReport {
            allocation_id: window.allocation_id.clone(),
            days: window.day_count(),
            inserted: report.inserted,
            skipped: report.skipped,
            batches: report.batches,
        })
    }

    /// 查询库存汇总（两端包含）
    pub fn inventory_summary(
        &self,
        tenant_id: TenantId,
        product_variant_id: i64,
        supplier_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ApiResult<InventorySummary> {
        if from > to {
            return Err(ApiError::InvalidRange {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        let buckets = self
            .allocation_repo
            .find_buckets(tenant_id, product_variant_id, supplier_id, from, to)?;
        Ok(InventorySummary::from_buckets(&buckets))
    }

    /// 释放预警列表
    ///
    /// # 规则
    /// - 只看设置了释放期的窗口
    /// - days_until_release 落在 [listing_min_days, warning_days] 且剩余可售 > 0 才纳入
    /// - 按 days_until_release 升序（同天按 allocation_id）
    #[instrument(skip(self), fields(%tenant_id, %as_of))]
    pub async fn list_release_warnings(
        &self,
        tenant_id: TenantId,
        as_of: NaiveDate,
    ) -> ApiResult<Vec<AllocationReleaseRow>> {
        let thresholds = self
            .config
            .get_release_thresholds()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        let classifier = ReleaseUrgencyClassifier::new(thresholds);

        let windows = self.allocation_repo.list_windows_with_release(tenant_id)?;
        let mut rows = Vec::new();

        for window in windows {
            let Some(warning) = classifier.classify(window.valid_from, window.release_days, as_of)
            else {
                continue;
            };

            let buckets = self.allocation_repo.find_buckets(
                tenant_id,
                window.product_variant_id,
                window.supplier_id,
                window.valid_from,
                window.valid_to,
            )?;
            let summary = InventorySummary::from_buckets(&buckets);

            if !classifier.include_in_listing(&warning, summary.available) {
                continue;
            }

            rows.push(AllocationReleaseRow {
                allocation_id: window.allocation_id,
                product_variant_id: window.product_variant_id,
                supplier_id: window.supplier_id,
                valid_from: window.valid_from,
                valid_to: window.valid_to,
                available: summary.available,
                warning,
            });
        }

        rows.sort_by(|a, b| {
            a.warning
                .days_until_release
                .cmp(&b.warning.days_until_release)
                .then_with(|| a.allocation_id.cmp(&b.allocation_id))
        });

        tracing::debug!(tenant_id = %tenant_id, %as_of, count = rows.len(), "释放预警列表");
        Ok(rows)
    }
}

/// 校验窗口数量参数: 周末系数 ≥ 0，且周末数量仍在 u32 范围内
fn validate_window(window: &AllocationWindow) -> ApiResult<()> {
    if window.weekend_multiplier < Decimal::ZERO {
        return Err(ApiError::InvalidInput(format!(
            "周末系数不能为负: {}",
            window.weekend_multiplier
        )));
    }
    let weekend_quantity = Decimal::from(window.default_quantity)
        .checked_mul(window.weekend_multiplier)
        .map(|raw| raw.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|rounded| rounded.to_u32());
    if weekend_quantity.is_none() {
        return Err(ApiError::InvalidInput(format!(
            "周末数量超出范围: {} × {}",
            window.default_quantity, window.weekend_multiplier
        )));
    }
    Ok(())
}

fn ensure_tenant(tenant_id: TenantId, window: &AllocationWindow) -> ApiResult<()> {
    if window.tenant_id != tenant_id {
        return Err(ApiError::InvalidInput(format!(
            "配额窗口租户不一致: window.tenant_id={}, caller={}",
            window.tenant_id, tenant_id
        )));
    }
    Ok(())
}
