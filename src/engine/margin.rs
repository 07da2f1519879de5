// ==========================================
// 旅游批发后台 - 毛利计算引擎
// ==========================================
// 职责: 供应商成本 vs 对外售价 → 毛利额 / 毛利率
// 输入: StayQuery + supplier_id
// 输出: MarginResult
// 红线: 售价为 0 时报错,不返回 Infinity/NaN
// ==========================================

use crate::domain::rate::{MarginBreakdown, MarginResult, StayQuery};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::rate_resolver::{RateResolver, RateSource};
use rust_decimal::Decimal;
use tracing::instrument;

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

// ==========================================
// MarginCalculator - 毛利计算引擎
// ==========================================
// 两次取价之间的一致性由调用方保证 (同一事务或同一快照)
pub struct MarginCalculator<S> {
    resolver: RateResolver<S>,
}

impl<S: RateSource> MarginCalculator<S> {
    pub fn new(source: S) -> Self {
        Self {
            resolver: RateResolver::new(source),
        }
    }

    /// 计算毛利
    ///
    /// # 规则
    /// - 成本 = resolve(query, supplier_id)
    /// - 售价 = resolve(query, supplier_id = None)
    /// - margin = 售价 − 成本
    /// - margin_percentage = margin / 售价 × 100
    ///
    /// # 错误
    /// - NoRateFound / NoOccupancyTier: 原样透传 (不区分是哪一侧)
    /// - DivisionByZero: 售价为 0
    /// - AmountOverflow: 毛利或毛利率超出 Decimal 范围
    #[instrument(skip(self, query), fields(
        tenant_id = %query.tenant_id,
        variant_id = query.product_variant_id,
    ))]
    pub fn calculate_margin(&self, query: &StayQuery, supplier_id: i64) -> EngineResult<MarginResult> {
        let supplier = self
            .resolver
            .resolve(&query.clone().with_supplier(Some(supplier_id)))?;
        let selling = self.resolver.resolve(&query.clone().with_supplier(None))?;

        if selling.total_cost.is_zero() {
            return Err(EngineError::DivisionByZero);
        }

        let overflow = || EngineError::AmountOverflow {
            rate_id: selling.rate_id.clone(),
        };
        let margin = selling
            .total_cost
            .checked_sub(supplier.total_cost)
            .ok_or_else(overflow)?;
        let margin_percentage = margin
            .checked_div(selling.total_cost)
            .and_then(|ratio| ratio.checked_mul(ONE_HUNDRED))
            .ok_or_else(overflow)?;

        tracing::debug!(
            supplier_cost = %supplier.total_cost,
            selling_price = %selling.total_cost,
            %margin,
            "毛利计算完成"
        );

        Ok(MarginResult {
            supplier_cost: supplier.total_cost,
            selling_price: selling.total_cost,
            margin,
            margin_percentage,
            breakdown: MarginBreakdown { supplier, selling },
        })
    }
}

/// 计算毛利 (函数式入口)
pub fn calculate_margin<S: RateSource>(
    source: S,
    query: &StayQuery,
    supplier_id: i64,
) -> EngineResult<MarginResult> {
    MarginCalculator::new(source).calculate_margin(query, supplier_id)
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rate::{OccupancyTier, RateDocument};
    use crate::domain::types::{PricingModel, TenantId};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn document(rate_id: &str, supplier_id: Option<i64>, nightly: Decimal) -> RateDocument {
        RateDocument {
            rate_id: rate_id.to_string(),
            tenant_id: TenantId(1),
            product_variant_id: 100,
            supplier_id,
            room_type: "standard".to_string(),
            valid_from: date(2025, 1, 1),
            valid_to: date(2025, 12, 31),
            priority: 0,
            created_at: date(2025, 1, 1).and_hms_opt(0, 0, 0).unwrap(),
            block_window: None,
            seasons: vec![],
            occupancy_tiers: vec![OccupancyTier {
                min_occupancy: 1,
                max_occupancy: 4,
                pricing_model: PricingModel::Fixed,
                base_amount: nightly,
                per_person_amount: Decimal::ZERO,
            }],
            extra_night_tiers: vec![],
        }
    }

    fn query() -> StayQuery {
        StayQuery::new(TenantId(1), 100, date(2025, 6, 1), date(2025, 6, 3), 2)
    }

    #[test]
    fn test_margin_round_trip() {
        let rates = vec![
            document("COST", Some(7), dec!(150)),
            document("SELL", None, dec!(250)),
        ];
        let result = calculate_margin(&rates, &query(), 7).unwrap();

        assert_eq!(result.supplier_cost, dec!(300));
        assert_eq!(result.selling_price, dec!(500));
        assert_eq!(result.margin, dec!(200));
        assert_eq!(result.margin_percentage, dec!(40));
        assert_eq!(result.breakdown.supplier.rate_id, "COST");
        assert_eq!(result.breakdown.selling.rate_id, "SELL");
    }

    #[test]
    fn test_negative_margin() {
        let rates = vec![
            document("COST", Some(7), dec!(120)),
            document("SELL", None, dec!(100)),
        ];
        let result = calculate_margin(&rates, &query(), 7).unwrap();
        assert_eq!(result.margin, dec!(-40));
        assert_eq!(result.margin_percentage, dec!(-20));
    }

    #[test]
    fn test_zero_selling_price() {
        let rates = vec![
            document("COST", Some(7), dec!(100)),
            document("SELL", None, Decimal::ZERO),
        ];
        assert_eq!(
            calculate_margin(&rates, &query(), 7).unwrap_err(),
            EngineError::DivisionByZero
        );
    }

    #[test]
    fn test_margin_overflow_is_an_error() {
        // 两晚: 售价约 MAX/2，成本约 -MAX/2，差额超出范围
        let quarter_max = Decimal::MAX / dec!(4);
        let rates = vec![
            document("COST", Some(7), -quarter_max),
            document("SELL", None, quarter_max),
        ];
        let err = calculate_margin(&rates, &query(), 7).unwrap_err();
        assert!(matches!(err, EngineError::AmountOverflow { .. }));
    }

    #[test]
    fn test_missing_master_rate_propagates() {
        let rates = vec![document("COST", Some(7), dec!(100))];
        let err = calculate_margin(&rates, &query(), 7).unwrap_err();
        assert!(matches!(err, EngineError::NoRateFound { supplier_id: None, .. }));
    }

    #[test]
    fn test_rounded_for_display() {
        let rates = vec![
            document("COST", Some(7), dec!(100)),
            document("SELL", None, dec!(150)),
        ];
        // 100 / 300 × 100 = 33.333...
        let result = calculate_margin(&rates, &query(), 7).unwrap().rounded(2);
        assert_eq!(result.margin_percentage, dec!(33.33));
    }
}
