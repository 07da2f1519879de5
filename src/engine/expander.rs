// ==========================================
// 旅游批发后台 - 配额日期展开引擎
// ==========================================
// 职责: 配额窗口 → 每日库存桶 (每个自然日一条)
// 输入: AllocationWindow
// 输出: DailyBuckets (惰性、有限、可重启的序列)
// 红线: 纯函数,不去重 (去重由持久层唯一键 + 跳过实现)
// ==========================================

use crate::domain::allocation::{AllocationWindow, DailyBucket};
use crate::domain::types::{is_weekend, AllocationType, Quantity};
use crate::engine::error::{EngineError, EngineResult};
use chrono::{Duration, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::instrument;

// ==========================================
// DateRangeExpander - 日期展开引擎
// ==========================================
pub struct DateRangeExpander {
    // 无状态引擎
}

impl DateRangeExpander {
    pub fn new() -> Self {
        Self {}
    }

    /// 展开配额窗口
    ///
    /// # 返回
    /// - Ok(DailyBuckets): valid_from..=valid_to 每天一条
    /// - Err(InvalidRange): valid_from > valid_to
    #[instrument(skip(self, window), fields(
        allocation_id = %window.allocation_id,
        from = %window.valid_from,
        to = %window.valid_to,
    ))]
    pub fn expand(&self, window: &AllocationWindow) -> EngineResult<DailyBuckets> {
        if window.valid_from > window.valid_to {
            return Err(EngineError::InvalidRange {
                from: window.valid_from,
                to: window.valid_to,
            });
        }

        tracing::debug!(days = window.day_count(), "展开配额窗口");
        Ok(DailyBuckets {
            window: window.clone(),
            cursor: Some(window.valid_from),
        })
    }

    /// 计算某天的库存数量
    ///
    /// # 规则
    /// 1) freesale → Unlimited
    /// 2) 周六/周日 → round_half_up(default_quantity × weekend_multiplier)
    /// 3) 其他 → default_quantity
    pub fn quantity_for(window: &AllocationWindow, date: NaiveDate) -> Quantity {
        if window.allocation_type == AllocationType::Freesale {
            return Quantity::Unlimited;
        }
        if !is_weekend(date) {
            return Quantity::Limited(window.default_quantity);
        }

        let raw = Decimal::from(window.default_quantity) * window.weekend_multiplier;
        let rounded = raw.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        if rounded.is_sign_negative() {
            return Quantity::Limited(0);
        }
        Quantity::Limited(rounded.to_u32().unwrap_or(u32::MAX))
    }
}

impl Default for DateRangeExpander {
    fn default() -> Self {
        Self::new()
    }
}

/// 展开配额窗口 (函数式入口)
pub fn expand_allocation_window(window: &AllocationWindow) -> EngineResult<DailyBuckets> {
    DateRangeExpander::new().expand(window)
}

// ==========================================
// DailyBuckets - 惰性库存桶序列
// ==========================================
// 单遍消费;restart() 得到从头开始的新序列
#[derive(Debug, Clone)]
pub struct DailyBuckets {
    window: AllocationWindow,
    cursor: Option<NaiveDate>,
}

impl DailyBuckets {
    /// 从窗口起始日重新开始
    pub fn restart(&self) -> Self {
        Self {
            window: self.window.clone(),
            cursor: Some(self.window.valid_from),
        }
    }
}

impl Iterator for DailyBuckets {
    type Item = DailyBucket;

    fn next(&mut self) -> Option<Self::Item> {
        let date = self.cursor?;
        self.cursor = if date < self.window.valid_to {
            Some(date + Duration::days(1))
        } else {
            None
        };

        Some(DailyBucket {
            tenant_id: self.window.tenant_id,
            product_variant_id: self.window.product_variant_id,
            supplier_id: self.window.supplier_id,
            date,
            quantity: DateRangeExpander::quantity_for(&self.window, date),
            booked: 0,
            held: 0,
            stop_sell: false,
            blackout: false,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.cursor {
            Some(date) => ((self.window.valid_to - date).num_days() + 1) as usize,
            None => 0,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DailyBuckets {}

impl std::iter::FusedIterator for DailyBuckets {}
