// ==========================================
// 旅游批发后台 - 价格领域模型
// ==========================================
// 职责: 价格文档 / 季节限制 / 入住人数档位 / 报价结果
// 对齐: rate_document、rate_season、rate_occupancy_tier 表
// 红线: 金额一律使用 Decimal,只在展示时取整
// ==========================================

use crate::domain::types::{DowMask, PricingModel, TenantId};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// 未指定房型时使用的默认房型
pub const DEFAULT_ROOM_TYPE: &str = "standard";

// ==========================================
// Season - 季节限制
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub season_from: NaiveDate,
    pub season_to: NaiveDate, // 包含
    pub dow_mask: DowMask,
    pub min_stay: Option<u32>,
    pub max_stay: Option<u32>,
    pub min_pax: Option<u32>,
    pub max_pax: Option<u32>,
}

impl Season {
    /// 判断该季节是否接受此次入住
    ///
    /// # 规则
    /// - 入住日落在 [season_from, season_to] 且星期命中掩码
    /// - 晚数满足 min_stay / max_stay (未设置则不限)
    /// - 人数满足 min_pax / max_pax (未设置则不限)
    pub fn admits(&self, check_in: NaiveDate, nights: u32, pax: u32) -> bool {
        if check_in < self.season_from || check_in > self.season_to {
            return false;
        }
        if !self.dow_mask.contains_date(check_in) {
            return false;
        }
        let within = |value: u32, min: Option<u32>, max: Option<u32>| {
            min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m)
        };
        within(nights, self.min_stay, self.max_stay) && within(pax, self.min_pax, self.max_pax)
    }
}

// ==========================================
// OccupancyTier - 入住人数档位
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyTier {
    pub min_occupancy: u32,
    pub max_occupancy: u32,
    pub pricing_model: PricingModel,
    pub base_amount: Decimal,
    pub per_person_amount: Decimal,
}

impl OccupancyTier {
    pub fn matches(&self, occupancy: u32) -> bool {
        self.min_occupancy <= occupancy && occupancy <= self.max_occupancy
    }

    /// 每晚价格
    ///
    /// - fixed → base_amount
    /// - base_plus_pax → base_amount + per_person_amount × occupancy
    ///
    /// 金额超出 Decimal 表示范围时返回 None
    pub fn nightly_rate(&self, occupancy: u32) -> Option<Decimal> {
        match self.pricing_model {
            PricingModel::Fixed => Some(self.base_amount),
            PricingModel::BasePlusPax => self
                .per_person_amount
                .checked_mul(Decimal::from(occupancy))
                .and_then(|pax| self.base_amount.checked_add(pax)),
        }
    }
}

// ==========================================
// RateDocument - 价格文档
// ==========================================
// supplier_id = None 表示本组织对外售价 (master rate)
// 同一变体多份命中时: priority 高者胜,再按 created_at 新者胜
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateDocument {
    pub rate_id: String,
    pub tenant_id: TenantId,
    pub product_variant_id: i64,
    pub supplier_id: Option<i64>,
    pub room_type: String,

    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate, // 包含
    pub priority: i32,
    pub created_at: NaiveDateTime,

    /// 合同包房窗口 [block_start, block_end),None 表示整个有效期都算包房
    pub block_window: Option<(NaiveDate, NaiveDate)>,

    pub seasons: Vec<Season>,
    pub occupancy_tiers: Vec<OccupancyTier>,
    /// 包房窗口外的加晚档位,为空时沿用 occupancy_tiers
    pub extra_night_tiers: Vec<OccupancyTier>,
}

impl RateDocument {
    /// 有效期是否覆盖 [check_in, check_out) 的每一晚
    pub fn covers(&self, check_in: NaiveDate, check_out: NaiveDate) -> bool {
        let last_night = check_out - Duration::days(1);
        self.valid_from <= check_in && last_night <= self.valid_to
    }

    /// 季节限制是否放行 (无季节配置则不限制)
    pub fn admits_stay(&self, check_in: NaiveDate, nights: u32, pax: u32) -> bool {
        self.seasons.is_empty() || self.seasons.iter().any(|s| s.admits(check_in, nights, pax))
    }

    pub fn block_tiers(&self) -> &[OccupancyTier] {
        &self.occupancy_tiers
    }

    pub fn extra_tiers(&self) -> &[OccupancyTier] {
        if self.extra_night_tiers.is_empty() {
            &self.occupancy_tiers
        } else {
            &self.extra_night_tiers
        }
    }
}

// ==========================================
// StayQuery - 报价请求
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayQuery {
    pub tenant_id: TenantId,
    pub product_variant_id: i64,
    pub supplier_id: Option<i64>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate, // 离店日,不计晚
    pub occupancy: u32,
    pub room_type: String,
}

impl StayQuery {
    pub fn new(
        tenant_id: TenantId,
        product_variant_id: i64,
        check_in: NaiveDate,
        check_out: NaiveDate,
        occupancy: u32,
    ) -> Self {
        Self {
            tenant_id,
            product_variant_id,
            supplier_id: None,
            check_in,
            check_out,
            occupancy,
            room_type: DEFAULT_ROOM_TYPE.to_string(),
        }
    }

    pub fn with_supplier(mut self, supplier_id: Option<i64>) -> Self {
        self.supplier_id = supplier_id;
        self
    }

    pub fn with_room_type(mut self, room_type: impl Into<String>) -> Self {
        self.room_type = room_type.into();
        self
    }

    /// 入住晚数 (离店日早于等于入住日时为 0)
    pub fn nights(&self) -> u32 {
        (self.check_out - self.check_in).num_days().max(0) as u32
    }
}

// ==========================================
// StayCostBreakdown - 报价明细
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayCostBreakdown {
    pub rate_id: String,
    pub total_cost: Decimal,

    pub block_nights: u32,
    pub extra_before_nights: u32,
    pub extra_after_nights: u32,

    pub block_cost: Decimal,
    pub extra_before_cost: Decimal,
    pub extra_after_cost: Decimal,

    /// 对应区段无晚数时为 None
    pub block_rate: Option<Decimal>,
    pub extra_before_rate: Option<Decimal>,
    pub extra_after_rate: Option<Decimal>,
}

impl StayCostBreakdown {
    pub fn total_nights(&self) -> u32 {
        self.block_nights + self.extra_before_nights + self.extra_after_nights
    }

    /// 展示用取整 (四舍五入到 scale 位小数)
    pub fn rounded(&self, scale: u32) -> Self {
        let r = |d: Decimal| round_money(d, scale);
        Self {
            rate_id: self.rate_id.clone(),
            total_cost: r(self.total_cost),
            block_nights: self.block_nights,
            extra_before_nights: self.extra_before_nights,
            extra_after_nights: self.extra_after_nights,
            block_cost: r(self.block_cost),
            extra_before_cost: r(self.extra_before_cost),
            extra_after_cost: r(self.extra_after_cost),
            block_rate: self.block_rate.map(r),
            extra_before_rate: self.extra_before_rate.map(r),
            extra_after_rate: self.extra_after_rate.map(r),
        }
    }
}

// ==========================================
// MarginResult - 毛利结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginResult {
    pub supplier_cost: Decimal,
    pub selling_price: Decimal,
    pub margin: Decimal,
    pub margin_percentage: Decimal,
    pub breakdown: MarginBreakdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginBreakdown {
    pub supplier: StayCostBreakdown,
    pub selling: StayCostBreakdown,
}

impl MarginResult {
    /// 展示用取整
    pub fn rounded(&self, scale: u32) -> Self {
        Self {
            supplier_cost: round_money(self.supplier_cost, scale),
            selling_price: round_money(self.selling_price, scale),
            margin: round_money(self.margin, scale),
            margin_percentage: round_money(self.margin_percentage, scale),
            breakdown: MarginBreakdown {
                supplier: self.breakdown.supplier.rounded(scale),
                selling: self.breakdown.selling.rounded(scale),
            },
        }
    }
}

/// 金额取整: 四舍五入 (0.5 远离零)
pub fn round_money(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}
