// ==========================================
// 旅游批发后台 - 配额领域模型
// ==========================================
// 职责: 配额窗口 / 每日库存桶 / 释放预警
// 对齐: allocation_window 表、daily_bucket 表
// ==========================================

use crate::domain::types::{AllocationType, Quantity, ReleaseUrgency, TenantId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// AllocationWindow - 配额窗口
// ==========================================
// 红线: valid_from ≤ valid_to (两端均包含)
// 用途: 合同谈定后一次性展开为每日库存桶
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationWindow {
    // ===== 主键 =====
    pub allocation_id: String,
    pub tenant_id: TenantId,

    // ===== 归属 =====
    pub product_variant_id: i64,
    pub supplier_id: i64,

    // ===== 有效期 =====
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate, // 包含

    // ===== 数量规则 =====
    pub default_quantity: u32,
    pub weekend_multiplier: Decimal, // ≥ 0
    pub allocation_type: AllocationType,

    // ===== 释放策略 =====
    pub release_days: Option<u32>, // None 表示无释放期
}

impl AllocationWindow {
    /// 窗口覆盖的天数 (非法区间返回 0)
    pub fn day_count(&self) -> usize {
        if self.valid_from > self.valid_to {
            return 0;
        }
        ((self.valid_to - self.valid_from).num_days() + 1) as usize
    }
}

// ==========================================
// DailyBucket - 每日库存桶
// ==========================================
// 唯一键: (tenant_id, product_variant_id, supplier_id, date)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBucket {
    pub tenant_id: TenantId,
    pub product_variant_id: i64,
    pub supplier_id: i64,
    pub date: NaiveDate,

    pub quantity: Quantity,
    pub booked: u32,
    pub held: u32,
    pub stop_sell: bool,
    pub blackout: bool,
}

impl DailyBucket {
    /// 当日剩余可售数量 (停售/封房日视为 0)
    pub fn available(&self) -> Quantity {
        if self.stop_sell || self.blackout {
            return Quantity::Limited(0);
        }
        self.quantity
            .saturating_sub(self.booked.saturating_add(self.held))
    }
}

// ==========================================
// ReleaseWarning - 释放预警 (只读视图,不落库)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseWarning {
    pub release_date: NaiveDate,
    pub days_until_release: i64, // 可为负数 (已过释放日)
    pub urgency: ReleaseUrgency,
}

// ==========================================
// AllocationReleaseRow - 列表用的预警行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationReleaseRow {
    pub allocation_id: String,
    pub product_variant_id: i64,
    pub supplier_id: i64,
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate,
    pub available: Quantity,
    pub warning: ReleaseWarning,
}
