// ==========================================
// 旅游批发后台 - 领域类型定义
// ==========================================
// 职责: 配额 / 价格核心共用的值类型
// 红线: "不限量"必须是显式标签,不允许用 null 表达
// ==========================================

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 租户 (Tenant)
// ==========================================
// 所有读写都必须带显式租户上下文,不存在模块级默认组织
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub i64);

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ==========================================
// 库存数量 (Quantity)
// ==========================================
// Limited(n): 有限配额; Unlimited: 自由销售,永不售罄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Quantity {
    Limited(u32),
    Unlimited,
}

impl Quantity {
    /// 从数据库可空列还原 (NULL → Unlimited)
    pub fn from_db(value: Option<i64>) -> Self {
        match value {
            Some(n) => Quantity::Limited(n.clamp(0, u32::MAX as i64) as u32),
            None => Quantity::Unlimited,
        }
    }

    /// 转换为数据库可空列 (Unlimited → NULL)
    pub fn to_db(&self) -> Option<i64> {
        match self {
            Quantity::Limited(n) => Some(*n as i64),
            Quantity::Unlimited => None,
        }
    }

    /// 扣减已占用数量,有限配额不会低于 0
    pub fn saturating_sub(&self, used: u32) -> Self {
        match self {
            Quantity::Limited(n) => Quantity::Limited(n.saturating_sub(used)),
            Quantity::Unlimited => Quantity::Unlimited,
        }
    }

    /// 两个数量相加,任一方不限量则结果不限量
    pub fn combine(&self, other: Quantity) -> Self {
        match (self, other) {
            (Quantity::Limited(a), Quantity::Limited(b)) => Quantity::Limited(a.saturating_add(b)),
            _ => Quantity::Unlimited,
        }
    }

    /// 是否仍有可售数量
    pub fn is_available(&self) -> bool {
        match self {
            Quantity::Limited(n) => *n > 0,
            Quantity::Unlimited => true,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Limited(n) => write!(f, "{}", n),
            Quantity::Unlimited => write!(f, "UNLIMITED"),
        }
    }
}

// ==========================================
// 配额类型 (Allocation Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationType {
    Committed, // 包销
    Freesale,  // 自由销售
    OnRequest, // 需确认
}

impl fmt::Display for AllocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl AllocationType {
    /// 从字符串解析配额类型
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "committed" => Some(AllocationType::Committed),
            "freesale" => Some(AllocationType::Freesale),
            "on_request" => Some(AllocationType::OnRequest),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AllocationType::Committed => "committed",
            AllocationType::Freesale => "freesale",
            AllocationType::OnRequest => "on_request",
        }
    }
}

// ==========================================
// 释放紧急等级 (Release Urgency)
// ==========================================
// 等级制,按 days_until_release 全序: Critical < Urgent < Warning < Safe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseUrgency {
    Critical, // ≤ 3 天
    Urgent,   // ≤ 7 天
    Warning,  // ≤ 30 天
    Safe,     // 其他
}

impl fmt::Display for ReleaseUrgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseUrgency::Critical => write!(f, "critical"),
            ReleaseUrgency::Urgent => write!(f, "urgent"),
            ReleaseUrgency::Warning => write!(f, "warning"),
            ReleaseUrgency::Safe => write!(f, "safe"),
        }
    }
}

// ==========================================
// 计价模型 (Pricing Model)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingModel {
    Fixed,       // 每晚固定价
    BasePlusPax, // 基础价 + 人头价 × 入住人数
}

impl fmt::Display for PricingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl PricingModel {
    /// 从字符串解析计价模型
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fixed" => Some(PricingModel::Fixed),
            "base_plus_pax" => Some(PricingModel::BasePlusPax),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PricingModel::Fixed => "fixed",
            PricingModel::BasePlusPax => "base_plus_pax",
        }
    }
}

// ==========================================
// 星期掩码 (Day-of-Week Mask)
// ==========================================
// bit i 对应周一起算的第 i 天 (bit 0 = 周一, bit 6 = 周日)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DowMask(pub u8);

impl DowMask {
    pub const ALL: DowMask = DowMask(0b111_1111);
    pub const WEEKEND: DowMask = DowMask(0b110_0000);

    /// 由星期列表构造掩码
    pub fn from_weekdays(days: &[Weekday]) -> Self {
        DowMask(
            days.iter()
                .fold(0u8, |mask, d| mask | (1 << d.num_days_from_monday())),
        )
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.contains(date.weekday())
    }
}

impl Default for DowMask {
    fn default() -> Self {
        DowMask::ALL
    }
}

/// 周六、周日视为周末
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_db_mapping() {
        assert_eq!(Quantity::from_db(None), Quantity::Unlimited);
        assert_eq!(Quantity::from_db(Some(7)), Quantity::Limited(7));
        assert_eq!(Quantity::Unlimited.to_db(), None);
        assert_eq!(Quantity::Limited(3).to_db(), Some(3));
    }

    #[test]
    fn test_quantity_arithmetic() {
        assert_eq!(Quantity::Limited(5).saturating_sub(8), Quantity::Limited(0));
        assert!(!Quantity::Limited(0).is_available());
        assert!(Quantity::Unlimited.saturating_sub(100).is_available());
        assert_eq!(
            Quantity::Limited(2).combine(Quantity::Unlimited),
            Quantity::Unlimited
        );
    }

    #[test]
    fn test_dow_mask() {
        let mask = DowMask::from_weekdays(&[Weekday::Sat, Weekday::Sun]);
        assert_eq!(mask, DowMask::WEEKEND);
        assert!(mask.contains(Weekday::Sun));
        assert!(!mask.contains(Weekday::Wed));
        // 2025-06-07 是周六
        assert!(mask.contains_date(NaiveDate::from_ymd_opt(2025, 6, 7).unwrap()));
    }

    #[test]
    fn test_allocation_type_round_trip() {
        for t in [
            AllocationType::Committed,
            AllocationType::Freesale,
            AllocationType::OnRequest,
        ] {
            assert_eq!(AllocationType::from_str(t.to_db_str()), Some(t));
        }
        assert_eq!(AllocationType::from_str("bogus"), None);
    }
}
