// ==========================================
// 旅游批发后台 - 库存汇总
// ==========================================
// 职责: 把一组每日库存桶汇总为 总量 / 已订 / 占位 / 剩余可售
// 用途: 释放预警列表的 "剩余可售 > 0" 过滤
// ==========================================

use crate::domain::allocation::DailyBucket;
use crate::domain::types::Quantity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySummary {
    pub days: usize,
    pub total: Quantity,
    pub booked: u32,
    pub held: u32,
    pub available: Quantity,
    pub closed_days: usize, // stop_sell 或 blackout 的天数
}

impl InventorySummary {
    pub fn empty() -> Self {
        Self {
            days: 0,
            total: Quantity::Limited(0),
            booked: 0,
            held: 0,
            available: Quantity::Limited(0),
            closed_days: 0,
        }
    }

    /// 汇总库存桶
    pub fn from_buckets<'a, I>(buckets: I) -> Self
    where
        I: IntoIterator<Item = &'a DailyBucket>,
    {
        buckets.into_iter().fold(Self::empty(), |mut acc, bucket| {
            acc.days += 1;
            acc.total = acc.total.combine(bucket.quantity);
            acc.booked = acc.booked.saturating_add(bucket.booked);
            acc.held = acc.held.saturating_add(bucket.held);
            acc.available = acc.available.combine(bucket.available());
            if bucket.stop_sell || bucket.blackout {
                acc.closed_days += 1;
            }
            acc
        })
    }
}
