// ==========================================
// 旅游批发后台 - 释放紧急等级判定引擎
// ==========================================
// 职责: 计算释放日 + 判定紧急等级 + 列表纳入过滤
// 输入: valid_from + release_days + 调用方给定的"今天"
// 输出: ReleaseWarning (只读视图,每次查询重新计算)
// 红线: 等级制,先命中先返回
// ==========================================

use crate::domain::allocation::ReleaseWarning;
use crate::domain::types::{Quantity, ReleaseUrgency};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: i64 = 86_400;

// ==========================================
// ReleaseThresholds - 分级阈值
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseThresholds {
    pub critical_days: i64,     // ≤ 此值 → critical
    pub urgent_days: i64,       // ≤ 此值 → urgent
    pub warning_days: i64,      // ≤ 此值 → warning
    pub listing_min_days: i64,  // 列表只保留释放后不超过 1 天的记录
}

impl Default for ReleaseThresholds {
    fn default() -> Self {
        Self {
            critical_days: 3,
            urgent_days: 7,
            warning_days: 30,
            listing_min_days: -1,
        }
    }
}

// ==========================================
// ReleaseUrgencyClassifier - 释放紧急等级判定
// ==========================================
pub struct ReleaseUrgencyClassifier {
    thresholds: ReleaseThresholds,
}

impl ReleaseUrgencyClassifier {
    pub fn new(thresholds: ReleaseThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ReleaseThresholds {
        &self.thresholds
    }

    /// 按日期判定
    ///
    /// # 返回
    /// - None: 无释放策略 (release_days 缺失)
    /// - Some(ReleaseWarning): release_date = valid_from − release_days
    pub fn classify(
        &self,
        valid_from: NaiveDate,
        release_days: Option<u32>,
        as_of: NaiveDate,
    ) -> Option<ReleaseWarning> {
        let release_date = Self::release_date(valid_from, release_days?);
        let days_until_release = (release_date - as_of).num_days();
        Some(self.warning(release_date, days_until_release))
    }

    /// 按时间点判定
    ///
    /// 释放日取当天 00:00,剩余天数向上取整
    pub fn classify_at(
        &self,
        valid_from: NaiveDate,
        release_days: Option<u32>,
        now: NaiveDateTime,
    ) -> Option<ReleaseWarning> {
        let release_date = Self::release_date(valid_from, release_days?);
        let seconds = (release_date.and_time(chrono::NaiveTime::MIN) - now).num_seconds();
        let days_until_release = (seconds + SECONDS_PER_DAY - 1).div_euclid(SECONDS_PER_DAY);
        Some(self.warning(release_date, days_until_release))
    }

    /// 分级 (顺序: critical → urgent → warning → safe)
    pub fn tier(&self, days_until_release: i64) -> ReleaseUrgency {
        let t = &self.thresholds;
        if days_until_release <= t.critical_days {
            ReleaseUrgency::Critical
        } else if days_until_release <= t.urgent_days {
            ReleaseUrgency::Urgent
        } else if days_until_release <= t.warning_days {
            ReleaseUrgency::Warning
        } else {
            ReleaseUrgency::Safe
        }
    }

    /// 列表纳入过滤
    ///
    /// 条件: days_until_release ∈ [listing_min_days, warning_days] 且剩余可售 > 0
    pub fn include_in_listing(&self, warning: &ReleaseWarning, available: Quantity) -> bool {
        let t = &self.thresholds;
        (t.listing_min_days..=t.warning_days).contains(&warning.days_until_release)
            && available.is_available()
    }

    fn release_date(valid_from: NaiveDate, release_days: u32) -> NaiveDate {
        valid_from - Duration::days(release_days as i64)
    }

    fn warning(&self, release_date: NaiveDate, days_until_release: i64) -> ReleaseWarning {
        ReleaseWarning {
            release_date,
            days_until_release,
            urgency: self.tier(days_until_release),
        }
    }
}

impl Default for ReleaseUrgencyClassifier {
    fn default() -> Self {
        Self::new(ReleaseThresholds::default())
    }
}

/// 判定释放紧急等级 (函数式入口,as_of 缺省为本地今天)
pub fn classify_release_urgency(
    valid_from: NaiveDate,
    release_days: Option<u32>,
    as_of: Option<NaiveDate>,
) -> Option<ReleaseWarning> {
    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
    ReleaseUrgencyClassifier::default().classify(valid_from, release_days, as_of)
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn as_of() -> NaiveDate {
        date(2025, 1, 1)
    }

    /// release_days = 0 时 release_date == valid_from,便于直接按释放日构造用例
    fn classify_release_on(release_date: NaiveDate) -> ReleaseWarning {
        ReleaseUrgencyClassifier::default()
            .classify(release_date, Some(0), as_of())
            .unwrap()
    }

    #[test]
    fn test_no_release_policy() {
        let c = ReleaseUrgencyClassifier::default();
        assert!(c.classify(date(2025, 2, 1), None, as_of()).is_none());
    }

    #[test]
    fn test_release_date_subtracts_lead_time() {
        let c = ReleaseUrgencyClassifier::default();
        let w = c.classify(date(2025, 2, 1), Some(14), as_of()).unwrap();
        assert_eq!(w.release_date, date(2025, 1, 18));
        assert_eq!(w.days_until_release, 17);
        assert_eq!(w.urgency, ReleaseUrgency::Warning);
    }

    #[test]
    fn test_urgency_tiers() {
        let critical = classify_release_on(date(2025, 1, 3));
        assert_eq!(critical.days_until_release, 2);
        assert_eq!(critical.urgency, ReleaseUrgency::Critical);

        let urgent = classify_release_on(date(2025, 1, 7));
        assert_eq!(urgent.days_until_release, 6);
        assert_eq!(urgent.urgency, ReleaseUrgency::Urgent);

        let warning = classify_release_on(date(2025, 1, 20));
        assert_eq!(warning.days_until_release, 19);
        assert_eq!(warning.urgency, ReleaseUrgency::Warning);

        let safe = classify_release_on(date(2025, 3, 1));
        assert_eq!(safe.days_until_release, 59);
        assert_eq!(safe.urgency, ReleaseUrgency::Safe);
    }

    #[test]
    fn test_tier_boundaries() {
        let c = ReleaseUrgencyClassifier::default();
        assert_eq!(c.tier(-5), ReleaseUrgency::Critical);
        assert_eq!(c.tier(3), ReleaseUrgency::Critical);
        assert_eq!(c.tier(4), ReleaseUrgency::Urgent);
        assert_eq!(c.tier(7), ReleaseUrgency::Urgent);
        assert_eq!(c.tier(8), ReleaseUrgency::Warning);
        assert_eq!(c.tier(30), ReleaseUrgency::Warning);
        assert_eq!(c.tier(31), ReleaseUrgency::Safe);
    }

    #[test]
    fn test_classify_at_rounds_up_partial_days() {
        let c = ReleaseUrgencyClassifier::default();
        let noon = date(2025, 1, 1).and_hms_opt(12, 0, 0).unwrap();

        // 释放日 2025-01-03 00:00,距中午 1.5 天 → 2
        let w = c.classify_at(date(2025, 1, 3), Some(0), noon).unwrap();
        assert_eq!(w.days_until_release, 2);

        // 释放日已过半天 → 0
        let w = c.classify_at(date(2025, 1, 1), Some(0), noon).unwrap();
        assert_eq!(w.days_until_release, 0);

        // 整天差值不变
        let midnight = date(2025, 1, 1).and_hms_opt(0, 0, 0).unwrap();
        let w = c.classify_at(date(2024, 12, 31), Some(0), midnight).unwrap();
        assert_eq!(w.days_until_release, -1);
    }

    #[test]
    fn test_listing_filter() {
        let c = ReleaseUrgencyClassifier::default();
        let at = |days: i64| ReleaseWarning {
            release_date: as_of() + Duration::days(days),
            days_until_release: days,
            urgency: c.tier(days),
        };

        assert!(c.include_in_listing(&at(-1), Quantity::Limited(1)));
        assert!(c.include_in_listing(&at(30), Quantity::Unlimited));
        assert!(!c.include_in_listing(&at(-2), Quantity::Limited(5)));
        assert!(!c.include_in_listing(&at(31), Quantity::Limited(5)));
        assert!(!c.include_in_listing(&at(10), Quantity::Limited(0)));
    }

    #[test]
    fn test_custom_thresholds() {
        let c = ReleaseUrgencyClassifier::new(ReleaseThresholds {
            critical_days: 1,
            urgent_days: 2,
            warning_days: 5,
            listing_min_days: 0,
        });
        assert_eq!(c.tier(2), ReleaseUrgency::Urgent);
        assert_eq!(c.tier(6), ReleaseUrgency::Safe);
    }
}
