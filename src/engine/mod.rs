// ==========================================
// 旅游批发后台 - 引擎层
// ==========================================
// 职责: 配额展开、释放预警、报价、毛利等纯计算
// 红线: Engine 不拼 SQL,不持有跨调用状态
// ==========================================

pub mod error;
pub mod expander;
pub mod inventory;
pub mod margin;
pub mod rate_resolver;
pub mod release;

// 重导出核心引擎
pub use error::{EngineError, EngineResult};
pub use expander::{expand_allocation_window, DailyBuckets, DateRangeExpander};
pub use inventory::InventorySummary;
pub use margin::{calculate_margin, MarginCalculator};
pub use rate_resolver::{resolve_stay_cost, RateResolver, RateSource, StaySegments};
pub use release::{classify_release_urgency, ReleaseThresholds, ReleaseUrgencyClassifier};
