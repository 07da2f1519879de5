// ==========================================
// 旅游批发后台 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod allocation;
pub mod rate;
pub mod types;

// 重导出核心类型
pub use allocation::{AllocationReleaseRow, AllocationWindow, DailyBucket, ReleaseWarning};
pub use rate::{
    MarginBreakdown, MarginResult, OccupancyTier, RateDocument, Season, StayCostBreakdown,
    StayQuery, DEFAULT_ROOM_TYPE,
};
pub use types::{
    AllocationType, DowMask, PricingModel, Quantity, ReleaseUrgency, TenantId,
};
