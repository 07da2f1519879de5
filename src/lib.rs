// ==========================================
// 旅游批发后台 - 核心库
// ==========================================
// 范围: 配额库存 (展开/释放预警) + 价格 (报价/毛利)
// 技术栈: Rust + SQLite
// 红线: 所有读写带租户上下文；金额全程定点小数
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AllocationType, DowMask, PricingModel, Quantity, ReleaseUrgency, TenantId,
};

// 领域实体
pub use domain::{
    AllocationReleaseRow, AllocationWindow, DailyBucket, MarginResult, OccupancyTier,
    RateDocument, ReleaseWarning, Season, StayCostBreakdown, StayQuery,
};

// 引擎
pub use engine::{
    calculate_margin, classify_release_urgency, expand_allocation_window, resolve_stay_cost,
    DateRangeExpander, EngineError, InventorySummary, MarginCalculator, RateResolver,
    RateSource, ReleaseThresholds, ReleaseUrgencyClassifier,
};

// API
pub use api::{AllocationApi, ApiError, PricingApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "旅游批发后台";
