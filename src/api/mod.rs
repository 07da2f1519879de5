// ==========================================
// 旅游批发后台 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行/上层服务调用
// ==========================================

pub mod allocation_api;
pub mod error;
pub mod pricing_api;

// 重导出核心类型
pub use allocation_api::{AllocationApi, ExpansionReport};
pub use error::{ApiError, ApiResult};
pub use pricing_api::PricingApi;
