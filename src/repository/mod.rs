// ==========================================
// 旅游批发后台 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入;所有读写带租户
// ==========================================

pub mod allocation_repo;
pub mod error;
pub mod rate_repo;
pub mod row_utils;

// 重导出核心仓储
pub use allocation_repo::{AllocationRepository, BucketUpsertReport};
pub use error::{RepositoryError, RepositoryResult};
pub use rate_repo::RateRepository;
