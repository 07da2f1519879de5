// ==========================================
// 旅游批发后台 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换引擎/仓储错误为面向分销商的错误消息
// 红线: 内部错误细节只进日志，不进对外文案
// ==========================================

use crate::engine::error::EngineError;
use crate::i18n::{t, t_with_args};
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 报价错误
    // ==========================================
    #[error("无效的日期区间: {from} ~ {to}")]
    InvalidRange { from: String, to: String },

    #[error("所选日期无可用报价: {0}")]
    PricingUnavailable(String),

    #[error("入住人数未定价: {0}")]
    OccupancyNotPriced(String),

    #[error("无法计算毛利: {0}")]
    MarginUnavailable(String),

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("配置读取失败: {0}")]
    ConfigError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 面向分销商的文案（按当前语言）
    ///
    /// 报价类错误给出可读原因，其余统一为内部错误提示
    pub fn user_message(&self) -> String {
        match self {
            ApiError::InvalidRange { from, to } => {
                t_with_args("pricing.invalid_range", &[("from", from.as_str()), ("to", to.as_str())])
            }
            ApiError::PricingUnavailable(_) => t("pricing.unavailable"),
            ApiError::OccupancyNotPriced(_) => t("pricing.occupancy_not_priced"),
            ApiError::MarginUnavailable(_) => t("pricing.margin_unavailable"),
            ApiError::NotFound(detail) => t_with_args("allocation.not_found", &[("id", detail.as_str())]),
            _ => t("common_errors.internal"),
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidRange { from, to } => ApiError::InvalidRange {
                from: from.to_string(),
                to: to.to_string(),
            },
            e @ EngineError::NoRateFound { .. } => ApiError::PricingUnavailable(e.to_string()),
            e @ EngineError::NoOccupancyTier { .. } => ApiError::OccupancyNotPriced(e.to_string()),
            e @ EngineError::DivisionByZero => ApiError::MarginUnavailable(e.to_string()),
            e @ EngineError::AmountOverflow { .. } => ApiError::PricingUnavailable(e.to_string()),
            EngineError::RateSource(msg) => ApiError::DatabaseError(msg),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
