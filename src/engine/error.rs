// ==========================================
// 旅游批发后台 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 引擎内不重试、不吞错,同步抛给直接调用方
// ==========================================

use chrono::NaiveDate;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// 起始日期晚于结束日期 (调用方输入错误)
    #[error("无效的日期区间: from={from} > to={to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },

    /// 没有任何价格文档覆盖该变体/日期/供应商
    #[error("未找到价格: variant_id={variant_id}, supplier_id={supplier_id:?}, {check_in}~{check_out}")]
    NoRateFound {
        variant_id: i64,
        supplier_id: Option<i64>,
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    /// 命中价格文档但没有覆盖该入住人数的档位
    #[error("入住人数未定价: rate_id={rate_id}, occupancy={occupancy}")]
    NoOccupancyTier { rate_id: String, occupancy: u32 },

    /// 计算毛利率时售价为 0
    #[error("售价为 0,无法计算毛利率")]
    DivisionByZero,

    /// 金额运算超出 Decimal 表示范围
    #[error("金额超出可计算范围: rate_id={rate_id}")]
    AmountOverflow { rate_id: String },

    /// 价格数据读取失败 (外部协作方)
    #[error("价格数据读取失败: {0}")]
    RateSource(String),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
