// ==========================================
// 旅游批发后台 - 配额/价格配置读取 Trait
// ==========================================
// 职责: 定义引擎与 API 所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::engine::release::ReleaseThresholds;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// PricingConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait PricingConfigReader: Send + Sync {
    // ===== 释放预警阈值 =====

    /// critical 阈值（天）
    ///
    /// # 默认值
    /// - 3
    async fn get_release_critical_days(&self) -> Result<i64, Box<dyn Error + Send + Sync>>;

    /// urgent 阈值（天）
    ///
    /// # 默认值
    /// - 7
    async fn get_release_urgent_days(&self) -> Result<i64, Box<dyn Error + Send + Sync>>;

    /// warning 阈值（天），同时是列表纳入窗口的上界
    ///
    /// # 默认值
    /// - 30
    async fn get_release_warning_days(&self) -> Result<i64, Box<dyn Error + Send + Sync>>;

    /// 列表纳入窗口的下界（天，可为负）
    ///
    /// # 默认值
    /// - -1 (释放后 1 天内仍展示)
    async fn get_release_listing_min_days(&self) -> Result<i64, Box<dyn Error + Send + Sync>>;

    /// 组装完整阈值
    async fn get_release_thresholds(&self) -> Result<ReleaseThresholds, Box<dyn Error + Send + Sync>> {
        Ok(ReleaseThresholds {
            critical_days: self.get_release_critical_days().await?,
            urgent_days: self.get_release_urgent_days().await?,
            warning_days: self.get_release_warning_days().await?,
            listing_min_days: self.get_release_listing_min_days().await?,
        })
    }

    // ===== 库存展开 =====

    /// 库存桶批量写入的批大小
    ///
    /// # 默认值
    /// - 500
    async fn get_bucket_batch_size(&self) -> Result<usize, Box<dyn Error + Send + Sync>>;

    // ===== 报价 =====

    /// 未指定房型时的默认房型
    ///
    /// # 默认值
    /// - "standard"
    async fn get_default_room_type(&self) -> Result<String, Box<dyn Error + Send + Sync>>;

    /// 展示金额保留的小数位
    ///
    /// # 默认值
    /// - 2
    async fn get_display_scale(&self) -> Result<u32, Box<dyn Error + Send + Sync>>;
}
