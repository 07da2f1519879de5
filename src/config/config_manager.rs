// ==========================================
// 旅游批发后台 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::pricing_config_trait::PricingConfigReader;
use crate::db::open_sqlite_connection;
use crate::domain::rate::DEFAULT_ROOM_TYPE;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(config_key = key, value, "配置已更新");
        Ok(())
    }

    /// 读取数值配置，缺失或格式错误时回退默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: FromStr + Display + Copy,
    {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "配置格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 报价留档时记录当时生效的阈值
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key"
        )?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

// ==========================================
// PricingConfigReader Trait 实现
// ==========================================
#[async_trait]
impl PricingConfigReader for ConfigManager {
    async fn get_release_critical_days(&self) -> ConfigResult<i64> {
        self.get_parsed_or_default(config_keys::RELEASE_CRITICAL_DAYS, 3)
    }

    async fn get_release_urgent_days(&self) -> ConfigResult<i64> {
        self.get_parsed_or_default(config_keys::RELEASE_URGENT_DAYS, 7)
    }

    async fn get_release_warning_days(&self) -> ConfigResult<i64> {
        self.get_parsed_or_default(config_keys::RELEASE_WARNING_DAYS, 30)
    }

    async fn get_release_listing_min_days(&self) -> ConfigResult<i64> {
        self.get_parsed_or_default(config_keys::RELEASE_LISTING_MIN_DAYS, -1)
    }

    async fn get_bucket_batch_size(&self) -> ConfigResult<usize> {
        let size = self.get_parsed_or_default(config_keys::BUCKET_BATCH_SIZE, 500usize)?;
        Ok(size.max(1))
    }

    async fn get_default_room_type(&self) -> ConfigResult<String> {
        let value = self
            .get_config_value(config_keys::DEFAULT_ROOM_TYPE)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        Ok(value.unwrap_or_else(|| DEFAULT_ROOM_TYPE.to_string()))
    }

    async fn get_display_scale(&self) -> ConfigResult<u32> {
        let scale = self.get_parsed_or_default(config_keys::DISPLAY_SCALE, 2u32)?;
        Ok(scale.min(8))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 释放预警
    pub const RELEASE_CRITICAL_DAYS: &str = "release_critical_days";
    pub const RELEASE_URGENT_DAYS: &str = "release_urgent_days";
    pub const RELEASE_WARNING_DAYS: &str = "release_warning_days";
    pub const RELEASE_LISTING_MIN_DAYS: &str = "release_listing_min_days";

    // 库存展开
    pub const BUCKET_BATCH_SIZE: &str = "bucket_batch_size";

    // 报价
    pub const DEFAULT_ROOM_TYPE: &str = "default_room_type";
    pub const DISPLAY_SCALE: &str = "display_scale";
}
