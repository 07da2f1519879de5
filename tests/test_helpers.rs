// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use tour_allocation::domain::{AllocationWindow, OccupancyTier, RateDocument};
use tour_allocation::{AllocationType, PricingModel, TenantId};

pub const TENANT: TenantId = TenantId(1);
pub const OTHER_TENANT: TenantId = TenantId(2);

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是 UTF-8")?
        .to_string();

    let conn = open_test_connection(&db_path)?;
    tour_allocation::db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试数据库连接（统一 PRAGMA）
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(tour_allocation::db::open_sqlite_connection(db_path)?)
}

/// 打开共享连接（多个仓储共用）
pub fn open_shared_connection(db_path: &str) -> Result<Arc<Mutex<Connection>>, Box<dyn Error>> {
    Ok(Arc::new(Mutex::new(open_test_connection(db_path)?)))
}

/// 写入 global 配置
pub fn insert_test_config(conn: &Connection, entries: &[(&str, &str)]) -> Result<(), Box<dyn Error>> {
    for (key, value) in entries {
        conn.execute(
            "INSERT OR REPLACE INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)",
            params![key, value],
        )?;
    }
    Ok(())
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("无效日期")
}

pub fn datetime(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, 0, 0).expect("无效时间")
}

// ==========================================
// 配额窗口构造
// ==========================================

/// 有限配额窗口（默认 10 间，周末 ×0.5）
pub fn committed_window(
    allocation_id: &str,
    valid_from: NaiveDate,
    valid_to: NaiveDate,
    release_days: Option<u32>,
) -> AllocationWindow {
    AllocationWindow {
        allocation_id: allocation_id.to_string(),
        tenant_id: TENANT,
        product_variant_id: 100,
        supplier_id: 500,
        valid_from,
        valid_to,
        default_quantity: 10,
        weekend_multiplier: Decimal::new(5, 1),
        allocation_type: AllocationType::Committed,
        release_days,
    }
}

// ==========================================
// 价格文档构造
// ==========================================

pub fn fixed_tier(min: u32, max: u32, amount: Decimal) -> OccupancyTier {
    OccupancyTier {
        min_occupancy: min,
        max_occupancy: max,
        pricing_model: PricingModel::Fixed,
        base_amount: amount,
        per_person_amount: Decimal::ZERO,
    }
}

pub fn rate_document(
    rate_id: &str,
    supplier_id: Option<i64>,
    nightly: Decimal,
    priority: i32,
) -> RateDocument {
    RateDocument {
        rate_id: rate_id.to_string(),
        tenant_id: TENANT,
        product_variant_id: 100,
        supplier_id,
        room_type: "standard".to_string(),
        valid_from: date(2024, 1, 1),
        valid_to: date(2024, 12, 31),
        priority,
        created_at: datetime(2024, 1, 1, 9),
        block_window: None,
        seasons: Vec::new(),
        occupancy_tiers: vec![fixed_tier(1, 4, nightly)],
        extra_night_tiers: Vec::new(),
    }
}
