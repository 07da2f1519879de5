// ==========================================
// 旅游批发后台 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为 (外键、busy_timeout)
// - 统一建表语句,测试与二进制共用同一份 schema
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 显式指定数据库路径的环境变量
pub const DB_PATH_ENV: &str = "TOUR_ALLOCATION_DB_PATH";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：foreign_keys / busy_timeout 都需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表 (幂等)
///
/// daily_bucket 上的唯一键保证重复展开时"跳过而非报错"
/// 业务主键均为 (tenant_id, id)，不同租户可使用相同编号
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS allocation_window (
            allocation_id TEXT NOT NULL,
            tenant_id INTEGER NOT NULL,
            product_variant_id INTEGER NOT NULL,
            supplier_id INTEGER NOT NULL,
            valid_from TEXT NOT NULL,
            valid_to TEXT NOT NULL,
            default_quantity INTEGER NOT NULL CHECK (default_quantity >= 0),
            weekend_multiplier TEXT NOT NULL,
            allocation_type TEXT NOT NULL,
            release_days INTEGER,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            CHECK (valid_from <= valid_to),
            PRIMARY KEY (tenant_id, allocation_id)
        );

        CREATE INDEX IF NOT EXISTS idx_allocation_window_tenant
            ON allocation_window (tenant_id, valid_from);

        CREATE TABLE IF NOT EXISTS daily_bucket (
            tenant_id INTEGER NOT NULL,
            product_variant_id INTEGER NOT NULL,
            supplier_id INTEGER NOT NULL,
            bucket_date TEXT NOT NULL,
            quantity INTEGER,
            booked INTEGER NOT NULL DEFAULT 0,
            held INTEGER NOT NULL DEFAULT 0,
            stop_sell INTEGER NOT NULL DEFAULT 0,
            blackout INTEGER NOT NULL DEFAULT 0,
            UNIQUE (tenant_id, product_variant_id, supplier_id, bucket_date)
        );

        CREATE TABLE IF NOT EXISTS rate_document (
            rate_id TEXT NOT NULL,
            tenant_id INTEGER NOT NULL,
            product_variant_id INTEGER NOT NULL,
            supplier_id INTEGER,
            room_type TEXT NOT NULL DEFAULT 'standard',
            valid_from TEXT NOT NULL,
            valid_to TEXT NOT NULL,
            priority INTEGER NOT NULL DEFAULT 0,
            block_start TEXT,
            block_end TEXT,
            created_at TEXT NOT NULL,
            PRIMARY KEY (tenant_id, rate_id)
        );

        CREATE INDEX IF NOT EXISTS idx_rate_document_lookup
            ON rate_document (tenant_id, product_variant_id, room_type);

        CREATE TABLE IF NOT EXISTS rate_season (
            tenant_id INTEGER NOT NULL,
            rate_id TEXT NOT NULL,
            seq_no INTEGER NOT NULL,
            season_from TEXT NOT NULL,
            season_to TEXT NOT NULL,
            dow_mask INTEGER NOT NULL DEFAULT 127,
            min_stay INTEGER,
            max_stay INTEGER,
            min_pax INTEGER,
            max_pax INTEGER,
            PRIMARY KEY (tenant_id, rate_id, seq_no),
            FOREIGN KEY (tenant_id, rate_id)
                REFERENCES rate_document (tenant_id, rate_id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS rate_occupancy_tier (
            tenant_id INTEGER NOT NULL,
            rate_id TEXT NOT NULL,
            seq_no INTEGER NOT NULL,
            night_kind TEXT NOT NULL DEFAULT 'BLOCK',
            min_occupancy INTEGER NOT NULL,
            max_occupancy INTEGER NOT NULL,
            pricing_model TEXT NOT NULL,
            base_amount TEXT NOT NULL,
            per_person_amount TEXT NOT NULL DEFAULT '0',
            PRIMARY KEY (tenant_id, rate_id, night_kind, seq_no),
            FOREIGN KEY (tenant_id, rate_id)
                REFERENCES rate_document (tenant_id, rate_id) ON DELETE CASCADE
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 默认数据库路径
///
/// 优先级: 环境变量 TOUR_ALLOCATION_DB_PATH → 用户数据目录 → 当前目录
pub fn default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./tour_allocation.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("tour-allocation");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("tour_allocation.db");
        } else {
            tracing::warn!("无法创建数据目录 {:?}，使用当前目录", dir);
        }
    }

    path.to_string_lossy().to_string()
}
