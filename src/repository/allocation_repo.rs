// ==========================================
// 旅游批发后台 - 配额数据仓储
// ==========================================
// 职责: allocation_window / daily_bucket 表的读写
// 红线: Repository 不含业务逻辑;所有查询都带 tenant_id
// ==========================================

use crate::domain::allocation::{AllocationWindow, DailyBucket};
use crate::domain::types::{AllocationType, Quantity, TenantId};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{format_date, parse_date, parse_decimal, parse_enum};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

const WINDOW_COLUMNS: &str = r#"
    allocation_id, tenant_id, product_variant_id, supplier_id,
    valid_from, valid_to, default_quantity, weekend_multiplier,
    allocation_type, release_days
"#;

/// 批量写入结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketUpsertReport {
    pub inserted: usize,
    pub skipped: usize, // 唯一键已存在而跳过
    pub batches: usize,
}

// ==========================================
// AllocationRepository - 配额仓储
// ==========================================
pub struct AllocationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AllocationRepository {
    /// 创建新的配额仓储实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // allocation_window
    // ==========================================

    /// 插入配额窗口
    pub fn insert_window(&self, window: &AllocationWindow) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        write_window(&conn, window)?;
        Ok(())
    }

    /// 配额窗口与其库存桶一并建档 (单事务)
    ///
    /// # 参数
    /// - window: 配额窗口
    /// - buckets: 该窗口展开出的库存桶序列
    /// - batch_size: 每批写入的行数 (仅影响 report.batches)
    ///
    /// # 说明
    /// 任一步失败整体回滚: 不会留下只有窗口、没有库存桶的半成品
    pub fn create_window_with_buckets<I>(
        &self,
        window: &AllocationWindow,
        buckets: I,
        batch_size: usize,
    ) -> RepositoryResult<BucketUpsertReport>
    where
        I: IntoIterator<Item = DailyBucket>,
    {
        let batch_size = batch_size.max(1);
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        write_window(&tx, window)?;

        let mut report = BucketUpsertReport::default();
        let mut iter = buckets.into_iter().peekable();
        while iter.peek().is_some() {
            write_bucket_batch(&tx, iter.by_ref().take(batch_size), &mut report)?;
            report.batches += 1;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(report)
    }

    /// 按 ID 查询配额窗口
    ///
    /// # 返回
    /// - Ok(Some): 找到
    /// - Ok(None): 本租户下不存在
    pub fn find_window(
        &self,
        tenant_id: TenantId,
        allocation_id: &str,
    ) -> RepositoryResult<Option<AllocationWindow>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM allocation_window WHERE tenant_id = ?1 AND allocation_id = ?2",
            WINDOW_COLUMNS
        );
        let window = conn
            .query_row(&sql, params![tenant_id.0, allocation_id], map_window)
            .optional()?;
        Ok(window)
    }

    /// 查询租户下全部配额窗口
    pub fn list_windows(&self, tenant_id: TenantId) -> RepositoryResult<Vec<AllocationWindow>> {
        self.query_windows(
            "WHERE tenant_id = ?1 ORDER BY valid_from, allocation_id",
            tenant_id,
        )
    }

    /// 查询设置了释放期的配额窗口
    pub fn list_windows_with_release(
        &self,
        tenant_id: TenantId,
    ) -> RepositoryResult<Vec<AllocationWindow>> {
        self.query_windows(
            "WHERE tenant_id = ?1 AND release_days IS NOT NULL ORDER BY valid_from, allocation_id",
            tenant_id,
        )
    }

    fn query_windows(
        &self,
        clause: &str,
        tenant_id: TenantId,
    ) -> RepositoryResult<Vec<AllocationWindow>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM allocation_window {}", WINDOW_COLUMNS, clause);
        let mut stmt = conn.prepare(&sql)?;
        let windows = stmt
            .query_map(params![tenant_id.0], map_window)?
            .collect::<SqliteResult<Vec<AllocationWindow>>>()?;
        Ok(windows)
    }

    // ==========================================
    // daily_bucket
    // ==========================================

    /// 批量写入库存桶 (唯一键冲突时跳过)
    ///
    /// # 参数
    /// - buckets: 库存桶序列 (可为惰性序列,按批消费)
    /// - batch_size: 每个事务写入的行数
    ///
    /// # 说明
    /// 同一窗口重复展开写入不会产生重复行,也不会覆盖已有的 booked/held
    pub fn upsert_buckets<I>(&self, buckets: I, batch_size: usize) -> RepositoryResult<BucketUpsertReport>
    where
        I: IntoIterator<Item = DailyBucket>,
    {
        let batch_size = batch_size.max(1);
        let mut conn = self.get_conn()?;
        let mut report = BucketUpsertReport::default();
        let mut iter = buckets.into_iter().peekable();

        while iter.peek().is_some() {
            let tx = conn
                .transaction()
                .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
            write_bucket_batch(&tx, iter.by_ref().take(batch_size), &mut report)?;
            tx.commit()
                .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
            report.batches += 1;
        }

        Ok(report)
    }

    /// 按日期区间查询库存桶 (两端包含)
    pub fn find_buckets(
        &self,
        tenant_id: TenantId,
        product_variant_id: i64,
        supplier_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<DailyBucket>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                tenant_id, product_variant_id, supplier_id, bucket_date,
                quantity, booked, held, stop_sell, blackout
            FROM daily_bucket
            WHERE tenant_id = ?1
              AND product_variant_id = ?2
              AND supplier_id = ?3
              AND bucket_date BETWEEN ?4 AND ?5
            ORDER BY bucket_date
            "#,
        )?;

        let buckets = stmt
            .query_map(
                params![
                    tenant_id.0,
                    product_variant_id,
                    supplier_id,
                    format_date(from),
                    format_date(to)
                ],
                map_bucket,
            )?
            .collect::<SqliteResult<Vec<DailyBucket>>>()?;
        Ok(buckets)
    }

    /// 更新某天的已订/占位数量 (预订协作方使用)
    pub fn update_bucket_usage(
        &self,
        tenant_id: TenantId,
        product_variant_id: i64,
        supplier_id: i64,
        date: NaiveDate,
        booked: u32,
        held: u32,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE daily_bucket SET booked = ?5, held = ?6
            WHERE tenant_id = ?1 AND product_variant_id = ?2
              AND supplier_id = ?3 AND bucket_date = ?4
            "#,
            params![
                tenant_id.0,
                product_variant_id,
                supplier_id,
                format_date(date),
                booked,
                held
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "daily_bucket".to_string(),
                id: format!("{}/{}/{}", product_variant_id, supplier_id, date),
            });
        }
        Ok(())
    }
}

fn write_window(conn: &Connection, window: &AllocationWindow) -> SqliteResult<()> {
    conn.execute(
        r#"
        INSERT INTO allocation_window (
            allocation_id, tenant_id, product_variant_id, supplier_id,
            valid_from, valid_to, default_quantity, weekend_multiplier,
            allocation_type, release_days
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
        params![
            window.allocation_id,
            window.tenant_id.0,
            window.product_variant_id,
            window.supplier_id,
            format_date(window.valid_from),
            format_date(window.valid_to),
            window.default_quantity,
            window.weekend_multiplier.to_string(),
            window.allocation_type.to_db_str(),
            window.release_days,
        ],
    )?;
    Ok(())
}

/// 写入一批库存桶 (唯一键冲突时跳过),不负责提交
fn write_bucket_batch<I>(
    conn: &Connection,
    buckets: I,
    report: &mut BucketUpsertReport,
) -> SqliteResult<()>
where
    I: Iterator<Item = DailyBucket>,
{
    let mut stmt = conn.prepare_cached(
        r#"
        INSERT INTO daily_bucket (
            tenant_id, product_variant_id, supplier_id, bucket_date,
            quantity, booked, held, stop_sell, blackout
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT (tenant_id, product_variant_id, supplier_id, bucket_date)
        DO NOTHING
        "#,
    )?;

    for bucket in buckets {
        let affected = stmt.execute(params![
            bucket.tenant_id.0,
            bucket.product_variant_id,
            bucket.supplier_id,
            format_date(bucket.date),
            bucket.quantity.to_db(),
            bucket.booked,
            bucket.held,
            bucket.stop_sell,
            bucket.blackout,
        ])?;
        if affected == 0 {
            report.skipped += 1;
        } else {
            report.inserted += affected;
        }
    }
    Ok(())
}

fn map_window(row: &Row<'_>) -> SqliteResult<AllocationWindow> {
    Ok(AllocationWindow {
        allocation_id: row.get(0)?,
        tenant_id: TenantId(row.get(1)?),
        product_variant_id: row.get(2)?,
        supplier_id: row.get(3)?,
        valid_from: parse_date(4, &row.get::<_, String>(4)?)?,
        valid_to: parse_date(5, &row.get::<_, String>(5)?)?,
        default_quantity: row.get(6)?,
        weekend_multiplier: parse_decimal(7, &row.get::<_, String>(7)?)?,
        allocation_type: parse_enum(8, &row.get::<_, String>(8)?, AllocationType::from_str)?,
        release_days: row.get(9)?,
    })
}

fn map_bucket(row: &Row<'_>) -> SqliteResult<DailyBucket> {
    Ok(DailyBucket {
        tenant_id: TenantId(row.get(0)?),
        product_variant_id: row.get(1)?,
        supplier_id: row.get(2)?,
        date: parse_date(3, &row.get::<_, String>(3)?)?,
        quantity: Quantity::from_db(row.get(4)?),
        booked: row.get(5)?,
        held: row.get(6)?,
        stop_sell: row.get(7)?,
        blackout: row.get(8)?,
    })
}
