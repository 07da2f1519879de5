// ==========================================
// 旅游批发后台 - 价格文档仓储
// ==========================================
// 职责: rate_document / rate_season / rate_occupancy_tier 表的读写
// 红线: 只做候选过滤 (租户/变体/房型/供应商),优先级判定交给引擎
// ==========================================

use crate::domain::rate::{OccupancyTier, RateDocument, Season, StayQuery};
use crate::domain::types::{DowMask, PricingModel, TenantId};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::rate_resolver::RateSource;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{
    format_date, format_datetime, parse_date, parse_datetime, parse_decimal, parse_enum,
};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const NIGHT_KIND_BLOCK: &str = "BLOCK";
const NIGHT_KIND_EXTRA: &str = "EXTRA";

// ==========================================
// RateRepository - 价格文档仓储
// ==========================================
pub struct RateRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RateRepository {
    /// 创建新的价格仓储实例
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

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入价格文档 (含季节与档位,单事务)
    pub fn insert_document(&self, doc: &RateDocument) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            r#"
            INSERT INTO rate_document (
                rate_id, tenant_id, product_variant_id, supplier_id, room_type,
                valid_from, valid_to, priority, block_start, block_end, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                doc.rate_id,
                doc.tenant_id.0,
                doc.product_variant_id,
                doc.supplier_id,
                doc.room_type,
                format_date(doc.valid_from),
                format_date(doc.valid_to),
                doc.priority,
                doc.block_window.map(|(start, _)| format_date(start)),
                doc.block_window.map(|(_, end)| format_date(end)),
                format_datetime(doc.created_at),
            ],
        )?;

        for (seq_no, season) in doc.seasons.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO rate_season (
                    tenant_id, rate_id, seq_no, season_from, season_to, dow_mask,
                    min_stay, max_stay, min_pax, max_pax
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                params![
                    doc.tenant_id.0,
                    doc.rate_id,
                    seq_no as i64,
                    format_date(season.season_from),
                    format_date(season.season_to),
                    season.dow_mask.0,
                    season.min_stay,
                    season.max_stay,
                    season.min_pax,
                    season.max_pax,
                ],
            )?;
        }

        let tiers = doc
            .occupancy_tiers
            .iter()
            .map(|t| (NIGHT_KIND_BLOCK, t))
            .enumerate()
            .chain(
                doc.extra_night_tiers
                    .iter()
                    .map(|t| (NIGHT_KIND_EXTRA, t))
                    .enumerate(),
            );
        for (seq_no, (night_kind, tier)) in tiers {
            tx.execute(
                r#"
                INSERT INTO rate_occupancy_tier (
                    tenant_id, rate_id, seq_no, night_kind, min_occupancy, max_occupancy,
                    pricing_model, base_amount, per_person_amount
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    doc.tenant_id.0,
                    doc.rate_id,
                    seq_no as i64,
                    night_kind,
                    tier.min_occupancy,
                    tier.max_occupancy,
                    tier.pricing_model.to_db_str(),
                    tier.base_amount.to_string(),
                    tier.per_person_amount.to_string(),
                ],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        tracing::debug!(rate_id = %doc.rate_id, "价格文档已写入");
        Ok(())
    }

    /// 查询候选价格文档
    ///
    /// supplier_id 为 None 时只返回 supplier_id IS NULL 的售价文档
    pub fn find_candidates(
        &self,
        tenant_id: TenantId,
        product_variant_id: i64,
        supplier_id: Option<i64>,
        room_type: &str,
    ) -> RepositoryResult<Vec<RateDocument>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                rate_id, tenant_id, product_variant_id, supplier_id, room_type,
                valid_from, valid_to, priority, block_start, block_end, created_at
            FROM rate_document
            WHERE tenant_id = ?1
              AND product_variant_id = ?2
              AND room_type = ?3
              AND supplier_id IS ?4
            ORDER BY priority DESC, created_at DESC
            "#,
        )?;

        let mut documents = stmt
            .query_map(
                params![tenant_id.0, product_variant_id, room_type, supplier_id],
                map_document,
            )?
            .collect::<SqliteResult<Vec<RateDocument>>>()?;

        for doc in documents.iter_mut() {
            doc.seasons = load_seasons(&conn, tenant_id, &doc.rate_id)?;
            let (block, extra) = load_tiers(&conn, tenant_id, &doc.rate_id)?;
            doc.occupancy_tiers = block;
            doc.extra_night_tiers = extra;
        }

        Ok(documents)
    }
}

impl RateSource for RateRepository {
    fn candidate_documents(&self, query: &StayQuery) -> EngineResult<Vec<RateDocument>> {
        self.find_candidates(
            query.tenant_id,
            query.product_variant_id,
            query.supplier_id,
            &query.room_type,
        )
        .map_err(|e| EngineError::RateSource(e.to_string()))
    }
}

fn map_document(row: &Row<'_>) -> SqliteResult<RateDocument> {
    let block_start: Option<String> = row.get(8)?;
    let block_end: Option<String> = row.get(9)?;
    let block_window = match (block_start, block_end) {
        (Some(start), Some(end)) => Some((parse_date(8, &start)?, parse_date(9, &end)?)),
        _ => None,
    };

    Ok(RateDocument {
        rate_id: row.get(0)?,
        tenant_id: TenantId(row.get(1)?),
        product_variant_id: row.get(2)?,
        supplier_id: row.get(3)?,
        room_type: row.get(4)?,
        valid_from: parse_date(5, &row.get::<_, String>(5)?)?,
        valid_to: parse_date(6, &row.get::<_, String>(6)?)?,
        priority: row.get(7)?,
        created_at: parse_datetime(10, &row.get::<_, String>(10)?)?,
        block_window,
        seasons: Vec::new(),
        occupancy_tiers: Vec::new(),
        extra_night_tiers: Vec::new(),
    })
}

fn load_seasons(
    conn: &Connection,
    tenant_id: TenantId,
    rate_id: &str,
) -> SqliteResult<Vec<Season>> {
    let mut stmt = conn.prepare_cached(
        r#"
        SELECT season_from, season_to, dow_mask, min_stay, max_stay, min_pax, max_pax
        FROM rate_season
        WHERE tenant_id = ?1 AND rate_id = ?2
        ORDER BY seq_no
        "#,
    )?;
    let seasons = stmt
        .query_map(params![tenant_id.0, rate_id], |row| {
            Ok(Season {
                season_from: parse_date(0, &row.get::<_, String>(0)?)?,
                season_to: parse_date(1, &row.get::<_, String>(1)?)?,
                dow_mask: DowMask(row.get(2)?),
                min_stay: row.get(3)?,
                max_stay: row.get(4)?,
                min_pax: row.get(5)?,
                max_pax: row.get(6)?,
            })
        })?
        .collect::<SqliteResult<Vec<Season>>>()?;
    Ok(seasons)
}

/// 读取档位,返回 (包房档位, 加晚档位)
fn load_tiers(
    conn: &Connection,
    tenant_id: TenantId,
    rate_id: &str,
) -> SqliteResult<(Vec<OccupancyTier>, Vec<OccupancyTier>)> {
    let mut stmt = conn.prepare_cached(
        r#"
        SELECT night_kind, min_occupancy, max_occupancy, pricing_model,
               base_amount, per_person_amount
        FROM rate_occupancy_tier
        WHERE tenant_id = ?1 AND rate_id = ?2
        ORDER BY night_kind, seq_no
        "#,
    )?;
    let rows = stmt
        .query_map(params![tenant_id.0, rate_id], |row| {
            let night_kind: String = row.get(0)?;
            let tier = OccupancyTier {
                min_occupancy: row.get(1)?,
                max_occupancy: row.get(2)?,
                pricing_model: parse_enum(3, &row.get::<_, String>(3)?, PricingModel::from_str)?,
                base_amount: parse_decimal(4, &row.get::<_, String>(4)?)?,
                per_person_amount: parse_decimal(5, &row.get::<_, String>(5)?)?,
            };
            Ok((night_kind, tier))
        })?
        .collect::<SqliteResult<Vec<(String, OccupancyTier)>>>()?;

    let (extra, block): (Vec<_>, Vec<_>) = rows
        .into_iter()
        .partition(|(kind, _)| kind == NIGHT_KIND_EXTRA);
    Ok((
        block.into_iter().map(|(_, t)| t).collect(),
        extra.into_iter().map(|(_, t)| t).collect(),
    ))
}
