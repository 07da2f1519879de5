// ==========================================
// 旅游批发后台 - 住宿报价引擎
// ==========================================
// 职责: 选定价格文档 + 拆分包房/加晚区段 + 计算总价
// 输入: StayQuery + RateSource (价格数据协作方)
// 输出: StayCostBreakdown
// 红线: 金额全程 Decimal,中间步骤不取整
// ==========================================

use crate::domain::rate::{OccupancyTier, RateDocument, StayCostBreakdown, StayQuery};
use crate::engine::error::{EngineError, EngineResult};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use tracing::instrument;

// ==========================================
// Trait: RateSource
// ==========================================
// 用途: 价格文档读取接口 (只读)
// 约定: 返回同租户、同变体、同房型,且 supplier_id 与查询一致
//       (查询未指定供应商时只返回 supplier_id 为空的售价文档) 的候选;
//       有效期、季节与优先级由引擎判定
pub trait RateSource {
    fn candidate_documents(&self, query: &StayQuery) -> EngineResult<Vec<RateDocument>>;
}

/// 内存价格表 (测试与缓存快照用)
impl RateSource for [RateDocument] {
    fn candidate_documents(&self, query: &StayQuery) -> EngineResult<Vec<RateDocument>> {
        Ok(self
            .iter()
            .filter(|doc| {
                doc.tenant_id == query.tenant_id
                    && doc.product_variant_id == query.product_variant_id
                    && doc.room_type == query.room_type
                    && doc.supplier_id == query.supplier_id
            })
            .cloned()
            .collect())
    }
}

impl RateSource for Vec<RateDocument> {
    fn candidate_documents(&self, query: &StayQuery) -> EngineResult<Vec<RateDocument>> {
        self.as_slice().candidate_documents(query)
    }
}

impl<T: RateSource + ?Sized> RateSource for &T {
    fn candidate_documents(&self, query: &StayQuery) -> EngineResult<Vec<RateDocument>> {
        (**self).candidate_documents(query)
    }
}

// ==========================================
// StaySegments - 区段拆分结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaySegments {
    pub extra_before: u32,
    pub block: u32,
    pub extra_after: u32,
}

impl StaySegments {
    /// 按包房窗口 [block_start, block_end) 拆分 [check_in, check_out)
    ///
    /// 无包房窗口时全部算包房晚
    pub fn split(
        check_in: NaiveDate,
        check_out: NaiveDate,
        block_window: Option<(NaiveDate, NaiveDate)>,
    ) -> Self {
        let span = |from: NaiveDate, to: NaiveDate| (to - from).num_days().max(0) as u32;

        let Some((block_start, block_end)) = block_window else {
            return Self {
                extra_before: 0,
                block: span(check_in, check_out),
                extra_after: 0,
            };
        };
        let block_end = block_end.max(block_start);

        Self {
            extra_before: span(check_in, check_out.min(block_start)),
            block: span(check_in.max(block_start), check_out.min(block_end)),
            extra_after: span(check_in.max(block_end), check_out),
        }
    }
}

// ==========================================
// RateResolver - 住宿报价引擎
// ==========================================
pub struct RateResolver<S> {
    source: S,
}

impl<S: RateSource> RateResolver<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// 计算一次入住的总成本
    ///
    /// # 流程
    /// 1) 选定价格文档 (有效期覆盖每一晚、季节放行、priority 最高)
    /// 2) 按包房窗口拆分为 加晚(前) / 包房 / 加晚(后)
    /// 3) 每个非空区段匹配入住人数档位,子成本 = 每晚价 × 晚数
    /// 4) total = 三段之和
    ///
    /// # 错误
    /// - InvalidRange: check_out ≤ check_in
    /// - NoRateFound: 无文档命中
    /// - NoOccupancyTier: 文档命中但人数无档位
    /// - AmountOverflow: 金额超出 Decimal 范围
    #[instrument(skip(self, query), fields(
        tenant_id = %query.tenant_id,
        variant_id = query.product_variant_id,
        supplier_id = ?query.supplier_id,
        check_in = %query.check_in,
        check_out = %query.check_out,
        occupancy = query.occupancy,
    ))]
    pub fn resolve(&self, query: &StayQuery) -> EngineResult<StayCostBreakdown> {
        if query.check_out <= query.check_in {
            return Err(EngineError::InvalidRange {
                from: query.check_in,
                to: query.check_out,
            });
        }

        let document = self.select_document(query)?;
        let segments = StaySegments::split(query.check_in, query.check_out, document.block_window);
        tracing::debug!(
            rate_id = %document.rate_id,
            priority = document.priority,
            ?segments,
            "命中价格文档"
        );

        let (block_rate, block_cost) =
            price_segment(&document, document.block_tiers(), segments.block, query.occupancy)?;
        let (extra_before_rate, extra_before_cost) = price_segment(
            &document,
            document.extra_tiers(),
            segments.extra_before,
            query.occupancy,
        )?;
        let (extra_after_rate, extra_after_cost) = price_segment(
            &document,
            document.extra_tiers(),
            segments.extra_after,
            query.occupancy,
        )?;

        let total_cost = block_cost
            .checked_add(extra_before_cost)
            .and_then(|sum| sum.checked_add(extra_after_cost))
            .ok_or_else(|| EngineError::AmountOverflow {
                rate_id: document.rate_id.clone(),
            })?;

        Ok(StayCostBreakdown {
            rate_id: document.rate_id.clone(),
            total_cost,
            block_nights: segments.block,
            extra_before_nights: segments.extra_before,
            extra_after_nights: segments.extra_after,
            block_cost,
            extra_before_cost,
            extra_after_cost,
            block_rate,
            extra_before_rate,
            extra_after_rate,
        })
    }

    /// 选定价格文档
    ///
    /// 排序: priority DESC → created_at DESC → rate_id ASC
    pub fn select_document(&self, query: &StayQuery) -> EngineResult<RateDocument> {
        let nights = query.nights();
        let mut candidates: Vec<RateDocument> = self
            .source
            .candidate_documents(query)?
            .into_iter()
            .filter(|doc| doc.covers(query.check_in, query.check_out))
            .filter(|doc| doc.admits_stay(query.check_in, nights, query.occupancy))
            .collect();

        candidates.sort_by(compare_precedence);

        candidates.into_iter().next().ok_or(EngineError::NoRateFound {
            variant_id: query.product_variant_id,
            supplier_id: query.supplier_id,
            check_in: query.check_in,
            check_out: query.check_out,
        })
    }
}

/// 解析住宿成本 (函数式入口)
pub fn resolve_stay_cost<S: RateSource>(
    source: S,
    query: &StayQuery,
) -> EngineResult<StayCostBreakdown> {
    RateResolver::new(source).resolve(query)
}

fn compare_precedence(a: &RateDocument, b: &RateDocument) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.rate_id.cmp(&b.rate_id))
}

/// 计算一个区段: 返回 (每晚价, 子成本),0 晚时为 (None, 0)
fn price_segment(
    document: &RateDocument,
    tiers: &[OccupancyTier],
    nights: u32,
    occupancy: u32,
) -> EngineResult<(Option<Decimal>, Decimal)> {
    if nights == 0 {
        return Ok((None, Decimal::ZERO));
    }

    let tier = tiers
        .iter()
        .find(|t| t.matches(occupancy))
        .ok_or_else(|| EngineError::NoOccupancyTier {
            rate_id: document.rate_id.clone(),
            occupancy,
        })?;

    let overflow = || EngineError::AmountOverflow {
        rate_id: document.rate_id.clone(),
    };
    let rate = tier.nightly_rate(occupancy).ok_or_else(overflow)?;
    let cost = rate.checked_mul(Decimal::from(nights)).ok_or_else(overflow)?;
    Ok((Some(rate), cost))
}
