// ==========================================
// RateRepository 集成测试
// ==========================================
// 测试目标: 价格文档落库/还原、候选过滤、经仓储报价与毛利
// ==========================================

mod test_helpers;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tour_allocation::domain::{OccupancyTier, Season};
use tour_allocation::engine::{calculate_margin, resolve_stay_cost, EngineError};
use tour_allocation::repository::RateRepository;
use tour_allocation::{DowMask, PricingModel, StayQuery};
use test_helpers::{
    create_test_db, date, datetime, fixed_tier, rate_document, OTHER_TENANT, TENANT,
};

fn stay(check_in: (i32, u32, u32), check_out: (i32, u32, u32), occupancy: u32) -> StayQuery {
    StayQuery::new(
        TENANT,
        100,
        date(check_in.0, check_in.1, check_in.2),
        date(check_out.0, check_out.1, check_out.2),
        occupancy,
    )
}

#[test]
fn test_document_round_trip_with_seasons_and_tiers() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo = RateRepository::new(&db_path).expect("Failed to create repo");

    let mut doc = rate_document("R-1", Some(500), dec!(100), 0);
    doc.block_window = Some((date(2024, 6, 1), date(2024, 6, 8)));
    doc.seasons = vec![Season {
        season_from: date(2024, 6, 1),
        season_to: date(2024, 8, 31),
        dow_mask: DowMask::ALL,
        min_stay: Some(2),
        max_stay: None,
        min_pax: None,
        max_pax: Some(4),
    }];
    doc.extra_night_tiers = vec![OccupancyTier {
        min_occupancy: 1,
        max_occupancy: 4,
        pricing_model: PricingModel::BasePlusPax,
        base_amount: dec!(80),
        per_person_amount: dec!(12.5),
    }];
    repo.insert_document(&doc).expect("insert document");

    let found = repo
        .find_candidates(TENANT, 100, Some(500), "standard")
        .expect("find candidates");
    assert_eq!(found, vec![doc]);
}

#[test]
fn test_candidates_filter_by_supplier_and_tenant() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo = RateRepository::new(&db_path).expect("Failed to create repo");

    repo.insert_document(&rate_document("COST", Some(500), dec!(100), 0))
        .expect("insert cost");
    repo.insert_document(&rate_document("SELL", None, dec!(160), 0))
        .expect("insert selling");

    let selling = repo
        .find_candidates(TENANT, 100, None, "standard")
        .expect("find selling");
    assert_eq!(selling.len(), 1);
    assert_eq!(selling[0].rate_id, "SELL");

    let cost = repo
        .find_candidates(TENANT, 100, Some(500), "standard")
        .expect("find cost");
    assert_eq!(cost.len(), 1);
    assert_eq!(cost[0].rate_id, "COST");

    assert!(repo
        .find_candidates(OTHER_TENANT, 100, None, "standard")
        .expect("find other tenant")
        .is_empty());
    assert!(repo
        .find_candidates(TENANT, 100, None, "suite")
        .expect("find suite")
        .is_empty());
}

#[test]
fn test_resolve_through_repository_prefers_priority_then_recency() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo = RateRepository::new(&db_path).expect("Failed to create repo");

    let low = rate_document("LOW", None, dec!(90), 0);
    let mut high_old = rate_document("HIGH-OLD", None, dec!(120), 5);
    high_old.created_at = datetime(2024, 1, 1, 9);
    let mut high_new = rate_document("HIGH-NEW", None, dec!(130), 5);
    high_new.created_at = datetime(2024, 2, 1, 9);

    for doc in [&low, &high_old, &high_new] {
        repo.insert_document(doc).expect("insert document");
    }

    let breakdown = resolve_stay_cost(&repo, &stay((2024, 6, 3), (2024, 6, 5), 2)).expect("resolve");
    assert_eq!(breakdown.rate_id, "HIGH-NEW");
    assert_eq!(breakdown.total_cost, dec!(260));
}

#[test]
fn test_block_window_split_through_repository() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo = RateRepository::new(&db_path).expect("Failed to create repo");

    let mut doc = rate_document("BLOCK", None, dec!(100), 0);
    doc.block_window = Some((date(2024, 6, 3), date(2024, 6, 6)));
    doc.extra_night_tiers = vec![fixed_tier(1, 4, dec!(70))];
    repo.insert_document(&doc).expect("insert document");

    // 6/1, 6/2 加晚; 6/3..6/5 包房; 6/6 加晚
    let breakdown = resolve_stay_cost(&repo, &stay((2024, 6, 1), (2024, 6, 7), 2)).expect("resolve");
    assert_eq!(breakdown.extra_before_nights, 2);
    assert_eq!(breakdown.block_nights, 3);
    assert_eq!(breakdown.extra_after_nights, 1);
    assert_eq!(breakdown.total_cost, dec!(70) * Decimal::from(3) + dec!(300));
}

#[test]
fn test_margin_through_repository() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo = RateRepository::new(&db_path).expect("Failed to create repo");

    repo.insert_document(&rate_document("COST", Some(500), dec!(100), 0))
        .expect("insert cost");
    repo.insert_document(&rate_document("SELL", None, dec!(500) / dec!(3), 0))
        .expect("insert selling");

    // 3 晚: 成本 300, 售价 500
    let result = calculate_margin(&repo, &stay((2024, 6, 3), (2024, 6, 6), 2), 500).expect("margin");
    assert_eq!(result.supplier_cost, dec!(300));
    assert_eq!(result.rounded(2).selling_price, dec!(500.00));
    assert_eq!(result.rounded(2).margin_percentage, dec!(40.00));
}

#[test]
fn test_unpriced_occupancy_is_reported() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo = RateRepository::new(&db_path).expect("Failed to create repo");

    repo.insert_document(&rate_document("SELL", None, dec!(100), 0))
        .expect("insert selling");

    let err = resolve_stay_cost(&repo, &stay((2024, 6, 3), (2024, 6, 5), 6)).unwrap_err();
    assert_eq!(
        err,
        EngineError::NoOccupancyTier {
            rate_id: "SELL".to_string(),
            occupancy: 6,
        }
    );
}

#[test]
fn test_same_rate_id_in_two_tenants() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo = RateRepository::new(&db_path).expect("Failed to create repo");

    let mut mine = rate_document("R1", None, dec!(100), 0);
    mine.extra_night_tiers = vec![fixed_tier(1, 4, dec!(130))];
    repo.insert_document(&mine).expect("insert tenant 1");

    let mut theirs = rate_document("R1", None, dec!(90), 0);
    theirs.tenant_id = OTHER_TENANT;
    repo.insert_document(&theirs).expect("insert tenant 2");

    let found = repo
        .find_candidates(OTHER_TENANT, 100, None, "standard")
        .expect("find tenant 2");
    assert_eq!(found, vec![theirs]);

    // 档位按租户加载，不串入另一租户的加晚档位
    let found = repo
        .find_candidates(TENANT, 100, None, "standard")
        .expect("find tenant 1");
    assert_eq!(found, vec![mine]);
}
