// ==========================================
// AllocationRepository 集成测试
// ==========================================
// 测试目标: 配额窗口建档、库存桶批量写入幂等、租户隔离
// ==========================================

mod test_helpers;

use tour_allocation::engine::{expand_allocation_window, InventorySummary};
use tour_allocation::repository::AllocationRepository;
use tour_allocation::{AllocationType, Quantity};
use test_helpers::{
    committed_window, create_test_db, date, open_test_connection, OTHER_TENANT, TENANT,
};

#[test]
fn test_insert_and_find_window() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo = AllocationRepository::new(&db_path).expect("Failed to create repo");

    let window = committed_window("ALLOC-1", date(2024, 6, 1), date(2024, 6, 7), Some(14));
    repo.insert_window(&window).expect("insert window");

    let found = repo
        .find_window(TENANT, "ALLOC-1")
        .expect("query window")
        .expect("window should exist");
    assert_eq!(found, window);

    // 其他租户看不到
    let hidden = repo.find_window(OTHER_TENANT, "ALLOC-1").expect("query window");
    assert!(hidden.is_none());
}

#[test]
fn test_list_windows_with_release_skips_windows_without_policy() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo = AllocationRepository::new(&db_path).expect("Failed to create repo");

    repo.insert_window(&committed_window("A", date(2024, 6, 1), date(2024, 6, 7), Some(14)))
        .expect("insert A");
    repo.insert_window(&committed_window("B", date(2024, 7, 1), date(2024, 7, 7), None))
        .expect("insert B");

    assert_eq!(repo.list_windows(TENANT).expect("list").len(), 2);

    let with_release = repo.list_windows_with_release(TENANT).expect("list");
    assert_eq!(with_release.len(), 1);
    assert_eq!(with_release[0].allocation_id, "A");
}

#[test]
fn test_upsert_buckets_in_batches() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo = AllocationRepository::new(&db_path).expect("Failed to create repo");

    // 2024-06-01 是周六
    let window = committed_window("ALLOC-1", date(2024, 6, 1), date(2024, 6, 7), None);
    let buckets = expand_allocation_window(&window).expect("expand");

    let report = repo.upsert_buckets(buckets, 3).expect("upsert");
    assert_eq!(report.inserted, 7);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.batches, 3);

    let stored = repo
        .find_buckets(TENANT, 100, 500, date(2024, 6, 1), date(2024, 6, 7))
        .expect("find buckets");
    assert_eq!(stored.len(), 7);
    assert_eq!(stored[0].quantity, Quantity::Limited(5)); // 周六
    assert_eq!(stored[1].quantity, Quantity::Limited(5)); // 周日
    assert_eq!(stored[2].quantity, Quantity::Limited(10)); // 周一

    let summary = InventorySummary::from_buckets(&stored);
    assert_eq!(summary.total, Quantity::Limited(60));
}

#[test]
fn test_reexpansion_is_idempotent_and_keeps_usage() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo = AllocationRepository::new(&db_path).expect("Failed to create repo");

    let window = committed_window("ALLOC-1", date(2024, 6, 1), date(2024, 6, 7), None);
    repo.upsert_buckets(expand_allocation_window(&window).expect("expand"), 500)
        .expect("first upsert");

    repo.update_bucket_usage(TENANT, 100, 500, date(2024, 6, 3), 4, 1)
        .expect("update usage");

    let report = repo
        .upsert_buckets(expand_allocation_window(&window).expect("expand"), 500)
        .expect("second upsert");
    assert_eq!(report.inserted, 0);
    assert_eq!(report.skipped, 7);

    let stored = repo
        .find_buckets(TENANT, 100, 500, date(2024, 6, 3), date(2024, 6, 3))
        .expect("find bucket");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].booked, 4);
    assert_eq!(stored[0].held, 1);
    assert_eq!(stored[0].available(), Quantity::Limited(5));
}

#[test]
fn test_freesale_buckets_round_trip_as_unlimited() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo = AllocationRepository::new(&db_path).expect("Failed to create repo");

    let mut window = committed_window("FREE", date(2024, 6, 1), date(2024, 6, 2), None);
    window.allocation_type = AllocationType::Freesale;
    repo.upsert_buckets(expand_allocation_window(&window).expect("expand"), 500)
        .expect("upsert");

    let stored = repo
        .find_buckets(TENANT, 100, 500, date(2024, 6, 1), date(2024, 6, 2))
        .expect("find buckets");
    assert!(stored.iter().all(|b| b.quantity == Quantity::Unlimited));
    assert_eq!(
        InventorySummary::from_buckets(&stored).available,
        Quantity::Unlimited
    );
}

#[test]
fn test_update_usage_on_missing_bucket_is_not_found() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo = AllocationRepository::new(&db_path).expect("Failed to create repo");

    let result = repo.update_bucket_usage(TENANT, 100, 500, date(2024, 6, 3), 1, 0);
    assert!(matches!(
        result,
        Err(tour_allocation::repository::RepositoryError::NotFound { .. })
    ));
}

#[test]
fn test_buckets_are_tenant_scoped() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo = AllocationRepository::new(&db_path).expect("Failed to create repo");

    let window = committed_window("ALLOC-1", date(2024, 6, 1), date(2024, 6, 7), None);
    repo.upsert_buckets(expand_allocation_window(&window).expect("expand"), 500)
        .expect("upsert");

    let mut other = window.clone();
    other.tenant_id = OTHER_TENANT;
    let report = repo
        .upsert_buckets(expand_allocation_window(&other).expect("expand"), 500)
        .expect("upsert other tenant");
    assert_eq!(report.inserted, 7, "不同租户同日期不冲突");

    let stored = repo
        .find_buckets(OTHER_TENANT, 100, 500, date(2024, 6, 1), date(2024, 6, 7))
        .expect("find buckets");
    assert_eq!(stored.len(), 7);
    assert!(stored.iter().all(|b| b.tenant_id == OTHER_TENANT));
}

#[test]
fn test_same_allocation_id_in_two_tenants() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo = AllocationRepository::new(&db_path).expect("Failed to create repo");

    let window = committed_window("A1", date(2024, 6, 1), date(2024, 6, 7), Some(14));
    repo.insert_window(&window).expect("insert tenant 1");

    let mut other = window.clone();
    other.tenant_id = OTHER_TENANT;
    other.default_quantity = 4;
    repo.insert_window(&other).expect("insert tenant 2");

    let mine = repo.find_window(TENANT, "A1").expect("query").expect("tenant 1 window");
    let theirs = repo
        .find_window(OTHER_TENANT, "A1")
        .expect("query")
        .expect("tenant 2 window");
    assert_eq!(mine.default_quantity, 10);
    assert_eq!(theirs.default_quantity, 4);

    // 同租户内编号仍唯一
    let dup = repo.insert_window(&window);
    assert!(matches!(
        dup,
        Err(tour_allocation::repository::RepositoryError::UniqueConstraintViolation(_))
    ));
}

#[test]
fn test_create_window_with_buckets_is_atomic() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo = AllocationRepository::new(&db_path).expect("Failed to create repo");

    let window = committed_window("ALLOC-1", date(2024, 6, 1), date(2024, 6, 7), None);
    let report = repo
        .create_window_with_buckets(&window, expand_allocation_window(&window).expect("expand"), 3)
        .expect("create");
    assert_eq!(report.inserted, 7);
    assert_eq!(report.batches, 3);

    // 库存桶写入失败时窗口一并回滚
    let conn = open_test_connection(&db_path).expect("Failed to open db");
    conn.execute_batch("DROP TABLE daily_bucket;").expect("drop table");
    drop(conn);

    let broken = committed_window("ALLOC-2", date(2024, 7, 1), date(2024, 7, 3), None);
    let result = repo.create_window_with_buckets(
        &broken,
        expand_allocation_window(&broken).expect("expand"),
        500,
    );
    assert!(result.is_err());
    assert!(repo.find_window(TENANT, "ALLOC-2").expect("query").is_none());
}
