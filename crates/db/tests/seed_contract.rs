use std::sync::{Mutex, MutexGuard, OnceLock};

use rankscope_core::domain::site::{DomainId, UserId};
use rankscope_core::visibility::{build_region_report, ReportOptions};
use rankscope_db::repositories::{
    DomainRepository, MetricsRepository, SearchSeriesRepository, SqlDomainRepository,
    SqlMetricsRepository, SqlSearchSeriesRepository,
};
use rankscope_db::{connect_with_settings, migrations, SeedDataset};

// The shared-cache in-memory database is one per process, so tests that
// migrate and seed it must not interleave.
fn db_lock() -> MutexGuard<'static, ()> {
    static DB_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    DB_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn seeded_pool() -> rankscope_db::DbPool {
    let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 5)
        .await
        .expect("pool should connect");
    migrations::run_pending(&pool).await.expect("migrations should apply");
    SeedDataset::load(&pool).await.expect("seed should load");
    pool
}

fn demo_user() -> UserId {
    UserId(rankscope_db::fixtures::SEED_USER_ID.to_string())
}

#[tokio::test]
async fn seed_satisfies_its_own_contract() {
    let _guard = db_lock();
    let pool = seeded_pool().await;

    let verification = SeedDataset::verify(&pool).await.expect("verification should run");
    assert!(
        verification.all_present,
        "failed seed checks: {:?}",
        verification
            .checks
            .iter()
            .filter(|(_, present)| !present)
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
    );

    pool.close().await;
}

#[tokio::test]
async fn seed_load_is_idempotent() {
    let _guard = db_lock();
    let pool = seeded_pool().await;

    SeedDataset::load(&pool).await.expect("second load should succeed");
    let verification = SeedDataset::verify(&pool).await.expect("verification should run");
    assert!(verification.all_present);

    pool.close().await;
}

#[tokio::test]
async fn metrics_repository_round_trips_seeded_rows() {
    let _guard = db_lock();
    let pool = seeded_pool().await;
    let repository = SqlMetricsRepository::new(pool.clone());

    let records = repository
        .list_for_domain(&demo_user(), &DomainId("dom-acme".to_string()))
        .await
        .expect("listing should succeed");

    assert_eq!(records.len(), 7);
    let us = records
        .iter()
        .find(|record| record.raw_region_code == "us")
        .expect("us row should be present");
    assert_eq!(us.impressions, 48_200);
    assert!(us.ai_platforms_present.contains("perplexity"));
    assert_eq!(us.ai_best_position, Some(2.0));

    pool.close().await;
}

#[tokio::test]
async fn metrics_are_tenant_scoped() {
    let _guard = db_lock();
    let pool = seeded_pool().await;
    let repository = SqlMetricsRepository::new(pool.clone());

    let records = repository
        .list_for_domain(&UserId("user-other".to_string()), &DomainId("dom-acme".to_string()))
        .await
        .expect("listing should succeed");
    assert!(records.is_empty(), "another user must not see seeded rows");

    pool.close().await;
}

#[tokio::test]
async fn search_series_is_ordered_and_range_filtered() {
    let _guard = db_lock();
    let pool = seeded_pool().await;
    let repository = SqlSearchSeriesRepository::new(pool.clone());
    let domain = DomainId("dom-acme".to_string());

    let full = repository
        .list_range(&demo_user(), &domain, None, None)
        .await
        .expect("full range should succeed");
    assert_eq!(full.len(), 28);
    assert!(full.windows(2).all(|pair| pair[0].period < pair[1].period));

    let start = "2026-01-12".parse().expect("valid date");
    let end = "2026-01-18".parse().expect("valid date");
    let week = repository
        .list_range(&demo_user(), &domain, Some(start), Some(end))
        .await
        .expect("bounded range should succeed");
    assert_eq!(week.len(), 7);
    assert_eq!(week[0].period, start);
    assert_eq!(week[6].period, end);

    pool.close().await;
}

#[tokio::test]
async fn domain_repository_enforces_ownership() {
    let _guard = db_lock();
    let pool = seeded_pool().await;
    let repository = SqlDomainRepository::new(pool.clone());

    let owned = repository.list_for_user(&demo_user()).await.expect("listing should succeed");
    assert_eq!(owned.len(), 2);
    assert_eq!(owned[0].hostname, "acme.dev");

    let foreign = repository
        .find_for_user(&UserId("user-other".to_string()), &DomainId("dom-acme".to_string()))
        .await
        .expect("lookup should succeed");
    assert!(foreign.is_none(), "ownership check must hide foreign domains");

    pool.close().await;
}

#[tokio::test]
async fn seeded_rows_aggregate_into_the_expected_canonical_regions() {
    let _guard = db_lock();
    let pool = seeded_pool().await;
    let repository = SqlMetricsRepository::new(pool.clone());

    let records = repository
        .list_for_domain(&demo_user(), &DomainId("dom-acme".to_string()))
        .await
        .expect("listing should succeed");
    let report = build_region_report(&records, &ReportOptions::default());

    // us, gb (uk+gb), il_ps (il+ps), de: the zzz row is dropped.
    let codes: Vec<&str> = report.regions.iter().map(|r| r.region.as_str()).collect();
    assert_eq!(codes, vec!["de", "gb", "il_ps", "us"]);

    let gb = report.regions.iter().find(|r| r.region == "gb").expect("gb present");
    assert_eq!(gb.impressions, 9_100 + 3_400);
    assert_eq!(gb.clicks, 420 + 150);

    pool.close().await;
}
