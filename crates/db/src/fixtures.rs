use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Deterministic demo dataset: one user, two tracked domains, visibility
/// rows covering the interesting aggregation shapes (alias merge, contested
/// merge, unattributable row), and four weeks of search-console days.
///
/// Loading is idempotent: rows are keyed by fixed ids and upserted, so
/// `seed` can run against a database that already holds the fixtures.
pub const SEED_USER_ID: &str = "user-demo";

const SEED_DOMAINS: &[(&str, &str)] = &[("dom-acme", "acme.dev"), ("dom-orbit", "orbitlabs.io")];

struct SeedMetricRow {
    id: &'static str,
    domain_id: &'static str,
    raw_region_code: &'static str,
    impressions: i64,
    clicks: i64,
    organic_score: f64,
    ai_visibility_score: f64,
    demand_score: f64,
    overall_visibility_score: f64,
    opportunity_score: f64,
    avg_position: f64,
    ai_mention_count: i64,
    ai_platforms_present: &'static str,
    ai_mentioned_competitors: &'static str,
    ai_domain_found: bool,
    ai_best_position: Option<f64>,
    calculated_at: &'static str,
}

const SEED_METRICS: &[SeedMetricRow] = &[
    SeedMetricRow {
        id: "seed-vm-001",
        domain_id: "dom-acme",
        raw_region_code: "us",
        impressions: 48_200,
        clicks: 2_410,
        organic_score: 72.0,
        ai_visibility_score: 41.0,
        demand_score: 66.0,
        overall_visibility_score: 68.5,
        opportunity_score: 55.0,
        avg_position: 4.2,
        ai_mention_count: 18,
        ai_platforms_present: r#"["chatgpt","perplexity"]"#,
        ai_mentioned_competitors: r#"["rival.io"]"#,
        ai_domain_found: true,
        ai_best_position: Some(2.0),
        calculated_at: "2026-02-01T06:00:00Z",
    },
    // `uk` and `gb` are the alias-merge case: both fold into canonical `gb`.
    SeedMetricRow {
        id: "seed-vm-002",
        domain_id: "dom-acme",
        raw_region_code: "uk",
        impressions: 9_100,
        clicks: 420,
        organic_score: 48.0,
        ai_visibility_score: 22.0,
        demand_score: 58.0,
        overall_visibility_score: 44.0,
        opportunity_score: 61.0,
        avg_position: 7.8,
        ai_mention_count: 4,
        ai_platforms_present: r#"["chatgpt"]"#,
        ai_mentioned_competitors: r#"[]"#,
        ai_domain_found: true,
        ai_best_position: Some(5.0),
        calculated_at: "2026-02-01T06:00:00Z",
    },
    SeedMetricRow {
        id: "seed-vm-003",
        domain_id: "dom-acme",
        raw_region_code: "gb",
        impressions: 3_400,
        clicks: 150,
        organic_score: 52.0,
        ai_visibility_score: 18.0,
        demand_score: 54.0,
        overall_visibility_score: 46.0,
        opportunity_score: 63.0,
        avg_position: 8.6,
        ai_mention_count: 2,
        ai_platforms_present: r#"["gemini"]"#,
        ai_mentioned_competitors: r#"["rival.io","otherco.com"]"#,
        ai_domain_found: false,
        ai_best_position: None,
        calculated_at: "2026-02-01T06:05:00Z",
    },
    // `il` and `ps` are the contested-territory case: both fold into `il_ps`.
    SeedMetricRow {
        id: "seed-vm-004",
        domain_id: "dom-acme",
        raw_region_code: "il",
        impressions: 1_800,
        clicks: 95,
        organic_score: 38.0,
        ai_visibility_score: 12.0,
        demand_score: 71.0,
        overall_visibility_score: 31.0,
        opportunity_score: 78.0,
        avg_position: 11.4,
        ai_mention_count: 1,
        ai_platforms_present: r#"[]"#,
        ai_mentioned_competitors: r#"[]"#,
        ai_domain_found: false,
        ai_best_position: None,
        calculated_at: "2026-02-01T06:10:00Z",
    },
    SeedMetricRow {
        id: "seed-vm-005",
        domain_id: "dom-acme",
        raw_region_code: "ps",
        impressions: 650,
        clicks: 40,
        organic_score: 29.0,
        ai_visibility_score: 9.0,
        demand_score: 74.0,
        overall_visibility_score: 26.0,
        opportunity_score: 81.0,
        avg_position: 13.0,
        ai_mention_count: 1,
        ai_platforms_present: r#"["chatgpt"]"#,
        ai_mentioned_competitors: r#"[]"#,
        ai_domain_found: true,
        ai_best_position: Some(9.0),
        calculated_at: "2026-02-01T06:10:00Z",
    },
    SeedMetricRow {
        id: "seed-vm-006",
        domain_id: "dom-acme",
        raw_region_code: "de",
        impressions: 12_700,
        clicks: 510,
        organic_score: 55.0,
        ai_visibility_score: 28.0,
        demand_score: 49.0,
        overall_visibility_score: 50.0,
        opportunity_score: 44.0,
        avg_position: 6.9,
        ai_mention_count: 6,
        ai_platforms_present: r#"["perplexity"]"#,
        ai_mentioned_competitors: r#"["rival.io"]"#,
        ai_domain_found: true,
        ai_best_position: Some(3.0),
        calculated_at: "2026-02-01T06:15:00Z",
    },
    // Unattributable row: the engine must drop it, not bucket it anywhere.
    SeedMetricRow {
        id: "seed-vm-007",
        domain_id: "dom-acme",
        raw_region_code: "zzz",
        impressions: 2_200,
        clicks: 80,
        organic_score: 33.0,
        ai_visibility_score: 5.0,
        demand_score: 20.0,
        overall_visibility_score: 25.0,
        opportunity_score: 15.0,
        avg_position: 14.2,
        ai_mention_count: 0,
        ai_platforms_present: r#"[]"#,
        ai_mentioned_competitors: r#"[]"#,
        ai_domain_found: false,
        ai_best_position: None,
        calculated_at: "2026-02-01T06:20:00Z",
    },
    SeedMetricRow {
        id: "seed-vm-008",
        domain_id: "dom-orbit",
        raw_region_code: "us",
        impressions: 5_300,
        clicks: 210,
        organic_score: 35.0,
        ai_visibility_score: 15.0,
        demand_score: 62.0,
        overall_visibility_score: 30.0,
        opportunity_score: 69.0,
        avg_position: 9.8,
        ai_mention_count: 3,
        ai_platforms_present: r#"["chatgpt"]"#,
        ai_mentioned_competitors: r#"[]"#,
        ai_domain_found: true,
        ai_best_position: Some(6.0),
        calculated_at: "2026-02-01T07:00:00Z",
    },
];

const SEARCH_SEED_DOMAIN: &str = "dom-acme";
const SEARCH_SEED_DAYS: u32 = 28;
const SEARCH_SEED_START: (i32, u32, u32) = (2026, 1, 5);

#[derive(Debug)]
pub struct SeedResult {
    pub domains_seeded: usize,
    pub metric_rows: usize,
    pub search_days: usize,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

pub struct SeedDataset;

impl SeedDataset {
    /// Upsert the full fixture dataset inside one transaction.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        for (id, hostname) in SEED_DOMAINS {
            tx.execute(
                sqlx::query(
                    "INSERT OR REPLACE INTO tracked_domain (id, user_id, hostname, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .bind(id)
                .bind(SEED_USER_ID)
                .bind(hostname)
                .bind("2026-01-02T09:00:00Z"),
            )
            .await?;
        }

        for row in SEED_METRICS {
            tx.execute(
                sqlx::query(
                    "INSERT OR REPLACE INTO visibility_metric (
                         id, user_id, domain_id, raw_region_code, impressions, clicks,
                         organic_score, ai_visibility_score, demand_score,
                         overall_visibility_score, opportunity_score, avg_position,
                         ai_mention_count, ai_platforms_present, ai_mentioned_competitors,
                         ai_domain_found, ai_best_position, calculated_at
                     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
                )
                .bind(row.id)
                .bind(SEED_USER_ID)
                .bind(row.domain_id)
                .bind(row.raw_region_code)
                .bind(row.impressions)
                .bind(row.clicks)
                .bind(row.organic_score)
                .bind(row.ai_visibility_score)
                .bind(row.demand_score)
                .bind(row.overall_visibility_score)
                .bind(row.opportunity_score)
                .bind(row.avg_position)
                .bind(row.ai_mention_count)
                .bind(row.ai_platforms_present)
                .bind(row.ai_mentioned_competitors)
                .bind(row.ai_domain_found)
                .bind(row.ai_best_position)
                .bind(row.calculated_at),
            )
            .await?;
        }

        for (offset, day) in seed_days() {
            // Deterministic but non-flat traffic: a weekly cycle on top of a
            // slow upward drift, so trend figures are non-zero.
            let weekday_boost = (offset % 7) as i64 * 12;
            let clicks = 40 + weekday_boost + offset as i64 * 2;
            let impressions = 1_000 + weekday_boost * 10 + offset as i64 * 55;
            let avg_position = 9.0 - offset as f64 * 0.08;

            tx.execute(
                sqlx::query(
                    "INSERT OR REPLACE INTO search_daily (
                         id, user_id, domain_id, day, clicks, impressions, avg_position
                     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )
                .bind(format!("seed-sd-{offset:03}"))
                .bind(SEED_USER_ID)
                .bind(SEARCH_SEED_DOMAIN)
                .bind(day)
                .bind(clicks)
                .bind(impressions)
                .bind(avg_position),
            )
            .await?;
        }

        tx.commit().await?;

        Ok(SeedResult {
            domains_seeded: SEED_DOMAINS.len(),
            metric_rows: SEED_METRICS.len(),
            search_days: SEARCH_SEED_DAYS as usize,
        })
    }

    /// Verify the fixtures exist and match the contract above.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let domain_count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM tracked_domain WHERE user_id = ?1")
                .bind(SEED_USER_ID)
                .fetch_one(pool)
                .await?;
        checks.push(("tracked-domains", domain_count == SEED_DOMAINS.len() as i64));

        for (id, _) in SEED_DOMAINS {
            let expected =
                SEED_METRICS.iter().filter(|row| row.domain_id == *id).count() as i64;
            let actual: i64 =
                sqlx::query_scalar("SELECT COUNT(1) FROM visibility_metric WHERE domain_id = ?1")
                    .bind(id)
                    .fetch_one(pool)
                    .await?;
            checks.push(("visibility-metric-rows", actual == expected));
        }

        let search_count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM search_daily WHERE domain_id = ?1")
                .bind(SEARCH_SEED_DOMAIN)
                .fetch_one(pool)
                .await?;
        checks.push(("search-days", search_count == SEARCH_SEED_DAYS as i64));

        let total_impressions: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(impressions), 0) FROM visibility_metric WHERE domain_id = 'dom-acme'",
        )
        .fetch_one(pool)
        .await?;
        let expected_impressions: i64 = SEED_METRICS
            .iter()
            .filter(|row| row.domain_id == "dom-acme")
            .map(|row| row.impressions)
            .sum();
        checks.push(("impression-conservation", total_impressions == expected_impressions));

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }
}

fn seed_days() -> impl Iterator<Item = (u32, String)> {
    let (year, month, day) = SEARCH_SEED_START;
    (0..SEARCH_SEED_DAYS).filter_map(move |offset| {
        let start = chrono::NaiveDate::from_ymd_opt(year, month, day)?;
        let date = start.checked_add_days(chrono::Days::new(offset as u64))?;
        Some((offset, date.to_string()))
    })
}
