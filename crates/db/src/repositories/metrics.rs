use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use rankscope_core::domain::metrics::RawMetricRecord;
use rankscope_core::domain::site::{DomainId, UserId};

use super::{MetricsRepository, RepositoryError};
use crate::DbPool;

pub struct SqlMetricsRepository {
    pool: DbPool,
}

impl SqlMetricsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MetricsRepository for SqlMetricsRepository {
    async fn list_for_domain(
        &self,
        user_id: &UserId,
        domain_id: &DomainId,
    ) -> Result<Vec<RawMetricRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT raw_region_code, user_id, domain_id, impressions, clicks,
                    organic_score, ai_visibility_score, demand_score,
                    overall_visibility_score, opportunity_score, avg_position,
                    ai_mention_count, ai_platforms_present, ai_mentioned_competitors,
                    ai_domain_found, ai_best_position, calculated_at
             FROM visibility_metric
             WHERE user_id = ?1 AND domain_id = ?2",
        )
        .bind(&user_id.0)
        .bind(&domain_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(decode_metric_row).collect()
    }
}

fn decode_metric_row(row: &SqliteRow) -> Result<RawMetricRecord, RepositoryError> {
    Ok(RawMetricRecord {
        raw_region_code: row.try_get("raw_region_code")?,
        domain_id: DomainId(row.try_get("domain_id")?),
        user_id: UserId(row.try_get("user_id")?),
        impressions: non_negative(row.try_get("impressions")?),
        clicks: non_negative(row.try_get("clicks")?),
        organic_score: row.try_get("organic_score")?,
        ai_visibility_score: row.try_get("ai_visibility_score")?,
        demand_score: row.try_get("demand_score")?,
        overall_visibility_score: row.try_get("overall_visibility_score")?,
        opportunity_score: row.try_get("opportunity_score")?,
        avg_position: row.try_get("avg_position")?,
        ai_mention_count: non_negative(row.try_get("ai_mention_count")?),
        ai_platforms_present: decode_string_set(row, "ai_platforms_present")?,
        ai_mentioned_competitors: decode_string_set(row, "ai_mentioned_competitors")?,
        ai_domain_found: row.try_get("ai_domain_found")?,
        ai_best_position: row.try_get("ai_best_position")?,
        calculated_at: row.try_get::<DateTime<Utc>, _>("calculated_at")?,
    })
}

fn decode_string_set(row: &SqliteRow, column: &str) -> Result<BTreeSet<String>, RepositoryError> {
    let raw: String = row.try_get(column)?;
    serde_json::from_str(&raw)
        .map_err(|error| RepositoryError::Decode(format!("{column} is not a JSON string array: {error}")))
}

// SQLite integers are signed; the schema defaults keep counts at zero or
// above, so clamp rather than fail on a hand-edited negative.
fn non_negative(value: i64) -> u64 {
    value.max(0) as u64
}
