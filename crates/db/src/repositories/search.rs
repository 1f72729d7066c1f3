use chrono::NaiveDate;
use sqlx::Row;

use rankscope_core::domain::metrics::PeriodRecord;
use rankscope_core::domain::site::{DomainId, UserId};

use super::{RepositoryError, SearchSeriesRepository};
use crate::DbPool;

pub struct SqlSearchSeriesRepository {
    pool: DbPool,
}

impl SqlSearchSeriesRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SearchSeriesRepository for SqlSearchSeriesRepository {
    async fn list_range(
        &self,
        user_id: &UserId,
        domain_id: &DomainId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<PeriodRecord>, RepositoryError> {
        // Days are `YYYY-MM-DD` text, so lexicographic comparison is
        // chronological and the open-ended bounds keep one query shape.
        let start_bound =
            start.map(|day| day.to_string()).unwrap_or_else(|| "0000-00-00".to_string());
        let end_bound = end.map(|day| day.to_string()).unwrap_or_else(|| "9999-99-99".to_string());

        let rows = sqlx::query(
            "SELECT day, clicks, impressions, avg_position
             FROM search_daily
             WHERE user_id = ?1 AND domain_id = ?2 AND day >= ?3 AND day <= ?4
             ORDER BY day ASC",
        )
        .bind(&user_id.0)
        .bind(&domain_id.0)
        .bind(start_bound)
        .bind(end_bound)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let day: String = row.try_get("day")?;
                let period = day.parse::<NaiveDate>().map_err(|error| {
                    RepositoryError::Decode(format!("day `{day}` is not a valid date: {error}"))
                })?;
                Ok(PeriodRecord {
                    period,
                    clicks: row.try_get::<i64, _>("clicks")?.max(0) as u64,
                    impressions: row.try_get::<i64, _>("impressions")?.max(0) as u64,
                    avg_position: row.try_get("avg_position")?,
                })
            })
            .collect()
    }
}
