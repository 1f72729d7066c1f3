use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use rankscope_core::domain::site::{DomainId, TrackedDomain, UserId};

use super::{DomainRepository, RepositoryError};
use crate::DbPool;

pub struct SqlDomainRepository {
    pool: DbPool,
}

impl SqlDomainRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl DomainRepository for SqlDomainRepository {
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<TrackedDomain>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, hostname, created_at
             FROM tracked_domain
             WHERE user_id = ?1
             ORDER BY hostname ASC",
        )
        .bind(&user_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(decode_domain_row).collect()
    }

    async fn find_for_user(
        &self,
        user_id: &UserId,
        domain_id: &DomainId,
    ) -> Result<Option<TrackedDomain>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, user_id, hostname, created_at
             FROM tracked_domain
             WHERE id = ?1 AND user_id = ?2",
        )
        .bind(&domain_id.0)
        .bind(&user_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(decode_domain_row).transpose()
    }
}

fn decode_domain_row(row: &SqliteRow) -> Result<TrackedDomain, RepositoryError> {
    Ok(TrackedDomain {
        id: DomainId(row.try_get("id")?),
        user_id: UserId(row.try_get("user_id")?),
        hostname: row.try_get("hostname")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}
