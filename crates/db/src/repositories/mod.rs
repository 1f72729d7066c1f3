use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use rankscope_core::domain::metrics::{PeriodRecord, RawMetricRecord};
use rankscope_core::domain::site::{DomainId, TrackedDomain, UserId};

pub mod domains;
pub mod memory;
pub mod metrics;
pub mod search;

pub use domains::SqlDomainRepository;
pub use memory::{InMemoryDomainRepository, InMemoryMetricsRepository, InMemorySearchSeriesRepository};
pub use metrics::SqlMetricsRepository;
pub use search::SqlSearchSeriesRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait DomainRepository: Send + Sync {
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<TrackedDomain>, RepositoryError>;

    /// Tenancy check and lookup in one step: `None` when the domain does not
    /// exist or belongs to another user.
    async fn find_for_user(
        &self,
        user_id: &UserId,
        domain_id: &DomainId,
    ) -> Result<Option<TrackedDomain>, RepositoryError>;
}

/// Read interface over raw visibility telemetry. Rows are written by the
/// upstream calculation job; this service only reads them. No ordering is
/// guaranteed: the aggregation engine must not assume any.
#[async_trait]
pub trait MetricsRepository: Send + Sync {
    async fn list_for_domain(
        &self,
        user_id: &UserId,
        domain_id: &DomainId,
    ) -> Result<Vec<RawMetricRecord>, RepositoryError>;
}

/// Read interface over daily search-console rows. Results are ordered by
/// day ascending because the summary calculator contracts an ordered
/// series.
#[async_trait]
pub trait SearchSeriesRepository: Send + Sync {
    async fn list_range(
        &self,
        user_id: &UserId,
        domain_id: &DomainId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<PeriodRecord>, RepositoryError>;
}
