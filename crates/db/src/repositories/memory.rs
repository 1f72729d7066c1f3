use chrono::NaiveDate;
use tokio::sync::RwLock;

use rankscope_core::domain::metrics::{PeriodRecord, RawMetricRecord};
use rankscope_core::domain::site::{DomainId, TrackedDomain, UserId};

use super::{DomainRepository, MetricsRepository, RepositoryError, SearchSeriesRepository};

#[derive(Default)]
pub struct InMemoryDomainRepository {
    domains: RwLock<Vec<TrackedDomain>>,
}

impl InMemoryDomainRepository {
    pub async fn push(&self, domain: TrackedDomain) {
        self.domains.write().await.push(domain);
    }
}

#[async_trait::async_trait]
impl DomainRepository for InMemoryDomainRepository {
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<TrackedDomain>, RepositoryError> {
        let domains = self.domains.read().await;
        let mut owned: Vec<TrackedDomain> =
            domains.iter().filter(|domain| &domain.user_id == user_id).cloned().collect();
        owned.sort_by(|a, b| a.hostname.cmp(&b.hostname));
        Ok(owned)
    }

    async fn find_for_user(
        &self,
        user_id: &UserId,
        domain_id: &DomainId,
    ) -> Result<Option<TrackedDomain>, RepositoryError> {
        let domains = self.domains.read().await;
        Ok(domains
            .iter()
            .find(|domain| &domain.id == domain_id && &domain.user_id == user_id)
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryMetricsRepository {
    records: RwLock<Vec<RawMetricRecord>>,
}

impl InMemoryMetricsRepository {
    pub async fn push(&self, record: RawMetricRecord) {
        self.records.write().await.push(record);
    }
}

#[async_trait::async_trait]
impl MetricsRepository for InMemoryMetricsRepository {
    async fn list_for_domain(
        &self,
        user_id: &UserId,
        domain_id: &DomainId,
    ) -> Result<Vec<RawMetricRecord>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|record| &record.user_id == user_id && &record.domain_id == domain_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemorySearchSeriesRepository {
    periods: RwLock<Vec<(UserId, DomainId, PeriodRecord)>>,
}

impl InMemorySearchSeriesRepository {
    pub async fn push(&self, user_id: UserId, domain_id: DomainId, period: PeriodRecord) {
        self.periods.write().await.push((user_id, domain_id, period));
    }
}

#[async_trait::async_trait]
impl SearchSeriesRepository for InMemorySearchSeriesRepository {
    async fn list_range(
        &self,
        user_id: &UserId,
        domain_id: &DomainId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<PeriodRecord>, RepositoryError> {
        let periods = self.periods.read().await;
        let mut matching: Vec<PeriodRecord> = periods
            .iter()
            .filter(|(owner, domain, period)| {
                owner == user_id
                    && domain == domain_id
                    && start.map(|bound| period.period >= bound).unwrap_or(true)
                    && end.map(|bound| period.period <= bound).unwrap_or(true)
            })
            .map(|(_, _, period)| period.clone())
            .collect();
        matching.sort_by_key(|period| period.period);
        Ok(matching)
    }
}
