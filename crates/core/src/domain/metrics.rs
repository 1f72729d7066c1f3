use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::site::{DomainId, UserId};

/// One row of visibility telemetry as written by the upstream calculation
/// job: a single (domain, region, run) observation. Rows are immutable once
/// persisted; the engine only ever reads them.
///
/// `raw_region_code` is whatever the provider reported and is not guaranteed
/// canonical: two rows may describe the same real-world region under
/// different codes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetricRecord {
    pub raw_region_code: String,
    pub domain_id: DomainId,
    pub user_id: UserId,
    pub impressions: u64,
    pub clicks: u64,
    pub organic_score: f64,
    pub ai_visibility_score: f64,
    pub demand_score: f64,
    pub overall_visibility_score: f64,
    pub opportunity_score: f64,
    pub avg_position: f64,
    pub ai_mention_count: u64,
    pub ai_platforms_present: BTreeSet<String>,
    pub ai_mentioned_competitors: BTreeSet<String>,
    pub ai_domain_found: bool,
    pub ai_best_position: Option<f64>,
    pub calculated_at: DateTime<Utc>,
}

/// The reduction target: one merged record per canonical region code for a
/// given domain. Count fields hold sums over contributing raw records, rate
/// fields hold impression-weighted averages, and `calculated_at` carries the
/// most recent contributing timestamp.
///
/// Canonical records are ephemeral: recomputed on every query, never
/// persisted by the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRegionRecord {
    pub region: String,
    pub domain_id: DomainId,
    pub user_id: UserId,
    pub impressions: u64,
    pub clicks: u64,
    pub organic_score: f64,
    pub ai_visibility_score: f64,
    pub demand_score: f64,
    pub overall_visibility_score: f64,
    pub opportunity_score: f64,
    pub avg_position: f64,
    pub ai_mention_count: u64,
    pub ai_platforms_present: BTreeSet<String>,
    pub ai_mentioned_competitors: BTreeSet<String>,
    pub ai_domain_found: bool,
    pub ai_best_position: Option<f64>,
    pub calculated_at: DateTime<Utc>,
}

impl CanonicalRegionRecord {
    /// Seed an accumulator from the first raw record attributed to a
    /// canonical code. Rate fields start as the record's own values carrying
    /// the record's own impressions as weight.
    pub fn seed(region: impl Into<String>, record: &RawMetricRecord) -> Self {
        Self {
            region: region.into(),
            domain_id: record.domain_id.clone(),
            user_id: record.user_id.clone(),
            impressions: record.impressions,
            clicks: record.clicks,
            organic_score: record.organic_score,
            ai_visibility_score: record.ai_visibility_score,
            demand_score: record.demand_score,
            overall_visibility_score: record.overall_visibility_score,
            opportunity_score: record.opportunity_score,
            avg_position: record.avg_position,
            ai_mention_count: record.ai_mention_count,
            ai_platforms_present: record.ai_platforms_present.clone(),
            ai_mentioned_competitors: record.ai_mentioned_competitors.clone(),
            ai_domain_found: record.ai_domain_found,
            ai_best_position: record.ai_best_position,
            calculated_at: record.calculated_at,
        }
    }
}

/// One day of search-console data for a domain, used by the time-range
/// summary. The store hands these to `summarize` ordered by `period`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodRecord {
    pub period: NaiveDate,
    pub clicks: u64,
    pub impressions: u64,
    pub avg_position: f64,
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Utc;

    use crate::domain::site::{DomainId, UserId};

    use super::{CanonicalRegionRecord, RawMetricRecord};

    fn raw(region: &str, impressions: u64) -> RawMetricRecord {
        RawMetricRecord {
            raw_region_code: region.to_string(),
            domain_id: DomainId("dom-1".to_string()),
            user_id: UserId("user-1".to_string()),
            impressions,
            clicks: 2,
            organic_score: 40.0,
            ai_visibility_score: 10.0,
            demand_score: 55.0,
            overall_visibility_score: 30.0,
            opportunity_score: 62.5,
            avg_position: 8.4,
            ai_mention_count: 1,
            ai_platforms_present: BTreeSet::from(["chatgpt".to_string()]),
            ai_mentioned_competitors: BTreeSet::new(),
            ai_domain_found: true,
            ai_best_position: Some(2.0),
            calculated_at: Utc::now(),
        }
    }

    #[test]
    fn seed_copies_metrics_and_rekeys_by_canonical_code() {
        let record = raw("uk", 120);
        let seeded = CanonicalRegionRecord::seed("gb", &record);

        assert_eq!(seeded.region, "gb");
        assert_eq!(seeded.impressions, 120);
        assert_eq!(seeded.opportunity_score, record.opportunity_score);
        assert_eq!(seeded.ai_best_position, Some(2.0));
    }

    #[test]
    fn records_serialize_with_camel_case_keys() {
        let json = serde_json::to_value(raw("us", 10)).expect("serialize");
        assert_eq!(json["rawRegionCode"], "us");
        assert_eq!(json["aiMentionCount"], 1);
        assert_eq!(json["aiDomainFound"], true);
    }
}
