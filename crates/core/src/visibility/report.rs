//! Engine facade: raw rows in, dashboard-ready report out.

use serde::{Deserialize, Serialize};

use crate::domain::metrics::{CanonicalRegionRecord, RawMetricRecord};
use crate::visibility::classify::{classify, rank, QuadrantCounts, QuadrantThresholds};
use crate::visibility::reduce::reduce;
use crate::visibility::DEFAULT_TOP_OPPORTUNITIES;

/// Tunables for report generation, normally built from the `[report]`
/// config section.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReportOptions {
    pub thresholds: QuadrantThresholds,
    pub top_limit: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self { thresholds: QuadrantThresholds::default(), top_limit: DEFAULT_TOP_OPPORTUNITIES }
    }
}

/// One entry in the ranked opportunity list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityEntry {
    pub region: String,
    pub opportunity_score: f64,
    pub demand_score: f64,
    pub presence_score: f64,
}

/// Roll-up block accompanying the canonical region list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_regions: usize,
    pub count_per_quadrant: QuadrantCounts,
    /// Unweighted arithmetic mean of `overall_visibility_score` across
    /// regions: the region is the unit of interest here, not the
    /// impression.
    pub avg_visibility_score: f64,
    pub top_opportunities: Vec<OpportunityEntry>,
}

/// The region report returned to the API layer: canonical records sorted by
/// region code plus the summary roll-up.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionReport {
    pub regions: Vec<CanonicalRegionRecord>,
    pub summary: ReportSummary,
}

/// Build the full region report for one domain's raw record set.
///
/// Input needs no ordering; unattributable records are dropped. Empty input
/// yields an empty region list and an all-zero summary: "no data yet" is a
/// valid state, not an error.
pub fn build_region_report(records: &[RawMetricRecord], options: &ReportOptions) -> RegionReport {
    let reduced = reduce(records);

    let mut count_per_quadrant = QuadrantCounts::default();
    let mut score_sum = 0.0;
    for record in reduced.values() {
        count_per_quadrant.record(classify(record, &options.thresholds));
        score_sum += record.overall_visibility_score;
    }

    let avg_visibility_score = if reduced.is_empty() {
        0.0
    } else {
        round1(score_sum / reduced.len() as f64)
    };

    let top_opportunities = rank(reduced.values(), options.top_limit)
        .into_iter()
        .map(|record| OpportunityEntry {
            region: record.region.clone(),
            opportunity_score: record.opportunity_score,
            demand_score: record.demand_score,
            presence_score: record.overall_visibility_score,
        })
        .collect();

    let summary = ReportSummary {
        total_regions: reduced.len(),
        count_per_quadrant,
        avg_visibility_score,
        top_opportunities,
    };

    // BTreeMap iteration already yields ascending canonical codes.
    RegionReport { regions: reduced.into_values().collect(), summary }
}

/// Optional pre-filter: keep only the most recent calculation run per raw
/// region code.
///
/// This is deliberately separate from [`reduce`]: the fold itself is
/// additive and statistical, and conflating "pick latest per raw code" with
/// "merge by canonical code" inside one function risks double-counting.
/// Callers that want point-in-time semantics apply this first. Output is
/// ordered by raw code for determinism; ties on `calculated_at` keep the
/// last row encountered.
pub fn latest_per_raw_code(records: &[RawMetricRecord]) -> Vec<RawMetricRecord> {
    use std::collections::BTreeMap;

    let mut latest: BTreeMap<String, &RawMetricRecord> = BTreeMap::new();
    for record in records {
        let key = record.raw_region_code.trim().to_ascii_lowercase();
        match latest.get(&key) {
            Some(existing) if existing.calculated_at > record.calculated_at => {}
            _ => {
                latest.insert(key, record);
            }
        }
    }

    latest.into_values().cloned().collect()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
