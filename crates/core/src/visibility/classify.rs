//! Quadrant classification and opportunity ranking over the canonical
//! region set.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::domain::metrics::CanonicalRegionRecord;

/// The four classification buckets over the presence/demand axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    /// Established visibility that is currently performing.
    Strong,
    /// Some presence with high market demand behind it.
    Emerging,
    /// Presence without the demand to sustain it.
    Declining,
    /// No meaningful presence.
    Absent,
}

/// Score cutoffs for quadrant assignment. These are configuration, not
/// algorithm: the dashboard's `[report]` section overrides them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuadrantThresholds {
    /// Presence below this is no presence at all.
    pub presence_floor: f64,
    /// Presence at or above this is established.
    pub presence_strong: f64,
    /// Demand at or above this marks a region worth growing into.
    pub demand_high: f64,
}

impl Default for QuadrantThresholds {
    fn default() -> Self {
        Self { presence_floor: 5.0, presence_strong: 60.0, demand_high: 50.0 }
    }
}

/// Assign a quadrant from the record's current scores.
///
/// Pure and stable: identical input always yields the identical label. The
/// presence axis is `overall_visibility_score`, the demand axis is
/// `demand_score`.
pub fn classify(record: &CanonicalRegionRecord, thresholds: &QuadrantThresholds) -> Quadrant {
    let presence = record.overall_visibility_score;
    let demand = record.demand_score;

    if presence < thresholds.presence_floor {
        Quadrant::Absent
    } else if presence >= thresholds.presence_strong {
        Quadrant::Strong
    } else if demand >= thresholds.demand_high {
        Quadrant::Emerging
    } else {
        Quadrant::Declining
    }
}

/// Rank canonical records by `opportunity_score` descending, ties broken by
/// canonical code ascending, truncated to `limit`.
pub fn rank<'a>(
    records: impl IntoIterator<Item = &'a CanonicalRegionRecord>,
    limit: usize,
) -> Vec<&'a CanonicalRegionRecord> {
    let mut ranked: Vec<&CanonicalRegionRecord> = records.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.opportunity_score
            .partial_cmp(&a.opportunity_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.region.cmp(&b.region))
    });
    ranked.truncate(limit);
    ranked
}

/// Per-quadrant region counts for the report summary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuadrantCounts {
    pub strong: u32,
    pub emerging: u32,
    pub declining: u32,
    pub absent: u32,
}

impl QuadrantCounts {
    pub fn record(&mut self, quadrant: Quadrant) {
        match quadrant {
            Quadrant::Strong => self.strong += 1,
            Quadrant::Emerging => self.emerging += 1,
            Quadrant::Declining => self.declining += 1,
            Quadrant::Absent => self.absent += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Utc;

    use crate::domain::metrics::CanonicalRegionRecord;
    use crate::domain::site::{DomainId, UserId};

    use super::{classify, rank, Quadrant, QuadrantCounts, QuadrantThresholds};

    fn region(code: &str, presence: f64, demand: f64, opportunity: f64) -> CanonicalRegionRecord {
        CanonicalRegionRecord {
            region: code.to_string(),
            domain_id: DomainId("dom-1".to_string()),
            user_id: UserId("user-1".to_string()),
            impressions: 100,
            clicks: 10,
            organic_score: presence,
            ai_visibility_score: 0.0,
            demand_score: demand,
            overall_visibility_score: presence,
            opportunity_score: opportunity,
            avg_position: 5.0,
            ai_mention_count: 0,
            ai_platforms_present: BTreeSet::new(),
            ai_mentioned_competitors: BTreeSet::new(),
            ai_domain_found: false,
            ai_best_position: None,
            calculated_at: Utc::now(),
        }
    }

    #[test]
    fn classifies_each_quadrant_from_current_scores() {
        let thresholds = QuadrantThresholds::default();

        assert_eq!(classify(&region("us", 75.0, 20.0, 0.0), &thresholds), Quadrant::Strong);
        assert_eq!(classify(&region("de", 30.0, 70.0, 0.0), &thresholds), Quadrant::Emerging);
        assert_eq!(classify(&region("fr", 30.0, 10.0, 0.0), &thresholds), Quadrant::Declining);
        assert_eq!(classify(&region("jp", 1.0, 90.0, 0.0), &thresholds), Quadrant::Absent);
    }

    #[test]
    fn classification_is_stable_for_identical_input() {
        let thresholds = QuadrantThresholds::default();
        let record = region("us", 59.999, 50.0, 0.0);

        let first = classify(&record, &thresholds);
        for _ in 0..100 {
            assert_eq!(classify(&record, &thresholds), first);
        }
        assert_eq!(first, Quadrant::Emerging);
    }

    #[test]
    fn thresholds_are_configuration() {
        let relaxed = QuadrantThresholds { presence_strong: 25.0, ..QuadrantThresholds::default() };
        let record = region("us", 30.0, 10.0, 0.0);

        assert_eq!(classify(&record, &QuadrantThresholds::default()), Quadrant::Declining);
        assert_eq!(classify(&record, &relaxed), Quadrant::Strong);
    }

    #[test]
    fn ranks_by_opportunity_descending() {
        let regions =
            vec![region("us", 0.0, 0.0, 40.0), region("de", 0.0, 0.0, 90.0), region("fr", 0.0, 0.0, 65.0)];
        let ranked = rank(&regions, 10);

        let codes: Vec<&str> = ranked.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(codes, vec!["de", "fr", "us"]);
    }

    #[test]
    fn equal_scores_order_by_canonical_code_ascending() {
        let regions = vec![
            region("nl", 0.0, 0.0, 50.0),
            region("be", 0.0, 0.0, 50.0),
            region("at", 0.0, 0.0, 50.0),
        ];
        let ranked = rank(&regions, 10);

        let codes: Vec<&str> = ranked.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(codes, vec!["at", "be", "nl"]);
    }

    #[test]
    fn rank_truncates_to_limit() {
        let regions: Vec<_> =
            (0..8).map(|i| region(&format!("r{i}"), 0.0, 0.0, i as f64)).collect();
        assert_eq!(rank(&regions, 5).len(), 5);
    }

    #[test]
    fn quadrant_counts_accumulate() {
        let mut counts = QuadrantCounts::default();
        counts.record(Quadrant::Strong);
        counts.record(Quadrant::Absent);
        counts.record(Quadrant::Absent);

        assert_eq!(counts.strong, 1);
        assert_eq!(counts.absent, 2);
        assert_eq!(counts.emerging, 0);
    }
}
