//! Metric reduction: fold raw per-region records into one canonical record
//! per region.
//!
//! Count fields sum. Rate fields (scores, positions) take an
//! impression-weighted average: never a plain mean, which would let a
//! 10-impression row drag a 10,000-impression row around. Set fields union,
//! booleans OR, best position takes the minimum. The fold is additive and
//! statistical: records with identical timestamps are all folded in, and any
//! "most recent run wins" selection belongs to a caller-supplied pre-filter
//! (see [`crate::visibility::report::latest_per_raw_code`]), not here.

use std::collections::BTreeMap;

use crate::domain::metrics::{CanonicalRegionRecord, RawMetricRecord};
use crate::visibility::regions::normalize;

/// Fold raw records into one canonical record per canonical region code.
///
/// Records whose region code cannot be normalized are dropped: they cannot
/// be attributed to any bucket and must not corrupt another region's
/// numbers. The result is keyed by canonical code, so iteration order is the
/// presentation order (ascending by code).
///
/// Output is bit-identical for any permutation of the input: records within
/// a canonical group fold in a fixed order, so floating-point rounding never
/// depends on how the store happened to return rows.
pub fn reduce(records: &[RawMetricRecord]) -> BTreeMap<String, CanonicalRegionRecord> {
    let mut groups: BTreeMap<String, Vec<&RawMetricRecord>> = BTreeMap::new();
    for record in records {
        let Some(canonical) = normalize(&record.raw_region_code) else {
            continue;
        };
        groups.entry(canonical).or_default().push(record);
    }

    let mut reduced = BTreeMap::new();
    for (canonical, mut members) in groups {
        // Deterministic fold order regardless of input permutation.
        members.sort_by(|a, b| {
            a.calculated_at
                .cmp(&b.calculated_at)
                .then_with(|| a.raw_region_code.cmp(&b.raw_region_code))
                .then_with(|| a.impressions.cmp(&b.impressions))
                .then_with(|| a.clicks.cmp(&b.clicks))
        });

        let mut iter = members.into_iter();
        let first = match iter.next() {
            Some(first) => first,
            None => continue,
        };
        let mut accumulator = CanonicalRegionRecord::seed(canonical.clone(), first);
        for record in iter {
            merge_into(&mut accumulator, record);
        }
        reduced.insert(canonical, accumulator);
    }

    reduced
}

/// Fold one raw record into a running canonical accumulator.
///
/// The weight for every rate field is the impressions accumulated so far for
/// this canonical region, applied before the incoming impressions are added
/// to the sum.
pub fn merge_into(accumulator: &mut CanonicalRegionRecord, record: &RawMetricRecord) {
    let acc_weight = accumulator.impressions as f64;
    let incoming_weight = record.impressions as f64;

    accumulator.organic_score =
        weighted(accumulator.organic_score, acc_weight, record.organic_score, incoming_weight);
    accumulator.ai_visibility_score = weighted(
        accumulator.ai_visibility_score,
        acc_weight,
        record.ai_visibility_score,
        incoming_weight,
    );
    accumulator.demand_score =
        weighted(accumulator.demand_score, acc_weight, record.demand_score, incoming_weight);
    accumulator.overall_visibility_score = weighted(
        accumulator.overall_visibility_score,
        acc_weight,
        record.overall_visibility_score,
        incoming_weight,
    );
    accumulator.opportunity_score = weighted(
        accumulator.opportunity_score,
        acc_weight,
        record.opportunity_score,
        incoming_weight,
    );
    accumulator.avg_position =
        weighted(accumulator.avg_position, acc_weight, record.avg_position, incoming_weight);

    accumulator.impressions += record.impressions;
    accumulator.clicks += record.clicks;
    accumulator.ai_mention_count += record.ai_mention_count;

    accumulator.ai_platforms_present.extend(record.ai_platforms_present.iter().cloned());
    accumulator
        .ai_mentioned_competitors
        .extend(record.ai_mentioned_competitors.iter().cloned());
    accumulator.ai_domain_found |= record.ai_domain_found;

    accumulator.ai_best_position = match (accumulator.ai_best_position, record.ai_best_position) {
        (Some(existing), Some(incoming)) => Some(existing.min(incoming)),
        (existing, None) => existing,
        (None, incoming) => incoming,
    };

    if record.calculated_at > accumulator.calculated_at {
        accumulator.calculated_at = record.calculated_at;
    }
}

/// Impression-weighted average of two rate values. Falls back to the
/// existing value when both weights are zero: never NaN, never a divide by
/// zero.
fn weighted(existing: f64, existing_weight: f64, incoming: f64, incoming_weight: f64) -> f64 {
    let total = existing_weight + incoming_weight;
    if total > 0.0 {
        (existing * existing_weight + incoming * incoming_weight) / total
    } else {
        existing
    }
}
