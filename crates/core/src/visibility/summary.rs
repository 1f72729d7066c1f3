//! Time-range summary statistics over an ordered search-console series.
//!
//! The ratios here are the ones that are easy to get silently wrong: CTR is
//! recomputed from total clicks over total impressions, and position is
//! impression-weighted. Averaging per-period CTRs would double-count
//! low-traffic days and is explicitly the wrong formula.

use serde::{Deserialize, Serialize};

use crate::domain::metrics::PeriodRecord;

/// First-half vs. second-half growth, as a percentage rounded to 1 decimal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendBlock {
    pub clicks: f64,
    pub impressions: f64,
}

/// Aggregate search performance over a period series.
///
/// `avg_ctr` is a percentage rounded to 2 decimals; `avg_position` and both
/// trend figures are rounded to 1 decimal. Fixed rounding keeps repeated
/// calls comparable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSummary {
    pub total_clicks: u64,
    pub total_impressions: u64,
    #[serde(rename = "avgCTR")]
    pub avg_ctr: f64,
    pub avg_position: f64,
    pub trends: TrendBlock,
}

/// Summarize a series of period records ordered by period ascending.
///
/// An empty series is a valid "no data yet" state and produces the all-zero
/// summary. Every ratio resolves to `0` when its denominator is zero.
pub fn summarize(series: &[PeriodRecord]) -> SearchSummary {
    let total_clicks: u64 = series.iter().map(|p| p.clicks).sum();
    let total_impressions: u64 = series.iter().map(|p| p.impressions).sum();

    let avg_ctr = if total_impressions > 0 {
        total_clicks as f64 / total_impressions as f64 * 100.0
    } else {
        0.0
    };

    let avg_position = if total_impressions > 0 {
        let weighted: f64 = series.iter().map(|p| p.avg_position * p.impressions as f64).sum();
        weighted / total_impressions as f64
    } else {
        0.0
    };

    let midpoint = series.len() / 2;
    let (first, second) = series.split_at(midpoint);
    let trends = TrendBlock {
        clicks: round_to(half_over_half(first, second, |p| p.clicks), 1),
        impressions: round_to(half_over_half(first, second, |p| p.impressions), 1),
    };

    SearchSummary {
        total_clicks,
        total_impressions,
        avg_ctr: round_to(avg_ctr, 2),
        avg_position: round_to(avg_position, 1),
        trends,
    }
}

/// Percentage change from the first half to the second half of the series.
/// Defined as `0` when the first-half sum is zero: the summary does not try
/// to represent "infinite growth".
fn half_over_half(
    first: &[PeriodRecord],
    second: &[PeriodRecord],
    field: fn(&PeriodRecord) -> u64,
) -> f64 {
    let first_sum: u64 = first.iter().map(field).sum();
    let second_sum: u64 = second.iter().map(field).sum();
    if first_sum == 0 {
        return 0.0;
    }
    (second_sum as f64 - first_sum as f64) / first_sum as f64 * 100.0
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::domain::metrics::PeriodRecord;

    use super::summarize;

    fn period(day: u32, impressions: u64, clicks: u64, position: f64) -> PeriodRecord {
        PeriodRecord {
            period: NaiveDate::from_ymd_opt(2026, 2, day).expect("valid date"),
            clicks,
            impressions,
            avg_position: position,
        }
    }

    #[test]
    fn ctr_is_derived_from_totals_not_averaged_per_period() {
        // A low-traffic day with a perfect CTR must not inflate the average:
        // unweighted mean of per-period CTRs would be (100% + 1%) / 2 = 50.5%,
        // while the correct figure is 11/1010.
        let series = vec![period(1, 10, 10, 2.0), period(2, 1000, 10, 4.0)];
        let summary = summarize(&series);

        assert_eq!(summary.total_clicks, 20);
        assert_eq!(summary.total_impressions, 1010);
        assert_eq!(summary.avg_ctr, 1.98);
        let unweighted = (10.0 / 10.0 + 10.0 / 1000.0) / 2.0 * 100.0;
        assert_ne!(summary.avg_ctr, unweighted);
    }

    #[test]
    fn position_is_impression_weighted() {
        let series = vec![period(1, 0, 0, 5.0), period(2, 100, 10, 3.0)];
        let summary = summarize(&series);

        // (5*0 + 3*100) / 100 = 3.0
        assert_eq!(summary.avg_position, 3.0);
        assert_eq!(summary.avg_ctr, 10.0);
    }

    #[test]
    fn zero_impressions_resolve_ratios_to_zero() {
        let series = vec![period(1, 0, 0, 5.0), period(2, 0, 0, 7.0)];
        let summary = summarize(&series);

        assert_eq!(summary.avg_ctr, 0.0);
        assert_eq!(summary.avg_position, 0.0);
        assert!(summary.avg_ctr.is_finite());
    }

    #[test]
    fn trend_compares_first_and_second_half() {
        let series = vec![
            period(1, 100, 10, 4.0),
            period(2, 100, 10, 4.0),
            period(3, 150, 20, 3.0),
            period(4, 150, 20, 3.0),
        ];
        let summary = summarize(&series);

        // Clicks: 20 -> 40 is +100%; impressions: 200 -> 300 is +50%.
        assert_eq!(summary.trends.clicks, 100.0);
        assert_eq!(summary.trends.impressions, 50.0);
    }

    #[test]
    fn odd_length_series_splits_at_floor_midpoint() {
        let series =
            vec![period(1, 100, 10, 4.0), period(2, 200, 20, 4.0), period(3, 100, 10, 4.0)];
        let summary = summarize(&series);

        // First half is day 1 only; second half is days 2 and 3.
        assert_eq!(summary.trends.clicks, 200.0);
        assert_eq!(summary.trends.impressions, 200.0);
    }

    #[test]
    fn zero_first_half_guards_division_and_reports_zero_trend() {
        let series = vec![period(1, 0, 0, 0.0), period(2, 500, 50, 2.0)];
        let summary = summarize(&series);

        assert_eq!(summary.trends.clicks, 0.0);
        assert_eq!(summary.trends.impressions, 0.0);
        assert!(summary.trends.clicks.is_finite());
    }

    #[test]
    fn empty_series_produces_the_all_zero_summary() {
        let summary = summarize(&[]);
        assert_eq!(summary, super::SearchSummary::default());
    }

    #[test]
    fn rounding_is_fixed_per_field() {
        let series = vec![period(1, 300, 1, 3.333), period(2, 300, 1, 3.333)];
        let summary = summarize(&series);

        // 2/600 = 0.3333…% -> 0.33; position rounds to one decimal.
        assert_eq!(summary.avg_ctr, 0.33);
        assert_eq!(summary.avg_position, 3.3);
    }
}
