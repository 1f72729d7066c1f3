//! Visibility Telemetry Aggregation & Classification Engine
//!
//! Takes raw, per-period, per-region metric records and produces the
//! canonical, deduplicated summary the dashboard reports from: region
//! identity normalization, statistically-correct metric reduction,
//! time-range summary statistics, and quadrant classification with
//! opportunity ranking.
//!
//! The engine is pure and stateless: it is handed a fully-materialized row
//! set, performs no I/O, and has no failure mode beyond "empty input in,
//! empty output out".

pub mod classify;
pub mod reduce;
pub mod regions;
pub mod report;
pub mod summary;

pub use classify::{classify, rank, Quadrant, QuadrantCounts, QuadrantThresholds};
pub use reduce::reduce;
pub use regions::normalize;
pub use report::{
    build_region_report, latest_per_raw_code, OpportunityEntry, RegionReport, ReportOptions,
    ReportSummary,
};
pub use summary::{summarize, SearchSummary, TrendBlock};

/// Maximum entries in the ranked opportunity list.
pub const DEFAULT_TOP_OPPORTUNITIES: usize = 5;
