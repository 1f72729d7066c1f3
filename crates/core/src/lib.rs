pub mod config;
pub mod domain;
pub mod errors;
pub mod visibility;

pub use domain::metrics::{CanonicalRegionRecord, PeriodRecord, RawMetricRecord};
pub use domain::site::{DomainId, TrackedDomain, UserId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use visibility::{
    build_region_report, latest_per_raw_code, normalize, reduce, summarize, Quadrant,
    QuadrantCounts, QuadrantThresholds, RegionReport, ReportOptions, ReportSummary, SearchSummary,
    TrendBlock,
};
