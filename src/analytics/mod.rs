//! Data analysis modules for slow log events

pub mod aggregator;
pub mod fingerprint;
pub mod ranking;
pub mod width;

pub use aggregator::{
    AggregateResult, Aggregator, BoolStats, Example, MetricStats, Metrics, QueryClass,
};
pub use fingerprint::{class_id, Fingerprinter};
pub use ranking::{rank, select, LimitPolicy, RankedProfile};
pub use width::{int_width, Columns, Width};

/// Metric whose sum ranks classes and sizes the response time columns
pub const PRIMARY_METRIC: &str = "Query_time";
