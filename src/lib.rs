//! slowlog-digest - MySQL slow query log profiler
//!
//! This library groups slow log events by query fingerprint, ranks the
//! resulting classes by total response time and renders a report.

pub mod analytics;
pub mod error;
pub mod ingest;
pub mod output;
pub mod parsers;
pub mod report;
pub mod sql;

// Re-export commonly used items
pub use analytics::{Aggregator, Fingerprinter, LimitPolicy, QueryClass, RankedProfile, Width};
pub use error::{timestamp_error, Result, SlowlogError};
pub use ingest::Analyzer;
pub use output::{JsonFormatter, TextFormatter};
pub use parsers::{QueryEvent, SlowLogParser};
pub use report::{Report, RunMetadata};
pub use sql::summarize;
