//! SQL inspection helpers

pub mod summary;

pub use summary::{summarize, StatementKind, SummaryQuery};
