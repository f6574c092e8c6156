//! Log format parsers for MySQL slow query logs

pub mod slow;

pub use slow::{parse_timestamp, QueryEvent, SlowLogParser, QUERY_LENGTH};
