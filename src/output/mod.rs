//! Output formatters for slowlog-digest reports

pub mod json;
pub mod text;
pub mod units;

pub use json::JsonFormatter;
pub use text::{summary_label, TextFormatter};
pub use units::{
    per, percent, short, short_byte, short_byte_int, short_int, short_time, Magnitude, Unit,
};
