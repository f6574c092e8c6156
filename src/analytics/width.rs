//! Column widths for the profile table
//!
//! Widths are derived from every class, not only the ones that end up in
//! the report, so the table lines up with the true extremes of the data.

use super::aggregator::QueryClass;
use super::PRIMARY_METRIC;
use crate::{Result, SlowlogError};
use serde::Serialize;

/// Characters used by a `.xxxx` suffix
const FRACTION_PADDING: usize = 5;

/// Characters used by the ` 100.0%` share suffix after the response time
const SHARE_PADDING: usize = 7;

/// Number of characters needed for the integer part of `v`, including the
/// sign of negative values.
pub fn int_width(v: f64) -> usize {
    let mut width = 1;
    let abs = v.abs();
    if abs != v {
        width += 1;
    }
    if !abs.is_finite() {
        return width + 2;
    }
    if abs >= 1.0 {
        width += abs.log10().floor() as usize;
    }
    width
}

/// Widths that depend on per-class values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Width {
    /// Width of the R/Call cell, 4 decimals included
    pub rp_call: usize,
}

impl Width {
    /// Compute widths over all classes
    pub fn from_classes<'a, I>(classes: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a QueryClass>,
    {
        let mut width = Width::default();
        for class in classes {
            width.calc(class)?;
        }
        Ok(width)
    }

    /// Widen to fit `class`
    pub fn calc(&mut self, class: &QueryClass) -> Result<()> {
        let stats = class
            .time_metric(PRIMARY_METRIC)
            .ok_or_else(|| SlowlogError::MissingMetric {
                metric: PRIMARY_METRIC.to_string(),
                class_id: class.id.clone(),
            })?;

        let per_call = stats.sum / class.total_queries as f64;
        self.rp_call = self.rp_call.max(int_width(per_call) + FRACTION_PADDING);
        Ok(())
    }

    /// Resolve the final profile table columns against the global class
    pub fn columns(&self, global: &QueryClass) -> Columns {
        let max_time = global.time_metric(PRIMARY_METRIC).map_or(0.0, |m| m.max);
        Columns {
            rank: int_width(global.unique_queries as f64).max(4),
            response_time: int_width(max_time).max(2) + FRACTION_PADDING,
            calls: int_width(global.total_queries as f64).max(5),
            rp_call: self.rp_call.max(int_width(0.0) + FRACTION_PADDING),
        }
    }
}

/// Column widths of the profile table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Columns {
    pub rank: usize,
    /// Width of the numeric response time, without the share suffix
    pub response_time: usize,
    pub calls: usize,
    pub rp_call: usize,
}

impl Columns {
    /// Width of the whole response time cell, share suffix included
    pub fn response_cell(&self) -> usize {
        self.response_time + SHARE_PADDING
    }

    pub fn rank_header(&self) -> String {
        pad_header("Rank", self.rank)
    }

    pub fn response_time_header(&self) -> String {
        pad_header("Response time", self.response_cell())
    }

    pub fn calls_header(&self) -> String {
        pad_header("Calls", self.calls)
    }

    pub fn rp_call_header(&self) -> String {
        pad_header("R/Call", self.rp_call)
    }

    /// Horizontal rule under each header
    pub fn rules(&self) -> [String; 4] {
        [
            "=".repeat(self.rank),
            "=".repeat(self.response_cell()),
            "=".repeat(self.calls),
            "=".repeat(self.rp_call),
        ]
    }

    pub fn format_rank(&self, rank: usize) -> String {
        format!("{:>w$}", rank, w = self.rank)
    }

    pub fn format_response_time(&self, seconds: f64) -> String {
        format!("{:>w$.4}", seconds, w = self.response_time)
    }

    pub fn format_calls(&self, calls: u64) -> String {
        format!("{:>w$}", calls, w = self.calls)
    }

    pub fn format_rp_call(&self, seconds: f64) -> String {
        format!("{:>w$.4}", seconds, w = self.rp_call)
    }
}

fn pad_header(title: &str, width: usize) -> String {
    format!("{:<w$}", title, w = width)
}
