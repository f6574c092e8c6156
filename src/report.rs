//! Assembly of the finished report handed to the formatters

use crate::analytics::{
    rank, select, AggregateResult, LimitPolicy, QueryClass, RankedProfile, Width,
};
use crate::Result;
use chrono::{DateTime, Local};
use log::{debug, warn};
use serde::Serialize;

/// Facts about the run printed in the report header
#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    pub current_date: DateTime<Local>,
    pub hostname: String,
    /// Names of the analyzed sources, space separated
    pub filename: String,
}

impl RunMetadata {
    /// Metadata for a run over `sources`, stamped now
    pub fn collect(sources: &[String]) -> Self {
        let hostname = match hostname::get() {
            Ok(name) => name.to_string_lossy().into_owned(),
            Err(e) => {
                warn!("Cannot determine hostname: {}", e);
                "unknown".to_string()
            }
        };
        Self {
            current_date: Local::now(),
            hostname,
            filename: sources.join(" "),
        }
    }
}

/// Everything the formatters need; built once, never modified
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: RunMetadata,
    pub global: QueryClass,
    pub profiles: Vec<RankedProfile>,
    pub width: Width,
}

impl Report {
    /// Build a report over `sources` stamped with the current host and time
    pub fn assemble(
        result: AggregateResult,
        sources: &[String],
        limit: LimitPolicy,
    ) -> Result<Self> {
        Self::assemble_with(result, RunMetadata::collect(sources), limit)
    }

    /// Build a report with explicit metadata.
    ///
    /// Widths are measured over every class before the limit is applied;
    /// a class without `Query_time` aborts the report.
    pub fn assemble_with(
        result: AggregateResult,
        metadata: RunMetadata,
        limit: LimitPolicy,
    ) -> Result<Self> {
        let AggregateResult { global, classes } = result;

        let width = Width::from_classes(classes.values())?;
        let total = classes.len();
        let profiles = select(rank(classes.into_values()), limit);
        debug!("Selected {} of {} classes (limit {})", profiles.len(), total, limit);

        Ok(Self {
            metadata,
            global,
            profiles,
            width,
        })
    }

    /// Total response time across all events
    pub fn global_time(&self) -> f64 {
        self.global
            .time_metric(crate::analytics::PRIMARY_METRIC)
            .map_or(0.0, |m| m.sum)
    }
}
