//! Per-class and global statistics over slow log events

use crate::parsers::QueryEvent;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Summary statistics of one numeric metric
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricStats {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub p95: f64,
    pub median: f64,
    #[serde(skip)]
    values: Vec<f64>,
}

impl MetricStats {
    /// Record one observation
    pub fn add(&mut self, value: f64) {
        if self.count == 0 || value < self.min {
            self.min = value;
        }
        if self.count == 0 || value > self.max {
            self.max = value;
        }
        self.count += 1;
        self.sum += value;
        self.values.push(value);
    }

    /// Compute the derived statistics and release the raw observations
    pub fn finalize(&mut self) {
        if self.count == 0 {
            return;
        }
        self.avg = self.sum / self.count as f64;
        let mut sorted = std::mem::take(&mut self.values);
        sorted.sort_by(|a, b| a.total_cmp(b));
        self.p95 = nearest_rank(&sorted, 0.95);
        self.median = nearest_rank(&sorted, 0.5);
    }
}

/// Nearest-rank percentile over sorted values
fn nearest_rank(sorted: &[f64], quantile: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (quantile * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// How often a `Yes`/`No` metric was `Yes`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoolStats {
    pub count: u64,
    pub true_count: u64,
}

/// All metrics of a class, grouped by kind
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub time_metrics: BTreeMap<String, MetricStats>,
    pub number_metrics: BTreeMap<String, MetricStats>,
    pub bool_metrics: BTreeMap<String, BoolStats>,
}

/// Representative execution of a class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Example {
    pub query: String,
    pub database: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub query_time: f64,
}

/// Aggregated statistics for every event sharing one class identifier.
/// The global class uses an empty `id` and `fingerprint`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryClass {
    pub id: String,
    pub fingerprint: String,
    pub total_queries: u64,
    /// Number of distinct classes; only set on the global class
    pub unique_queries: u64,
    pub metrics: Metrics,
    pub databases: BTreeMap<String, u64>,
    pub users: BTreeMap<String, u64>,
    pub hosts: BTreeMap<String, u64>,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub example: Option<Example>,
}

impl QueryClass {
    fn new(id: &str, fingerprint: &str) -> Self {
        Self {
            id: id.to_string(),
            fingerprint: fingerprint.to_string(),
            ..Default::default()
        }
    }

    /// Statistics of a time metric
    pub fn time_metric(&self, name: &str) -> Option<&MetricStats> {
        self.metrics.time_metrics.get(name)
    }

    /// Statistics of a number metric
    pub fn number_metric(&self, name: &str) -> Option<&MetricStats> {
        self.metrics.number_metrics.get(name)
    }

    fn add_event(&mut self, event: &QueryEvent, keep_example: bool) {
        self.total_queries += 1;

        for (name, value) in &event.time_metrics {
            self.metrics
                .time_metrics
                .entry(name.clone())
                .or_default()
                .add(*value);
        }
        for (name, value) in &event.number_metrics {
            self.metrics
                .number_metrics
                .entry(name.clone())
                .or_default()
                .add(*value as f64);
        }
        for (name, value) in &event.bool_metrics {
            let stats = self.metrics.bool_metrics.entry(name.clone()).or_default();
            stats.count += 1;
            if *value {
                stats.true_count += 1;
            }
        }

        if let Some(db) = &event.database {
            *self.databases.entry(db.clone()).or_insert(0) += 1;
        }
        if let Some(user) = &event.user {
            *self.users.entry(user.clone()).or_insert(0) += 1;
        }
        if let Some(host) = &event.host {
            *self.hosts.entry(host.clone()).or_insert(0) += 1;
        }

        if let Some(ts) = event.timestamp {
            if self.first_seen.map_or(true, |first| ts < first) {
                self.first_seen = Some(ts);
            }
            if self.last_seen.map_or(true, |last| ts > last) {
                self.last_seen = Some(ts);
            }
        }

        if keep_example {
            let query_time = event.time_metric(super::PRIMARY_METRIC).unwrap_or(0.0);
            let replace = match &self.example {
                None => true,
                Some(current) => query_time > current.query_time,
            };
            if replace {
                self.example = Some(Example {
                    query: event.query.clone(),
                    database: event.database.clone(),
                    timestamp: event.timestamp,
                    query_time,
                });
            }
        }
    }

    fn finalize(&mut self) {
        for stats in self.metrics.time_metrics.values_mut() {
            stats.finalize();
        }
        for stats in self.metrics.number_metrics.values_mut() {
            stats.finalize();
        }
    }
}

/// Output of [`Aggregator::finalize`]
#[derive(Debug, Clone, Default)]
pub struct AggregateResult {
    pub global: QueryClass,
    pub classes: HashMap<String, QueryClass>,
}

/// Accumulates events into per-class and global statistics
pub struct Aggregator {
    keep_examples: bool,
    global: QueryClass,
    classes: HashMap<String, QueryClass>,
}

impl Aggregator {
    /// Create a new aggregator; `keep_examples` retains the slowest query text per class
    pub fn new(keep_examples: bool) -> Self {
        Self {
            keep_examples,
            global: QueryClass::default(),
            classes: HashMap::new(),
        }
    }

    /// Add one event belonging to class `id`
    pub fn add_event(&mut self, event: &QueryEvent, id: &str, fingerprint: &str) {
        self.global.add_event(event, false);
        self.classes
            .entry(id.to_string())
            .or_insert_with(|| QueryClass::new(id, fingerprint))
            .add_event(event, self.keep_examples);
    }

    /// Number of events seen so far
    pub fn total_events(&self) -> u64 {
        self.global.total_queries
    }

    /// Compute final statistics for every class and the global class
    pub fn finalize(mut self) -> AggregateResult {
        self.global.unique_queries = self.classes.len() as u64;
        self.global.finalize();
        for class in self.classes.values_mut() {
            class.finalize();
        }
        AggregateResult {
            global: self.global,
            classes: self.classes,
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(true)
    }
}
