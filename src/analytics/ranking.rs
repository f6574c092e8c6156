//! Ranking of query classes by total cost and selection of the top entries

use super::aggregator::QueryClass;
use super::PRIMARY_METRIC;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Number of classes reported when no limit is given
pub const DEFAULT_LIMIT: usize = 20;

/// How many ranked classes appear in a report
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum LimitPolicy {
    /// At most this many classes
    Count(usize),
    /// This percentage (0-100) of all classes, rounded down
    Percent(f64),
}

impl LimitPolicy {
    /// Number of classes to keep out of `total`
    pub fn limit(&self, total: usize) -> usize {
        match *self {
            LimitPolicy::Count(count) => total.min(count),
            LimitPolicy::Percent(percent) => {
                let count = (total as f64 * percent / 100.0).floor() as usize;
                count.min(total)
            }
        }
    }
}

impl Default for LimitPolicy {
    fn default() -> Self {
        LimitPolicy::Count(DEFAULT_LIMIT)
    }
}

impl FromStr for LimitPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if let Some(percent) = value.strip_suffix('%') {
            let percent: f64 = percent
                .trim()
                .parse()
                .map_err(|e| format!("Invalid percentage '{}': {}", value, e))?;
            if !(0.0..=100.0).contains(&percent) {
                return Err(format!("Percentage should be in 0-100: {}%", percent));
            }
            return Ok(LimitPolicy::Percent(percent));
        }

        if value.starts_with('-') {
            return Err(format!("Limit should be a natural number: {}", value));
        }
        value
            .parse::<usize>()
            .map(LimitPolicy::Count)
            .map_err(|e| format!("Invalid limit '{}': {}", value, e))
    }
}

impl fmt::Display for LimitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitPolicy::Count(count) => write!(f, "{}", count),
            LimitPolicy::Percent(percent) => write!(f, "{}%", percent),
        }
    }
}

/// A query class and its position in the by-total-cost ordering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedProfile {
    /// 1-based position
    pub rank: usize,
    pub class: QueryClass,
}

impl RankedProfile {
    /// Total response time of the class
    pub fn total_time(&self) -> f64 {
        total_cost(&self.class)
    }
}

fn total_cost(class: &QueryClass) -> f64 {
    class.time_metric(PRIMARY_METRIC).map_or(0.0, |m| m.sum)
}

/// Sort classes by descending total response time. Classes with the same
/// total are ordered by class identifier so output is reproducible.
pub fn rank<I>(classes: I) -> Vec<RankedProfile>
where
    I: IntoIterator<Item = QueryClass>,
{
    let mut classes: Vec<QueryClass> = classes.into_iter().collect();
    classes.sort_by(|a, b| {
        total_cost(b)
            .total_cmp(&total_cost(a))
            .then_with(|| a.id.cmp(&b.id))
    });
    classes
        .into_iter()
        .enumerate()
        .map(|(i, class)| RankedProfile { rank: i + 1, class })
        .collect()
}

/// Keep the leading profiles allowed by `policy`
pub fn select(mut ranked: Vec<RankedProfile>, policy: LimitPolicy) -> Vec<RankedProfile> {
    let count = policy.limit(ranked.len());
    ranked.truncate(count);
    ranked
}
