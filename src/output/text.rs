//! Human-readable text report

use crate::analytics::{MetricStats, QueryClass, RankedProfile, PRIMARY_METRIC};
use crate::output::units::{per, percent, short_time, Unit};
use crate::report::Report;
use crate::sql::summarize;
use crate::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Width of the attribute name column
const LABEL_WIDTH: usize = 12;

/// Width of each statistic column
const VALUE_WIDTH: usize = 7;

/// Metrics shown first, in this order, with their display names
const KNOWN_METRICS: &[(&str, &str)] = &[
    ("Query_time", "Exec time"),
    ("Lock_time", "Lock time"),
    ("Rows_sent", "Rows sent"),
    ("Rows_examined", "Rows examine"),
    ("Rows_affected", "Rows affecte"),
    ("Bytes_sent", "Bytes sent"),
    ("Query_length", "Query size"),
];

/// One row of an attribute table
struct Attribute<'a> {
    name: &'a str,
    label: String,
    stats: &'a MetricStats,
    unit: Unit,
    is_time: bool,
}

impl<'a> Attribute<'a> {
    fn time(name: &'a str, label: String, stats: &'a MetricStats) -> Self {
        Self {
            name,
            label,
            stats,
            unit: Unit::Duration,
            is_time: true,
        }
    }

    fn number(name: &'a str, label: String, stats: &'a MetricStats) -> Self {
        Self {
            name,
            label,
            stats,
            unit: number_unit(name),
            is_time: false,
        }
    }
}

/// Text formatter for reports
pub struct TextFormatter {
    show_examples: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new() -> Self {
        Self { show_examples: true }
    }

    /// Print (or omit) the example query of every ranked class
    pub fn with_examples(mut self, show_examples: bool) -> Self {
        self.show_examples = show_examples;
        self
    }

    /// Render the whole report
    pub fn format(&self, report: &Report) -> Result<String> {
        let mut output = String::new();
        self.write_header(&mut output, report)?;
        self.write_profile(&mut output, report)?;
        for profile in &report.profiles {
            self.write_query(&mut output, report, profile)?;
        }
        Ok(output)
    }

    fn write_header(&self, output: &mut String, report: &Report) -> Result<()> {
        let metadata = &report.metadata;
        let global = &report.global;

        writeln!(
            output,
            "# Generated at: {}",
            metadata.current_date.format("%Y-%m-%d %H:%M:%S %:z")
        )?;
        writeln!(output, "# Hostname: {}", metadata.hostname)?;
        writeln!(output, "# Files: {}", metadata.filename)?;
        writeln!(
            output,
            "# Overall: {} total, {} unique",
            global.total_queries, global.unique_queries
        )?;
        write_time_range(output, global)?;

        writeln!(
            output,
            "# {:<lw$} {:>vw$} {:>vw$} {:>vw$} {:>vw$} {:>vw$} {:>vw$}",
            "Attribute", "total", "min", "max", "avg", "95%", "median",
            lw = LABEL_WIDTH,
            vw = VALUE_WIDTH
        )?;
        writeln!(output, "# {} {}", "=".repeat(LABEL_WIDTH), value_rules(6))?;

        let zero = MetricStats::default();
        let mut rows = attributes(global);
        if !rows.iter().any(|a| a.name == PRIMARY_METRIC) {
            rows.insert(0, Attribute::time(PRIMARY_METRIC, "Exec time".to_string(), &zero));
        }
        for attribute in &rows {
            writeln!(
                output,
                "# {:<lw$} {}",
                attribute.label,
                stat_cells(attribute),
                lw = LABEL_WIDTH
            )?;
        }
        write_booleans(output, global)?;
        Ok(())
    }

    fn write_profile(&self, output: &mut String, report: &Report) -> Result<()> {
        let columns = report.width.columns(&report.global);
        let global_time = report.global_time();
        let [rank_rule, response_rule, calls_rule, rp_call_rule] = columns.rules();

        writeln!(output)?;
        writeln!(output, "# Profile")?;
        writeln!(
            output,
            "# {} {} {} {} Query",
            columns.rank_header(),
            columns.response_time_header(),
            columns.calls_header(),
            columns.rp_call_header()
        )?;
        writeln!(
            output,
            "# {} {} {} {} =====",
            rank_rule, response_rule, calls_rule, rp_call_rule
        )?;

        for profile in &report.profiles {
            let class = &profile.class;
            let total_time = profile.total_time();
            writeln!(
                output,
                "# {} {} {:>5.1}% {} {} {}",
                columns.format_rank(profile.rank),
                columns.format_response_time(total_time),
                percent(total_time, global_time),
                columns.format_calls(class.total_queries),
                columns.format_rp_call(per(total_time, class.total_queries)),
                summary_label(class)
            )?;
        }
        Ok(())
    }

    fn write_query(
        &self,
        output: &mut String,
        report: &Report,
        profile: &RankedProfile,
    ) -> Result<()> {
        let class = &profile.class;
        let global = &report.global;
        let total_time = profile.total_time();

        writeln!(output)?;
        writeln!(output, "# Query {}: 0x{}", profile.rank, class.id)?;
        writeln!(output, "# Fingerprint: {}", class.fingerprint)?;
        writeln!(
            output,
            "# Calls: {} ({:.2}%), Response time: {} ({:.2}%)",
            class.total_queries,
            percent(class.total_queries, global.total_queries),
            short_time(total_time),
            percent(total_time, report.global_time())
        )?;
        write_time_range(output, class)?;

        writeln!(
            output,
            "# {:<lw$} {:>3} {:>vw$} {:>vw$} {:>vw$} {:>vw$} {:>vw$} {:>vw$}",
            "Attribute", "pct", "total", "min", "max", "avg", "95%", "median",
            lw = LABEL_WIDTH,
            vw = VALUE_WIDTH
        )?;
        writeln!(output, "# {} === {}", "=".repeat(LABEL_WIDTH), value_rules(6))?;
        writeln!(
            output,
            "# {:<lw$} {:>3.0} {:>vw$}",
            "Count",
            percent(class.total_queries, global.total_queries),
            class.total_queries,
            lw = LABEL_WIDTH,
            vw = VALUE_WIDTH
        )?;
        for attribute in attributes(class) {
            let global_sum = global_stats(global, &attribute).map(|m| m.sum);
            writeln!(
                output,
                "# {:<lw$} {:>3.0} {}",
                attribute.label,
                percent(attribute.stats.sum, global_sum),
                stat_cells(&attribute),
                lw = LABEL_WIDTH
            )?;
        }
        write_booleans(output, class)?;

        write_counts(output, "Databases", &class.databases)?;
        write_counts(output, "Users", &class.users)?;
        write_counts(output, "Hosts", &class.hosts)?;

        writeln!(output, "# Summary: {}", summary_label(class))?;
        if self.show_examples {
            if let Some(example) = &class.example {
                writeln!(output, "# Example:")?;
                if let Some(db) = &example.database {
                    writeln!(output, "USE `{}`\\G", db)?;
                }
                writeln!(output, "{}\\G", example.query)?;
            }
        }
        Ok(())
    }
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary label of a class's example query; recomputed on every call
pub fn summary_label(class: &QueryClass) -> String {
    class
        .example
        .as_ref()
        .map(|example| summarize(&example.query))
        .unwrap_or_default()
}

fn attributes(class: &QueryClass) -> Vec<Attribute<'_>> {
    let metrics = &class.metrics;
    let mut rows = Vec::new();

    for (name, label) in KNOWN_METRICS {
        if let Some((key, stats)) = metrics.time_metrics.get_key_value(*name) {
            rows.push(Attribute::time(key, label.to_string(), stats));
        } else if let Some((key, stats)) = metrics.number_metrics.get_key_value(*name) {
            rows.push(Attribute::number(key, label.to_string(), stats));
        }
    }

    let is_known = |name: &str| KNOWN_METRICS.iter().any(|(known, _)| *known == name);
    for (name, stats) in metrics.time_metrics.iter().filter(|(n, _)| !is_known(n)) {
        rows.push(Attribute::time(name, display_name(name), stats));
    }
    for (name, stats) in metrics.number_metrics.iter().filter(|(n, _)| !is_known(n)) {
        rows.push(Attribute::number(name, display_name(name), stats));
    }
    rows
}

fn global_stats<'a>(global: &'a QueryClass, attribute: &Attribute<'_>) -> Option<&'a MetricStats> {
    if attribute.is_time {
        global.time_metric(attribute.name)
    } else {
        global.number_metric(attribute.name)
    }
}

fn number_unit(name: &str) -> Unit {
    if name.contains("Bytes") || name.ends_with("_length") {
        Unit::Bytes
    } else {
        Unit::Count
    }
}

fn display_name(name: &str) -> String {
    let name = name.replace('_', " ");
    name.chars().take(LABEL_WIDTH).collect()
}

fn stat_cells(attribute: &Attribute<'_>) -> String {
    let stats = attribute.stats;
    let whole = attribute.unit.whole();
    format!(
        "{:>vw$} {:>vw$} {:>vw$} {:>vw$} {:>vw$} {:>vw$}",
        whole.format(stats.sum),
        whole.format(stats.min),
        whole.format(stats.max),
        attribute.unit.format(stats.avg),
        attribute.unit.format(stats.p95),
        attribute.unit.format(stats.median),
        vw = VALUE_WIDTH
    )
}

fn value_rules(count: usize) -> String {
    vec!["=".repeat(VALUE_WIDTH); count].join(" ")
}

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn write_time_range(output: &mut String, class: &QueryClass) -> Result<()> {
    if let (Some(first), Some(last)) = (class.first_seen, class.last_seen) {
        if first == last {
            writeln!(output, "# Time range: all events occurred at {}", format_ts(first))?;
        } else {
            writeln!(output, "# Time range: {} to {}", format_ts(first), format_ts(last))?;
        }
    }
    Ok(())
}

fn write_booleans(output: &mut String, class: &QueryClass) -> Result<()> {
    let flags = &class.metrics.bool_metrics;
    if flags.is_empty() {
        return Ok(());
    }
    writeln!(output, "# Boolean:")?;
    for (name, stats) in flags {
        writeln!(
            output,
            "# {:<lw$} {:>3.0}% yes, {:>3.0}% no",
            display_name(name),
            percent(stats.true_count, stats.count),
            percent(stats.count - stats.true_count, stats.count),
            lw = LABEL_WIDTH
        )?;
    }
    Ok(())
}

fn write_counts(output: &mut String, title: &str, counts: &BTreeMap<String, u64>) -> Result<()> {
    if counts.is_empty() {
        return Ok(());
    }
    let mut entries: Vec<(&String, &u64)> = counts.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    let list = entries
        .iter()
        .map(|(name, count)| format!("{} ({})", name, count))
        .collect::<Vec<_>>()
        .join(", ");
    writeln!(output, "# {}: {}", title, list)?;
    Ok(())
}
