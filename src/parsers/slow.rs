//! MySQL slow query log parser
//!
//! Understands the stock MySQL layout as well as the extra header lines
//! written by Percona Server and MariaDB. Parsing is line driven: feed
//! lines with [`SlowLogParser::feed_line`] and collect an event whenever a
//! header closes the query text that preceded it.

use crate::{timestamp_error, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the derived metric holding the byte length of the query text
pub const QUERY_LENGTH: &str = "Query_length";

/// One execution recorded in a slow log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryEvent {
    pub timestamp: Option<DateTime<Utc>>,
    pub user: Option<String>,
    pub host: Option<String>,
    pub database: Option<String>,
    pub query: String,
    /// Metrics measured in seconds (`Query_time`, `Lock_time`, `InnoDB_IO_r_wait`, ...)
    pub time_metrics: BTreeMap<String, f64>,
    /// Counters (`Rows_sent`, `Rows_examined`, `Bytes_sent`, ...)
    pub number_metrics: BTreeMap<String, u64>,
    /// `Yes`/`No` flags (`QC_hit`, `Full_scan`, ...)
    pub bool_metrics: BTreeMap<String, bool>,
}

impl QueryEvent {
    /// Value of a time metric, if the log recorded it
    pub fn time_metric(&self, name: &str) -> Option<f64> {
        self.time_metrics.get(name).copied()
    }
}

/// Line oriented parser for slow query logs
pub struct SlowLogParser {
    time_regex: Regex,
    user_host_regex: Regex,
    metric_regex: Regex,
    admin_regex: Regex,
    use_regex: Regex,
    set_timestamp_regex: Regex,
    banner_regex: Regex,
    current: QueryEvent,
    query_lines: Vec<String>,
    /// A `use`/`SET timestamp` line was consumed since the last header
    in_body: bool,
    line_number: usize,
}

impl SlowLogParser {
    /// Create a new slow log parser
    pub fn new() -> Self {
        Self {
            time_regex: Regex::new(r"^# Time:\s+(.+?)\s*$").unwrap(),
            user_host_regex: Regex::new(
                r"^# User@Host:\s+([^\[]*)\[([^\]]*)\]\s+@\s+([^\[]*?)\s*\[([^\]]*)\]",
            )
            .unwrap(),
            metric_regex: Regex::new(r"(\w+): (\S+)").unwrap(),
            admin_regex: Regex::new(r"^# administrator command:\s+(.+?);?\s*$").unwrap(),
            use_regex: Regex::new(r"(?i)^use\s+`?([^`;\s]+)`?\s*;?\s*$").unwrap(),
            set_timestamp_regex: Regex::new(r"(?i)^SET\s+timestamp\s*=\s*(\d+)\s*;?\s*$")
                .unwrap(),
            banner_regex: Regex::new(concat!(
                r"^(?:\S.*, Version: .+ started with:",
                r"|Tcp port: \d+.*",
                r"|Time\s+Id\s+Command\s+Argument)\s*$",
            ))
            .unwrap(),
            current: QueryEvent::default(),
            query_lines: Vec::new(),
            in_body: false,
            line_number: 0,
        }
    }

    /// Feed one line of input. Returns the previous event when this line
    /// starts the header block of the next one.
    pub fn feed_line(&mut self, line: &str) -> Option<QueryEvent> {
        self.line_number += 1;
        let line = line.trim_end_matches(['\r', '\n']);

        if self.banner_regex.is_match(line) {
            debug!("Skipping server banner at line {}", self.line_number);
            return None;
        }

        if let Some(captures) = self.admin_regex.captures(line) {
            self.query_lines
                .push(format!("administrator command: {}", &captures[1]));
            return None;
        }

        if line.starts_with('#') {
            let finished = if !self.query_lines.is_empty() {
                self.take_event()
            } else {
                if self.in_body {
                    // the previous header block had no query text
                    debug!("Dropping event without query before line {}", self.line_number);
                    self.current = QueryEvent::default();
                }
                None
            };
            self.in_body = false;
            self.parse_header(line);
            return finished;
        }

        if self.query_lines.is_empty() {
            if line.trim().is_empty() {
                return None;
            }
            if let Some(captures) = self.use_regex.captures(line) {
                self.current.database = Some(captures[1].to_string());
                self.in_body = true;
                return None;
            }
            if let Some(captures) = self.set_timestamp_regex.captures(line) {
                if self.current.timestamp.is_none() {
                    self.current.timestamp = captures[1]
                        .parse::<i64>()
                        .ok()
                        .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
                }
                self.in_body = true;
                return None;
            }
        }

        self.query_lines.push(line.to_string());
        None
    }

    /// Flush the event still being accumulated at end of input
    pub fn finish(&mut self) -> Option<QueryEvent> {
        self.in_body = false;
        if self.query_lines.is_empty() {
            self.current = QueryEvent::default();
            return None;
        }
        self.take_event()
    }

    /// Parse a complete log held in memory
    pub fn parse_str(&mut self, content: &str) -> Vec<QueryEvent> {
        let mut events: Vec<QueryEvent> = content
            .lines()
            .filter_map(|line| self.feed_line(line))
            .collect();
        events.extend(self.finish());
        events
    }

    /// Number of lines consumed so far
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    fn take_event(&mut self) -> Option<QueryEvent> {
        let text = self.query_lines.join("\n");
        self.query_lines.clear();
        let mut event = std::mem::take(&mut self.current);

        let query = text.trim();
        let query = query.strip_suffix(';').unwrap_or(query).trim_end();
        if query.is_empty() {
            return None;
        }

        event.query = query.to_string();
        event
            .number_metrics
            .insert(QUERY_LENGTH.to_string(), event.query.len() as u64);
        Some(event)
    }

    fn parse_header(&mut self, line: &str) {
        if let Some(captures) = self.time_regex.captures(line) {
            match parse_timestamp(&captures[1]) {
                Ok(ts) => self.current.timestamp = Some(ts),
                Err(e) => debug!("Line {}: {}", self.line_number, e),
            }
            return;
        }

        if let Some(captures) = self.user_host_regex.captures(line) {
            let user = captures[2].trim();
            let user = if user.is_empty() { captures[1].trim() } else { user };
            if !user.is_empty() {
                self.current.user = Some(user.to_string());
            }
            let host = captures[3].trim();
            let host = if host.is_empty() { captures[4].trim() } else { host };
            if !host.is_empty() {
                self.current.host = Some(host.to_string());
            }
            return;
        }

        for captures in self.metric_regex.captures_iter(line) {
            record_metric(&mut self.current, &captures[1], &captures[2], self.line_number);
        }
    }
}

/// Store one `Key: value` header pair on `event`
fn record_metric(event: &mut QueryEvent, key: &str, value: &str, line_number: usize) {
    if key == "Schema" {
        event.database = Some(value.to_string());
        return;
    }
    if key == "Thread_id" || key == "Id" {
        return;
    }
    if key.ends_with("_time") || key.ends_with("_wait") {
        match value.parse::<f64>() {
            Ok(v) => {
                event.time_metrics.insert(key.to_string(), v);
            }
            Err(_) => debug!("Line {}: bad time value {}={}", line_number, key, value),
        }
        return;
    }
    match value {
        "Yes" => {
            event.bool_metrics.insert(key.to_string(), true);
        }
        "No" => {
            event.bool_metrics.insert(key.to_string(), false);
        }
        _ => match value.parse::<u64>() {
            Ok(v) => {
                event.number_metrics.insert(key.to_string(), v);
            }
            Err(_) => debug!("Line {}: ignoring {}={}", line_number, key, value),
        },
    }
}

impl Default for SlowLogParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the value of a `# Time:` header.
///
/// MySQL 5.7+ writes RFC 3339 (`2024-01-15T10:00:00.123456Z`); older servers
/// write `YYMMDD HH:MM:SS` in server local time, which is taken as UTC here.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt.and_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(dt.and_utc());
    }

    let legacy = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if let Ok(dt) = NaiveDateTime::parse_from_str(&legacy, "%y%m%d %H:%M:%S") {
        return Ok(dt.and_utc());
    }

    Err(timestamp_error("Failed to parse timestamp", value))
}
