//! Unit tests for output formatters
//!
//! Tests unit scaling, SQL summaries, and text and JSON report rendering

#[path = "../test_data/mod.rs"]
mod test_data;

use chrono::Local;
use slowlog_digest::analytics::{class_id, Aggregator, Fingerprinter, LimitPolicy};
use slowlog_digest::output::json::JsonFormatter;
use slowlog_digest::output::text::TextFormatter;
use slowlog_digest::output::units::{
    per, percent, short, short_byte, short_byte_int, short_int, short_time,
};
use slowlog_digest::sql::{summarize, StatementKind};
use slowlog_digest::{Report, RunMetadata, SlowLogParser};

/// Helper function to create a test report from a log held in memory
fn create_test_report(content: &str, limit: LimitPolicy) -> Report {
    let fingerprinter = Fingerprinter::new();
    let mut aggregator = Aggregator::new(true);
    for event in SlowLogParser::new().parse_str(content) {
        let fingerprint = fingerprinter.fingerprint(&event.query);
        aggregator.add_event(&event, &class_id(&fingerprint), &fingerprint);
    }
    let metadata = RunMetadata {
        current_date: Local::now(),
        hostname: "db01".to_string(),
        filename: "slow.log".to_string(),
    };
    Report::assemble_with(aggregator.finalize(), metadata, limit).unwrap()
}

fn comprehensive_report(limit: LimitPolicy) -> Report {
    create_test_report(test_data::comprehensive_slow_log(), limit)
}

#[cfg(test)]
mod unit_format_tests {
    use super::*;

    #[test]
    fn test_time_tiers_pick_designated_range() {
        let cases = [
            (0.000_000_000_1, "0"),
            (0.000_000_001, "1.0ns"),
            (0.000_000_999, "999.0ns"),
            (0.000_001, "1.0µs"),
            (0.000_5, "500.0µs"),
            (0.001, "1.0ms"),
            (0.75, "750.0ms"),
            (1.0, "1.00s"),
            (42.126, "42.13s"),
        ];
        for (value, expected) in cases {
            assert_eq!(short_time(value), expected, "short_time({})", value);
        }
    }

    #[test]
    fn test_byte_and_count_ladders() {
        assert_eq!(short_byte(1024u64), "1.00k");
        assert_eq!(short(1024u64), "1.02k");
        assert_eq!(short_byte(1_048_576u64), "1.00M");
        assert_eq!(short(1_048_576u64), "1.05M");
        assert_eq!(short_byte_int(1_500_000u64), "1M");
        assert_eq!(short_int(1_500_000u64), "1.50M");
    }

    #[test]
    fn test_zero_renders_bare() {
        assert_eq!(short_byte(0u64), "0");
        assert_eq!(short(0u64), "0");
        assert_eq!(short_byte_int(0u64), "0");
        assert_eq!(short_int(0u64), "0");
        assert_eq!(short_time(0.0), "0");
    }

    #[test]
    fn test_ratio_helpers() {
        assert_eq!(percent(50u64, 200u64), 25.0);
        assert_eq!(per(9.0, 3u64), 3.0);
        assert_eq!(per(1.0, 0u64).to_string(), "inf");
        assert_eq!(percent(0u64, 0u64).to_string(), "NaN");
    }
}

#[cfg(test)]
mod summary_tests {
    use super::*;

    #[test]
    fn test_summary_scenarios() {
        assert_eq!(summarize("SELECT a FROM foo"), "SELECT foo");
        assert_eq!(summarize("INSERT INTO db.t (x) VALUES (1)"), "INSERT db.t");
        assert_eq!(summarize("not valid sql (("), "");
        assert_eq!(summarize("UPDATE a JOIN b ON a.id=b.id SET a.x=1"), "UPDATE a b");
    }

    #[test]
    fn test_summary_of_nested_queries() {
        let cases = [
            (
                "SELECT * FROM a WHERE a.id IN \
                 (SELECT a_id FROM b WHERE b.c IN (SELECT id FROM c))",
                "SELECT a b c",
            ),
            (
                "INSERT INTO archive SELECT * FROM shop.orders WHERE created_at < '2024-01-01'",
                "INSERT archive shop.orders",
            ),
            (
                "SELECT e.kind, COUNT(*) FROM events e \
                 JOIN users u ON u.id = e.user_id GROUP BY e.kind",
                "SELECT events users",
            ),
        ];
        for (sql, expected) in cases {
            assert_eq!(summarize(sql), expected, "summary of {}", sql);
        }
    }

    #[test]
    fn test_summary_statement_kinds() {
        assert_eq!(summarize("BEGIN"), "BEGIN");
        assert_eq!(summarize("ROLLBACK"), "ROLLBACK");
        assert_eq!(StatementKind::UnlockTables.to_string(), "UNLOCK TABLES");
    }
}

#[cfg(test)]
mod text_formatter_tests {
    use super::*;

    #[test]
    fn test_header() {
        let report = comprehensive_report(LimitPolicy::default());
        let output = TextFormatter::new().format(&report).unwrap();

        assert!(output.starts_with("# Generated at: "));
        assert!(output.contains("# Hostname: db01\n"));
        assert!(output.contains("# Files: slow.log\n"));
        assert!(output.contains("# Overall: 6 total, 3 unique\n"));
        assert!(output.contains("# Time range: 2024-08-15T10:30:15 to 2024-08-15T10:30:20\n"));
        let exec_time = "# Exec time      4.33s  10.0ms   2.00s 721.7ms   2.00s  10.0ms\n";
        assert!(output.contains(exec_time));
    }

    #[test]
    fn test_profile_table() {
        let report = comprehensive_report(LimitPolicy::default());
        let output = TextFormatter::new().format(&report).unwrap();

        assert!(output.contains("# Rank Response time  Calls R/Call Query\n"));
        assert!(output.contains("# ==== ============== ===== ====== =====\n"));
        assert!(output.contains("#    1  3.5000  80.8%     2 1.7500 SELECT orders\n"));
        assert!(output.contains("#    2  0.8000  18.5%     1 0.8000 DELETE sessions\n"));
        assert!(output.contains("#    3  0.0300   0.7%     3 0.0100 INSERT shop.audit\n"));
    }

    #[test]
    fn test_query_blocks() {
        let report = comprehensive_report(LimitPolicy::default());
        let output = TextFormatter::new().format(&report).unwrap();

        let orders = &report.profiles[0].class;
        assert!(output.contains(&format!("# Query 1: 0x{}\n", orders.id)));
        assert!(output.contains("# Calls: 2 (33.33%), Response time: 3.50s (80.83%)\n"));
        assert!(output.contains("# Hosts: web01 (1), web02 (1)\n"));
        assert!(output.contains("# Summary: SELECT orders\n"));
        assert!(output.contains("SELECT o.id, o.total FROM orders o WHERE o.customer_id = 7\\G\n"));
        assert_eq!(output.matches("# Example:").count(), 3);
    }

    #[test]
    fn test_limit_truncates_blocks_only() {
        let report = comprehensive_report(LimitPolicy::Count(1));
        let output = TextFormatter::new().format(&report).unwrap();

        assert!(output.contains("# Overall: 6 total, 3 unique\n"));
        assert!(output.contains("# Query 1: "));
        assert!(!output.contains("# Query 2: "));
        assert!(!output.contains("DELETE sessions"));
    }

    #[test]
    fn test_examples_omitted() {
        let report = comprehensive_report(LimitPolicy::default());
        let output = TextFormatter::new().with_examples(false).format(&report).unwrap();
        assert!(!output.contains("# Example:"));
        assert!(output.contains("# Summary: DELETE sessions\n"));
    }

    #[test]
    fn test_percona_attributes() {
        let report = create_test_report(test_data::percona_slow_log(), LimitPolicy::default());
        let output = TextFormatter::new().format(&report).unwrap();

        assert!(output.contains("# Databases: analytics (1)\n"));
        assert!(output.contains("# Boolean:\n"));
        assert!(output.contains("# Full scan    100% yes,   0% no\n"));
        assert!(output.contains("# Bytes sent "));
        assert!(output.contains("USE `analytics`\\G\n"));
        assert!(output.contains("# Summary: SELECT events users\n"));
        assert!(output.contains("# Summary: \n"));
        assert!(output.contains("administrator command: Quit\\G\n"));
    }

    #[test]
    fn test_empty_report() {
        let report = create_test_report("", LimitPolicy::default());
        let output = TextFormatter::new().format(&report).unwrap();

        assert!(output.contains("# Overall: 0 total, 0 unique\n"));
        let exec_time = "# Exec time          0       0       0       0       0       0\n";
        assert!(output.contains(exec_time));
        assert!(output.contains("# Profile\n"));
        assert!(!output.contains("# Query 1"));
    }
}

#[cfg(test)]
mod json_formatter_tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_json_report() {
        let report = comprehensive_report(LimitPolicy::Count(2));
        let output = JsonFormatter::new().format(&report).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["metadata"]["hostname"], "db01");
        assert_eq!(value["global"]["total_queries"], 6);
        assert_eq!(value["global"]["unique_queries"], 3);
        assert_eq!(value["profiles"].as_array().unwrap().len(), 2);
        assert_eq!(value["profiles"][0]["rank"], 1);
        assert_eq!(value["profiles"][0]["summary"], "SELECT orders");
        assert_eq!(value["profiles"][0]["class"]["total_queries"], 2);
        let query_time = &value["profiles"][0]["class"]["metrics"]["time_metrics"]["Query_time"];
        assert_eq!(query_time["sum"], 3.5);
        assert!(query_time.get("values").is_none());
        assert_eq!(value["width"]["rp_call"], 6);
    }

    #[test]
    fn test_compact_json() {
        let report = create_test_report("", LimitPolicy::default());
        let output = JsonFormatter::new().with_pretty(false).format(&report).unwrap();
        assert!(!output.contains('\n'));
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["profiles"], Value::Array(vec![]));
        assert_eq!(value["global"]["total_queries"], 0);
    }
}
