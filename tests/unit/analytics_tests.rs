//! Unit tests for analytics functionality
//!
//! Tests fingerprinting, aggregation, ranking, selection and column widths

#[path = "../test_data/mod.rs"]
mod test_data;

use chrono::Local;
use slowlog_digest::analytics::{
    class_id, int_width, rank, select, Aggregator, Fingerprinter, LimitPolicy, MetricStats,
    QueryClass, Width, PRIMARY_METRIC,
};
use slowlog_digest::{Analyzer, QueryEvent, Report, RunMetadata, SlowLogParser, SlowlogError};

/// Helper function to aggregate a log held in memory
fn aggregate(content: &str) -> slowlog_digest::analytics::AggregateResult {
    let fingerprinter = Fingerprinter::new();
    let mut aggregator = Aggregator::new(true);
    for event in SlowLogParser::new().parse_str(content) {
        let fingerprint = fingerprinter.fingerprint(&event.query);
        aggregator.add_event(&event, &class_id(&fingerprint), &fingerprint);
    }
    aggregator.finalize()
}

/// Helper function to build a class with a given total response time
fn create_test_class(id: &str, calls: u64, total_time: f64) -> QueryClass {
    let mut class = QueryClass {
        id: id.to_string(),
        total_queries: calls,
        ..Default::default()
    };
    let mut stats = MetricStats::default();
    stats.add(total_time);
    stats.finalize();
    class
        .metrics
        .time_metrics
        .insert(PRIMARY_METRIC.to_string(), stats);
    class
}

fn test_metadata() -> RunMetadata {
    RunMetadata {
        current_date: Local::now(),
        hostname: "db01".to_string(),
        filename: "slow.log".to_string(),
    }
}

#[cfg(test)]
mod aggregation_tests {
    use super::*;

    #[test]
    fn test_classes_group_by_fingerprint() {
        let result = aggregate(test_data::comprehensive_slow_log());
        assert_eq!(result.global.total_queries, 6);
        assert_eq!(result.global.unique_queries, 3);
        assert_eq!(result.classes.len(), 3);

        let mut calls: Vec<u64> = result.classes.values().map(|c| c.total_queries).collect();
        calls.sort_unstable();
        assert_eq!(calls, vec![1, 2, 3]);
    }

    #[test]
    fn test_class_statistics() {
        let result = aggregate(test_data::comprehensive_slow_log());
        let orders = result
            .classes
            .values()
            .find(|c| c.fingerprint.contains("from orders"))
            .expect("orders class");

        let query_time = orders.time_metric("Query_time").unwrap();
        assert_eq!(query_time.count, 2);
        assert_eq!(query_time.sum, 3.5);
        assert_eq!(query_time.min, 1.5);
        assert_eq!(query_time.max, 2.0);
        assert_eq!(query_time.avg, 1.75);
        assert_eq!(query_time.p95, 2.0);
        assert_eq!(query_time.median, 1.5);

        let example = orders.example.as_ref().unwrap();
        assert!(example.query.ends_with("customer_id = 7"));
        assert_eq!(example.query_time, 2.0);

        assert_eq!(orders.hosts.get("web01"), Some(&1));
        assert_eq!(orders.hosts.get("web02"), Some(&1));
        assert_eq!(orders.users.get("app"), Some(&2));
        assert!(orders.first_seen < orders.last_seen);
    }

    #[test]
    fn test_global_statistics() {
        let result = aggregate(test_data::comprehensive_slow_log());
        let query_time = result.global.time_metric("Query_time").unwrap();
        assert!((query_time.sum - 4.33).abs() < 1e-9);
        assert_eq!(query_time.max, 2.0);
        assert_eq!(query_time.min, 0.01);
        assert_eq!(result.global.number_metric("Rows_examined").unwrap().sum, 305000.0);
        assert!(result.global.example.is_none());
    }

    #[test]
    fn test_boolean_metrics() {
        let result = aggregate(test_data::percona_slow_log());
        let flags = &result.global.metrics.bool_metrics;
        assert_eq!(flags["Full_scan"].count, 1);
        assert_eq!(flags["Full_scan"].true_count, 1);
        assert_eq!(flags["QC_Hit"].true_count, 0);
    }

    #[test]
    fn test_examples_can_be_disabled() {
        let mut aggregator = Aggregator::new(false);
        let event = QueryEvent {
            query: "SELECT 1".to_string(),
            ..Default::default()
        };
        aggregator.add_event(&event, "A", "select ?");
        let result = aggregator.finalize();
        assert!(result.classes["A"].example.is_none());
    }
}

#[cfg(test)]
mod ranking_tests {
    use super::*;

    #[test]
    fn test_ranking_is_descending() {
        let ranked = rank(vec![
            create_test_class("A", 1, 0.5),
            create_test_class("B", 1, 9.0),
            create_test_class("C", 1, 3.0),
        ]);
        for pair in ranked.windows(2) {
            assert!(pair[0].total_time() >= pair[1].total_time());
            assert_eq!(pair[0].rank + 1, pair[1].rank);
        }
        assert_eq!(ranked[0].class.id, "B");
    }

    #[test]
    fn test_percentage_limit_is_floor() {
        for total in 0..50usize {
            for percent in [0.0, 10.0, 33.3, 50.0, 99.9, 100.0] {
                let expected = (total as f64 * percent / 100.0).floor() as usize;
                assert_eq!(LimitPolicy::Percent(percent).limit(total), expected);
            }
        }
    }

    #[test]
    fn test_count_limit_never_exceeds_request() {
        for total in 0..30usize {
            for count in 0..30usize {
                let kept = LimitPolicy::Count(count).limit(total);
                assert!(kept <= count);
                assert_eq!(kept, total.min(count));
            }
        }
    }

    #[test]
    fn test_select_zero_percent() {
        let ranked = rank((0..5).map(|i| create_test_class(&i.to_string(), 1, i as f64)));
        assert!(select(ranked, LimitPolicy::Percent(0.0)).is_empty());
    }
}

#[cfg(test)]
mod width_tests {
    use super::*;

    #[test]
    fn test_int_width_at_least_digit_count() {
        for v in (0..100_000u64).step_by(37).chain([9, 10, 99, 100, 999, 1000, 1_000_000_000]) {
            assert!(int_width(v as f64) >= v.to_string().len(), "width of {}", v);
        }
    }

    #[test]
    fn test_width_from_log() {
        let result = aggregate(test_data::comprehensive_slow_log());
        let width = Width::from_classes(result.classes.values()).unwrap();
        assert_eq!(width.rp_call, 6);

        let columns = width.columns(&result.global);
        assert_eq!(columns.rank, 4);
        assert_eq!(columns.calls, 5);
        assert_eq!(columns.response_time, 7);
    }

    #[test]
    fn test_width_reflects_rows_outside_the_limit() {
        let classes = vec![
            create_test_class("SINGLE_SLOW_CALL", 1, 1_250.0),
            create_test_class("MANY_CALLS", 123_456, 1.0),
            create_test_class("HEAVY", 100_000, 3_949.0),
        ];

        let mut result = slowlog_digest::analytics::AggregateResult::default();
        for class in classes {
            result.classes.insert(class.id.clone(), class);
        }
        let report = Report::assemble_with(result, test_metadata(), LimitPolicy::Count(1)).unwrap();

        assert_eq!(report.profiles.len(), 1);
        assert_eq!(report.profiles[0].class.id, "HEAVY");
        // 1250.0000 per call in a class that is not displayed
        assert_eq!(report.width.rp_call, 4 + 5);
    }

    #[test]
    fn test_missing_query_time_aborts_report() {
        let mut result = slowlog_digest::analytics::AggregateResult::default();
        let class = QueryClass {
            id: "A".to_string(),
            total_queries: 1,
            ..Default::default()
        };
        result.classes.insert(class.id.clone(), class);
        let err =
            Report::assemble_with(result, test_metadata(), LimitPolicy::default()).unwrap_err();
        assert!(matches!(err, SlowlogError::MissingMetric { .. }));
    }
}

#[cfg(test)]
mod analyzer_tests {
    use super::*;

    #[tokio::test]
    async fn test_analyzer_over_two_sources() {
        let mut analyzer = Analyzer::new(true);
        analyzer
            .analyze(test_data::comprehensive_slow_log().as_bytes(), "a.log")
            .await
            .unwrap();
        analyzer
            .analyze(test_data::percona_slow_log().as_bytes(), "b.log")
            .await
            .unwrap();

        let report = analyzer.finalize(LimitPolicy::Count(2)).unwrap();
        assert_eq!(report.global.total_queries, 8);
        assert_eq!(report.global.unique_queries, 5);
        assert_eq!(report.profiles.len(), 2);
        assert_eq!(report.profiles[0].class.databases.get("analytics"), Some(&1));
        assert!(report.profiles[1].class.fingerprint.contains("from orders"));
        assert_eq!(report.metadata.filename, "a.log b.log");
    }

    #[tokio::test]
    async fn test_analyzer_without_events() {
        let mut analyzer = Analyzer::new(true);
        assert_eq!(analyzer.analyze(&b""[..], "empty.log").await.unwrap(), 0);
        let report = analyzer.finalize(LimitPolicy::default()).unwrap();
        assert!(report.profiles.is_empty());
        assert_eq!(report.global.total_queries, 0);
    }
}
