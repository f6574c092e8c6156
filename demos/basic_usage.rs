//! Basic usage example for slowlog-digest
//!
//! This example demonstrates how to use the slowlog-digest library to parse
//! a MySQL slow log, group it into query classes and print a report.
//!
//! Run with `cargo run --example basic_usage [path/to/slow.log]`.

use slowlog_digest::analytics::class_id;
use slowlog_digest::{
    Aggregator, Fingerprinter, JsonFormatter, LimitPolicy, Report, SlowLogParser, TextFormatter,
};
use std::fs;

const SAMPLE_LOG: &str = "# Time: 2024-01-01T10:00:00.123456Z
# User@Host: app[app] @ web01 [10.0.0.11]  Id:    12
# Query_time: 0.250000  Lock_time: 0.000100 Rows_sent: 1  Rows_examined: 1000
use shop;
SET timestamp=1704103200;
SELECT * FROM users WHERE id = 1;
# Time: 2024-01-01T10:00:01.000000Z
# User@Host: app[app] @ web01 [10.0.0.11]  Id:    12
# Query_time: 0.300000  Lock_time: 0.000100 Rows_sent: 1  Rows_examined: 1000
SET timestamp=1704103201;
SELECT * FROM users WHERE id = 2;
# Time: 2024-01-01T10:00:02.000000Z
# User@Host: batch[batch] @ worker01 [10.0.0.21]  Id:    13
# Query_time: 1.200000  Lock_time: 0.000300 Rows_sent: 0  Rows_examined: 50000
SET timestamp=1704103202;
UPDATE orders SET status = 'shipped' WHERE shipped_at IS NOT NULL;
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("slowlog-digest Basic Usage Example");
    println!("==================================");

    let (name, content) = match std::env::args().nth(1) {
        Some(path) => {
            let content = fs::read_to_string(&path)?;
            (path, content)
        }
        None => ("sample".to_string(), SAMPLE_LOG.to_string()),
    };
    println!("Reading log: {}", name);

    // Parse events
    let events = SlowLogParser::new().parse_str(&content);
    println!("Parsed {} events", events.len());

    // Group events by fingerprint
    let fingerprinter = Fingerprinter::new();
    let mut aggregator = Aggregator::new(true);
    for event in &events {
        let fingerprint = fingerprinter.fingerprint(&event.query);
        aggregator.add_event(event, &class_id(&fingerprint), &fingerprint);
    }

    // Rank classes and keep the top five
    let report = Report::assemble(aggregator.finalize(), &[name], LimitPolicy::Count(5))?;

    println!("\nReport (Text):");
    println!("{}", TextFormatter::new().format(&report)?);

    println!("\nReport (JSON):");
    println!("{}", JsonFormatter::new().format(&report)?);

    Ok(())
}
