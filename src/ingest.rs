//! Streaming ingestion of slow log sources
//!
//! Each source is read by a producer task that parses lines into
//! [`QueryEvent`]s and sends them over a bounded channel; the [`Analyzer`]
//! drains the channel, fingerprints every event and aggregates it. Sources
//! are processed one after another.

use crate::analytics::{Aggregator, Fingerprinter, LimitPolicy};
use crate::parsers::{QueryEvent, SlowLogParser};
use crate::report::Report;
use crate::{Result, SlowlogError};
use indicatif::ProgressBar;
use log::{debug, info};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Capacity of the channel between a source's producer and the analyzer
const EVENT_BUFFER: usize = 1024;

/// Start a producer task parsing `reader`; events arrive on the returned receiver
pub fn spawn_parser<R>(reader: R) -> (JoinHandle<Result<usize>>, mpsc::Receiver<QueryEvent>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let handle = tokio::spawn(produce(reader, tx));
    (handle, rx)
}

/// Parse `reader` line by line, sending every completed event. Returns the
/// number of lines read. Invalid UTF-8 is replaced rather than rejected.
async fn produce<R>(reader: R, tx: mpsc::Sender<QueryEvent>) -> Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut parser = SlowLogParser::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        if let Some(event) = parser.feed_line(&line) {
            if tx.send(event).await.is_err() {
                debug!("Event receiver dropped, stopping at line {}", parser.line_number());
                return Ok(parser.line_number());
            }
        }
    }

    if let Some(event) = parser.finish() {
        // the receiver only goes away when the consumer has stopped
        let _ = tx.send(event).await;
    }
    Ok(parser.line_number())
}

/// Aggregates events from any number of sources into a [`Report`]
pub struct Analyzer {
    aggregator: Aggregator,
    fingerprinter: Fingerprinter,
    sources: Vec<String>,
    progress: Option<ProgressBar>,
}

impl Analyzer {
    /// Create an analyzer; `keep_examples` retains one example query per class
    pub fn new(keep_examples: bool) -> Self {
        Self {
            aggregator: Aggregator::new(keep_examples),
            fingerprinter: Fingerprinter::new(),
            sources: Vec::new(),
            progress: None,
        }
    }

    /// Tick `progress` for every ingested event
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Consume one source until its stream is exhausted. Returns the number
    /// of events read from it.
    pub async fn analyze<R>(&mut self, reader: R, name: &str) -> Result<u64>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        if let Some(pb) = &self.progress {
            pb.set_message(format!("Processing {}", name));
        }

        let (handle, mut rx) = spawn_parser(reader);
        let mut events = 0u64;
        while let Some(event) = rx.recv().await {
            self.add_event(&event);
            events += 1;
        }

        let lines = handle.await.map_err(|e| SlowlogError::Unexpected {
            message: e.to_string(),
            context: Some(format!("reading {}", name)),
        })??;

        info!("Processed {} events ({} lines) from {}", events, lines, name);
        self.sources.push(name.to_string());
        Ok(events)
    }

    /// Fingerprint and aggregate a single event
    pub fn add_event(&mut self, event: &QueryEvent) {
        let fingerprint = self.fingerprinter.fingerprint(&event.query);
        let id = self.fingerprinter.class_id(&fingerprint);
        self.aggregator.add_event(event, &id, &fingerprint);
        if let Some(pb) = &self.progress {
            pb.inc(1);
        }
    }

    /// Names of the sources analyzed so far
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Finish aggregation and assemble the report
    pub fn finalize(self, limit: LimitPolicy) -> Result<Report> {
        if let Some(pb) = &self.progress {
            pb.finish_and_clear();
        }
        info!("Total events: {}", self.aggregator.total_events());
        Report::assemble(self.aggregator.finalize(), &self.sources, limit)
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(true)
    }
}
